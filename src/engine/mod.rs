//! Engagement core: counters, numbering, ranking, expiry.
//!
//! Every operation takes the store and the caller's token explicitly; the
//! core keeps no state of its own.

pub mod attachments;
pub mod counter;
pub mod expiry;
pub mod numbering;
pub mod posting;
pub mod ranking;
