// src/models/mod.rs

pub mod comment;
pub mod like;
pub mod page;
pub mod thread;
pub mod user;
