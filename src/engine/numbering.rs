//! Per-thread comment numbering.
//!
//! The thread's own `message_count` is the sequence: incrementing it and
//! reading the new value is one atomic store operation, so concurrent callers
//! always receive distinct numbers. A number whose comment is never persisted
//! stays consumed.

use uuid::Uuid;

use crate::{error::AppError, store::Store};

pub async fn next_message_number(store: &dyn Store, thread_id: Uuid) -> Result<i64, AppError> {
    store
        .increment_message_count(thread_id)
        .await?
        .ok_or_else(AppError::thread_not_found)
}
