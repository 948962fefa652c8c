//! Engagement store.
//!
//! Every mutating method is a single conditional update against one row (or
//! one map entry): it either applies atomically or reports that its predicate
//! did not match. Expired rows never match any predicate and are never
//! returned by any read.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        like::ItemKind,
        thread::{NewThread, Thread},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Rows removed by one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub threads: u64,
    pub comments: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_thread(&self, new: NewThread) -> Result<Thread, AppError>;

    async fn find_thread(&self, id: Uuid) -> Result<Option<Thread>, AppError>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError>;

    /// Appends URLs to an item's file list. `false` if the item is gone.
    async fn append_files(&self, kind: ItemKind, id: Uuid, urls: &[String]) -> Result<bool, AppError>;

    /// Adds `token` to `likedBy` and increments `likeCount` if the token is
    /// absent. Returns the new count, or `None` if the predicate did not match.
    async fn add_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError>;

    /// Inverse of [`Store::add_like`]: matches only if the token is present.
    async fn remove_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError>;

    /// Adds `token` to `clickedBy` and increments `clicks` if absent.
    async fn add_click(&self, thread_id: Uuid, token: &str) -> Result<Option<i64>, AppError>;

    /// Increments `messageCount` and returns the new value.
    async fn increment_message_count(&self, thread_id: Uuid) -> Result<Option<i64>, AppError>;

    /// Fails with `Conflict` if the number is already taken in the thread and
    /// with `NotFound` if the thread no longer exists.
    async fn insert_comment(&self, new: NewComment) -> Result<Comment, AppError>;

    async fn comment_number_exists(&self, thread_id: Uuid, message_number: i64) -> Result<bool, AppError>;

    async fn increment_reply_count(&self, thread_id: Uuid, message_number: i64) -> Result<(), AppError>;

    /// Every live thread, in no particular order.
    async fn live_threads(&self) -> Result<Vec<Thread>, AppError>;

    /// Every live comment of one thread, in no particular order.
    async fn live_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>, AppError>;

    /// Live threads whose `likedBy` contains `token`, newest first.
    async fn threads_liked_by(&self, token: &str) -> Result<Vec<Thread>, AppError>;

    async fn purge_expired(&self) -> Result<PurgeReport, AppError>;
}
