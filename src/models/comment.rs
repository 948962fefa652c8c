use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub thread_id: Uuid,

    /// Thread-scoped sequence number, starting at 1.
    pub message_number: i64,

    pub text: String,

    /// Message number this comment answers, within the same thread.
    pub reply_to: Option<i64>,

    /// Whether the author was the thread owner at creation time.
    pub is_op: bool,

    pub like_count: i64,
    pub liked_by: Vec<String>,
    pub reply_count: i64,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,

    /// Copied from the parent thread once, at creation.
    pub thread_expires_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_liked_by(&self, token: &str) -> bool {
        self.liked_by.iter().any(|t| t == token)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.thread_expires_at <= now
    }

    pub fn view(&self, viewer: Option<&str>) -> CommentView {
        CommentView {
            id: self.id,
            thread_id: self.thread_id,
            text: self.text.clone(),
            message_number: self.message_number,
            reply_to: self.reply_to,
            is_op: self.is_op,
            like_count: self.like_count,
            reply_count: self.reply_count,
            is_liked: viewer.is_some_and(|v| self.is_liked_by(v)),
            files: self.files.clone(),
            created_at: self.created_at,
        }
    }
}

/// Input for inserting a comment once its number has been allocated.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub thread_id: Uuid,
    pub message_number: i64,
    pub text: String,
    pub reply_to: Option<i64>,
    pub is_op: bool,
    pub thread_expires_at: DateTime<Utc>,
}

/// DTO for displaying a comment to a particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub text: String,
    pub message_number: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
    pub is_op: bool,
    pub like_count: i64,
    pub reply_count: i64,
    pub is_liked: bool,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new comment, checked after whitespace normalization.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub thread_id: Uuid,

    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be between 1 and 500 characters"
    ))]
    pub text: String,

    /// Optional: the message number being replied to.
    #[validate(range(min = 1, message = "replyTo must be a positive message number"))]
    pub reply_to: Option<i64>,
}
