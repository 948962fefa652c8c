use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Fixed lifetime of a thread, counted from `created_at`.
pub const THREAD_TTL_HOURS: i64 = 24;

pub fn thread_ttl() -> Duration {
    Duration::hours(THREAD_TTL_HOURS)
}

/// Represents the 'threads' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Thread {
    pub id: Uuid,
    pub text: String,

    /// Anonymous token of the creator.
    pub owner_id: String,

    /// Doubles as the comment sequence generator.
    pub message_count: i64,

    pub like_count: i64,
    pub liked_by: Vec<String>,

    /// View counter. One per token, never decremented.
    pub clicks: i64,
    pub clicked_by: Vec<String>,

    pub files: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Thread {
    pub fn is_liked_by(&self, token: &str) -> bool {
        self.liked_by.iter().any(|t| t == token)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Projects the thread for a given viewer. The flags are never stored.
    pub fn view(&self, viewer: Option<&str>) -> ThreadView {
        ThreadView {
            id: self.id,
            text: self.text.clone(),
            message_count: self.message_count,
            like_count: self.like_count,
            created_at: self.created_at,
            is_liked: viewer.is_some_and(|v| self.is_liked_by(v)),
            is_op: viewer.is_some_and(|v| v == self.owner_id),
            files: self.files.clone(),
            score: None,
        }
    }
}

/// Input for inserting a thread. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub text: String,
    pub owner_id: String,
}

/// Public projection of a thread, used by the feed and the thread endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    pub id: Uuid,
    pub text: String,
    pub message_count: i64,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub is_liked: bool,
    pub is_op: bool,
    pub files: Vec<String>,

    /// Engagement score; present on feed items only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// DTO for creating a new thread, checked after whitespace normalization.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateThreadRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Text must be between 1 and 500 characters"
    ))]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsOpResponse {
    pub is_op: bool,
}
