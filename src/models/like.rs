use serde::{Deserialize, Serialize};

/// Kind of engagement item. Both kinds carry likes and attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Thread,
    Comment,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Thread => "thread",
            ItemKind::Comment => "comment",
        }
    }
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeInfo {
    pub like_count: i64,
    pub is_liked: bool,
}
