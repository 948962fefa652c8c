//! In-process store for development and tests.
//!
//! Each thread and comment lives in its own `DashMap` entry; holding the
//! entry's write guard gives the same single-document atomicity the
//! PostgreSQL store gets from row locks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{PurgeReport, Store};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        like::ItemKind,
        thread::{NewThread, Thread, thread_ttl},
    },
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct MemoryStore {
    threads: DashMap<Uuid, Thread>,
    comments: DashMap<Uuid, Comment>,
    /// `(thread_id, message_number)` -> comment id.
    numbers: DashMap<(Uuid, i64), Uuid>,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Builds a store whose notion of "now" comes from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            threads: DashMap::new(),
            comments: DashMap::new(),
            numbers: DashMap::new(),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Id of the live comment numbered `message_number` in a thread.
    fn numbered(&self, thread_id: Uuid, message_number: i64, now: DateTime<Utc>) -> Option<Uuid> {
        let id = *self.numbers.get(&(thread_id, message_number))?;
        self.comments
            .get(&id)
            .filter(|c| !c.is_expired(now))
            .map(|_| id)
    }
}

fn add_member(members: &mut Vec<String>, count: &mut i64, token: &str) -> Option<i64> {
    if members.iter().any(|m| m == token) {
        return None;
    }
    members.push(token.to_string());
    *count += 1;
    Some(*count)
}

fn remove_member(members: &mut Vec<String>, count: &mut i64, token: &str) -> Option<i64> {
    let idx = members.iter().position(|m| m == token)?;
    members.remove(idx);
    *count -= 1;
    Some(*count)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_thread(&self, new: NewThread) -> Result<Thread, AppError> {
        let created_at = self.now();
        let thread = Thread {
            id: Uuid::new_v4(),
            text: new.text,
            owner_id: new.owner_id,
            message_count: 0,
            like_count: 0,
            liked_by: Vec::new(),
            clicks: 0,
            clicked_by: Vec::new(),
            files: Vec::new(),
            created_at,
            expires_at: created_at + thread_ttl(),
        };
        self.threads.insert(thread.id, thread.clone());
        Ok(thread)
    }

    async fn find_thread(&self, id: Uuid) -> Result<Option<Thread>, AppError> {
        let now = self.now();
        Ok(self
            .threads
            .get(&id)
            .filter(|t| !t.is_expired(now))
            .map(|t| t.value().clone()))
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        let now = self.now();
        Ok(self
            .comments
            .get(&id)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.value().clone()))
    }

    async fn append_files(&self, kind: ItemKind, id: Uuid, urls: &[String]) -> Result<bool, AppError> {
        let now = self.now();
        let appended = match kind {
            ItemKind::Thread => self
                .threads
                .get_mut(&id)
                .filter(|t| !t.is_expired(now))
                .map(|mut t| t.files.extend_from_slice(urls)),
            ItemKind::Comment => self
                .comments
                .get_mut(&id)
                .filter(|c| !c.is_expired(now))
                .map(|mut c| c.files.extend_from_slice(urls)),
        };
        Ok(appended.is_some())
    }

    async fn add_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
        let now = self.now();
        Ok(match kind {
            ItemKind::Thread => self.threads.get_mut(&id).and_then(|mut t| {
                if t.is_expired(now) {
                    return None;
                }
                let t = &mut *t;
                add_member(&mut t.liked_by, &mut t.like_count, token)
            }),
            ItemKind::Comment => self.comments.get_mut(&id).and_then(|mut c| {
                if c.is_expired(now) {
                    return None;
                }
                let c = &mut *c;
                add_member(&mut c.liked_by, &mut c.like_count, token)
            }),
        })
    }

    async fn remove_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
        let now = self.now();
        Ok(match kind {
            ItemKind::Thread => self.threads.get_mut(&id).and_then(|mut t| {
                if t.is_expired(now) {
                    return None;
                }
                let t = &mut *t;
                remove_member(&mut t.liked_by, &mut t.like_count, token)
            }),
            ItemKind::Comment => self.comments.get_mut(&id).and_then(|mut c| {
                if c.is_expired(now) {
                    return None;
                }
                let c = &mut *c;
                remove_member(&mut c.liked_by, &mut c.like_count, token)
            }),
        })
    }

    async fn add_click(&self, thread_id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
        let now = self.now();
        Ok(self.threads.get_mut(&thread_id).and_then(|mut t| {
            if t.is_expired(now) {
                return None;
            }
            let t = &mut *t;
            add_member(&mut t.clicked_by, &mut t.clicks, token)
        }))
    }

    async fn increment_message_count(&self, thread_id: Uuid) -> Result<Option<i64>, AppError> {
        let now = self.now();
        Ok(self.threads.get_mut(&thread_id).and_then(|mut t| {
            if t.is_expired(now) {
                return None;
            }
            t.message_count += 1;
            Some(t.message_count)
        }))
    }

    async fn insert_comment(&self, new: NewComment) -> Result<Comment, AppError> {
        let now = self.now();
        // The parent's write guard serializes inserts into one thread and keeps
        // a concurrent purge from orphaning the comment.
        let parent = self
            .threads
            .get_mut(&new.thread_id)
            .filter(|t| !t.is_expired(now))
            .ok_or_else(AppError::thread_not_found)?;

        let key = (new.thread_id, new.message_number);
        if self.numbers.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "Message number {} already exists in thread",
                new.message_number
            )));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            thread_id: new.thread_id,
            message_number: new.message_number,
            text: new.text,
            reply_to: new.reply_to,
            is_op: new.is_op,
            like_count: 0,
            liked_by: Vec::new(),
            reply_count: 0,
            files: Vec::new(),
            created_at: now,
            thread_expires_at: new.thread_expires_at,
        };
        self.comments.insert(comment.id, comment.clone());
        self.numbers.insert(key, comment.id);
        drop(parent);
        Ok(comment)
    }

    async fn comment_number_exists(&self, thread_id: Uuid, message_number: i64) -> Result<bool, AppError> {
        let now = self.now();
        Ok(self.numbered(thread_id, message_number, now).is_some())
    }

    async fn increment_reply_count(&self, thread_id: Uuid, message_number: i64) -> Result<(), AppError> {
        let now = self.now();
        let target = self.numbered(thread_id, message_number, now);

        if let Some(mut comment) = target.and_then(|id| self.comments.get_mut(&id)) {
            comment.reply_count += 1;
        }
        Ok(())
    }

    async fn live_threads(&self) -> Result<Vec<Thread>, AppError> {
        let now = self.now();
        Ok(self
            .threads
            .iter()
            .filter(|t| !t.is_expired(now))
            .map(|t| t.value().clone())
            .collect())
    }

    async fn live_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let now = self.now();
        Ok(self
            .comments
            .iter()
            .filter(|c| c.thread_id == thread_id && !c.is_expired(now))
            .map(|c| c.value().clone())
            .collect())
    }

    async fn threads_liked_by(&self, token: &str) -> Result<Vec<Thread>, AppError> {
        let now = self.now();
        let mut threads: Vec<Thread> = self
            .threads
            .iter()
            .filter(|t| !t.is_expired(now) && t.is_liked_by(token))
            .map(|t| t.value().clone())
            .collect();
        threads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(threads)
    }

    async fn purge_expired(&self) -> Result<PurgeReport, AppError> {
        let now = self.now();
        let mut report = PurgeReport::default();
        self.threads.retain(|_, t| {
            let keep = !t.is_expired(now);
            report.threads += u64::from(!keep);
            keep
        });
        let mut purged = Vec::new();
        self.comments.retain(|_, c| {
            let keep = !c.is_expired(now);
            if !keep {
                purged.push((c.thread_id, c.message_number));
            }
            keep
        });
        // Index entries go after the comments; a lookup in between finds no row.
        for key in &purged {
            self.numbers.remove(key);
        }
        report.comments = purged.len() as u64;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    fn manual_clock(start: DateTime<Utc>) -> (Clock, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(start));
        let handle = now.clone();
        (Arc::new(move || *handle.lock().unwrap()), now)
    }

    async fn seed(store: &MemoryStore) -> Thread {
        store
            .insert_thread(NewThread {
                text: "hello".to_string(),
                owner_id: "op".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn like_predicates_are_mutually_exclusive() {
        let store = MemoryStore::new();
        let thread = seed(&store).await;

        assert_eq!(store.remove_like(ItemKind::Thread, thread.id, "u1").await.unwrap(), None);
        assert_eq!(store.add_like(ItemKind::Thread, thread.id, "u1").await.unwrap(), Some(1));
        assert_eq!(store.add_like(ItemKind::Thread, thread.id, "u1").await.unwrap(), None);
        assert_eq!(store.remove_like(ItemKind::Thread, thread.id, "u1").await.unwrap(), Some(0));

        let stored = store.find_thread(thread.id).await.unwrap().unwrap();
        assert_eq!(stored.like_count, 0);
        assert!(stored.liked_by.is_empty());
    }

    #[tokio::test]
    async fn expired_rows_match_nothing() {
        let start = Utc::now();
        let (clock, now) = manual_clock(start);
        let store = MemoryStore::with_clock(clock);
        let thread = seed(&store).await;

        *now.lock().unwrap() = start + Duration::hours(24);

        assert!(store.find_thread(thread.id).await.unwrap().is_none());
        assert_eq!(store.add_like(ItemKind::Thread, thread.id, "u1").await.unwrap(), None);
        assert_eq!(store.add_click(thread.id, "u1").await.unwrap(), None);
        assert_eq!(store.increment_message_count(thread.id).await.unwrap(), None);
        assert!(store.live_threads().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn purge_removes_threads_and_their_comments() {
        let start = Utc::now();
        let (clock, now) = manual_clock(start);
        let store = MemoryStore::with_clock(clock);
        let old = seed(&store).await;
        store
            .insert_comment(NewComment {
                thread_id: old.id,
                message_number: 1,
                text: "c".to_string(),
                reply_to: None,
                is_op: false,
                thread_expires_at: old.expires_at,
            })
            .await
            .unwrap();

        *now.lock().unwrap() = start + Duration::hours(12);
        let fresh = seed(&store).await;

        *now.lock().unwrap() = start + Duration::hours(25);
        let report = store.purge_expired().await.unwrap();
        assert_eq!(report, PurgeReport { threads: 1, comments: 1 });
        assert!(store.find_thread(fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_comments_match_nothing() {
        use crate::engine::{counter, posting};

        let start = Utc::now();
        let (clock, now) = manual_clock(start);
        let store = MemoryStore::with_clock(clock);
        let thread = posting::create_thread(&store, "op", "t").await.unwrap();
        let comment = posting::create_comment(&store, "u1", thread.id, "c", None)
            .await
            .unwrap();
        counter::toggle_like(&store, ItemKind::Comment, comment.id, "u1")
            .await
            .unwrap();

        *now.lock().unwrap() = start + Duration::hours(24);

        assert!(store.find_comment(comment.id).await.unwrap().is_none());
        assert!(store.live_comments(thread.id).await.unwrap().is_empty());
        assert!(!store.comment_number_exists(thread.id, 1).await.unwrap());
        assert_eq!(store.add_like(ItemKind::Comment, comment.id, "u2").await.unwrap(), None);
        assert_eq!(store.remove_like(ItemKind::Comment, comment.id, "u1").await.unwrap(), None);
        assert!(!store.append_files(ItemKind::Comment, comment.id, &["f".to_string()]).await.unwrap());

        let err = counter::toggle_like(&store, ItemKind::Comment, comment.id, "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = posting::create_comment(&store, "u2", thread.id, "late", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn number_index_follows_inserts_and_purges() {
        let start = Utc::now();
        let (clock, now) = manual_clock(start);
        let store = MemoryStore::with_clock(clock);
        let a = seed(&store).await;
        let b = seed(&store).await;
        let comment = |thread: &Thread, message_number| NewComment {
            thread_id: thread.id,
            message_number,
            text: "c".to_string(),
            reply_to: None,
            is_op: false,
            thread_expires_at: thread.expires_at,
        };

        let first = store.insert_comment(comment(&a, 1)).await.unwrap();
        store.insert_comment(comment(&b, 1)).await.unwrap();
        store.insert_comment(comment(&a, 2)).await.unwrap();

        assert!(store.comment_number_exists(a.id, 2).await.unwrap());
        assert!(!store.comment_number_exists(b.id, 2).await.unwrap());

        store.increment_reply_count(a.id, 1).await.unwrap();
        assert_eq!(store.find_comment(first.id).await.unwrap().unwrap().reply_count, 1);

        *now.lock().unwrap() = start + Duration::hours(25);
        let report = store.purge_expired().await.unwrap();
        assert_eq!(report, PurgeReport { threads: 2, comments: 3 });
        assert!(store.numbers.is_empty());
    }

    #[tokio::test]
    async fn duplicate_message_number_is_a_conflict() {
        let store = MemoryStore::new();
        let thread = seed(&store).await;
        let new = NewComment {
            thread_id: thread.id,
            message_number: 1,
            text: "c".to_string(),
            reply_to: None,
            is_op: false,
            thread_expires_at: thread.expires_at,
        };
        store.insert_comment(new.clone()).await.unwrap();
        let err = store.insert_comment(new).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
