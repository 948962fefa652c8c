//! Thread and comment creation.

use uuid::Uuid;
use validator::Validate;

use super::{expiry, numbering};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, CreateCommentRequest, NewComment},
        thread::{CreateThreadRequest, NewThread, Thread},
    },
    store::Store,
    utils::text::normalize_text,
};

pub async fn create_thread(store: &dyn Store, owner: &str, text: &str) -> Result<Thread, AppError> {
    if owner.is_empty() {
        return Err(AppError::Unauthenticated("Authentication required".to_string()));
    }

    let request = CreateThreadRequest {
        text: normalize_text(text),
    };
    request.validate()?;

    let thread = store
        .insert_thread(NewThread {
            text: request.text,
            owner_id: owner.to_string(),
        })
        .await?;

    tracing::info!(thread_id = %thread.id, "thread created");
    Ok(thread)
}

/// Creates a comment under a live thread.
///
/// Validation happens before any write. The message number is allocated
/// after the reply target has been checked, so a rejected request never
/// consumes a number.
pub async fn create_comment(
    store: &dyn Store,
    owner: &str,
    thread_id: Uuid,
    text: &str,
    reply_to: Option<i64>,
) -> Result<Comment, AppError> {
    if owner.is_empty() {
        return Err(AppError::Unauthenticated("Authentication required".to_string()));
    }

    let request = CreateCommentRequest {
        thread_id,
        text: normalize_text(text),
        reply_to: reply_to.filter(|n| *n != 0),
    };
    request.validate()?;

    let thread = store
        .find_thread(request.thread_id)
        .await?
        .ok_or_else(AppError::thread_not_found)?;

    if let Some(target) = request.reply_to {
        if !store.comment_number_exists(thread.id, target).await? {
            return Err(AppError::Validation(format!(
                "No comment found with message number {} to reply to",
                target
            )));
        }
    }

    let message_number = numbering::next_message_number(store, thread.id).await?;

    let comment = store
        .insert_comment(NewComment {
            thread_id: thread.id,
            message_number,
            text: request.text,
            reply_to: request.reply_to,
            is_op: thread.owner_id == owner,
            thread_expires_at: expiry::expires_at(thread.created_at),
        })
        .await?;

    if let Some(target) = comment.reply_to {
        store.increment_reply_count(thread.id, target).await?;
    }

    tracing::info!(
        thread_id = %thread.id,
        message_number,
        "comment created"
    );
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::like::ItemKind,
        store::{MemoryStore, PurgeReport},
    };
    use std::{collections::HashSet, sync::Arc};

    #[tokio::test]
    async fn numbering_and_reply_counts_follow_creation_order() {
        let store = MemoryStore::new();
        let thread = create_thread(&store, "op", "  Hello   World!  ").await.unwrap();
        assert_eq!(thread.text, "Hello World!");

        let first = create_comment(&store, "u1", thread.id, "first", None).await.unwrap();
        assert_eq!(first.message_number, 1);
        assert_eq!(first.reply_to, None);

        let second = create_comment(&store, "u2", thread.id, "second", Some(1)).await.unwrap();
        assert_eq!(second.message_number, 2);
        assert_eq!(second.reply_to, Some(1));

        let first = store.find_comment(first.id).await.unwrap().unwrap();
        assert_eq!(first.reply_count, 1);
        let thread = store.find_thread(thread.id).await.unwrap().unwrap();
        assert_eq!(thread.message_count, 2);
    }

    #[tokio::test]
    async fn reply_to_zero_means_no_reply() {
        let store = MemoryStore::new();
        let thread = create_thread(&store, "op", "t").await.unwrap();
        let c = create_comment(&store, "u1", thread.id, "c", Some(0)).await.unwrap();
        assert_eq!(c.reply_to, None);
    }

    #[tokio::test]
    async fn is_op_is_fixed_from_the_thread_owner() {
        let store = MemoryStore::new();
        let thread = create_thread(&store, "op", "t").await.unwrap();
        assert!(create_comment(&store, "op", thread.id, "mine", None).await.unwrap().is_op);
        assert!(!create_comment(&store, "u1", thread.id, "theirs", None).await.unwrap().is_op);
    }

    #[tokio::test]
    async fn comment_expiry_is_copied_from_the_thread() {
        let store = MemoryStore::new();
        let thread = create_thread(&store, "op", "t").await.unwrap();
        let c = create_comment(&store, "u1", thread.id, "c", None).await.unwrap();
        assert_eq!(c.thread_expires_at, thread.expires_at);
    }

    #[tokio::test]
    async fn invalid_input_mutates_nothing() {
        let store = MemoryStore::new();
        assert!(matches!(
            create_thread(&store, "op", "   \n ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_thread(&store, "op", &"x".repeat(501)).await,
            Err(AppError::Validation(_))
        ));
        assert!(create_thread(&store, "op", &"x".repeat(500)).await.is_ok());

        let thread = create_thread(&store, "op", "t").await.unwrap();
        assert!(matches!(
            create_comment(&store, "u1", thread.id, "dangling", Some(7)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create_comment(&store, "u1", thread.id, "", None).await,
            Err(AppError::Validation(_))
        ));
        let thread = store.find_thread(thread.id).await.unwrap().unwrap();
        assert_eq!(thread.message_count, 0);
    }

    #[tokio::test]
    async fn commenting_on_a_missing_thread_is_not_found() {
        let store = MemoryStore::new();
        let err = create_comment(&store, "u1", Uuid::new_v4(), "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_comments_receive_unique_numbers() {
        let store = Arc::new(MemoryStore::new());
        let thread_id = create_thread(store.as_ref(), "op", "t").await.unwrap().id;

        let handles: Vec<_> = (0..30)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    create_comment(store.as_ref(), &format!("u{i}"), thread_id, "hi", None).await
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        for handle in handles {
            let comment = handle.await.unwrap().unwrap();
            assert!(numbers.insert(comment.message_number));
        }
        assert_eq!(numbers.len(), 30);
    }

    /// Delegates to a `MemoryStore` but fails the first comment insert.
    struct FailFirstInsert {
        inner: MemoryStore,
        failed: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl Store for FailFirstInsert {
        async fn insert_thread(&self, new: NewThread) -> Result<Thread, AppError> {
            self.inner.insert_thread(new).await
        }
        async fn find_thread(&self, id: Uuid) -> Result<Option<Thread>, AppError> {
            self.inner.find_thread(id).await
        }
        async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
            self.inner.find_comment(id).await
        }
        async fn append_files(&self, kind: ItemKind, id: Uuid, urls: &[String]) -> Result<bool, AppError> {
            self.inner.append_files(kind, id, urls).await
        }
        async fn add_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
            self.inner.add_like(kind, id, token).await
        }
        async fn remove_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
            self.inner.remove_like(kind, id, token).await
        }
        async fn add_click(&self, thread_id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
            self.inner.add_click(thread_id, token).await
        }
        async fn increment_message_count(&self, thread_id: Uuid) -> Result<Option<i64>, AppError> {
            self.inner.increment_message_count(thread_id).await
        }
        async fn insert_comment(&self, new: NewComment) -> Result<Comment, AppError> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(AppError::InternalServerError("connection lost".to_string()));
            }
            self.inner.insert_comment(new).await
        }
        async fn comment_number_exists(&self, thread_id: Uuid, message_number: i64) -> Result<bool, AppError> {
            self.inner.comment_number_exists(thread_id, message_number).await
        }
        async fn increment_reply_count(&self, thread_id: Uuid, message_number: i64) -> Result<(), AppError> {
            self.inner.increment_reply_count(thread_id, message_number).await
        }
        async fn live_threads(&self) -> Result<Vec<Thread>, AppError> {
            self.inner.live_threads().await
        }
        async fn live_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>, AppError> {
            self.inner.live_comments(thread_id).await
        }
        async fn threads_liked_by(&self, token: &str) -> Result<Vec<Thread>, AppError> {
            self.inner.threads_liked_by(token).await
        }
        async fn purge_expired(&self) -> Result<PurgeReport, AppError> {
            self.inner.purge_expired().await
        }
    }

    #[tokio::test]
    async fn a_failed_insert_consumes_its_number() {
        let store = FailFirstInsert {
            inner: MemoryStore::new(),
            failed: std::sync::atomic::AtomicBool::new(false),
        };
        let thread = create_thread(&store, "op", "t").await.unwrap();

        let err = create_comment(&store, "u1", thread.id, "lost", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));

        let next = create_comment(&store, "u1", thread.id, "kept", None).await.unwrap();
        assert_eq!(next.message_number, 2);

        let thread = store.find_thread(thread.id).await.unwrap().unwrap();
        assert_eq!(thread.message_count, 2);
        assert!(!store.comment_number_exists(thread.id, 1).await.unwrap());
        let numbers: Vec<i64> = store
            .live_comments(thread.id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.message_number)
            .collect();
        assert_eq!(numbers, vec![2]);
    }
}
