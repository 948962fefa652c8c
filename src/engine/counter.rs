//! Like toggling and view counting.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::like::{ItemKind, LikeInfo},
    store::Store,
};

fn require_token(token: &str) -> Result<(), AppError> {
    if token.is_empty() {
        return Err(AppError::Unauthenticated("Authentication required".to_string()));
    }
    Ok(())
}

fn not_found(kind: ItemKind) -> AppError {
    match kind {
        ItemKind::Thread => AppError::thread_not_found(),
        ItemKind::Comment => AppError::comment_not_found(),
    }
}

/// Flips `token`'s like on an item.
///
/// The "like" predicate (token absent) is tried first and the "unlike"
/// predicate (token present) second. At most one can match; if neither does
/// the item does not exist.
pub async fn toggle_like(
    store: &dyn Store,
    kind: ItemKind,
    id: Uuid,
    token: &str,
) -> Result<LikeInfo, AppError> {
    require_token(token)?;

    if let Some(like_count) = store.add_like(kind, id, token).await? {
        tracing::debug!(kind = kind.as_str(), %id, like_count, "liked");
        return Ok(LikeInfo {
            like_count,
            is_liked: true,
        });
    }

    if let Some(like_count) = store.remove_like(kind, id, token).await? {
        tracing::debug!(kind = kind.as_str(), %id, like_count, "unliked");
        return Ok(LikeInfo {
            like_count,
            is_liked: false,
        });
    }

    Err(not_found(kind))
}

/// Records a view of a thread. Repeated views by one token are no-ops.
///
/// Returns whether this call counted a new view.
pub async fn click_thread(store: &dyn Store, thread_id: Uuid, token: &str) -> Result<bool, AppError> {
    require_token(token)?;

    if let Some(clicks) = store.add_click(thread_id, token).await? {
        tracing::debug!(%thread_id, clicks, "view counted");
        return Ok(true);
    }

    match store.find_thread(thread_id).await? {
        Some(_) => Ok(false),
        None => Err(AppError::thread_not_found()),
    }
}
