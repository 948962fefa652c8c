use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::{MultipartForm, parse_id};
use crate::{
    engine::{attachments, counter, posting, ranking},
    error::AppError,
    models::{
        like::ItemKind,
        page::{COMMENT_PAGE_SIZE, CommentSort, ListParams, PageRequest},
        user::{UserToken, Viewer},
    },
    state::AppState,
    store::Store,
    utils::media::validate_uploads,
};

/// `replyTo` arrives as a form string; blank means absent.
fn parse_reply_to(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Validation("replyTo must be a message number".to_string())),
    }
}

/// Create a new comment from a multipart form
/// (`threadId`, `text`, optional `replyTo`, optional `files`).
pub async fn create_comment(
    State(state): State<AppState>,
    token: UserToken,
    form: MultipartForm,
) -> Result<impl IntoResponse, AppError> {
    validate_uploads(&form.uploads, state.config.max_upload_bytes)?;

    let thread_id = parse_id(form.text("threadId").unwrap_or_default())?;
    let reply_to = parse_reply_to(form.text("replyTo"))?;

    let comment = posting::create_comment(
        state.store.as_ref(),
        token.as_str(),
        thread_id,
        form.text("text").unwrap_or_default(),
        reply_to,
    )
    .await?;

    let files = attachments::attach(
        state.store.as_ref(),
        state.media.as_ref(),
        ItemKind::Comment,
        comment.id,
        form.uploads,
    )
    .await?;

    let mut view = comment.view(Some(token.as_str()));
    view.files = files;

    Ok((StatusCode::CREATED, Json(view)))
}

/// List comments of a thread: `sort` = new (default) | old | popular.
pub async fn list_comments(
    State(store): State<Arc<dyn Store>>,
    viewer: Viewer,
    Path(thread_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let thread_id = parse_id(&thread_id)?;

    let page = ranking::thread_comments(
        store.as_ref(),
        thread_id,
        CommentSort::parse(params.sort.as_deref()),
        PageRequest::from_params(&params, COMMENT_PAGE_SIZE),
        viewer.token(),
    )
    .await?;

    Ok(Json(page))
}

/// Toggle Like on a comment.
pub async fn toggle_like(
    State(store): State<Arc<dyn Store>>,
    token: UserToken,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let info = counter::toggle_like(store.as_ref(), ItemKind::Comment, id, token.as_str()).await?;
    Ok(Json(info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_to_parsing() {
        assert_eq!(parse_reply_to(None).unwrap(), None);
        assert_eq!(parse_reply_to(Some("  ")).unwrap(), None);
        assert_eq!(parse_reply_to(Some("3")).unwrap(), Some(3));
        assert!(parse_reply_to(Some("three")).is_err());
    }
}
