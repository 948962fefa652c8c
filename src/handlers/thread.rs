use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::{MultipartForm, parse_id};
use crate::{
    engine::{attachments, counter, posting},
    error::AppError,
    models::{like::ItemKind, thread::IsOpResponse, user::UserToken},
    state::AppState,
    store::Store,
    utils::media::validate_uploads,
};

/// Create a new thread from a multipart form (`text`, optional `files`).
///
/// The thread is stored before its files are uploaded; an upload failure
/// leaves the thread in place and returns 502.
pub async fn create_thread(
    State(state): State<AppState>,
    token: UserToken,
    form: MultipartForm,
) -> Result<impl IntoResponse, AppError> {
    validate_uploads(&form.uploads, state.config.max_upload_bytes)?;

    let thread = posting::create_thread(
        state.store.as_ref(),
        token.as_str(),
        form.text("text").unwrap_or_default(),
    )
    .await?;

    attachments::attach(
        state.store.as_ref(),
        state.media.as_ref(),
        ItemKind::Thread,
        thread.id,
        form.uploads,
    )
    .await?;

    let thread = state
        .store
        .find_thread(thread.id)
        .await?
        .ok_or_else(AppError::thread_not_found)?;

    Ok((StatusCode::CREATED, Json(thread.view(Some(token.as_str())))))
}

/// Get a single thread. Counts a view for the caller first.
pub async fn get_thread(
    State(store): State<Arc<dyn Store>>,
    token: UserToken,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    counter::click_thread(store.as_ref(), id, token.as_str()).await?;

    let thread = store
        .find_thread(id)
        .await?
        .ok_or_else(AppError::thread_not_found)?;

    Ok(Json(thread.view(Some(token.as_str()))))
}

/// Whether the caller created the thread.
pub async fn is_op(
    State(store): State<Arc<dyn Store>>,
    token: UserToken,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let thread = store
        .find_thread(id)
        .await?
        .ok_or_else(AppError::thread_not_found)?;

    Ok(Json(IsOpResponse {
        is_op: thread.owner_id == token.as_str(),
    }))
}

/// Toggle Like on a thread.
pub async fn toggle_like(
    State(store): State<Arc<dyn Store>>,
    token: UserToken,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let info = counter::toggle_like(store.as_ref(), ItemKind::Thread, id, token.as_str()).await?;
    Ok(Json(info))
}
