use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::{engine::ranking, error::AppError, models::user::UserToken, store::Store};

/// Threads the caller has liked, newest first.
pub async fn liked_threads(
    State(store): State<Arc<dyn Store>>,
    token: UserToken,
) -> Result<impl IntoResponse, AppError> {
    let threads = ranking::liked_threads(store.as_ref(), token.as_str()).await?;
    Ok(Json(threads))
}
