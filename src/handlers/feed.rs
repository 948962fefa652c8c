use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    engine::ranking,
    error::AppError,
    models::{
        page::{FEED_PAGE_SIZE, FeedSort, ListParams, PageRequest},
        user::Viewer,
    },
    store::Store,
};

/// Ranked thread feed: `sort` = new (default) | old | hot.
pub async fn get_feed(
    State(store): State<Arc<dyn Store>>,
    viewer: Viewer,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = ranking::feed(
        store.as_ref(),
        FeedSort::parse(params.sort.as_deref()),
        PageRequest::from_params(&params, FEED_PAGE_SIZE),
        viewer.token(),
    )
    .await?;

    Ok(Json(page))
}
