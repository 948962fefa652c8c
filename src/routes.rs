// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{comment, feed, thread, user},
    state::AppState,
    utils::{identity::identity_middleware, media::MAX_FILES_PER_REQUEST},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (thread, comment, feed, user).
/// * Resolves the anonymous identity cookie on every API request.
/// * Serves stored uploads under `/uploads`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Credentialed requests are required for the identity cookie.
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    // Room for a full set of maximum-size files plus the text fields.
    let body_limit = state.config.max_upload_bytes * MAX_FILES_PER_REQUEST + 1024 * 1024;

    let thread_routes = Router::new()
        .route("/", post(thread::create_thread))
        .route("/{id}", get(thread::get_thread))
        .route("/{id}/isop", get(thread::is_op))
        .route("/{id}/like", patch(thread::toggle_like));

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route("/{id}", get(comment::list_comments))
        .route("/{id}/like", patch(comment::toggle_like));

    let feed_routes = Router::new().route("/", get(feed::get_feed));

    let user_routes = Router::new().route("/liked-threads", get(user::liked_threads));

    let api = Router::new()
        .nest("/thread", thread_routes)
        .nest("/comment", comment_routes)
        .nest("/feed", feed_routes)
        .nest("/user", user_routes)
        .layer(middleware::from_fn_with_state(state.clone(), identity_middleware))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
