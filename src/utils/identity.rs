// src/utils/identity.rs

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{config::Config, models::user::UserToken};

/// Name of the cookie carrying the anonymous token.
pub const COOKIE_NAME: &str = "userId";

/// Thirty days.
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

const MAX_TOKEN_LEN: usize = 128;

fn is_valid_token(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_TOKEN_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reads the anonymous token from the `Cookie` headers, if a usable one is present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| is_valid_token(value))
}

/// Builds the `Set-Cookie` value for a freshly issued token.
pub fn issue_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly",
        COOKIE_NAME, token, COOKIE_MAX_AGE_SECS
    );
    // Browsers drop SameSite=None cookies that are not Secure.
    if secure {
        cookie.push_str("; SameSite=None; Secure");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    cookie
}

/// Axum Middleware: anonymous identity.
///
/// Resolves the `userId` cookie into a `UserToken` request extension. Clients
/// without a usable cookie get a new random token, returned via `Set-Cookie`
/// so it stays stable across their following requests.
pub async fn identity_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let (token, issued) = match token_from_headers(req.headers()) {
        Some(token) => (token, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    req.extensions_mut().insert(UserToken(token.clone()));
    let mut response = next.run(req).await;

    if issued {
        match HeaderValue::from_str(&issue_cookie(&token, config.cookie_secure)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Failed to encode identity cookie: {}", e),
        }
    }

    response
}
