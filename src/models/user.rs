// src/models/user.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::error::AppError;

/// Opaque anonymous identifier of one client.
///
/// Inserted into request extensions by the identity middleware; there are
/// no accounts behind it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserToken(pub String);

impl UserToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extracting a `UserToken` rejects with 401 when no token was resolved.
impl<S: Send + Sync> FromRequestParts<S> for UserToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserToken>()
            .filter(|token| !token.0.is_empty())
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))
    }
}

/// Optional token for read-only queries; an absent token is an anonymous viewer.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<UserToken>);

impl Viewer {
    pub fn token(&self) -> Option<&str> {
        self.0.as_ref().map(UserToken::as_str)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(
            parts
                .extensions
                .get::<UserToken>()
                .filter(|token| !token.0.is_empty())
                .cloned(),
        ))
    }
}
