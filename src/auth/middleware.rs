use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::TokenKeys;
use crate::db::Database;
use crate::error::FeedError;
use crate::feed::{identity, Viewer};

/// Authenticated viewer (required).
/// Rejects with 401 `unauthorized` when the bearer token is missing, malformed,
/// expired or belongs to a deleted user.
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub Viewer);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
    Database: FromRef<S>,
    Arc<TokenKeys>: FromRef<S>,
{
    type Rejection = FeedError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = Database::from_ref(state);
        let keys = Arc::<TokenKeys>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(FeedError::Unauthorized("Authorization header required"))?;

        let token = bearer_token(header.to_str().unwrap_or_default())
            .ok_or(FeedError::Unauthorized("Invalid authorization header format"))?;

        let viewer = identity::verify(&db, &keys, token).await?;
        Ok(RequireUser(viewer))
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
