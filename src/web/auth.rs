use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;

use super::response::{success, ApiJson};
use super::AppState;
use crate::auth::RequireUser;
use crate::error::FeedResult;
use crate::feed::{identity, NewUser};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<NewUser>,
) -> FeedResult<Response> {
    let session = identity::register(&state.db, &state.keys, form).await?;
    Ok(success(session, "User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> FeedResult<Response> {
    let session = identity::authenticate(&state.db, &state.keys, &form.email, &form.password).await?;
    Ok(success(session, "Login successful"))
}

pub async fn me(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
) -> FeedResult<Response> {
    let user = identity::me(&state.db, viewer).await?;
    Ok(success(user, "User retrieved successfully"))
}
