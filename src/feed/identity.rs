use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::{self, TokenKeys};
use crate::db::{self, Database, UserSummary};
use crate::error::{FeedError, FeedResult};

/// The authenticated user a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: i64,
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued token and the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserSummary,
}

/// Create an account and sign the new user in.
pub async fn register(db: &Database, keys: &TokenKeys, form: NewUser) -> FeedResult<AuthSession> {
    auth::validate_registration(&form.first_name, &form.last_name, &form.email, &form.password)?;

    let email = auth::normalize_email(&form.email);
    let password = form.password;
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .context("Password hashing task failed")??;

    let mut tx = db.begin().await?;
    let user_id = db::insert_user(
        &mut *tx,
        form.first_name.trim(),
        form.last_name.trim(),
        &email,
        &password_hash,
    )
    .await?
    .ok_or(FeedError::Conflict)?;

    let user = db::get_user_by_id(&mut *tx, user_id)
        .await?
        .ok_or_else(|| anyhow!("user {user_id} missing after insert"))?;
    tx.commit().await?;

    let token = keys.issue(user.id, &user.email)?;
    info!(user_id = user.id, "User registered");

    Ok(AuthSession {
        token,
        user: UserSummary::from(&user),
    })
}

/// Exchange credentials for a token. Unknown emails and wrong passwords
/// produce the same error.
pub async fn authenticate(
    db: &Database,
    keys: &TokenKeys,
    email: &str,
    password: &str,
) -> FeedResult<AuthSession> {
    auth::validate_login(email, password)?;

    let email = auth::normalize_email(email);
    let Some(user) = db::get_active_user_by_email(db.pool(), &email).await? else {
        debug!("Login attempt for unknown email");
        return Err(FeedError::InvalidCredentials);
    };

    let password = password.to_string();
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored_hash))
        .await
        .context("Password verification task failed")??;

    if !matches {
        debug!(user_id = user.id, "Login attempt with wrong password");
        return Err(FeedError::InvalidCredentials);
    }

    let token = keys.issue(user.id, &user.email)?;
    info!(user_id = user.id, "User logged in");

    Ok(AuthSession {
        token,
        user: UserSummary::from(&user),
    })
}

/// Resolve a bearer token to a viewer. Tokens of soft-deleted users are
/// rejected even if their signature is still valid.
pub async fn verify(db: &Database, keys: &TokenKeys, token: &str) -> FeedResult<Viewer> {
    let claims = keys.verify(token)?;
    let user_id = claims
        .user_id()
        .ok_or(FeedError::Unauthorized("Invalid or expired token"))?;

    match db::get_active_user(db.pool(), user_id).await? {
        Some(user) => Ok(Viewer { id: user.id }),
        None => Err(FeedError::Unauthorized("Invalid or expired token")),
    }
}

pub async fn me(db: &Database, viewer: Viewer) -> FeedResult<UserSummary> {
    db::get_active_user(db.pool(), viewer.id)
        .await?
        .map(|user| UserSummary::from(&user))
        .ok_or(FeedError::NotFound("User"))
}
