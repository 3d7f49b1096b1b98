use axum::extract::State;
use axum::response::Response;

use super::posts::CommentRequest;
use super::response::{success, success_message, ApiJson, IdPath};
use super::AppState;
use crate::auth::RequireUser;
use crate::error::FeedResult;
use crate::feed::comments;

pub async fn create_reply(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
    ApiJson(body): ApiJson<CommentRequest>,
) -> FeedResult<Response> {
    let view = comments::create_reply(&state.db, viewer, id, &body.content).await?;
    Ok(success(view, "Reply created successfully"))
}

pub async fn list_replies(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let views = comments::list_replies(&state.db, viewer, id).await?;
    let message = format!("{} replies found", views.len());
    Ok(success(views, message))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    comments::delete_comment(&state.db, viewer, id).await?;
    Ok(success_message("Comment deleted successfully"))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let like = comments::toggle_comment_like(&state.db, viewer, id).await?;
    let message = if like.liked { "Comment liked" } else { "Comment unliked" };
    Ok(success(like, message))
}

pub async fn list_likers(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let users = comments::list_comment_likers(&state.db, viewer, id).await?;
    let message = format!("{} users liked this comment", users.len());
    Ok(success(users, message))
}
