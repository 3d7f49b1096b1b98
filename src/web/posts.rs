use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::response::{paginated, success, success_message, ApiJson, IdPath};
use super::AppState;
use crate::auth::RequireUser;
use crate::error::FeedResult;
use crate::feed::{comments, posts, NewPost, PageRequest, PostChanges};

/// `?page&limit`. Unparseable values fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        let parse = |value: &Option<String>| value.as_deref().and_then(|v| v.trim().parse().ok());
        PageRequest::new(parse(&self.page), parse(&self.limit))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentRequest {
    pub content: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    ApiJson(post): ApiJson<NewPost>,
) -> FeedResult<Response> {
    let view = posts::create_post(&state.db, viewer, post).await?;
    Ok(success(view, "Post created successfully"))
}

pub async fn list_posts(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Query(query): Query<PageQuery>,
) -> FeedResult<Response> {
    let page = posts::list_posts(&state.db, viewer, query.request()).await?;
    Ok(paginated(page))
}

pub async fn get_post(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let view = posts::get_post(&state.db, viewer, id).await?;
    Ok(success(view, "Post retrieved successfully"))
}

pub async fn update_post(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
    ApiJson(changes): ApiJson<PostChanges>,
) -> FeedResult<Response> {
    let view = posts::update_post(&state.db, viewer, id, changes).await?;
    Ok(success(view, "Post updated successfully"))
}

pub async fn delete_post(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    posts::delete_post(&state.db, viewer, id).await?;
    Ok(success_message("Post deleted successfully"))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let like = posts::toggle_post_like(&state.db, viewer, id).await?;
    let message = if like.liked { "Post liked" } else { "Post unliked" };
    Ok(success(like, message))
}

pub async fn list_likers(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let users = posts::list_post_likers(&state.db, viewer, id).await?;
    let message = format!("{} users liked this post", users.len());
    Ok(success(users, message))
}

pub async fn create_comment(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
    ApiJson(body): ApiJson<CommentRequest>,
) -> FeedResult<Response> {
    let view = comments::create_comment(&state.db, viewer, id, &body.content).await?;
    Ok(success(view, "Comment created successfully"))
}

pub async fn list_comments(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    IdPath(id): IdPath,
) -> FeedResult<Response> {
    let views = comments::list_comments(&state.db, viewer, id).await?;
    let message = format!("{} comments found", views.len());
    Ok(success(views, message))
}
