use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::upload::MULTIPART_OVERHEAD;
use super::{auth, comments, posts, upload, AppState};

/// Create the router with all API routes.
pub fn router(max_upload_size: usize) -> Router<AppState> {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Posts
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::toggle_like))
        .route("/posts/:id/likes", get(posts::list_likers))
        .route(
            "/posts/:id/comments",
            get(posts::list_comments).post(posts::create_comment),
        )
        // Comments
        .route(
            "/comments/:id/replies",
            get(comments::list_replies).post(comments::create_reply),
        )
        .route("/comments/:id", delete(comments::delete_comment))
        .route("/comments/:id/like", post(comments::toggle_like))
        .route("/comments/:id/likes", get(comments::list_likers))
        // Uploads
        .route(
            "/upload",
            post(upload::upload_image)
                .layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD)),
        );

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
