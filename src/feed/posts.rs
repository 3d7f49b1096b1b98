use anyhow::anyhow;
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::info;

use super::aggregate::{self, PostView};
use super::ledger::{self, LikeState, Toggle};
use super::{Page, PageRequest, Viewer};
use crate::auth::require_content;
use crate::db::{self, Database, PostRow, TargetKind, UserSummary};
use crate::error::{FeedError, FeedResult};

/// Body of a new post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewPost {
    pub content: String,
    pub image_url: Option<String>,
    pub is_private: bool,
}

/// Partial update. Absent or blank content and absent privacy are left as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostChanges {
    pub content: Option<String>,
    pub is_private: Option<bool>,
}

/// Load a live post the viewer may see.
pub(crate) async fn visible_post(
    conn: &mut SqliteConnection,
    viewer: Viewer,
    post_id: i64,
) -> FeedResult<PostRow> {
    match db::get_post(conn, post_id).await? {
        Some(post) if post.is_deleted() => Err(FeedError::NotFound("Post")),
        Some(post) if !post.is_visible_to(viewer.id) => Err(FeedError::Forbidden(
            "You don't have permission to view this post",
        )),
        Some(post) => Ok(post),
        None => Err(FeedError::NotFound("Post")),
    }
}

/// Check that a post's thread is open to the viewer. Unlike [`visible_post`]
/// a deleted post passes, so its comments stay addressable, but privacy
/// still applies.
pub(crate) async fn thread_visible(
    conn: &mut SqliteConnection,
    viewer: Viewer,
    post_id: i64,
) -> FeedResult<()> {
    match db::get_post(conn, post_id).await? {
        Some(post) if post.is_visible_to(viewer.id) => Ok(()),
        Some(_) => Err(FeedError::Forbidden(
            "You don't have permission to view this post",
        )),
        None => Err(FeedError::NotFound("Post")),
    }
}

/// Explain why an owner-guarded write on a post matched nothing.
async fn owned_post_miss(
    conn: &mut SqliteConnection,
    post_id: i64,
    forbidden: &'static str,
) -> FeedError {
    match db::get_post(conn, post_id).await {
        Ok(Some(post)) if !post.is_deleted() => FeedError::Forbidden(forbidden),
        Ok(_) => FeedError::NotFound("Post"),
        Err(e) => e.into(),
    }
}

async fn read_back(conn: &mut SqliteConnection, viewer: Viewer, post_id: i64) -> FeedResult<PostView> {
    let row = db::get_post(&mut *conn, post_id)
        .await?
        .ok_or_else(|| anyhow!("post {post_id} missing after write"))?;

    aggregate::post_views(conn, Some(viewer.id), vec![row])
        .await?
        .pop()
        .ok_or_else(|| anyhow!("post {post_id} dropped from view batch").into())
}

pub async fn create_post(db: &Database, viewer: Viewer, post: NewPost) -> FeedResult<PostView> {
    let content = require_content(&post.content)?;
    let image_url = post
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    let mut tx = db.begin().await?;
    let post_id = db::insert_post(&mut *tx, viewer.id, content, image_url, post.is_private).await?;
    let view = read_back(&mut tx, viewer, post_id).await?;
    tx.commit().await?;

    info!(user_id = viewer.id, post_id, is_private = post.is_private, "Post created");
    Ok(view)
}

pub async fn get_post(db: &Database, viewer: Viewer, post_id: i64) -> FeedResult<PostView> {
    let mut conn = db.pool().acquire().await?;
    let post = visible_post(&mut conn, viewer, post_id).await?;

    aggregate::post_views(&mut conn, Some(viewer.id), vec![post])
        .await?
        .pop()
        .ok_or_else(|| anyhow!("post {post_id} dropped from view batch").into())
}

/// Live posts that are public or owned by the viewer, newest first.
pub async fn list_posts(db: &Database, viewer: Viewer, request: PageRequest) -> FeedResult<Page<PostView>> {
    let mut tx = db.begin().await?;

    let total = db::count_visible_posts(&mut *tx, viewer.id).await?;
    let rows = db::list_visible_posts(
        &mut *tx,
        viewer.id,
        i64::from(request.limit),
        request.offset(),
    )
    .await?;
    let items = aggregate::post_views(&mut tx, Some(viewer.id), rows).await?;
    tx.commit().await?;

    Ok(Page::new(items, request, total))
}

pub async fn update_post(
    db: &Database,
    viewer: Viewer,
    post_id: i64,
    changes: PostChanges,
) -> FeedResult<PostView> {
    let content = changes
        .content
        .as_deref()
        .map(str::trim)
        .filter(|content| !content.is_empty());

    let mut tx = db.begin().await?;
    let updated =
        db::update_owned_post(&mut *tx, post_id, viewer.id, content, changes.is_private).await?;
    if updated == 0 {
        return Err(owned_post_miss(&mut tx, post_id, "You can only update your own posts").await);
    }
    let view = read_back(&mut tx, viewer, post_id).await?;
    tx.commit().await?;

    info!(user_id = viewer.id, post_id, "Post updated");
    Ok(view)
}

/// Soft delete. Comments and likes on the post are kept.
pub async fn delete_post(db: &Database, viewer: Viewer, post_id: i64) -> FeedResult<()> {
    let mut tx = db.begin().await?;
    if db::soft_delete_owned_post(&mut *tx, post_id, viewer.id).await? == 0 {
        return Err(owned_post_miss(&mut tx, post_id, "You can only delete your own posts").await);
    }
    tx.commit().await?;

    info!(user_id = viewer.id, post_id, "Post deleted");
    Ok(())
}

pub async fn toggle_post_like(db: &Database, viewer: Viewer, post_id: i64) -> FeedResult<LikeState> {
    let mut toggle = Toggle::begin(db, viewer, TargetKind::Post, post_id).await?;
    visible_post(toggle.conn(), viewer, post_id).await?;
    toggle.finish().await
}

pub async fn list_post_likers(
    db: &Database,
    viewer: Viewer,
    post_id: i64,
) -> FeedResult<Vec<UserSummary>> {
    let mut conn = db.pool().acquire().await?;
    visible_post(&mut conn, viewer, post_id).await?;
    Ok(ledger::list_likers(&mut conn, TargetKind::Post, post_id).await?)
}
