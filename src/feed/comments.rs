//! Comments and one level of replies.
//!
//! A comment belongs to a post; a reply belongs to a top-level comment and
//! inherits its post. Replying to a reply is rejected. Children of a deleted
//! comment stay addressable by their own id, but the deleted parent can no
//! longer be listed or replied to. Every read or write through a comment id
//! applies the privacy of the comment's post.

use anyhow::anyhow;
use sqlx::SqliteConnection;
use tracing::info;

use super::aggregate::{self, CommentView};
use super::ledger::{self, LikeState, Toggle};
use super::posts::{thread_visible, visible_post};
use super::Viewer;
use crate::auth::require_content;
use crate::db::{self, CommentRow, Database, TargetKind, UserSummary};
use crate::error::{FeedError, FeedResult};

/// Load a comment that has not been deleted.
async fn live_comment(conn: &mut SqliteConnection, comment_id: i64) -> FeedResult<CommentRow> {
    db::get_comment(conn, comment_id)
        .await?
        .filter(|comment| !comment.is_deleted())
        .ok_or(FeedError::NotFound("Comment"))
}

/// Load a live comment whose post the viewer may see.
async fn visible_comment(
    conn: &mut SqliteConnection,
    viewer: Viewer,
    comment_id: i64,
) -> FeedResult<CommentRow> {
    let comment = live_comment(&mut *conn, comment_id).await?;
    thread_visible(conn, viewer, comment.post_id).await?;
    Ok(comment)
}

async fn read_back(
    conn: &mut SqliteConnection,
    viewer: Viewer,
    comment_id: i64,
) -> FeedResult<CommentView> {
    let row = db::get_comment(&mut *conn, comment_id)
        .await?
        .ok_or_else(|| anyhow!("comment {comment_id} missing after write"))?;

    aggregate::comment_views(conn, Some(viewer.id), vec![row])
        .await?
        .pop()
        .ok_or_else(|| anyhow!("comment {comment_id} dropped from view batch").into())
}

/// Add a top-level comment to a post the viewer can see.
pub async fn create_comment(
    db: &Database,
    viewer: Viewer,
    post_id: i64,
    content: &str,
) -> FeedResult<CommentView> {
    let content = require_content(content)?;

    let mut tx = db.begin().await?;
    let Some(comment_id) =
        db::insert_comment_on_visible_post(&mut *tx, post_id, viewer.id, content).await?
    else {
        visible_post(&mut tx, viewer, post_id).await?;
        return Err(anyhow!("comment insert on visible post {post_id} matched no row").into());
    };
    let view = read_back(&mut tx, viewer, comment_id).await?;
    tx.commit().await?;

    info!(user_id = viewer.id, post_id, comment_id, "Comment created");
    Ok(view)
}

/// Reply to a live top-level comment on a post the viewer can see.
pub async fn create_reply(
    db: &Database,
    viewer: Viewer,
    parent_id: i64,
    content: &str,
) -> FeedResult<CommentView> {
    let content = require_content(content)?;

    let mut tx = db.begin().await?;
    let Some(comment_id) = db::insert_reply(&mut *tx, parent_id, viewer.id, content).await? else {
        let parent = visible_comment(&mut tx, viewer, parent_id).await?;
        if parent.is_reply() {
            return Err(FeedError::validation("Cannot reply to a reply"));
        }
        return Err(anyhow!("reply insert under live comment {parent_id} matched no row").into());
    };
    let view = read_back(&mut tx, viewer, comment_id).await?;
    tx.commit().await?;

    info!(user_id = viewer.id, parent_id, comment_id, "Reply created");
    Ok(view)
}

/// Live top-level comments on a post, newest first.
pub async fn list_comments(
    db: &Database,
    viewer: Viewer,
    post_id: i64,
) -> FeedResult<Vec<CommentView>> {
    let mut tx = db.begin().await?;
    visible_post(&mut tx, viewer, post_id).await?;

    let rows = db::list_top_level_comments(&mut *tx, post_id).await?;
    let views = aggregate::comment_views(&mut tx, Some(viewer.id), rows).await?;
    tx.commit().await?;
    Ok(views)
}

/// Live replies to a comment, oldest first.
pub async fn list_replies(
    db: &Database,
    viewer: Viewer,
    comment_id: i64,
) -> FeedResult<Vec<CommentView>> {
    let mut tx = db.begin().await?;
    visible_comment(&mut tx, viewer, comment_id).await?;

    let rows = db::list_replies(&mut *tx, comment_id).await?;
    let views = aggregate::comment_views(&mut tx, Some(viewer.id), rows).await?;
    tx.commit().await?;
    Ok(views)
}

/// Soft delete. Only the author may delete; replies and likes are kept.
pub async fn delete_comment(db: &Database, viewer: Viewer, comment_id: i64) -> FeedResult<()> {
    let mut tx = db.begin().await?;
    if db::soft_delete_owned_comment(&mut *tx, comment_id, viewer.id).await? == 0 {
        live_comment(&mut tx, comment_id).await?;
        return Err(FeedError::Forbidden("You can only delete your own comments"));
    }
    tx.commit().await?;

    info!(user_id = viewer.id, comment_id, "Comment deleted");
    Ok(())
}

pub async fn toggle_comment_like(
    db: &Database,
    viewer: Viewer,
    comment_id: i64,
) -> FeedResult<LikeState> {
    let mut toggle = Toggle::begin(db, viewer, TargetKind::Comment, comment_id).await?;
    visible_comment(toggle.conn(), viewer, comment_id).await?;
    toggle.finish().await
}

pub async fn list_comment_likers(
    db: &Database,
    viewer: Viewer,
    comment_id: i64,
) -> FeedResult<Vec<UserSummary>> {
    let mut conn = db.pool().acquire().await?;
    visible_comment(&mut conn, viewer, comment_id).await?;
    Ok(ledger::list_likers(&mut conn, TargetKind::Comment, comment_id).await?)
}
