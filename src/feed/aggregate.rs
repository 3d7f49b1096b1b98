//! Derived counts and per-viewer state.
//!
//! Nothing here is stored: every view is assembled from the ledger and the
//! comment tree at read time, one grouped query per metric for the whole batch.
//! Callers pass the connection that performed any preceding write so the
//! counts observe it.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::db::{self, CommentRow, PostRow, TargetKind, UserSummary};

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_private: bool,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
    pub likes_count: i64,
    /// Live top-level comments only.
    pub comments_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: UserSummary,
    pub likes_count: i64,
    pub replies_count: i64,
    pub is_liked: bool,
}

/// Decorate posts with like/comment counts and the viewer's like flag.
/// Order is preserved. With no viewer, `is_liked` is false everywhere.
pub async fn post_views(
    conn: &mut SqliteConnection,
    viewer: Option<i64>,
    rows: Vec<PostRow>,
) -> Result<Vec<PostView>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let likes = db::like_counts(&mut *conn, TargetKind::Post, &ids).await?;
    let comments = db::top_level_comment_counts(&mut *conn, &ids).await?;
    let liked = match viewer {
        Some(user_id) => db::liked_target_ids(&mut *conn, user_id, TargetKind::Post, &ids).await?,
        None => Default::default(),
    };

    Ok(rows
        .into_iter()
        .map(|row| PostView {
            user: row.author(),
            likes_count: likes.get(&row.id).copied().unwrap_or(0),
            comments_count: comments.get(&row.id).copied().unwrap_or(0),
            is_liked: liked.contains(&row.id),
            id: row.id,
            content: row.content,
            image_url: row.image_url,
            is_private: row.is_private,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

/// Decorate comments with like/reply counts and the viewer's like flag.
pub async fn comment_views(
    conn: &mut SqliteConnection,
    viewer: Option<i64>,
    rows: Vec<CommentRow>,
) -> Result<Vec<CommentView>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let likes = db::like_counts(&mut *conn, TargetKind::Comment, &ids).await?;
    // Replies cannot have replies, so only top-level rows need counting
    let parent_ids: Vec<i64> = rows
        .iter()
        .filter(|row| !row.is_reply())
        .map(|row| row.id)
        .collect();
    let replies = db::reply_counts(&mut *conn, &parent_ids).await?;
    let liked = match viewer {
        Some(user_id) => {
            db::liked_target_ids(&mut *conn, user_id, TargetKind::Comment, &ids).await?
        }
        None => Default::default(),
    };

    Ok(rows
        .into_iter()
        .map(|row| CommentView {
            user: row.author(),
            likes_count: likes.get(&row.id).copied().unwrap_or(0),
            replies_count: replies.get(&row.id).copied().unwrap_or(0),
            is_liked: liked.contains(&row.id),
            id: row.id,
            post_id: row.post_id,
            parent_comment_id: row.parent_comment_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}
