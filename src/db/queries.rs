use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use sqlx::SqliteExecutor;

use super::models::{CommentRow, PostRow, TargetKind, User, UserSummary};

/// Columns selected for a post joined with its author (`p` and `u` aliases).
const POST_SELECT: &str = r"
    SELECT
        p.id, p.user_id, p.content, p.image_url, p.is_private,
        p.created_at, p.updated_at, p.deleted_at,
        u.first_name AS author_first_name, u.last_name AS author_last_name,
        u.email AS author_email, u.created_at AS author_created_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
";

/// Columns selected for a comment joined with its author (`c` and `u` aliases).
const COMMENT_SELECT: &str = r"
    SELECT
        c.id, c.post_id, c.user_id, c.parent_comment_id, c.content,
        c.created_at, c.updated_at, c.deleted_at,
        u.first_name AS author_first_name, u.last_name AS author_last_name,
        u.email AS author_email, u.created_at AS author_created_at
    FROM comments c
    JOIN users u ON u.id = c.user_id
";

fn placeholders(n: usize) -> String {
    std::iter::repeat_n("?", n).collect::<Vec<_>>().join(",")
}

// ========== User Queries ==========

/// Insert a user. Returns `None` if the email is already registered.
pub async fn insert_user(
    executor: impl SqliteExecutor<'_>,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Option<i64>> {
    let result = sqlx::query(
        r"
        INSERT INTO users (first_name, last_name, email, password_hash)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(email) DO NOTHING
        ",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .execute(executor)
    .await
    .context("Failed to insert user")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

/// Get a user by id, including soft-deleted users.
pub async fn get_user_by_id(executor: impl SqliteExecutor<'_>, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch user by id")
}

/// Get a user that has not been soft-deleted.
pub async fn get_active_user(executor: impl SqliteExecutor<'_>, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ? AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch active user")
}

/// Get an active user by (already lower-cased) email.
pub async fn get_active_user_by_email(
    executor: impl SqliteExecutor<'_>,
    email: &str,
) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE email = ? AND deleted_at IS NULL")
        .bind(email)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch user by email")
}

/// Soft-delete a user. Their content keeps its author.
pub async fn soft_delete_user(executor: impl SqliteExecutor<'_>, id: i64) -> Result<u64> {
    let result = sqlx::query(
        r"
        UPDATE users
        SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND deleted_at IS NULL
        ",
    )
    .bind(id)
    .execute(executor)
    .await
    .context("Failed to soft-delete user")?;

    Ok(result.rows_affected())
}

// ========== Post Queries ==========

/// Insert a post and return its id.
pub async fn insert_post(
    executor: impl SqliteExecutor<'_>,
    user_id: i64,
    content: &str,
    image_url: Option<&str>,
    is_private: bool,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO posts (user_id, content, image_url, is_private)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(user_id)
    .bind(content)
    .bind(image_url)
    .bind(is_private)
    .execute(executor)
    .await
    .context("Failed to insert post")?;

    Ok(result.last_insert_rowid())
}

/// Get a post with its author, including soft-deleted posts.
pub async fn get_post(executor: impl SqliteExecutor<'_>, id: i64) -> Result<Option<PostRow>> {
    let query = format!("{POST_SELECT} WHERE p.id = ?");
    sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch post")
}

/// Count live posts visible to `viewer`.
pub async fn count_visible_posts(executor: impl SqliteExecutor<'_>, viewer: i64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r"
        SELECT COUNT(*) FROM posts
        WHERE deleted_at IS NULL AND (is_private = 0 OR user_id = ?)
        ",
    )
    .bind(viewer)
    .fetch_one(executor)
    .await
    .context("Failed to count visible posts")?;

    Ok(row.0)
}

/// Page of live posts visible to `viewer`, newest first.
pub async fn list_visible_posts(
    executor: impl SqliteExecutor<'_>,
    viewer: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostRow>> {
    let query = format!(
        r"
        {POST_SELECT}
        WHERE p.deleted_at IS NULL AND (p.is_private = 0 OR p.user_id = ?)
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT ? OFFSET ?
        "
    );
    sqlx::query_as(&query)
        .bind(viewer)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
        .context("Failed to list visible posts")
}

/// Apply a partial update to a live post owned by `owner`. `None` fields keep
/// their stored value. Returns 0 when no such post exists.
pub async fn update_owned_post(
    executor: impl SqliteExecutor<'_>,
    id: i64,
    owner: i64,
    content: Option<&str>,
    is_private: Option<bool>,
) -> Result<u64> {
    let result = sqlx::query(
        r"
        UPDATE posts
        SET content = COALESCE(?, content),
            is_private = COALESCE(?, is_private),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ? AND deleted_at IS NULL
        ",
    )
    .bind(content)
    .bind(is_private)
    .bind(id)
    .bind(owner)
    .execute(executor)
    .await
    .context("Failed to update post")?;

    Ok(result.rows_affected())
}

/// Soft-delete a live post owned by `owner`. Its comments and likes are left
/// in place.
pub async fn soft_delete_owned_post(
    executor: impl SqliteExecutor<'_>,
    id: i64,
    owner: i64,
) -> Result<u64> {
    let result = sqlx::query(
        r"
        UPDATE posts
        SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ? AND deleted_at IS NULL
        ",
    )
    .bind(id)
    .bind(owner)
    .execute(executor)
    .await
    .context("Failed to soft-delete post")?;

    Ok(result.rows_affected())
}

// ========== Comment Queries ==========

/// Insert a top-level comment if the post is live and visible to `user_id`.
/// Returns `None` when the guard fails.
pub async fn insert_comment_on_visible_post(
    executor: impl SqliteExecutor<'_>,
    post_id: i64,
    user_id: i64,
    content: &str,
) -> Result<Option<i64>> {
    let result = sqlx::query(
        r"
        INSERT INTO comments (post_id, user_id, content)
        SELECT p.id, ?, ?
        FROM posts p
        WHERE p.id = ? AND p.deleted_at IS NULL AND (p.is_private = 0 OR p.user_id = ?)
        ",
    )
    .bind(user_id)
    .bind(content)
    .bind(post_id)
    .bind(user_id)
    .execute(executor)
    .await
    .context("Failed to insert comment")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

/// Insert a reply under a live top-level comment, inheriting its post.
/// Returns `None` when the parent is missing, deleted or itself a reply, or
/// when its post is private to another user. A deleted post does not block
/// the reply.
pub async fn insert_reply(
    executor: impl SqliteExecutor<'_>,
    parent_comment_id: i64,
    user_id: i64,
    content: &str,
) -> Result<Option<i64>> {
    let result = sqlx::query(
        r"
        INSERT INTO comments (post_id, user_id, parent_comment_id, content)
        SELECT c.post_id, ?, c.id, ?
        FROM comments c
        JOIN posts p ON p.id = c.post_id
        WHERE c.id = ? AND c.deleted_at IS NULL AND c.parent_comment_id IS NULL
          AND (p.is_private = 0 OR p.user_id = ?)
        ",
    )
    .bind(user_id)
    .bind(content)
    .bind(parent_comment_id)
    .bind(user_id)
    .execute(executor)
    .await
    .context("Failed to insert reply")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

/// Get a comment with its author, including soft-deleted comments.
pub async fn get_comment(executor: impl SqliteExecutor<'_>, id: i64) -> Result<Option<CommentRow>> {
    let query = format!("{COMMENT_SELECT} WHERE c.id = ?");
    sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch comment")
}

/// Live top-level comments of a post, newest first.
pub async fn list_top_level_comments(
    executor: impl SqliteExecutor<'_>,
    post_id: i64,
) -> Result<Vec<CommentRow>> {
    let query = format!(
        r"
        {COMMENT_SELECT}
        WHERE c.post_id = ? AND c.parent_comment_id IS NULL AND c.deleted_at IS NULL
        ORDER BY c.created_at DESC, c.id DESC
        "
    );
    sqlx::query_as(&query)
        .bind(post_id)
        .fetch_all(executor)
        .await
        .context("Failed to list comments")
}

/// Live replies to a comment, oldest first.
pub async fn list_replies(
    executor: impl SqliteExecutor<'_>,
    parent_comment_id: i64,
) -> Result<Vec<CommentRow>> {
    let query = format!(
        r"
        {COMMENT_SELECT}
        WHERE c.parent_comment_id = ? AND c.deleted_at IS NULL
        ORDER BY c.created_at ASC, c.id ASC
        "
    );
    sqlx::query_as(&query)
        .bind(parent_comment_id)
        .fetch_all(executor)
        .await
        .context("Failed to list replies")
}

/// Soft-delete a live comment written by `author`. Its replies and likes are
/// left in place.
pub async fn soft_delete_owned_comment(
    executor: impl SqliteExecutor<'_>,
    id: i64,
    author: i64,
) -> Result<u64> {
    let result = sqlx::query(
        r"
        UPDATE comments
        SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ? AND deleted_at IS NULL
        ",
    )
    .bind(id)
    .bind(author)
    .execute(executor)
    .await
    .context("Failed to soft-delete comment")?;

    Ok(result.rows_affected())
}

// ========== Like Queries ==========

/// Remove a like. Returns the number of rows removed (0 or 1).
pub async fn delete_like(
    executor: impl SqliteExecutor<'_>,
    user_id: i64,
    kind: TargetKind,
    target_id: i64,
) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM likes WHERE user_id = ? AND likeable_type = ? AND likeable_id = ?",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(target_id)
    .execute(executor)
    .await
    .context("Failed to delete like")?;

    Ok(result.rows_affected())
}

/// Insert a like, ignoring a conflicting existing row.
pub async fn insert_like(
    executor: impl SqliteExecutor<'_>,
    user_id: i64,
    kind: TargetKind,
    target_id: i64,
) -> Result<u64> {
    let result = sqlx::query(
        r"
        INSERT INTO likes (user_id, likeable_type, likeable_id)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id, likeable_type, likeable_id) DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(target_id)
    .execute(executor)
    .await
    .context("Failed to insert like")?;

    Ok(result.rows_affected())
}

/// Number of likes on a single target.
pub async fn count_likes(
    executor: impl SqliteExecutor<'_>,
    kind: TargetKind,
    target_id: i64,
) -> Result<i64> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM likes WHERE likeable_type = ? AND likeable_id = ?")
            .bind(kind.as_str())
            .bind(target_id)
            .fetch_one(executor)
            .await
            .context("Failed to count likes")?;

    Ok(row.0)
}

/// Whether `user_id` has liked the target.
pub async fn has_liked(
    executor: impl SqliteExecutor<'_>,
    user_id: i64,
    kind: TargetKind,
    target_id: i64,
) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM likes WHERE user_id = ? AND likeable_type = ? AND likeable_id = ?",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(target_id)
    .fetch_optional(executor)
    .await
    .context("Failed to check like")?;

    Ok(row.is_some())
}

/// Users who liked the target, in the order the likes were made.
pub async fn list_likers(
    executor: impl SqliteExecutor<'_>,
    kind: TargetKind,
    target_id: i64,
) -> Result<Vec<UserSummary>> {
    sqlx::query_as(
        r"
        SELECT u.id, u.first_name, u.last_name, u.email, u.created_at
        FROM likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.likeable_type = ? AND l.likeable_id = ?
        ORDER BY l.id ASC
        ",
    )
    .bind(kind.as_str())
    .bind(target_id)
    .fetch_all(executor)
    .await
    .context("Failed to list likers")
}

// ========== Batch Aggregate Queries ==========

/// Like counts for many targets of one kind. Targets without likes are absent.
pub async fn like_counts(
    executor: impl SqliteExecutor<'_>,
    kind: TargetKind,
    target_ids: &[i64],
) -> Result<HashMap<i64, i64>> {
    if target_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = format!(
        r"
        SELECT likeable_id, COUNT(*) FROM likes
        WHERE likeable_type = ? AND likeable_id IN ({})
        GROUP BY likeable_id
        ",
        placeholders(target_ids.len())
    );

    let mut query = sqlx::query_as::<_, (i64, i64)>(&query).bind(kind.as_str());
    for id in target_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(executor)
        .await
        .context("Failed to fetch like counts")?;
    Ok(rows.into_iter().collect())
}

/// Subset of `target_ids` that `user_id` has liked.
pub async fn liked_target_ids(
    executor: impl SqliteExecutor<'_>,
    user_id: i64,
    kind: TargetKind,
    target_ids: &[i64],
) -> Result<HashSet<i64>> {
    if target_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let query = format!(
        r"
        SELECT likeable_id FROM likes
        WHERE user_id = ? AND likeable_type = ? AND likeable_id IN ({})
        ",
        placeholders(target_ids.len())
    );

    let mut query = sqlx::query_as::<_, (i64,)>(&query)
        .bind(user_id)
        .bind(kind.as_str());
    for id in target_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(executor)
        .await
        .context("Failed to fetch liked targets")?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Live top-level comment counts per post.
pub async fn top_level_comment_counts(
    executor: impl SqliteExecutor<'_>,
    post_ids: &[i64],
) -> Result<HashMap<i64, i64>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = format!(
        r"
        SELECT post_id, COUNT(*) FROM comments
        WHERE parent_comment_id IS NULL AND deleted_at IS NULL AND post_id IN ({})
        GROUP BY post_id
        ",
        placeholders(post_ids.len())
    );

    let mut query = sqlx::query_as::<_, (i64, i64)>(&query);
    for id in post_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(executor)
        .await
        .context("Failed to fetch comment counts")?;
    Ok(rows.into_iter().collect())
}

/// Live direct reply counts per comment.
pub async fn reply_counts(
    executor: impl SqliteExecutor<'_>,
    comment_ids: &[i64],
) -> Result<HashMap<i64, i64>> {
    if comment_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = format!(
        r"
        SELECT parent_comment_id, COUNT(*) FROM comments
        WHERE deleted_at IS NULL AND parent_comment_id IN ({})
        GROUP BY parent_comment_id
        ",
        placeholders(comment_ids.len())
    );

    let mut query = sqlx::query_as::<_, (i64, i64)>(&query);
    for id in comment_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(executor)
        .await
        .context("Failed to fetch reply counts")?;
    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?,?,?");
        assert_eq!(placeholders(0), "");
    }
}
