//! The engagement ledger: at most one like per (user, target kind, target id).
//!
//! Uniqueness is held by the `likes` UNIQUE constraint. A toggle deletes first
//! and only inserts if nothing was deleted, with the insert ignoring conflicts,
//! so two concurrent toggles can never produce a second row.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::info;

use super::Viewer;
use crate::db::{self, Database, TargetKind, UserSummary};
use crate::error::FeedResult;

/// Result of a toggle as returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
}

/// An in-flight toggle holding the write lock.
///
/// [`Toggle::begin`] opens a transaction whose first statement removes any
/// existing like, so SQLite takes the write lock before anything is read.
/// Callers check that the target exists through [`Toggle::conn`] and then
/// call [`Toggle::finish`]. Dropping the toggle rolls everything back.
pub struct Toggle {
    tx: Transaction<'static, Sqlite>,
    viewer: Viewer,
    kind: TargetKind,
    target_id: i64,
    removed: bool,
}

impl Toggle {
    pub async fn begin(
        db: &Database,
        viewer: Viewer,
        kind: TargetKind,
        target_id: i64,
    ) -> FeedResult<Self> {
        let mut tx = db.begin().await?;
        let removed = db::delete_like(&mut *tx, viewer.id, kind, target_id).await? > 0;

        Ok(Self {
            tx,
            viewer,
            kind,
            target_id,
            removed,
        })
    }

    /// Connection inside the toggle's transaction.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commit. Returns `liked: false` if a like was removed, otherwise inserts
    /// one and returns `liked: true`. A like that a concurrent request already
    /// inserted counts as liked.
    pub async fn finish(mut self) -> FeedResult<LikeState> {
        let liked = !self.removed;
        if liked {
            db::insert_like(&mut *self.tx, self.viewer.id, self.kind, self.target_id).await?;
        }
        self.tx.commit().await?;

        info!(
            user_id = self.viewer.id,
            kind = %self.kind,
            target_id = self.target_id,
            liked,
            "Toggled like"
        );
        Ok(LikeState { liked })
    }
}

/// Number of likes on a target.
pub async fn count_for(conn: &mut SqliteConnection, kind: TargetKind, target_id: i64) -> Result<i64> {
    db::count_likes(conn, kind, target_id).await
}

/// Whether `viewer` currently likes a target.
pub async fn is_liked_by(
    conn: &mut SqliteConnection,
    viewer: Viewer,
    kind: TargetKind,
    target_id: i64,
) -> Result<bool> {
    db::has_liked(conn, viewer.id, kind, target_id).await
}

/// Users who liked a target, in the order the likes were made.
pub async fn list_likers(
    conn: &mut SqliteConnection,
    kind: TargetKind,
    target_id: i64,
) -> Result<Vec<UserSummary>> {
    db::list_likers(conn, kind, target_id).await
}
