use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Timestamp default used by every table: UTC with millisecond precision.
macro_rules! now_default {
    () => {
        "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))"
    };
}

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM _schema_version")
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating users, posts, comments and likes");

    let mut tx = pool.begin().await?;

    // Users; email is stored lower-cased so the plain UNIQUE is case-insensitive
    sqlx::query(concat!(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            updated_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            deleted_at TEXT
        )
        "
    ))
    .execute(&mut *tx)
    .await
    .context("Failed to create users table")?;

    sqlx::query(concat!(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            content TEXT NOT NULL,
            image_url TEXT,
            is_private INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            updated_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            deleted_at TEXT
        )
        "
    ))
    .execute(&mut *tx)
    .await
    .context("Failed to create posts table")?;

    sqlx::query(concat!(
        r"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL REFERENCES posts(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            parent_comment_id INTEGER REFERENCES comments(id),
            content TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            updated_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            deleted_at TEXT
        )
        "
    ))
    .execute(&mut *tx)
    .await
    .context("Failed to create comments table")?;

    // At most one like per (user, target)
    sqlx::query(concat!(
        r"
        CREATE TABLE IF NOT EXISTS likes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            likeable_type TEXT NOT NULL CHECK (likeable_type IN ('post', 'comment')),
            likeable_id INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT ",
        now_default!(),
        r",
            UNIQUE (user_id, likeable_type, likeable_id)
        )
        "
    ))
    .execute(&mut *tx)
    .await
    .context("Failed to create likes table")?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_posts_feed ON posts(deleted_at, created_at DESC, id DESC)",
        "CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id, parent_comment_id)",
        "CREATE INDEX IF NOT EXISTS idx_comments_parent_id ON comments(parent_comment_id)",
        "CREATE INDEX IF NOT EXISTS idx_likes_target ON likes(likeable_type, likeable_id)",
    ];
    for index in indexes {
        sqlx::query(index)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create index: {index}"))?;
    }

    tx.commit().await?;
    Ok(())
}
