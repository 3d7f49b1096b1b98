//! Integration tests for the database layer.

use social_feed::db::{
    count_visible_posts, get_active_user, get_active_user_by_email, get_comment, get_post,
    get_user_by_id, insert_comment_on_visible_post, insert_like, insert_post, insert_reply,
    insert_user, like_counts, liked_target_ids, reply_counts, soft_delete_owned_post,
    soft_delete_user, top_level_comment_counts, update_owned_post, Database, TargetKind,
};
use social_feed::feed::aggregate;
use tempfile::TempDir;

async fn setup_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

async fn create_user(db: &Database, email: &str) -> i64 {
    insert_user(db.pool(), "Test", "User", email, "unused-hash")
        .await
        .expect("Failed to insert user")
        .expect("Email already taken")
}

#[tokio::test]
async fn test_reopen_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path).await.unwrap();
    let user_id = create_user(&db, "keep@example.com").await;
    drop(db);

    // Migrations must not run twice or wipe data
    let db = Database::new(&db_path).await.unwrap();
    let user = get_user_by_id(db.pool(), user_id).await.unwrap().unwrap();
    assert_eq!(user.email, "keep@example.com");
}

#[tokio::test]
async fn test_insert_user_conflict_returns_none() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db, "dup@example.com").await;

    let second = insert_user(db.pool(), "Other", "Person", "dup@example.com", "h")
        .await
        .unwrap();
    assert!(second.is_none());
}

#[tokio::test]
async fn test_soft_deleted_user_is_inactive() {
    let (db, _temp_dir) = setup_test_db().await;
    let id = create_user(&db, "bye@example.com").await;

    assert_eq!(soft_delete_user(db.pool(), id).await.unwrap(), 1);
    assert_eq!(soft_delete_user(db.pool(), id).await.unwrap(), 0);

    assert!(get_active_user(db.pool(), id).await.unwrap().is_none());
    assert!(get_active_user_by_email(db.pool(), "bye@example.com")
        .await
        .unwrap()
        .is_none());

    let stored = get_user_by_id(db.pool(), id).await.unwrap().unwrap();
    assert!(stored.deleted_at.is_some());

    // The address stays reserved
    let again = insert_user(db.pool(), "New", "User", "bye@example.com", "h")
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn test_post_row_carries_author() {
    let (db, _temp_dir) = setup_test_db().await;
    let user_id = create_user(&db, "author@example.com").await;

    let post_id = insert_post(db.pool(), user_id, "Body", Some("/uploads/x.png"), true)
        .await
        .unwrap();
    let row = get_post(db.pool(), post_id).await.unwrap().unwrap();

    assert_eq!(row.author_email, "author@example.com");
    assert_eq!(row.image_url.as_deref(), Some("/uploads/x.png"));
    assert!(row.is_private);
    assert!(row.is_visible_to(user_id));
    assert!(!row.is_visible_to(user_id + 1));
    assert_eq!(row.created_at, row.updated_at);
    assert!(row.created_at.ends_with('Z'));
}

#[tokio::test]
async fn test_owned_writes_are_guarded() {
    let (db, _temp_dir) = setup_test_db().await;
    let owner = create_user(&db, "owner@example.com").await;
    let other = create_user(&db, "other@example.com").await;
    let post_id = insert_post(db.pool(), owner, "Body", None, false)
        .await
        .unwrap();

    assert_eq!(
        update_owned_post(db.pool(), post_id, other, Some("x"), None)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        soft_delete_owned_post(db.pool(), post_id, other).await.unwrap(),
        0
    );

    assert_eq!(
        update_owned_post(db.pool(), post_id, owner, None, Some(true))
            .await
            .unwrap(),
        1
    );
    let row = get_post(db.pool(), post_id).await.unwrap().unwrap();
    assert_eq!(row.content, "Body");
    assert!(row.is_private);

    assert_eq!(
        soft_delete_owned_post(db.pool(), post_id, owner).await.unwrap(),
        1
    );
    assert_eq!(
        update_owned_post(db.pool(), post_id, owner, Some("late"), None)
            .await
            .unwrap(),
        0
    );
    assert_eq!(count_visible_posts(db.pool(), owner).await.unwrap(), 0);
}

#[tokio::test]
async fn test_guarded_comment_inserts() {
    let (db, _temp_dir) = setup_test_db().await;
    let owner = create_user(&db, "owner@example.com").await;
    let other = create_user(&db, "other@example.com").await;
    let private_post = insert_post(db.pool(), owner, "Secret", None, true)
        .await
        .unwrap();

    assert!(
        insert_comment_on_visible_post(db.pool(), private_post, other, "hi")
            .await
            .unwrap()
            .is_none()
    );

    let comment = insert_comment_on_visible_post(db.pool(), private_post, owner, "hi")
        .await
        .unwrap()
        .expect("Owner can comment");
    // The post's privacy also guards replies
    assert!(insert_reply(db.pool(), comment, other, "re")
        .await
        .unwrap()
        .is_none());

    let reply = insert_reply(db.pool(), comment, owner, "re")
        .await
        .unwrap()
        .expect("Reply to top-level comment");
    assert!(insert_reply(db.pool(), reply, owner, "re re")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_batch_counts() {
    let (db, _temp_dir) = setup_test_db().await;
    let a = create_user(&db, "a@example.com").await;
    let b = create_user(&db, "b@example.com").await;
    let p1 = insert_post(db.pool(), a, "one", None, false).await.unwrap();
    let p2 = insert_post(db.pool(), a, "two", None, false).await.unwrap();

    let c1 = insert_comment_on_visible_post(db.pool(), p1, b, "c1")
        .await
        .unwrap()
        .unwrap();
    insert_comment_on_visible_post(db.pool(), p1, a, "c2")
        .await
        .unwrap()
        .unwrap();
    insert_reply(db.pool(), c1, a, "r1").await.unwrap().unwrap();

    insert_like(db.pool(), a, TargetKind::Post, p1).await.unwrap();
    insert_like(db.pool(), b, TargetKind::Post, p1).await.unwrap();
    // A duplicate is ignored rather than failing
    assert_eq!(
        insert_like(db.pool(), b, TargetKind::Post, p1).await.unwrap(),
        0
    );
    insert_like(db.pool(), b, TargetKind::Comment, p2).await.unwrap();

    let likes = like_counts(db.pool(), TargetKind::Post, &[p1, p2])
        .await
        .unwrap();
    assert_eq!(likes.get(&p1), Some(&2));
    assert_eq!(likes.get(&p2), None);

    let liked = liked_target_ids(db.pool(), b, TargetKind::Post, &[p1, p2])
        .await
        .unwrap();
    assert!(liked.contains(&p1));
    assert!(!liked.contains(&p2));

    let comments = top_level_comment_counts(db.pool(), &[p1, p2])
        .await
        .unwrap();
    assert_eq!(comments.get(&p1), Some(&2));
    assert_eq!(comments.get(&p2), None);

    let replies = reply_counts(db.pool(), &[c1]).await.unwrap();
    assert_eq!(replies.get(&c1), Some(&1));

    assert!(like_counts(db.pool(), TargetKind::Post, &[])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_views_without_viewer() {
    let (db, _temp_dir) = setup_test_db().await;
    let a = create_user(&db, "a@example.com").await;
    let b = create_user(&db, "b@example.com").await;
    let post_id = insert_post(db.pool(), a, "one", None, false).await.unwrap();
    let comment_id = insert_comment_on_visible_post(db.pool(), post_id, b, "c1")
        .await
        .unwrap()
        .unwrap();
    insert_reply(db.pool(), comment_id, a, "r1")
        .await
        .unwrap()
        .unwrap();
    insert_like(db.pool(), a, TargetKind::Post, post_id).await.unwrap();
    insert_like(db.pool(), a, TargetKind::Comment, comment_id)
        .await
        .unwrap();

    let mut conn = db.pool().acquire().await.unwrap();

    let post = get_post(&mut *conn, post_id).await.unwrap().unwrap();
    let views = aggregate::post_views(&mut conn, None, vec![post]).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].likes_count, 1);
    assert_eq!(views[0].comments_count, 1);
    assert!(!views[0].is_liked);

    // The liker sees the flag; no viewer never does
    let post = get_post(&mut *conn, post_id).await.unwrap().unwrap();
    let views = aggregate::post_views(&mut conn, Some(a), vec![post]).await.unwrap();
    assert!(views[0].is_liked);

    let comment = get_comment(&mut *conn, comment_id).await.unwrap().unwrap();
    let views = aggregate::comment_views(&mut conn, None, vec![comment])
        .await
        .unwrap();
    assert_eq!(views[0].likes_count, 1);
    assert_eq!(views[0].replies_count, 1);
    assert!(!views[0].is_liked);

    assert!(aggregate::post_views(&mut conn, None, Vec::new())
        .await
        .unwrap()
        .is_empty());
    assert!(aggregate::comment_views(&mut conn, Some(a), Vec::new())
        .await
        .unwrap()
        .is_empty());
}
