//! Integration tests for posts: visibility, ownership and soft deletion.

use social_feed::db::{insert_user, Database};
use social_feed::error::FeedError;
use social_feed::feed::{comments, posts, NewPost, PageRequest, PostChanges, Viewer};
use tempfile::TempDir;

async fn setup_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

async fn create_test_user(db: &Database, email: &str) -> Viewer {
    let id = insert_user(db.pool(), "Test", "User", email, "unused-hash")
        .await
        .expect("Failed to create user")
        .expect("Email already taken");
    Viewer { id }
}

fn new_post(content: &str, is_private: bool) -> NewPost {
    NewPost {
        content: content.to_string(),
        image_url: None,
        is_private,
    }
}

#[tokio::test]
async fn test_create_and_get_post() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;

    let created = posts::create_post(
        &db,
        alice,
        NewPost {
            content: "  Hello world  ".to_string(),
            image_url: Some("/uploads/abc.png".to_string()),
            is_private: false,
        },
    )
    .await
    .expect("Failed to create post");

    assert_eq!(created.content, "Hello world");
    assert_eq!(created.image_url.as_deref(), Some("/uploads/abc.png"));
    assert_eq!(created.user.id, alice.id);
    assert_eq!(created.likes_count, 0);
    assert_eq!(created.comments_count, 0);
    assert!(!created.is_liked);

    let fetched = posts::get_post(&db, alice, created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;

    let result = posts::create_post(&db, alice, new_post(" \n ", false)).await;
    assert!(matches!(result, Err(FeedError::Validation(_))));
}

#[tokio::test]
async fn test_private_post_visibility() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let bob = create_test_user(&db, "bob@example.com").await;

    let secret = posts::create_post(&db, alice, new_post("secret", true))
        .await
        .unwrap();
    let public = posts::create_post(&db, alice, new_post("public", false))
        .await
        .unwrap();

    // Owner sees both
    let page = posts::list_posts(&db, alice, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(posts::get_post(&db, alice, secret.id).await.is_ok());

    // Others never see the private one
    let page = posts::list_posts(&db, bob, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, public.id);
    assert!(page.items.iter().all(|p| p.id != secret.id));

    let result = posts::get_post(&db, bob, secret.id).await;
    assert!(matches!(result, Err(FeedError::Forbidden(_))));

    let result = posts::list_post_likers(&db, bob, secret.id).await;
    assert!(matches!(result, Err(FeedError::Forbidden(_))));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let post = posts::create_post(&db, alice, new_post(&format!("post {i}"), false))
            .await
            .unwrap();
        ids.push(post.id);
    }
    ids.reverse();

    let page = posts::list_posts(&db, alice, PageRequest::default())
        .await
        .unwrap();
    let listed: Vec<i64> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_partial_update() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let post = posts::create_post(&db, alice, new_post("original", false))
        .await
        .unwrap();

    // Blank content leaves content alone; privacy changes
    let updated = posts::update_post(
        &db,
        alice,
        post.id,
        PostChanges {
            content: Some("   ".to_string()),
            is_private: Some(true),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.content, "original");
    assert!(updated.is_private);

    // Absent privacy leaves privacy alone
    let updated = posts::update_post(
        &db,
        alice,
        post.id,
        PostChanges {
            content: Some("edited".to_string()),
            is_private: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.content, "edited");
    assert!(updated.is_private);
}

#[tokio::test]
async fn test_only_owner_can_mutate() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let bob = create_test_user(&db, "bob@example.com").await;
    let post = posts::create_post(&db, alice, new_post("mine", false))
        .await
        .unwrap();

    let result = posts::update_post(&db, bob, post.id, PostChanges::default()).await;
    assert!(matches!(result, Err(FeedError::Forbidden(_))));

    let result = posts::delete_post(&db, bob, post.id).await;
    assert!(matches!(result, Err(FeedError::Forbidden(_))));

    let result = posts::update_post(&db, alice, 4242, PostChanges::default()).await;
    assert!(matches!(result, Err(FeedError::NotFound(_))));

    let result = posts::delete_post(&db, alice, 4242).await;
    assert!(matches!(result, Err(FeedError::NotFound(_))));

    // Still intact
    assert_eq!(
        posts::get_post(&db, bob, post.id).await.unwrap().content,
        "mine"
    );
}

#[tokio::test]
async fn test_deleted_post_is_gone_but_children_remain() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let bob = create_test_user(&db, "bob@example.com").await;

    let post = posts::create_post(&db, alice, new_post("short-lived", false))
        .await
        .unwrap();
    let comment = comments::create_comment(&db, bob, post.id, "nice")
        .await
        .unwrap();
    comments::toggle_comment_like(&db, alice, comment.id)
        .await
        .unwrap();

    posts::delete_post(&db, alice, post.id).await.unwrap();

    let result = posts::get_post(&db, bob, post.id).await;
    assert!(matches!(result, Err(FeedError::NotFound(_))));

    let page = posts::list_posts(&db, alice, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());

    // Deleting twice is NotFound
    let result = posts::delete_post(&db, alice, post.id).await;
    assert!(matches!(result, Err(FeedError::NotFound(_))));

    // Likes and comments stay addressable by comment id
    let likers = comments::list_comment_likers(&db, bob, comment.id)
        .await
        .unwrap();
    assert_eq!(likers.len(), 1);
    assert!(!comments::toggle_comment_like(&db, alice, comment.id)
        .await
        .unwrap()
        .liked);
    let reply = comments::create_reply(&db, alice, comment.id, "still here")
        .await
        .unwrap();
    assert_eq!(reply.post_id, post.id);
}

#[tokio::test]
async fn test_like_scenario() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let bob = create_test_user(&db, "bob@example.com").await;

    let post = posts::create_post(&db, alice, new_post("P", false))
        .await
        .unwrap();

    assert!(posts::toggle_post_like(&db, bob, post.id).await.unwrap().liked);
    let seen_by_bob = posts::get_post(&db, bob, post.id).await.unwrap();
    assert_eq!(seen_by_bob.likes_count, 1);
    assert!(seen_by_bob.is_liked);

    // The flag is per viewer
    let seen_by_alice = posts::get_post(&db, alice, post.id).await.unwrap();
    assert_eq!(seen_by_alice.likes_count, 1);
    assert!(!seen_by_alice.is_liked);

    assert!(!posts::toggle_post_like(&db, bob, post.id).await.unwrap().liked);
    assert_eq!(
        posts::get_post(&db, bob, post.id).await.unwrap().likes_count,
        0
    );

    posts::delete_post(&db, alice, post.id).await.unwrap();
    let result = posts::get_post(&db, bob, post.id).await;
    assert!(matches!(result, Err(FeedError::NotFound(_))));
}
