//! Integration tests for paginated post listings.

use social_feed::db::{insert_post, insert_user, Database};
use social_feed::feed::{posts, PageRequest, Viewer, MAX_PAGE_SIZE};
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

/// Insert `count` public posts and return their ids, newest first.
async fn seed_posts(db: &Database, owner: Viewer, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let id = insert_post(db.pool(), owner.id, &format!("Post {i}"), None, false)
            .await
            .expect("Failed to create post");
        ids.push(id);
    }
    ids.reverse();
    ids
}

#[tokio::test]
async fn test_pages_cover_all_posts_once() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let expected = seed_posts(&db, alice, 25).await;

    let first = posts::list_posts(&db, alice, PageRequest::new(Some(1), Some(10)))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total, 25);
    assert!(first.has_more);

    let second = posts::list_posts(&db, alice, PageRequest::new(Some(2), Some(10)))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 10);
    assert!(second.has_more);

    let third = posts::list_posts(&db, alice, PageRequest::new(Some(3), Some(10)))
        .await
        .unwrap();
    assert_eq!(third.items.len(), 5);
    assert_eq!(third.page, 3);
    assert!(!third.has_more);

    let seen: Vec<i64> = first
        .items
        .iter()
        .chain(&second.items)
        .chain(&third.items)
        .map(|p| p.id)
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    seed_posts(&db, alice, 3).await;

    let page = posts::list_posts(&db, alice, PageRequest::new(Some(5), Some(10)))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_exact_fit_has_no_more() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    seed_posts(&db, alice, 20).await;

    let page = posts::list_posts(&db, alice, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 20);
    assert_eq!(page.limit, 20);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    seed_posts(&db, alice, 3).await;

    let page = posts::list_posts(&db, alice, PageRequest::new(Some(0), Some(1000)))
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, MAX_PAGE_SIZE);
    assert_eq!(page.items.len(), 3);

    let page = posts::list_posts(&db, alice, PageRequest::new(Some(2), Some(0)))
        .await
        .unwrap();
    assert_eq!(page.limit, 1);
    assert_eq!(page.items.len(), 1);
    assert!(page.has_more);
}

#[tokio::test]
async fn test_total_excludes_hidden_posts() {
    let (db, _temp_dir) = setup_test_db().await;
    let alice = create_test_user(&db, "alice@example.com").await;
    let bob = create_test_user(&db, "bob@example.com").await;
    seed_posts(&db, alice, 4).await;
    insert_post(db.pool(), alice.id, "hidden", None, true)
        .await
        .unwrap();
    let gone = insert_post(db.pool(), bob.id, "gone", None, false)
        .await
        .unwrap();
    posts::delete_post(&db, bob, gone).await.unwrap();

    let page = posts::list_posts(&db, bob, PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert!(page.has_more);

    let page = posts::list_posts(&db, alice, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 5);
}
