//! Tests for the per-site session pool

use kodegen_tools_sitemirror::SessionPool;
use kodegen_tools_sitemirror::config::Fingerprint;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::{FakeSessionFactory, FakeSite};

#[tokio::test]
async fn test_acquire_reuses_session_for_same_id() {
    let pool = SessionPool::new(FakeSessionFactory::new(FakeSite::new()));
    let fingerprint = Fingerprint::default();

    let first = pool.acquire("example.com", &fingerprint).await.unwrap();
    let second = pool.acquire("example.com", &fingerprint).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.factory().created(), 1);
    assert_eq!(first.id, "example.com");
}

#[tokio::test]
async fn test_concurrent_acquire_launches_once() {
    let factory = FakeSessionFactory::new(FakeSite::new()).with_launch_delay(Duration::from_millis(50));
    let pool = Arc::new(SessionPool::new(factory));
    let fingerprint = Fingerprint::default();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let fingerprint = fingerprint.clone();
            tokio::spawn(async move { pool.acquire("example.com", &fingerprint).await })
        })
        .collect();

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(pool.factory().created(), 1, "one browser per identifier");
    assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_distinct_ids_get_distinct_sessions() {
    let pool = SessionPool::new(FakeSessionFactory::new(FakeSite::new()));
    let fingerprint = Fingerprint::default();

    let a = pool.acquire("a.example.com", &fingerprint).await.unwrap();
    let b = pool.acquire("b.example.com:8080", &fingerprint).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(
        pool.session_ids().await,
        vec!["a.example.com".to_string(), "b.example.com:8080".to_string()]
    );
}

#[tokio::test]
async fn test_release_closes_and_forgets_session() {
    let pool = SessionPool::new(FakeSessionFactory::new(FakeSite::new()));
    let fingerprint = Fingerprint::default();

    pool.acquire("example.com", &fingerprint).await.unwrap();
    assert!(pool.contains("example.com").await);

    assert!(pool.release("example.com").await.unwrap());
    assert!(!pool.contains("example.com").await);
    assert_eq!(pool.factory().closed(), 1);

    // Unknown identifiers are a no-op
    assert!(!pool.release("example.com").await.unwrap());
    assert_eq!(pool.factory().closed(), 1);

    // A released identifier gets a fresh session
    pool.acquire("example.com", &fingerprint).await.unwrap();
    assert_eq!(pool.factory().created(), 2);
}

#[tokio::test]
async fn test_release_all_closes_everything() {
    let pool = SessionPool::new(FakeSessionFactory::new(FakeSite::new()));
    let fingerprint = Fingerprint::default();

    for id in ["a", "b", "c"] {
        pool.acquire(id, &fingerprint).await.unwrap();
    }

    assert_eq!(pool.release_all().await, 3);
    assert_eq!(pool.factory().closed(), 3);
    assert!(pool.session_ids().await.is_empty());
    assert_eq!(pool.release_all().await, 0);
}

#[tokio::test]
async fn test_failed_creation_is_not_registered() {
    let pool = SessionPool::new(FakeSessionFactory::failing());
    let fingerprint = Fingerprint::default();

    let err = match pool.acquire("example.com", &fingerprint).await {
        Ok(_) => panic!("creation should fail"),
        Err(e) => e,
    };

    assert!(format!("{err:#}").contains("browser executable not found"));
    assert!(!pool.contains("example.com").await);
}
