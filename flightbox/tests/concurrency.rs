//! Tests for the per-key lock map.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use flightbox::{CacheKey, KeyedLocks};
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_key_is_mutually_exclusive() {
    let locks = Arc::new(KeyedLocks::new());
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            let max_active = Arc::clone(&max_active);
            tokio::spawn(async move {
                let _guard = locks.lock(CacheKey::from("token-refresh")).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();

    for result in join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_distinct_keys_lock_independently() {
    let locks = KeyedLocks::new();

    let first = locks.lock("a").await;
    let second = tokio::time::timeout(Duration::from_millis(100), locks.lock("b"))
        .await
        .expect("lock on another key must not wait");

    assert_eq!(first.key(), &"a");
    assert_eq!(second.key(), &"b");
    assert_eq!(locks.len(), 2);

    drop(first);
    drop(second);
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_slot_is_reaped_only_when_uncontended() {
    let locks = Arc::new(KeyedLocks::new());
    let guard = locks.lock("key").await;
    assert_eq!(locks.holders(&"key"), 1);

    let waiter = {
        let locks = Arc::clone(&locks);
        tokio::spawn(async move {
            let _guard = locks.lock("key").await;
        })
    };

    while locks.holders(&"key") < 2 {
        tokio::task::yield_now().await;
    }

    drop(guard);
    waiter.await.unwrap();

    assert_eq!(locks.holders(&"key"), 0);
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_cancelled_waiter_does_not_leak_slot() {
    let locks = KeyedLocks::new();
    let guard = locks.lock("key").await;

    let timed_out = tokio::time::timeout(Duration::from_millis(20), locks.lock("key")).await;
    assert!(timed_out.is_err());
    assert_eq!(locks.holders(&"key"), 1);

    drop(guard);
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_many_distinct_keys_do_not_accumulate() {
    let locks = KeyedLocks::new();

    for i in 0..1_000 {
        let _guard = locks.lock(format!("project_{i}")).await;
    }

    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_owned_guard_outlives_the_locking_task() {
    let locks = Arc::new(KeyedLocks::new());

    let guard = Arc::clone(&locks).lock_owned("key").await;
    let holder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(guard.key(), &"key");
    });

    assert!(
        tokio::time::timeout(Duration::from_millis(10), locks.lock("key"))
            .await
            .is_err(),
        "key is held by the spawned task"
    );

    holder.await.unwrap();
    let guard = locks.lock("key").await;
    assert_eq!(locks.len(), 1);
    drop(guard);
    assert!(locks.is_empty());
}
