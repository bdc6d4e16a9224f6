//! Integration tests for `RedisLockCoordinator` using testcontainers.
//!
//! These tests use a real Redis instance to validate mutual exclusion, TTL
//! expiry, and holder-checked release.
//!
//! # Requirements
//!
//! Docker must be running to execute these tests. The tests will
//! automatically start a Redis container using testcontainers.

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use gatekeeper_core::{LockCoordinator, LockError};
use gatekeeper_lock::RedisLockCoordinator;
use std::time::Duration;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;

/// Helper to start a Redis container and return a configured coordinator.
///
/// Returns both the container (to keep it alive) and the coordinator.
async fn setup_coordinator(ttl: Duration) -> (ContainerAsync<Redis>, RedisLockCoordinator) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start redis container");

    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get redis port");

    let redis_url = format!("redis://127.0.0.1:{port}");

    let coordinator = RedisLockCoordinator::with_ttl(&redis_url, ttl)
        .await
        .expect("Failed to connect to redis");

    (container, coordinator)
}

#[tokio::test]
async fn test_acquire_is_exclusive_until_released() {
    let (_container, lock) = setup_coordinator(Duration::from_secs(8)).await;

    let token = lock
        .acquire("booking:concert:1")
        .await
        .expect("first acquire should succeed");

    // A second claim on the same key fails fast instead of queuing.
    let second = lock.acquire("booking:concert:1").await;
    assert_eq!(
        second,
        Err(LockError::Unavailable("booking:concert:1".to_string()))
    );

    lock.release(token).await.expect("release should succeed");

    lock.acquire("booking:concert:1")
        .await
        .expect("acquire after release should succeed");
}

#[tokio::test]
async fn test_different_keys_do_not_contend() {
    let (_container, lock) = setup_coordinator(Duration::from_secs(8)).await;

    let _a = lock
        .acquire("booking:concert:1")
        .await
        .expect("acquire concert 1");
    lock.acquire("booking:concert:2")
        .await
        .expect("acquire concert 2 should not contend with concert 1");
}

#[tokio::test]
async fn test_ttl_reclaims_a_crashed_holder() {
    let (_container, lock) = setup_coordinator(Duration::from_millis(200)).await;

    // Acquire and "crash": never release.
    let _abandoned = lock
        .acquire("booking:concert:1")
        .await
        .expect("first acquire should succeed");

    tokio::time::sleep(Duration::from_millis(400)).await;

    lock.acquire("booking:concert:1")
        .await
        .expect("key should be reclaimable after TTL expiry");
}

#[tokio::test]
async fn test_stale_release_does_not_clobber_new_holder() {
    let (_container, lock) = setup_coordinator(Duration::from_millis(200)).await;

    let stale = lock
        .acquire("booking:concert:1")
        .await
        .expect("first acquire should succeed");

    // Let the first grant expire, then hand the key to a new holder.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let _current = lock
        .acquire("booking:concert:1")
        .await
        .expect("reacquire after expiry should succeed");

    // The late release of the expired token must be a harmless no-op.
    lock.release(stale).await.expect("stale release is safe");

    let contended = lock.acquire("booking:concert:1").await;
    assert_eq!(
        contended,
        Err(LockError::Unavailable("booking:concert:1".to_string())),
        "current holder's lock must survive the stale release"
    );
}

#[tokio::test]
async fn test_release_is_idempotent_against_double_release() {
    let (_container, lock) = setup_coordinator(Duration::from_secs(8)).await;

    let token = lock
        .acquire("booking:concert:1")
        .await
        .expect("acquire should succeed");

    lock.release(token.clone())
        .await
        .expect("first release should succeed");
    lock.release(token)
        .await
        .expect("second release should be a no-op");
}
