//! Single-process lock coordinator for tests.

use gatekeeper_core::{LockCoordinator, LockError, LockToken};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default TTL, matching the production coordinator's default.
const DEFAULT_TTL: Duration = Duration::from_secs(8);

struct HeldLock {
    holder: String,
    expires_at: Instant,
}

/// In-memory [`LockCoordinator`] with the same observable behavior as the
/// Redis implementation: non-blocking acquire, TTL-based expiry of crashed
/// holders, and holder-checked release that never clobbers a newer grant.
///
/// Only enforces exclusion within one process - which is exactly what a
/// deterministic test needs.
pub struct InMemoryLockCoordinator {
    locks: Mutex<HashMap<String, HeldLock>>,
    ttl: Duration,
}

impl InMemoryLockCoordinator {
    /// Create a coordinator with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a coordinator whose grants expire after `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Whether `key` is currently held (and not expired).
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        let locks = self.locked();
        locks
            .get(key)
            .is_some_and(|held| held.expires_at > Instant::now())
    }

    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in tests
    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<String, HeldLock>> {
        self.locks.lock().unwrap()
    }
}

impl Default for InMemoryLockCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl LockCoordinator for InMemoryLockCoordinator {
    fn acquire<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LockToken, LockError>> + Send + 'a>> {
        Box::pin(async move {
            let mut locks = self.locked();
            let now = Instant::now();
            if let Some(held) = locks.get(key) {
                if held.expires_at > now {
                    return Err(LockError::Unavailable(key.to_string()));
                }
            }
            let holder = Uuid::new_v4().to_string();
            locks.insert(
                key.to_string(),
                HeldLock {
                    holder: holder.clone(),
                    expires_at: now + self.ttl,
                },
            );
            Ok(LockToken::new(key, holder))
        })
    }

    fn release(
        &self,
        token: LockToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LockError>> + Send + '_>> {
        Box::pin(async move {
            let mut locks = self.locked();
            // Only the current holder may delete the key; a stale token
            // releasing after expiry must not remove a newer grant.
            if locks
                .get(token.key())
                .is_some_and(|held| held.holder == token.holder())
            {
                locks.remove(token.key());
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests assert on known-good values
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_fails_while_held() {
        let lock = InMemoryLockCoordinator::new();
        let token = lock.acquire("k").await.unwrap();

        let second = lock.acquire("k").await;
        assert_eq!(second, Err(LockError::Unavailable("k".to_string())));

        lock.release(token).await.unwrap();
        assert!(lock.acquire("k").await.is_ok());
    }

    #[tokio::test]
    async fn expired_grant_can_be_reacquired() {
        let lock = InMemoryLockCoordinator::with_ttl(Duration::from_millis(20));
        let stale = lock.acquire("k").await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        // The first grant expired; a new holder takes the key.
        let _fresh = lock.acquire("k").await.unwrap();

        // The stale holder's late release must not remove the new grant.
        lock.release(stale).await.unwrap();
        assert!(lock.is_held("k"));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let lock = InMemoryLockCoordinator::new();
        let _a = lock.acquire("booking:concert:1").await.unwrap();
        assert!(lock.acquire("booking:concert:2").await.is_ok());
    }
}
