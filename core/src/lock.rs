//! Distributed lock coordination.
//!
//! This module defines the seam for cross-process mutual exclusion: a named,
//! time-bounded exclusive claim enforced by a backend shared between all
//! server processes (Redis in production).
//!
//! # Design
//!
//! - **Non-blocking acquire**: if the key is currently held, [`LockCoordinator::acquire`]
//!   fails immediately with [`LockError::Unavailable`] instead of queuing.
//!   Callers treat that as backpressure, not as a retryable internal error.
//! - **TTL**: every granted lock expires automatically, bounding worst-case
//!   unavailability when a holder crashes or hangs before releasing.
//! - **Holder-checked release**: [`LockCoordinator::release`] is safe to call
//!   after expiry - a late release of an already-expired token must never
//!   delete a lock granted to someone else in the meantime.
//!
//! # Guaranteed release
//!
//! [`LockGuard`] scopes a granted lock to a region of code. The owning code
//! calls [`LockGuard::release`] on normal and error paths (so the release is
//! awaited and observable before returning); if the guard is dropped without
//! that - cancellation, panic - `Drop` spawns a best-effort release, and the
//! TTL reclaims the key if even that cannot run.
//!
//! # Dyn Compatibility
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so it can be used as a trait object (`Arc<dyn LockCoordinator>`)
//! and injected into services at construction.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during lock coordination.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The named lock is currently held by another process.
    ///
    /// This is backpressure, not a fault: the caller should surface it as
    /// "busy, retry later" rather than retrying internally.
    #[error("lock {0:?} is held elsewhere")]
    Unavailable(String),

    /// The lock backend failed (connection refused, protocol error, ...).
    #[error("lock backend error: {0}")]
    Backend(String),
}

/// A granted claim on a named lock.
///
/// The `holder` value is generated fresh for every acquisition; release
/// only succeeds against the backend if the key still carries this holder,
/// which is what makes a late release after expiry harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    key: String,
    holder: String,
}

impl LockToken {
    /// Create a token for `key` held by `holder`.
    #[must_use]
    pub fn new(key: impl Into<String>, holder: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            holder: holder.into(),
        }
    }

    /// The locked key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The holder value the key was claimed with.
    #[must_use]
    pub fn holder(&self) -> &str {
        &self.holder
    }
}

/// Cross-process mutual exclusion on named keys.
///
/// Implementations must enforce exclusion across independent server
/// processes sharing the same backend, not merely within one process's
/// memory space.
///
/// # Implementations
///
/// - `RedisLockCoordinator` (`gatekeeper-lock`): production, backed by
///   `SET key holder NX PX ttl` plus a holder-checked delete script.
/// - `InMemoryLockCoordinator` (`gatekeeper-testing`): single-process,
///   deterministic tests.
pub trait LockCoordinator: Send + Sync {
    /// Try to acquire the lock named `key` without blocking.
    ///
    /// Returns a [`LockToken`] on success. The grant carries the backend's
    /// configured TTL.
    ///
    /// # Errors
    ///
    /// - [`LockError::Unavailable`]: the key is held elsewhere right now.
    /// - [`LockError::Backend`]: the backend could not be reached or
    ///   answered with an error.
    fn acquire<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LockToken, LockError>> + Send + 'a>>;

    /// Release a previously granted lock.
    ///
    /// Safe to call after the token has expired: if the key no longer
    /// carries this token's holder, the call is a no-op.
    ///
    /// # Errors
    ///
    /// - [`LockError::Backend`]: the backend could not be reached.
    fn release(
        &self,
        token: LockToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LockError>> + Send + '_>>;
}

/// Scoped holder of a granted lock.
///
/// Prefer [`LockGuard::release`] on every deliberate exit path - it awaits
/// the backend round-trip so the release is observable before the caller
/// returns. The `Drop` implementation covers the paths no code runs on
/// (future cancelled, panic): it spawns the release onto the current tokio
/// runtime, and the lock TTL bounds the damage if no runtime is available.
pub struct LockGuard {
    coordinator: Arc<dyn LockCoordinator>,
    token: Option<LockToken>,
}

impl LockGuard {
    /// Wrap a granted token so its release is guaranteed.
    #[must_use]
    pub fn new(coordinator: Arc<dyn LockCoordinator>, token: LockToken) -> Self {
        Self {
            coordinator,
            token: Some(token),
        }
    }

    /// The held token, if the guard still owns one.
    #[must_use]
    pub fn token(&self) -> Option<&LockToken> {
        self.token.as_ref()
    }

    /// Release the lock and consume the guard.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Backend`] if the backend could not be reached;
    /// the token is gone from the guard either way, so `Drop` will not retry.
    pub async fn release(mut self) -> Result<(), LockError> {
        match self.token.take() {
            Some(token) => self.coordinator.release(token).await,
            None => Ok(()),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let coordinator = Arc::clone(&self.coordinator);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(error) = coordinator.release(token).await {
                    tracing::warn!(%error, "lock release on drop failed, TTL will reclaim");
                }
            });
        }
        // No runtime here (process tearing down): the TTL reclaims the key.
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests assert on known-good values
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Coordinator double that records every release it sees.
    struct RecordingCoordinator {
        released: Mutex<Vec<LockToken>>,
        release_count: AtomicUsize,
    }

    impl RecordingCoordinator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                released: Mutex::new(Vec::new()),
                release_count: AtomicUsize::new(0),
            })
        }
    }

    impl LockCoordinator for RecordingCoordinator {
        fn acquire<'a>(
            &'a self,
            key: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<LockToken, LockError>> + Send + 'a>> {
            Box::pin(async move { Ok(LockToken::new(key, "holder")) })
        }

        fn release(
            &self,
            token: LockToken,
        ) -> Pin<Box<dyn Future<Output = Result<(), LockError>> + Send + '_>> {
            Box::pin(async move {
                self.release_count.fetch_add(1, Ordering::SeqCst);
                if let Ok(mut released) = self.released.lock() {
                    released.push(token);
                }
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn explicit_release_hands_token_back() {
        let coordinator = RecordingCoordinator::new();
        let token = coordinator.acquire("booking:concert:1").await.unwrap();
        let guard = LockGuard::new(coordinator.clone(), token.clone());

        guard.release().await.unwrap();

        let released = coordinator.released.lock().unwrap();
        assert_eq!(released.as_slice(), &[token]);
    }

    #[tokio::test]
    async fn drop_spawns_release() {
        let coordinator = RecordingCoordinator::new();
        let token = coordinator.acquire("booking:concert:2").await.unwrap();

        drop(LockGuard::new(coordinator.clone(), token));

        // The drop-path release is spawned; give it a moment to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(coordinator.release_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_after_release_is_single() {
        let coordinator = RecordingCoordinator::new();
        let token = coordinator.acquire("booking:concert:3").await.unwrap();
        let guard = LockGuard::new(coordinator.clone(), token);

        guard.release().await.unwrap();
        // Guard consumed by release; only the explicit release is observed.
        tokio::task::yield_now().await;
        assert_eq!(coordinator.release_count.load(Ordering::SeqCst), 1);
    }
}
