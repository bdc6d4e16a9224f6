//! Redis-backed distributed lock coordinator.
//!
//! Implements [`LockCoordinator`] on top of a shared Redis instance so
//! mutual exclusion holds across every server process pointed at the same
//! backend, not merely within one process's memory space.
//!
//! # Algorithm
//!
//! - **Acquire**: a single `SET key holder NX PX ttl` round-trip. `NX` makes
//!   the claim non-blocking (the command answers nil instead of queuing when
//!   the key exists), `PX` attaches the TTL that reclaims the key if the
//!   holder crashes before releasing. The holder value is a fresh UUID per
//!   acquisition.
//! - **Release**: a Lua script that deletes the key only if it still carries
//!   this acquisition's holder value, executed atomically server-side. A
//!   late release of an expired token therefore never deletes a lock
//!   granted to someone else in the meantime.
//!
//! # Example
//!
//! ```no_run
//! use gatekeeper_core::LockCoordinator;
//! use gatekeeper_lock::RedisLockCoordinator;
//!
//! # async fn example() -> Result<(), gatekeeper_core::LockError> {
//! let lock = RedisLockCoordinator::new("redis://127.0.0.1:6379").await?;
//! let token = lock.acquire("booking:concert:42").await?;
//! // ...critical section...
//! lock.release(token).await?;
//! # Ok(())
//! # }
//! ```

use gatekeeper_core::{LockCoordinator, LockError, LockToken};
use redis::aio::ConnectionManager;
use redis::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;

/// Default time-to-live for granted locks.
///
/// Long enough to cover a booking transaction with comfortable margin,
/// short enough to bound unavailability when a holder crashes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(8);

/// Delete the key only if it still carries our holder value.
const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Redis-backed [`LockCoordinator`].
///
/// Cheap to clone; all clones share one multiplexed connection via
/// [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisLockCoordinator {
    conn_manager: ConnectionManager,
    ttl: Duration,
}

impl RedisLockCoordinator {
    /// Connect to Redis at `redis_url` with the [`DEFAULT_TTL`].
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Backend`] if the URL is invalid or the
    /// connection cannot be established.
    pub async fn new(redis_url: &str) -> Result<Self, LockError> {
        Self::with_ttl(redis_url, DEFAULT_TTL).await
    }

    /// Connect to Redis at `redis_url`; granted locks expire after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Backend`] if the URL is invalid or the
    /// connection cannot be established.
    pub async fn with_ttl(redis_url: &str, ttl: Duration) -> Result<Self, LockError> {
        let client = Client::open(redis_url)
            .map_err(|e| LockError::Backend(format!("failed to create Redis client: {e}")))?;
        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            LockError::Backend(format!("failed to create Redis connection manager: {e}"))
        })?;
        Ok(Self { conn_manager, ttl })
    }

    /// The TTL attached to every grant.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl LockCoordinator for RedisLockCoordinator {
    fn acquire<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<LockToken, LockError>> + Send + 'a>> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let holder = Uuid::new_v4().to_string();
            let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);

            // SET ... NX PX answers "OK" on a fresh claim, nil when held.
            let reply: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(&holder)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(|e| LockError::Backend(format!("failed to acquire lock: {e}")))?;

            if reply.is_some() {
                tracing::debug!(key, holder = %holder, "lock acquired");
                Ok(LockToken::new(key, holder))
            } else {
                Err(LockError::Unavailable(key.to_string()))
            }
        })
    }

    fn release(
        &self,
        token: LockToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LockError>> + Send + '_>> {
        Box::pin(async move {
            let mut conn = self.conn_manager.clone();
            let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
                .key(token.key())
                .arg(token.holder())
                .invoke_async(&mut conn)
                .await
                .map_err(|e| LockError::Backend(format!("failed to release lock: {e}")))?;

            if deleted == 0 {
                // Expired or reclaimed; the script left the current owner alone.
                tracing::debug!(key = token.key(), "lock was no longer ours at release");
            } else {
                tracing::debug!(key = token.key(), "lock released");
            }
            Ok(())
        })
    }
}
