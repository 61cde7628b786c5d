//! Shared token cache.
//!
//! The current access token is held in a process-external key/value
//! store shared by every SDK instance pointed at the same cache host.
//! The abstraction is deliberately minimal: hash-field get/set plus
//! per-key TTL, which is all the session layer needs.
//!
//! No retries happen at this layer. If the backend is unreachable the
//! error propagates immediately - no subsequent call can succeed
//! without the cache, so there is nothing useful to recover to.

pub mod memory;
pub mod redis;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Error;

pub use self::memory::MemoryTokenCache;
pub use self::redis::RedisTokenCache;

/// TTL sentinel: the key does not exist.
pub const TTL_KEY_ABSENT: i64 = -2;

/// TTL sentinel: the key exists but carries no expiry. The session
/// layer treats this as invalid - a crash between the field write and
/// the expiry write can leave a token in this state.
pub const TTL_NO_EXPIRY: i64 = -1;

/// Minimal key/value contract backing the shared token.
///
/// Field set and expiry set are two separate calls, not a transaction.
/// Callers must tolerate a key that has fields but no expiry.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Whether the key currently exists.
    async fn exists(&self, key: &str) -> Result<bool, Error>;

    /// All hash fields at the key; empty map when the key is absent.
    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, Error>;

    /// Full overwrite of the hash at the key.
    async fn set_fields(&self, key: &str, fields: &HashMap<String, String>) -> Result<(), Error>;

    /// Remaining TTL in seconds, or [`TTL_KEY_ABSENT`] / [`TTL_NO_EXPIRY`].
    async fn ttl_seconds(&self, key: &str) -> Result<i64, Error>;

    /// Expire the key at an absolute epoch-seconds instant.
    async fn expire_at(&self, key: &str, epoch_seconds: i64) -> Result<(), Error>;
}
