//! Redis-backed token cache.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::Error;

use super::TokenCache;

/// Token cache backed by a Redis-compatible store.
///
/// The connection manager is clone-cheap and reconnects on its own;
/// command failures still surface as [`Error::CacheUnavailable`] and
/// are fatal for the calling operation.
#[derive(Clone)]
pub struct RedisTokenCache {
    conn: ConnectionManager,
}

impl RedisTokenCache {
    /// Dial the cache backend. The URL comes from
    /// [`ProfileConfig::cache_url`](crate::config::ProfileConfig::cache_url).
    pub async fn connect(url: &str) -> Result<Self, Error> {
        info!("connecting to token cache");
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn exists(&self, key: &str) -> Result<bool, Error> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, Error> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }

    async fn set_fields(&self, key: &str, fields: &HashMap<String, String>) -> Result<(), Error> {
        debug!(key, "overwriting cached token fields");
        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut conn = self.conn.clone();
        // DEL + HSET so stale fields never survive an overwrite
        let _: () = redis::pipe()
            .del(key)
            .hset_multiple(key, &pairs)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn ttl_seconds(&self, key: &str) -> Result<i64, Error> {
        let mut conn = self.conn.clone();
        Ok(conn.ttl(key).await?)
    }

    async fn expire_at(&self, key: &str, epoch_seconds: i64) -> Result<(), Error> {
        debug!(key, epoch_seconds, "setting cache expiry");
        let mut conn = self.conn.clone();
        let _: () = conn.expire_at(key, epoch_seconds).await?;
        Ok(())
    }
}
