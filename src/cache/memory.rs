//! In-process token cache.
//!
//! Mirrors the Redis semantics (hash fields, key TTL, `-2`/`-1`
//! sentinels) without a network hop. Used by the test suite and by
//! embedders that run a single instance and do not need a shared
//! backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Error;

use super::{TokenCache, TTL_KEY_ABSENT, TTL_NO_EXPIRY};

#[derive(Debug, Clone)]
struct Entry {
    fields: HashMap<String, String>,
    /// Absolute epoch seconds, `None` while no expiry has been set
    expires_at: Option<i64>,
}

#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the entry if its expiry has passed, then run `f` on what
    /// remains.
    fn with_live_entry<T>(&self, key: &str, f: impl FnOnce(Option<&Entry>) -> T) -> T {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().timestamp();
        if let Some(entry) = entries.get(key) {
            if entry.expires_at.is_some_and(|at| at <= now) {
                entries.remove(key);
            }
        }
        f(entries.get(key))
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.with_live_entry(key, |entry| entry.is_some()))
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, Error> {
        Ok(self.with_live_entry(key, |entry| {
            entry.map(|e| e.fields.clone()).unwrap_or_default()
        }))
    }

    async fn set_fields(&self, key: &str, fields: &HashMap<String, String>) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                fields: fields.clone(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn ttl_seconds(&self, key: &str) -> Result<i64, Error> {
        Ok(self.with_live_entry(key, |entry| match entry {
            None => TTL_KEY_ABSENT,
            Some(Entry {
                expires_at: None, ..
            }) => TTL_NO_EXPIRY,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => at - Utc::now().timestamp(),
        }))
    }

    async fn expire_at(&self, key: &str, epoch_seconds: i64) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(epoch_seconds);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_fields(value: &str) -> HashMap<String, String> {
        HashMap::from([("access_token".to_string(), value.to_string())])
    }

    #[tokio::test]
    async fn test_round_trip_with_ttl() {
        let cache = MemoryTokenCache::new();
        let requested = 120;
        cache.set_fields("k", &token_fields("tok")).await.unwrap();
        cache
            .expire_at("k", Utc::now().timestamp() + requested)
            .await
            .unwrap();

        let fields = cache.get_fields("k").await.unwrap();
        assert_eq!(fields.get("access_token").map(String::as_str), Some("tok"));

        let ttl = cache.ttl_seconds("k").await.unwrap();
        assert!(ttl > 0, "ttl must stay positive before expiry, got {ttl}");
        assert!(ttl <= requested, "ttl must never exceed what was requested");
    }

    #[tokio::test]
    async fn test_absent_key_sentinels() {
        let cache = MemoryTokenCache::new();
        assert!(!cache.exists("missing").await.unwrap());
        assert!(cache.get_fields("missing").await.unwrap().is_empty());
        assert_eq!(cache.ttl_seconds("missing").await.unwrap(), TTL_KEY_ABSENT);
    }

    #[tokio::test]
    async fn test_fields_without_expiry() {
        let cache = MemoryTokenCache::new();
        cache.set_fields("k", &token_fields("tok")).await.unwrap();
        // set_fields alone leaves the key without an expiry
        assert_eq!(cache.ttl_seconds("k").await.unwrap(), TTL_NO_EXPIRY);
    }

    #[tokio::test]
    async fn test_expired_key_disappears() {
        let cache = MemoryTokenCache::new();
        cache.set_fields("k", &token_fields("tok")).await.unwrap();
        cache
            .expire_at("k", Utc::now().timestamp() - 5)
            .await
            .unwrap();

        assert!(!cache.exists("k").await.unwrap());
        assert_eq!(cache.ttl_seconds("k").await.unwrap(), TTL_KEY_ABSENT);
        assert!(cache.get_fields("k").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_fields() {
        let cache = MemoryTokenCache::new();
        cache.set_fields("k", &token_fields("old")).await.unwrap();
        cache.set_fields("k", &token_fields("new")).await.unwrap();
        let fields = cache.get_fields("k").await.unwrap();
        assert_eq!(fields.get("access_token").map(String::as_str), Some("new"));
    }
}
