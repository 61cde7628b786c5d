//! Session manager: the token lifecycle core.
//!
//! Every caller that wants to talk to the API asks the manager for an
//! [`Agent`]. The manager guarantees the agent is backed by a token
//! valid for at least a short grace window, while keeping redundant
//! token exchanges against the auth endpoint to a minimum.
//!
//! This is a check-on-access design: there is no background timer, the
//! TTL of the shared cache entry is inspected on every `agent()` call
//! and decides between reuse, proactive refresh, and full
//! re-authentication. The check-then-act sequence is serialized under
//! an internal mutex, so two tasks on the same manager cannot race a
//! refresh. Independent processes sharing the cache can still race
//! each other; the cache is last-write-wins and the auth endpoint
//! tolerates concurrent exchanges, so that race is accepted rather
//! than locked away.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{RedisTokenCache, TokenCache};
use crate::config::ProfileConfig;
use crate::error::{AuthStage, Error};

use super::token::{Token, TokenPayload};

/// Fixed cache key under which the shared token lives
pub const DEFAULT_CACHE_KEY: &str = "agcloud:session";

/// Header carrying the access token on every request
const AUTH_HEADER: &str = "x-uid";

/// User-agent marker sent with every request
const USER_AGENT_VALUE: &str = concat!("agcloud-sdk/", env!("CARGO_PKG_VERSION"));

/// Below this TTL the token is effectively gone; re-authenticate.
const DEFAULT_LOW_WATER_SECS: i64 = 2;

/// Below this TTL (but above the low water mark) the token still works
/// and is used to authenticate its own renewal.
const DEFAULT_HIGH_WATER_SECS: i64 = 900;

/// Subtracted from the remote `expires_in` so the cache entry
/// disappears before the remote token would be rejected.
const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 10;

/// Default HTTP timeout for auth and resource calls
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tunables for the token lifecycle.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// TTL below which the token is treated as expired
    pub low_water: i64,
    /// TTL at or below which a proactive refresh is attempted
    pub high_water: i64,
    /// Safety margin subtracted from the reported token lifetime
    pub expiry_margin: i64,
    /// Timeout applied to every HTTP client the manager builds
    pub request_timeout: Duration,
    /// Cache key holding the shared token
    pub cache_key: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            low_water: DEFAULT_LOW_WATER_SECS,
            high_water: DEFAULT_HIGH_WATER_SECS,
            expiry_margin: DEFAULT_EXPIRY_MARGIN_SECS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

/// An authenticated HTTP client handle.
///
/// Carries the current token in its default headers. Clone is cheap -
/// reqwest clients share their connection pool internally. The handle
/// is ephemeral: hold it for a call window, ask the manager again when
/// a request comes back unauthorized.
#[derive(Debug, Clone)]
pub struct Agent {
    client: Client,
    token: String,
}

impl Agent {
    /// The underlying HTTP client, token headers included.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The access token this agent was built with.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Owns token acquisition, expiry tracking, and proactive refresh.
/// Construct one per profile and share it by reference.
pub struct SessionManager {
    config: ProfileConfig,
    /// Bare client for credential exchanges (no token headers)
    http: Client,
    cache: Arc<dyn TokenCache>,
    current: Mutex<Option<Agent>>,
    options: SessionOptions,
}

impl SessionManager {
    /// Load the profile, dial the shared cache, and build a manager
    /// with default options.
    pub async fn connect(profile: Option<&str>) -> Result<Self, Error> {
        let config = ProfileConfig::load(profile)?;
        info!(profile = %config.profile, "initializing session");
        let cache = RedisTokenCache::connect(&config.cache_url()).await?;
        Self::with_cache(config, Arc::new(cache), SessionOptions::default())
    }

    /// Build a manager over an injected cache backend.
    pub fn with_cache(
        config: ProfileConfig,
        cache: Arc<dyn TokenCache>,
        options: SessionOptions,
    ) -> Result<Self, Error> {
        let http = Client::builder().timeout(options.request_timeout).build()?;
        Ok(Self {
            config,
            http,
            cache,
            current: Mutex::new(None),
            options,
        })
    }

    /// The profile configuration this manager was built from.
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Obtain an agent backed by a currently valid token.
    ///
    /// Decision per call, driven by the cache TTL:
    /// - no agent yet: adopt the shared token from the cache, or
    ///   perform a full credential exchange if none is usable
    /// - TTL below the low water mark: the token is effectively gone,
    ///   re-authenticate from credentials
    /// - TTL between the water marks: proactively renew using the
    ///   current token, degrading to a full exchange if the renewal is
    ///   rejected
    /// - TTL above the high water mark: reuse the agent unchanged
    pub async fn agent(&self) -> Result<Agent, Error> {
        let mut current = self.current.lock().await;

        let agent = match current.as_ref() {
            None => {
                debug!("no agent yet, cold start");
                let token = self.load_or_create_token().await?;
                self.build_agent(&token)?
            }
            Some(existing) => {
                let ttl = self.cache.ttl_seconds(&self.options.cache_key).await?;
                if ttl < self.options.low_water {
                    debug!(ttl, "cached token gone, re-authenticating");
                    let token = self.create_and_store_token().await?;
                    self.build_agent(&token)?
                } else if ttl <= self.options.high_water {
                    debug!(ttl, "token nearing expiry, refreshing");
                    let token = match self.refresh_token(existing).await {
                        Ok(token) => token,
                        Err(err @ Error::CacheUnavailable(_)) => return Err(err),
                        Err(err) => {
                            warn!(error = %err, "refresh failed, falling back to full credential exchange");
                            self.create_and_store_token().await?
                        }
                    };
                    self.build_agent(&token)?
                } else {
                    return Ok(existing.clone());
                }
            }
        };

        *current = Some(agent.clone());
        Ok(agent)
    }

    /// Cold start: adopt the shared token when the cache holds a live
    /// one, otherwise perform a full credential exchange.
    async fn load_or_create_token(&self) -> Result<Token, Error> {
        let key = &self.options.cache_key;
        let fields = self.cache.get_fields(key).await?;
        if !fields.is_empty() {
            let ttl = self.cache.ttl_seconds(key).await?;
            // A key with fields but no expiry (ttl == -1) means a
            // writer crashed between the field and expiry writes;
            // treat it like an expired token.
            if ttl >= self.options.low_water {
                if let Some(token) = Token::from_fields(&fields, ttl) {
                    debug!(ttl, "adopted shared token from cache");
                    return Ok(token);
                }
            } else {
                debug!(ttl, "ignoring unusable cached token");
            }
        }
        self.create_and_store_token().await
    }

    /// Full credential exchange: `POST /auth/token` authenticated with
    /// the profile's client id and secret.
    async fn create_token(&self) -> Result<Token, Error> {
        let url = format!("{}/auth/token", self.config.api_host);
        debug!("requesting new access token");
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(AuthStage::Create, status, &body));
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(format!("auth payload: {e}")))?;
        info!("obtained new access token");
        Ok(Token::from_payload(payload, self.options.expiry_margin))
    }

    async fn create_and_store_token(&self) -> Result<Token, Error> {
        let token = self.create_token().await?;
        self.store_token(&token).await?;
        Ok(token)
    }

    /// Renewal: `GET /auth/token` authenticated with the *current*
    /// token, not the original credentials.
    async fn refresh_token(&self, agent: &Agent) -> Result<Token, Error> {
        let url = format!("{}/auth/token", self.config.api_host);
        let response = agent.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(AuthStage::Refresh, status, &body));
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(format!("auth payload: {e}")))?;
        let token = Token::from_payload(payload, self.options.expiry_margin);
        self.store_token(&token).await?;
        info!("refreshed access token");
        Ok(token)
    }

    /// Persist a token under the fixed cache key: field overwrite,
    /// then absolute expiry. Two calls, not a transaction - the
    /// cold-start path defends against a crash in between.
    async fn store_token(&self, token: &Token) -> Result<(), Error> {
        let key = &self.options.cache_key;
        self.cache.set_fields(key, &token.to_fields()).await?;
        self.cache.expire_at(key, token.expires_at).await?;
        Ok(())
    }

    /// Build a client with the token in its default headers.
    fn build_agent(&self, token: &Token) -> Result<Agent, Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT_VALUE),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let mut value = header::HeaderValue::from_str(&token.access_token)
            .map_err(|_| Error::InvalidResponse("token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTH_HEADER, value);

        let client = Client::builder()
            .timeout(self.options.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Agent {
            client,
            token: token.access_token.clone(),
        })
    }
}
