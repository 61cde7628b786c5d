//! Element resource client (item catalog).

use serde_json::Value;
use tracing::info;

use crate::api::Envelope;
use crate::error::Error;
use crate::session::SessionManager;

/// Client for the `/element` resource family.
pub struct Element<'a> {
    session: &'a SessionManager,
    host: String,
}

impl<'a> Element<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        let host = format!("{}/element", session.config().api_host);
        Self { session, host }
    }

    /// Read one item by id.
    pub async fn item(&self, item_id: i64) -> Result<Envelope, Error> {
        info!(item_id, "get item");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .get(format!("{}/item/{}", self.host, item_id))
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// List items, optionally filtered by query parameters.
    pub async fn items(&self, query: &[(&str, &str)]) -> Result<Envelope, Error> {
        info!("list items");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .get(format!("{}/item", self.host))
            .query(query)
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// Create a new item.
    pub async fn create_item(&self, payload: &Value) -> Result<Envelope, Error> {
        info!("create item");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .post(format!("{}/item", self.host))
            .json(payload)
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// Look an item up by its code.
    pub async fn item_by_code(&self, code: &str) -> Result<Envelope, Error> {
        info!(code, "find item by code");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .get(format!("{}/item/findByCode", self.host))
            .query(&[("code", code)])
            .send()
            .await?;
        Envelope::from_response(response).await
    }
}
