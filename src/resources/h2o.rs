//! H2o resource client (customers and orders).

use serde_json::Value;
use tracing::info;

use crate::api::Envelope;
use crate::error::Error;
use crate::session::SessionManager;

/// Client for the `/h2o` resource family.
pub struct H2o<'a> {
    session: &'a SessionManager,
    host: String,
}

impl<'a> H2o<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        let host = format!("{}/h2o", session.config().api_host);
        Self { session, host }
    }

    /// Read one customer by id.
    pub async fn customer(&self, customer_id: i64) -> Result<Envelope, Error> {
        info!(customer_id, "get customer");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .get(format!("{}/customer/{}", self.host, customer_id))
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// List customers, optionally filtered by query parameters.
    pub async fn customers(&self, query: &[(&str, &str)]) -> Result<Envelope, Error> {
        info!("list customers");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .get(format!("{}/customer", self.host))
            .query(query)
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// Create a new customer.
    pub async fn create_customer(&self, payload: &Value) -> Result<Envelope, Error> {
        info!("create customer");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .post(format!("{}/customer", self.host))
            .json(payload)
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// Read one order by id.
    pub async fn order(&self, order_id: i64) -> Result<Envelope, Error> {
        info!(order_id, "get order");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .get(format!("{}/order/{}", self.host, order_id))
            .send()
            .await?;
        Envelope::from_response(response).await
    }

    /// Create a new order.
    pub async fn create_order(&self, payload: &Value) -> Result<Envelope, Error> {
        info!("create order");
        let agent = self.session.agent().await?;
        let response = agent
            .client()
            .post(format!("{}/order", self.host))
            .json(payload)
            .send()
            .await?;
        Envelope::from_response(response).await
    }
}
