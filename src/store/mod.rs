//! Dashboard store adapter: create/update/get/delete/publish against the
//! remote dashboard hosting platform, plus embed-URL construction. The
//! adapter owns the platform's concurrency token (etag); callers never manage
//! versioning themselves.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::StoreConfig;
use crate::generation::types::DashboardConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(String),
    #[error("store rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("dashboard {id} was created but publishing failed: {message}")]
    PublishFailed { id: String, message: String },
    #[error("store returned an unreadable dashboard definition: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Creates a dashboard definition; returns the platform id.
    async fn create(&self, config: &DashboardConfig, name: &str) -> Result<String, StoreError>;

    /// Replaces the definition of an existing dashboard. Idempotent for the
    /// same config.
    async fn update(&self, id: &str, config: &DashboardConfig) -> Result<String, StoreError>;

    async fn get(&self, id: &str) -> Result<DashboardConfig, StoreError>;

    async fn delete(&self, id: &str) -> Result<(bool, String), StoreError>;

    /// Makes the dashboard available to viewers.
    async fn publish(&self, id: &str) -> Result<(), StoreError>;

    fn embed_url(&self, id: &str) -> String;

    fn dashboard_url(&self, id: &str) -> String;
}

/// HTTP implementation over the platform's Lakeview-style REST API.
pub struct RemoteDashboardStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
    warehouse_id: String,
    parent_path: String,
}

impl RemoteDashboardStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            warehouse_id: config.warehouse_id.clone(),
            parent_path: config.parent_path.clone(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/2.0/lakeview/dashboards{path}", self.base_url)
    }

    async fn check(&self, response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    fn serialize_config(config: &DashboardConfig) -> Result<String, StoreError> {
        serde_json::to_string(config).map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DashboardStore for RemoteDashboardStore {
    async fn create(&self, config: &DashboardConfig, name: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.api(""))
            .bearer_auth(&self.token)
            .json(&json!({
                "display_name": name,
                "warehouse_id": self.warehouse_id,
                "serialized_dashboard": Self::serialize_config(config)?,
                "parent_path": self.parent_path,
            }))
            .send()
            .await?;

        let body = self.check(response).await?;
        body["dashboard_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Malformed("create response missing dashboard_id".into()))
    }

    async fn update(&self, id: &str, config: &DashboardConfig) -> Result<String, StoreError> {
        // The platform requires the current etag on every update; fetch it
        // here so callers stay oblivious to versioning.
        let current = self
            .client
            .get(self.api(&format!("/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let current = self.check(current).await?;
        let etag = current["etag"].as_str().unwrap_or_default();

        let response = self
            .client
            .patch(self.api(&format!("/{id}")))
            .bearer_auth(&self.token)
            .json(&json!({
                "serialized_dashboard": Self::serialize_config(config)?,
                "etag": etag,
            }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(id.to_string())
    }

    async fn get(&self, id: &str) -> Result<DashboardConfig, StoreError> {
        let response = self
            .client
            .get(self.api(&format!("/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = self.check(response).await?;

        let serialized = body["serialized_dashboard"]
            .as_str()
            .ok_or_else(|| StoreError::Malformed("missing serialized_dashboard".into()))?;
        serde_json::from_str(serialized).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(bool, String), StoreError> {
        let response = self
            .client
            .delete(self.api(&format!("/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok((true, format!("Dashboard {id} deleted")))
        } else {
            Ok((false, response.text().await.unwrap_or_default()))
        }
    }

    async fn publish(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.api(&format!("/{id}/published")))
            .bearer_auth(&self.token)
            .json(&json!({"embed_credentials": false}))
            .send()
            .await?;
        self.check(response)
            .await
            .map_err(|e| StoreError::PublishFailed {
                id: id.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn embed_url(&self, id: &str) -> String {
        format!("{}/embed/dashboardsv3/{id}?o=0", self.base_url)
    }

    fn dashboard_url(&self, id: &str) -> String {
        format!("{}/dashboardsv3/{id}", self.base_url)
    }
}
