// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST client for the UniFi Network integration API.

use crate::types::{ControllerConfig, DeviceDetails, Site, UnifiDevice};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Devices fetched per page. The API accepts 1–100.
const PAGE_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum UnifiError {
    /// Controller entry without a base URL or API key; skipped, never
    /// fatal.
    #[error("controller {0:?} has no base URL or API key")]
    MissingConfig(String),

    #[error("controller returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// The controller surface the engine consumes.
#[async_trait]
pub trait UnifiApi: Send + Sync {
    /// Display name from the controller config.
    fn name(&self) -> &str;

    /// Base URL; the per-job site cache is keyed on this.
    fn base_url(&self) -> &str;

    async fn sites(&self) -> Result<Vec<Site>, UnifiError>;

    async fn devices(&self, site_id: &str) -> Result<Vec<UnifiDevice>, UnifiError>;

    async fn device_details(
        &self,
        site_id: &str,
        device_id: &str,
    ) -> Result<DeviceDetails, UnifiError>;
}

/// Paged response envelope used by the integration API list endpoints.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// reqwest-backed [`UnifiApi`].
#[derive(Debug)]
pub struct HttpUnifiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    name: String,
}

impl HttpUnifiClient {
    pub fn new(config: &ControllerConfig) -> Result<Self, UnifiError> {
        if config.base_url.is_empty() || config.api_key.is_empty() {
            return Err(UnifiError::MissingConfig(config.name.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            name: config.name.clone(),
        })
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        offset: usize,
    ) -> Result<Vec<T>, UnifiError> {
        let url = format!(
            "{}/proxy/network/integrations/v1/{}?limit={}&offset={}",
            self.base_url, path, PAGE_SIZE, offset
        );
        let response = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UnifiError::Api { status: status.as_u16(), body });
        }
        Ok(response.json::<Page<T>>().await?.data)
    }

    async fn get_all<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, UnifiError> {
        let mut out = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.get_page::<T>(path, offset).await?;
            let fetched = page.len();
            out.extend(page);
            if fetched < PAGE_SIZE {
                return Ok(out);
            }
            offset += fetched;
        }
    }
}

#[async_trait]
impl UnifiApi for HttpUnifiClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn sites(&self) -> Result<Vec<Site>, UnifiError> {
        self.get_all("sites").await
    }

    async fn devices(&self, site_id: &str) -> Result<Vec<UnifiDevice>, UnifiError> {
        debug!(controller = self.name, site_id, "listing devices");
        self.get_all(&format!("sites/{}/devices", site_id)).await
    }

    async fn device_details(
        &self,
        site_id: &str,
        device_id: &str,
    ) -> Result<DeviceDetails, UnifiError> {
        let url = format!(
            "{}/proxy/network/integrations/v1/sites/{}/devices/{}",
            self.base_url, site_id, device_id
        );
        let response = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UnifiError::Api { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
