// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory controller double for engine tests.

use crate::client::{UnifiApi, UnifiError};
use crate::types::{DeviceDetails, Site, UnifiDevice};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Default)]
pub struct MockUnifiApi {
    name: String,
    base_url: String,
    sites: Vec<Site>,
    devices: HashMap<String, Vec<UnifiDevice>>,
    details: HashMap<String, DeviceDetails>,
    fail_sites: bool,
}

impl MockUnifiApi {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            base_url: format!("https://{}.example.net", name),
            name,
            ..Default::default()
        }
    }

    pub fn with_site(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.sites.push(Site { id: id.clone(), name: id });
        self
    }

    pub fn with_device(mut self, site_id: impl Into<String>, device: UnifiDevice) -> Self {
        self.devices.entry(site_id.into()).or_default().push(device);
        self
    }

    pub fn with_details(mut self, details: DeviceDetails) -> Self {
        self.details.insert(details.id.clone(), details);
        self
    }

    pub fn fail_sites(mut self) -> Self {
        self.fail_sites = true;
        self
    }
}

#[async_trait]
impl UnifiApi for MockUnifiApi {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn sites(&self) -> Result<Vec<Site>, UnifiError> {
        if self.fail_sites {
            return Err(UnifiError::Api { status: 500, body: "boom".to_string() });
        }
        Ok(self.sites.clone())
    }

    async fn devices(&self, site_id: &str) -> Result<Vec<UnifiDevice>, UnifiError> {
        Ok(self.devices.get(site_id).cloned().unwrap_or_default())
    }

    async fn device_details(
        &self,
        site_id: &str,
        device_id: &str,
    ) -> Result<DeviceDetails, UnifiError> {
        let _ = site_id;
        self.details.get(device_id).cloned().ok_or(UnifiError::Api {
            status: 404,
            body: format!("no such device: {}", device_id),
        })
    }
}
