// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL sink: one file per stream, one record per line.

use crate::{PublishError, Publisher, StreamConfig};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use sweep_core::{Clock, DiscoveredDevice, DiscoveredInterface, SystemClock, TopologyLink};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Wire envelope: every record carries its origin and a timestamp.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    agent_id: &'a str,
    poller_id: &'a str,
    partition: &'a str,
    timestamp_ms: u64,
    #[serde(flatten)]
    record: &'a T,
}

/// File-backed [`Publisher`]. Streams map to `<dir>/<stream>.jsonl`.
pub struct JsonlSink {
    dir: PathBuf,
    config: StreamConfig,
    clock: SystemClock,
}

impl JsonlSink {
    pub fn new(dir: impl Into<PathBuf>, config: StreamConfig) -> Self {
        Self { dir: dir.into(), config, clock: SystemClock }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn stream_path(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", stream))
    }

    fn encode<T: Serialize>(&self, record: &T) -> Result<String, PublishError> {
        let envelope = Envelope {
            agent_id: &self.config.agent_id,
            poller_id: &self.config.poller_id,
            partition: &self.config.partition,
            timestamp_ms: self.clock.epoch_ms(),
            record,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Append lines, retrying the whole chunk on I/O failure.
    async fn append(&self, path: &Path, lines: &[String]) -> Result<(), PublishError> {
        let mut payload = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            payload.push_str(line);
            payload.push('\n');
        }

        let mut last_err: Option<std::io::Error> = None;
        for attempt in 0..=self.config.publish_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.publish_retry_interval).await;
            }
            match self.try_append(path, payload.as_bytes()).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(path = %path.display(), attempt, error = %e, "stream append failed");
                    last_err = Some(e);
                }
            }
        }
        Err(PublishError::Io(last_err.unwrap_or_else(|| {
            std::io::Error::from(std::io::ErrorKind::Other)
        })))
    }

    async fn try_append(&self, path: &Path, payload: &[u8]) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(payload).await?;
        file.flush().await?;
        Ok(())
    }

    async fn publish_batch<T: Serialize + Sync>(
        &self,
        stream: &str,
        records: &[T],
    ) -> Result<(), PublishError> {
        let path = self.stream_path(stream);
        let batch = self.config.publish_batch_size.max(1);
        for chunk in records.chunks(batch) {
            let lines: Result<Vec<String>, PublishError> =
                chunk.iter().map(|r| self.encode(r)).collect();
            self.append(&path, &lines?).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for JsonlSink {
    async fn publish_device(&self, device: &DiscoveredDevice) -> Result<(), PublishError> {
        let line = self.encode(device)?;
        self.append(&self.stream_path(&self.config.device_stream), &[line]).await
    }

    async fn publish_interface(
        &self,
        interface: &DiscoveredInterface,
    ) -> Result<(), PublishError> {
        let line = self.encode(interface)?;
        self.append(&self.stream_path(&self.config.interface_stream), &[line]).await
    }

    async fn publish_link(&self, link: &TopologyLink) -> Result<(), PublishError> {
        let line = self.encode(link)?;
        self.append(&self.stream_path(&self.config.topology_stream), &[line]).await
    }

    async fn publish_devices(&self, devices: &[DiscoveredDevice]) -> Result<(), PublishError> {
        self.publish_batch(&self.config.device_stream, devices).await
    }

    async fn publish_interfaces(
        &self,
        interfaces: &[DiscoveredInterface],
    ) -> Result<(), PublishError> {
        self.publish_batch(&self.config.interface_stream, interfaces).await
    }

    async fn publish_links(&self, links: &[TopologyLink]) -> Result<(), PublishError> {
        self.publish_batch(&self.config.topology_stream, links).await
    }
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
