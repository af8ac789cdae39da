// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Background worker draining the alert outboxes to the export sink.
//!
//! Alerts are queued transactionally by ingest (incursions) and by the
//! sweeper (missing sources). The relay delivers each queued row to the
//! sink first and deletes it afterwards, so delivery is at-least-once: a
//! crash between the two re-delivers on the next poll. A sink failure
//! leaves the row queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::persistence::TelemetryStore;
use crate::sink::AlertSink;

/// Configuration for the export relay.
#[derive(Debug, Clone)]
pub struct ExportRelayConfig {
    /// How often to poll the outboxes.
    pub poll_interval: Duration,
    /// Maximum alerts drained from each outbox per poll.
    pub batch_size: i64,
}

impl Default for ExportRelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 200,
        }
    }
}

/// Background worker that drains queued alerts to the sink.
pub struct ExportRelay {
    store: Arc<dyn TelemetryStore>,
    sink: Arc<dyn AlertSink>,
    config: ExportRelayConfig,
    shutdown: Arc<Notify>,
}

impl ExportRelay {
    /// Create a new relay.
    pub fn new(
        store: Arc<dyn TelemetryStore>,
        sink: Arc<dyn AlertSink>,
        config: ExportRelayConfig,
    ) -> Self {
        Self {
            store,
            sink,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the relay loop until shutdown is signalled.
    pub async fn run(self) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "Export relay started"
        );

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Export relay received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    match self.drain_once().await {
                        Ok(0) => debug!("No queued alerts to export"),
                        Ok(delivered) => debug!(delivered, "Exported queued alerts"),
                        Err(e) => error!(error = %e, "Export poll failed, retrying next cycle"),
                    }
                }
            }
        }

        info!("Export relay stopped");
    }

    /// Drain one batch from each outbox.
    ///
    /// Returns the number of alerts delivered and confirmed. Undeliverable
    /// alerts stay queued for the next poll.
    pub async fn drain_once(&self) -> Result<u64> {
        let mut delivered = 0u64;

        let incursions = self.store.pending_incursions(self.config.batch_size).await?;
        let mut confirmed = Vec::with_capacity(incursions.len());
        for (id, event) in &incursions {
            match self.sink.deliver_incursion(event).await {
                Ok(()) => confirmed.push(*id),
                Err(e) => {
                    warn!(id, source_id = event.source_id, error = %e,
                        "Failed to deliver incursion alert, leaving queued");
                    break;
                }
            }
        }
        if !confirmed.is_empty() {
            self.store.confirm_incursions(&confirmed).await?;
            delivered += confirmed.len() as u64;
        }

        let missing = self.store.pending_missing(self.config.batch_size).await?;
        let mut confirmed = Vec::with_capacity(missing.len());
        for (id, event) in &missing {
            match self.sink.deliver_missing(event).await {
                Ok(()) => confirmed.push(*id),
                Err(e) => {
                    warn!(id, source_id = event.source_id, error = %e,
                        "Failed to deliver missing-source alert, leaving queued");
                    break;
                }
            }
        }
        if !confirmed.is_empty() {
            self.store.confirm_missing(&confirmed).await?;
            delivered += confirmed.len() as u64;
        }

        Ok(delivered)
    }
}
