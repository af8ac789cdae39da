// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Background worker for declaring silent sources missing.
//!
//! Sources that stop reporting keep an armed `declare_missing_at` deadline
//! in the registry. The sweeper periodically scans for expired deadlines
//! and, for each, atomically disarms the deadline and queues exactly one
//! missing-source alert. A source that reports again re-arms its deadline
//! and becomes eligible to go missing again later.
//!
//! The sweep makes bounded-latency progress rather than running huge
//! backlogs to completion: at most `max_per_pass` sources per cycle, and
//! only deadlines that expired within the stale window are honored.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::persistence::TelemetryStore;

/// Configuration for the missing-source sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to run a sweep pass.
    pub sweep_interval: Duration,
    /// How far past expiry a deadline is still honored. Older expiries are
    /// leftovers of a degraded run and are treated as already handled,
    /// preventing unbounded reprocessing after an outage.
    pub stale_window: Duration,
    /// Upper bound on sources declared missing in one pass.
    pub max_per_pass: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_millis(250),
            stale_window: Duration::from_millis(500),
            max_per_pass: 300,
        }
    }
}

/// Background worker that declares silent sources missing.
pub struct MissingSweeper {
    store: Arc<dyn TelemetryStore>,
    config: SweeperConfig,
    shutdown: Arc<Notify>,
}

impl MissingSweeper {
    /// Create a new sweeper.
    pub fn new(store: Arc<dyn TelemetryStore>, config: SweeperConfig) -> Self {
        Self {
            store,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the sweep loop until shutdown is signalled.
    ///
    /// A failed cycle is logged and skipped; the next cycle retries from
    /// scratch, which is safe because deadlines stay armed until a pass
    /// commits.
    pub async fn run(self) {
        info!(
            sweep_interval_ms = self.config.sweep_interval.as_millis() as u64,
            stale_window_ms = self.config.stale_window.as_millis() as u64,
            max_per_pass = self.config.max_per_pass,
            "Missing-source sweeper started"
        );

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Missing-source sweeper received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.sweep_interval) => {
                    match self.sweep_once().await {
                        Ok(0) => debug!("Sweep pass found no expired deadlines"),
                        Ok(declared) => info!(declared, "Declared silent sources missing"),
                        Err(e) => error!(error = %e, "Sweep pass failed, retrying next cycle"),
                    }
                }
            }
        }

        info!("Missing-source sweeper stopped");
    }

    /// Run one sweep pass against the store.
    ///
    /// Returns the number of sources declared missing. Disarm and emission
    /// commit together, so a given expiry produces at most one alert no
    /// matter how often this is called.
    pub async fn sweep_once(&self) -> Result<u64> {
        let stale_window = chrono::Duration::from_std(self.config.stale_window)
            .map_err(|e| Error::Other(format!("invalid stale_window: {}", e)))?;

        self.store
            .sweep_missing(Utc::now(), stale_window, self.config.max_per_pass)
            .await
    }
}
