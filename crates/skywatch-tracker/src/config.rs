// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for skywatch-tracker, loaded from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Tracker configuration.
///
/// | Variable | Required | Default | Description |
/// |----------|----------|---------|-------------|
/// | `SKYWATCH_DATABASE_URL` | Yes | - | PostgreSQL or SQLite connection string |
/// | `SKYWATCH_HTTP_PORT` | No | `8080` | HTTP ingest port |
/// | `SKYWATCH_ZONES_PATH` | No | built-in set | JSON file with protected zones |
/// | `SKYWATCH_RETAIN_PER_SOURCE` | No | `10` | Live records kept per source |
/// | `SKYWATCH_MISSING_GRACE_SECS` | No | `120` | Silence before missing-eligibility |
/// | `SKYWATCH_SWEEP_INTERVAL_MS` | No | `250` | Sweeper period |
/// | `SKYWATCH_STALE_WINDOW_MS` | No | `500` | How far past expiry a deadline is honored |
/// | `SKYWATCH_SWEEP_MAX_PER_PASS` | No | `300` | Sources declared missing per pass |
/// | `SKYWATCH_EXPORT_INTERVAL_MS` | No | `500` | Export relay period |
/// | `SKYWATCH_EXPORT_BATCH_SIZE` | No | `200` | Alerts drained per relay poll |
/// | `SKYWATCH_ALERT_LOG_PATH` | No | `.data/alerts.jsonl` | JSONL alert sink path |
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL or SQLite connection URL.
    pub database_url: String,
    /// HTTP server address for the ingest surface.
    pub http_addr: SocketAddr,
    /// Optional JSON file with protected zones; the built-in reference set
    /// is used when unset.
    pub zones_path: Option<PathBuf>,
    /// Live records kept per source before migration (K).
    pub retain_per_source: i64,
    /// How long a source may stay silent before missing-eligibility.
    pub missing_grace: Duration,
    /// Sweeper period.
    pub sweep_interval: Duration,
    /// How far past expiry a deadline is still honored by a sweep.
    pub stale_window: Duration,
    /// Upper bound on sources declared missing per sweep pass.
    pub sweep_max_per_pass: i64,
    /// Export relay poll period.
    pub export_interval: Duration,
    /// Alerts drained from each outbox per relay poll.
    pub export_batch_size: i64,
    /// Path of the JSONL alert sink file.
    pub alert_log_path: PathBuf,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("SKYWATCH_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("SKYWATCH_DATABASE_URL"))?;

        let http_port: u16 = std::env::var("SKYWATCH_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SKYWATCH_HTTP_PORT", "must be a valid port"))?;

        let zones_path = std::env::var("SKYWATCH_ZONES_PATH").ok().map(PathBuf::from);

        let alert_log_path = PathBuf::from(
            std::env::var("SKYWATCH_ALERT_LOG_PATH")
                .unwrap_or_else(|_| ".data/alerts.jsonl".to_string()),
        );

        Ok(Self {
            database_url,
            http_addr: SocketAddr::from(([0, 0, 0, 0], http_port)),
            zones_path,
            retain_per_source: env_or("SKYWATCH_RETAIN_PER_SOURCE", 10),
            missing_grace: Duration::from_secs(env_or("SKYWATCH_MISSING_GRACE_SECS", 120)),
            sweep_interval: Duration::from_millis(env_or("SKYWATCH_SWEEP_INTERVAL_MS", 250)),
            stale_window: Duration::from_millis(env_or("SKYWATCH_STALE_WINDOW_MS", 500)),
            sweep_max_per_pass: env_or("SKYWATCH_SWEEP_MAX_PER_PASS", 300),
            export_interval: Duration::from_millis(env_or("SKYWATCH_EXPORT_INTERVAL_MS", 500)),
            export_batch_size: env_or("SKYWATCH_EXPORT_BATCH_SIZE", 200),
            alert_log_path,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
