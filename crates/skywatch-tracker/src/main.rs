// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Skywatch Tracker - service binary.
//!
//! Wires configuration, store, zones, background workers and the HTTP
//! ingest surface together, then runs until ctrl-c.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};

use skywatch_tracker::config::Config;
use skywatch_tracker::export_relay::{ExportRelay, ExportRelayConfig};
use skywatch_tracker::http::{self, AppState};
use skywatch_tracker::ingest::{IngestConfig, IngestPipeline};
use skywatch_tracker::persistence::{PostgresStore, SqliteStore, TelemetryStore};
use skywatch_tracker::sink::{AlertSink, JsonlAlertSink};
use skywatch_tracker::sweeper::{MissingSweeper, SweeperConfig};
use skywatch_tracker::migrations;
use skywatch_tracker::zones::ZoneSet;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skywatch_tracker=info".into()),
        )
        .init();

    info!("Starting Skywatch Tracker");

    let config = Config::from_env()?;

    info!(
        http_addr = %config.http_addr,
        retain_per_source = config.retain_per_source,
        missing_grace_secs = config.missing_grace.as_secs(),
        "Configuration loaded"
    );

    // Connect to the store; the URL scheme picks the backend.
    let store: Arc<dyn TelemetryStore> = if config.database_url.starts_with("sqlite") {
        let options = sqlx::sqlite::SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        migrations::run_sqlite(&pool).await?;
        Arc::new(SqliteStore::new(pool))
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;
        migrations::run_postgres(&pool).await?;
        Arc::new(PostgresStore::new(pool))
    };

    store.health_check().await?;
    info!("Database ready");

    // Protected zones are reference data: a bad file degrades to no zones
    // rather than blocking location tracking.
    let zones = match &config.zones_path {
        Some(path) => match ZoneSet::from_json_file(path) {
            Ok(zones) => {
                info!(zones = zones.len(), path = %path.display(), "Loaded protected zones");
                zones
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(),
                    "Failed to load protected zones, incursion detection disabled");
                ZoneSet::empty()
            }
        },
        None => {
            let zones = ZoneSet::reference();
            info!(zones = zones.len(), "Using built-in reference zones");
            zones
        }
    };

    let pipeline = Arc::new(IngestPipeline::new(
        store.clone(),
        Arc::new(zones),
        IngestConfig {
            missing_grace: config.missing_grace,
            retain_per_source: config.retain_per_source,
        },
    ));

    let sink: Arc<dyn AlertSink> = Arc::new(JsonlAlertSink::open(&config.alert_log_path).await?);
    info!(path = %config.alert_log_path.display(), "Alert sink ready");

    // Background workers: the sweeper declares silent sources missing, the
    // relay exports queued alerts.
    let sweeper = MissingSweeper::new(
        store.clone(),
        SweeperConfig {
            sweep_interval: config.sweep_interval,
            stale_window: config.stale_window,
            max_per_pass: config.sweep_max_per_pass,
        },
    );
    let sweeper_shutdown = sweeper.shutdown_handle();
    let sweeper_handle = tokio::spawn(sweeper.run());

    let relay = ExportRelay::new(
        store.clone(),
        sink,
        ExportRelayConfig {
            poll_interval: config.export_interval,
            batch_size: config.export_batch_size,
        },
    );
    let relay_shutdown = relay.shutdown_handle();
    let relay_handle = tokio::spawn(relay.run());

    let app = http::router(AppState {
        pipeline,
        store: store.clone(),
    });
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "HTTP ingest surface ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Shutdown signal received");

    sweeper_shutdown.notify_one();
    relay_shutdown.notify_one();
    sweeper_handle.await.ok();
    relay_handle.await.ok();

    info!("Skywatch Tracker shut down");

    Ok(())
}
