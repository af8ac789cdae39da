// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Skywatch Tracker - Telemetry Ingest and Missing-Source Detection
//!
//! Tracks a large population of mobile reporting sources ("drones"). For
//! each source the tracker:
//!
//! - keeps a bounded window of recent location history, migrating older
//!   records to cold storage inside the same transaction that appends the
//!   new one;
//! - detects reports intruding into protected zones and queues one
//!   incursion alert per violated zone;
//! - declares sources that stop reporting missing, exactly once per expiry,
//!   via a periodic sweep that never races concurrent re-ingests.
//!
//! # Architecture
//!
//! ```text
//! reporters ──► HTTP ──► IngestPipeline ──► TelemetryStore ──► incursion_outbox
//!                                             │    ▲                │
//!                                  (registry, ledger, archive)      │
//!                                             │    │                ▼
//!                        MissingSweeper ──────┘    └───────── ExportRelay ──► AlertSink
//!                        (disarm + queue               (deliver, then confirm)
//!                         missing_outbox)
//! ```
//!
//! Correctness never relies on in-process locks: every multi-step operation
//! (ingest, sweep pass, outbox confirm) is a single database transaction,
//! so an observer never sees a location record without its refreshed
//! deadline, nor a disarmed deadline without its committed missing alert.
//! Operations on different sources are fully independent.
//!
//! # Backends
//!
//! The [`persistence::TelemetryStore`] trait has two backends: PostgreSQL
//! for production and SQLite for embedded deployments and hermetic tests.
//! Both require only primary-key and index support plus multi-statement
//! transactions.
//!
//! # Modules
//!
//! - [`config`]: Server configuration from environment variables
//! - [`error`]: Error types, separating invalid input from transient failure
//! - [`events`]: Alert event shapes delivered to the sink
//! - [`export_relay`]: Background worker draining alert outboxes
//! - [`geo`]: Coordinate primitives and great-circle distance
//! - [`http`]: HTTP ingest surface
//! - [`ingest`]: The ingest pipeline
//! - [`migrations`]: Embedded schema migrations
//! - [`persistence`]: Telemetry store trait and backends
//! - [`sink`]: Alert sink backends (JSONL file, in-memory)
//! - [`sweeper`]: Background worker declaring silent sources missing
//! - [`zones`]: Protected zones and geofence evaluation

#![deny(missing_docs)]

/// Server configuration loaded from environment variables.
pub mod config;

/// Error types for tracker operations.
pub mod error;

/// Alert event shapes delivered to the export sink.
pub mod events;

/// Background worker draining the alert outboxes to the sink.
pub mod export_relay;

/// Geographic primitives and great-circle distance.
pub mod geo;

/// HTTP ingest surface.
pub mod http;

/// Ingest pipeline: validation, geofence evaluation, atomic commit.
pub mod ingest;

/// Embedded database migrations.
pub mod migrations;

/// Telemetry store trait and database backends.
pub mod persistence;

/// Alert sink backends.
pub mod sink;

/// Background worker declaring silent sources missing.
pub mod sweeper;

/// Protected zones and geofence evaluation.
pub mod zones;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{IncursionEvent, MissingEvent};
pub use export_relay::{ExportRelay, ExportRelayConfig};
pub use geo::GeoPoint;
pub use ingest::{IngestConfig, IngestOutcome, IngestPipeline};
pub use persistence::{PostgresStore, SqliteStore, TelemetryStore};
pub use sink::{AlertSink, JsonlAlertSink, MemoryAlertSink};
pub use sweeper::{MissingSweeper, SweeperConfig};
pub use zones::{ProtectedZone, ZoneSet};
