//! Persistence interfaces and backends for the telemetry store.
//!
//! The store owns the source registry, the live location ledger, the cold
//! archive, and the two alert outboxes. Every multi-step operation executes
//! inside a single database transaction: no partial state is ever visible,
//! and a failure rolls the whole unit back.

pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::events::{IncursionEvent, MissingEvent};

/// A tracked source row from the registry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SourceRecord {
    /// Stable caller-supplied identity.
    pub source_id: i64,
    /// When the source becomes eligible to be declared missing. `None`
    /// means the sweeper already declared it, or it has never reported.
    pub declare_missing_at: Option<DateTime<Utc>>,
}

/// One reported location in the live ledger.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LocationRecord {
    /// The reporting source.
    pub source_id: i64,
    /// When the report was observed. Part of the primary key.
    pub event_timestamp: DateTime<Utc>,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Speed in metres per second.
    pub speed_mps: f64,
}

/// Aggregate counters for the status surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStatus {
    /// Sources with an armed missing-deadline.
    pub armed_sources: i64,
    /// Records in the live ledger across all sources.
    pub live_records: i64,
    /// Incursion alerts awaiting export.
    pub pending_incursions: i64,
    /// Missing-source alerts awaiting export.
    pub pending_missing: i64,
}

/// Transactional telemetry store used by the ingest pipeline, the sweeper,
/// and the export relay.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Ingest one location report as a single atomic unit:
    ///
    /// 1. upsert the source with the given deadline,
    /// 2. append `record` to the live ledger,
    /// 3. queue one incursion alert per entry in `incursions`,
    /// 4. move every record older than the retention window of `retain`
    ///    entries into the archive.
    ///
    /// Returns the number of records migrated to the archive. On error
    /// nothing is applied and the caller retries the entire ingest.
    async fn report_location(
        &self,
        record: &LocationRecord,
        deadline: DateTime<Utc>,
        incursions: &[IncursionEvent],
        retain: i64,
    ) -> Result<u64>;

    /// Declare silent sources missing, as a single atomic unit.
    ///
    /// Selects up to `max_per_pass` sources whose deadline falls in the
    /// half-open window `(horizon - stale_window, horizon]`, and for each
    /// clears the deadline and queues one missing alert carrying the
    /// source's last known location. Deadlines older than the window are
    /// left alone: they are leftovers of a degraded run and are treated as
    /// already handled.
    ///
    /// Returns the number of sources declared missing this pass.
    async fn sweep_missing(
        &self,
        horizon: DateTime<Utc>,
        stale_window: Duration,
        max_per_pass: i64,
    ) -> Result<u64>;

    /// Fetch one source row from the registry.
    async fn get_source(&self, source_id: i64) -> Result<Option<SourceRecord>>;

    /// Live ledger entries for a source, newest first.
    async fn live_history(&self, source_id: i64, limit: i64) -> Result<Vec<LocationRecord>>;

    /// Number of records migrated to the archive for a source.
    async fn archived_count(&self, source_id: i64) -> Result<i64>;

    /// Incursion alerts awaiting export, in queue order, with their queue
    /// ids. Rows stay queued until confirmed.
    async fn pending_incursions(&self, limit: i64) -> Result<Vec<(i64, IncursionEvent)>>;

    /// Delete delivered incursion alerts from the queue.
    async fn confirm_incursions(&self, ids: &[i64]) -> Result<()>;

    /// Missing-source alerts awaiting export, in queue order, with their
    /// queue ids.
    async fn pending_missing(&self, limit: i64) -> Result<Vec<(i64, MissingEvent)>>;

    /// Delete delivered missing-source alerts from the queue.
    async fn confirm_missing(&self, ids: &[i64]) -> Result<()>;

    /// Aggregate counters for the status surface.
    async fn status(&self) -> Result<StoreStatus>;

    /// Cheap connectivity probe.
    async fn health_check(&self) -> Result<bool>;
}
