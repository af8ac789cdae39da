//! SQLite-backed telemetry store.
//!
//! Used for embedded deployments and hermetic tests. Timestamps are stored
//! as UTC text; the encoding compares chronologically, so the deadline and
//! retention window scans behave exactly as on PostgreSQL.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::Result;
use crate::events::{IncursionEvent, MissingEvent};

use super::{LocationRecord, SourceRecord, StoreStatus, TelemetryStore};

/// SQLite-backed telemetry store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store from an existing pool. Migrations must already have
    /// been applied.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and initialize a store from a database file path.
    ///
    /// Creates parent directories and the database file if needed, connects,
    /// and runs all migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new().max_connections(5).connect(&url).await?;

        crate::migrations::run_sqlite(&pool).await?;
        Ok(Self { pool })
    }

    /// Create and initialize an in-memory store.
    ///
    /// The pool is capped at one connection: each SQLite `:memory:`
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        crate::migrations::run_sqlite(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl TelemetryStore for SqliteStore {
    async fn report_location(
        &self,
        record: &LocationRecord,
        deadline: DateTime<Utc>,
        incursions: &[IncursionEvent],
        retain: i64,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sources (source_id, declare_missing_at)
            VALUES (?, ?)
            ON CONFLICT (source_id) DO UPDATE SET declare_missing_at = excluded.declare_missing_at
            "#,
        )
        .bind(record.source_id)
        .bind(deadline)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO location_records (source_id, event_timestamp, longitude, latitude, speed_mps)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.source_id)
        .bind(record.event_timestamp)
        .bind(record.longitude)
        .bind(record.latitude)
        .bind(record.speed_mps)
        .execute(&mut *tx)
        .await?;

        for incursion in incursions {
            sqlx::query(
                r#"
                INSERT INTO incursion_outbox
                    (source_id, event_timestamp, longitude, latitude, speed_mps, zone_name, distance_m)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(incursion.source_id)
            .bind(incursion.event_timestamp)
            .bind(incursion.longitude)
            .bind(incursion.latitude)
            .bind(incursion.speed_mps)
            .bind(&incursion.zone_name)
            .bind(incursion.distance_m)
            .execute(&mut *tx)
            .await?;
        }

        // Retention boundary: the row just past the window, counting the
        // record inserted above. No row there means the ledger still fits.
        let boundary: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT event_timestamp FROM location_records
            WHERE source_id = ?
            ORDER BY event_timestamp DESC
            LIMIT 1 OFFSET ?
            "#,
        )
        .bind(record.source_id)
        .bind(retain)
        .fetch_optional(&mut *tx)
        .await?;

        let mut migrated = 0u64;
        if let Some(boundary) = boundary {
            sqlx::query(
                r#"
                INSERT INTO location_archive
                    (source_id, event_timestamp, longitude, latitude, speed_mps, archived_at)
                SELECT source_id, event_timestamp, longitude, latitude, speed_mps, ?
                FROM location_records
                WHERE source_id = ? AND event_timestamp <= ?
                "#,
            )
            .bind(record.event_timestamp)
            .bind(record.source_id)
            .bind(boundary)
            .execute(&mut *tx)
            .await?;

            migrated = sqlx::query(
                "DELETE FROM location_records WHERE source_id = ? AND event_timestamp <= ?",
            )
            .bind(record.source_id)
            .bind(boundary)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(migrated)
    }

    async fn sweep_missing(
        &self,
        horizon: DateTime<Utc>,
        stale_window: Duration,
        max_per_pass: i64,
    ) -> Result<u64> {
        let window_start = horizon - stale_window;
        let mut tx = self.pool.begin().await?;

        // Cheap probe: the newest expired deadline. Nothing expired, or only
        // abandoned leftovers older than the window, means a no-op pass.
        let newest_expired: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(declare_missing_at) FROM sources WHERE declare_missing_at <= ?")
                .bind(horizon)
                .fetch_one(&mut *tx)
                .await?;

        let Some(newest_expired) = newest_expired else {
            return Ok(0);
        };
        if newest_expired <= window_start {
            return Ok(0);
        }

        let candidates: Vec<(i64, DateTime<Utc>, f64, f64, f64)> = sqlx::query_as(
            r#"
            SELECT s.source_id, l.event_timestamp, l.longitude, l.latitude, l.speed_mps
            FROM sources s
            JOIN location_records l ON l.source_id = s.source_id
            WHERE s.declare_missing_at > ? AND s.declare_missing_at <= ?
              AND l.event_timestamp =
                  (SELECT MAX(event_timestamp) FROM location_records WHERE source_id = s.source_id)
            ORDER BY s.source_id
            LIMIT ?
            "#,
        )
        .bind(window_start)
        .bind(horizon)
        .bind(max_per_pass)
        .fetch_all(&mut *tx)
        .await?;

        for (source_id, event_timestamp, longitude, latitude, speed_mps) in &candidates {
            sqlx::query("UPDATE sources SET declare_missing_at = NULL WHERE source_id = ?")
                .bind(source_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO missing_outbox (source_id, event_timestamp, longitude, latitude, speed_mps)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(source_id)
            .bind(event_timestamp)
            .bind(longitude)
            .bind(latitude)
            .bind(speed_mps)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(candidates.len() as u64)
    }

    async fn get_source(&self, source_id: i64) -> Result<Option<SourceRecord>> {
        let record = sqlx::query_as::<_, SourceRecord>(
            "SELECT source_id, declare_missing_at FROM sources WHERE source_id = ?",
        )
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn live_history(&self, source_id: i64, limit: i64) -> Result<Vec<LocationRecord>> {
        let records = sqlx::query_as::<_, LocationRecord>(
            r#"
            SELECT source_id, event_timestamp, longitude, latitude, speed_mps
            FROM location_records
            WHERE source_id = ?
            ORDER BY event_timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(source_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn archived_count(&self, source_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM location_archive WHERE source_id = ?")
                .bind(source_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn pending_incursions(&self, limit: i64) -> Result<Vec<(i64, IncursionEvent)>> {
        let rows: Vec<(i64, i64, DateTime<Utc>, f64, f64, f64, String, f64)> = sqlx::query_as(
            r#"
            SELECT id, source_id, event_timestamp, longitude, latitude, speed_mps, zone_name, distance_m
            FROM incursion_outbox
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, source_id, event_timestamp, longitude, latitude, speed_mps, zone_name, distance_m)| {
                    (
                        id,
                        IncursionEvent {
                            source_id,
                            event_timestamp,
                            longitude,
                            latitude,
                            speed_mps,
                            zone_name,
                            distance_m,
                        },
                    )
                },
            )
            .collect())
    }

    async fn confirm_incursions(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM incursion_outbox WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn pending_missing(&self, limit: i64) -> Result<Vec<(i64, MissingEvent)>> {
        let rows: Vec<(i64, i64, DateTime<Utc>, f64, f64, f64)> = sqlx::query_as(
            r#"
            SELECT id, source_id, event_timestamp, longitude, latitude, speed_mps
            FROM missing_outbox
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, source_id, event_timestamp, longitude, latitude, speed_mps)| {
                (
                    id,
                    MissingEvent {
                        source_id,
                        event_timestamp,
                        longitude,
                        latitude,
                        speed_mps,
                    },
                )
            })
            .collect())
    }

    async fn confirm_missing(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM missing_outbox WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn status(&self) -> Result<StoreStatus> {
        let armed_sources: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sources WHERE declare_missing_at IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        let live_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM location_records")
            .fetch_one(&self.pool)
            .await?;
        let pending_incursions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM incursion_outbox")
            .fetch_one(&self.pool)
            .await?;
        let pending_missing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM missing_outbox")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStatus {
            armed_sources,
            live_records,
            pending_incursions,
            pending_missing,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let result: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == 1)
    }
}
