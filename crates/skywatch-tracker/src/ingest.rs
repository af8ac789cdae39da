// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ingest pipeline: one reported location in, one committed ledger entry out.
//!
//! Each report is validated, evaluated against the zone set, and then
//! applied as a single atomic store unit: upsert the source deadline, append
//! the record, queue incursion alerts, migrate aged records. If any step
//! fails nothing is applied; callers retry the entire ingest.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::IncursionEvent;
use crate::geo::GeoPoint;
use crate::persistence::{LocationRecord, TelemetryStore};
use crate::zones::ZoneSet;

/// Ingest pipeline configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// How long a source may stay silent before becoming eligible to be
    /// declared missing.
    pub missing_grace: Duration,
    /// Live records kept per source; older records migrate to the archive.
    pub retain_per_source: i64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            missing_grace: Duration::from_secs(120),
            retain_per_source: 10,
        }
    }
}

/// Result of one committed ingest.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The ledger entry that was appended.
    pub record: LocationRecord,
    /// Incursion alerts queued alongside it, one per violated zone.
    pub incursions: Vec<IncursionEvent>,
    /// Records migrated to the archive by the retention step.
    pub migrated: u64,
}

/// Validates, evaluates and commits location reports.
pub struct IngestPipeline {
    store: Arc<dyn TelemetryStore>,
    zones: Arc<ZoneSet>,
    config: IngestConfig,
}

impl IngestPipeline {
    /// Create a pipeline over a store and a static zone set.
    pub fn new(store: Arc<dyn TelemetryStore>, zones: Arc<ZoneSet>, config: IngestConfig) -> Self {
        Self {
            store,
            zones,
            config,
        }
    }

    /// Ingest a report observed now.
    pub async fn report(
        &self,
        source_id: i64,
        position: GeoPoint,
        speed_mps: f64,
    ) -> Result<IngestOutcome> {
        self.report_at(source_id, position, speed_mps, Utc::now())
            .await
    }

    /// Ingest a report with an explicit observation time.
    pub async fn report_at(
        &self,
        source_id: i64,
        position: GeoPoint,
        speed_mps: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<IngestOutcome> {
        validate(source_id, position, speed_mps)?;

        let incursions: Vec<IncursionEvent> = self
            .zones
            .evaluate(position)
            .into_iter()
            .map(|hit| IncursionEvent {
                source_id,
                event_timestamp: observed_at,
                longitude: position.longitude,
                latitude: position.latitude,
                speed_mps,
                zone_name: hit.zone_name,
                distance_m: hit.distance_m,
            })
            .collect();

        let record = LocationRecord {
            source_id,
            event_timestamp: observed_at,
            longitude: position.longitude,
            latitude: position.latitude,
            speed_mps,
        };

        let deadline = observed_at
            + chrono::Duration::from_std(self.config.missing_grace)
                .map_err(|e| Error::Other(format!("invalid missing_grace: {}", e)))?;

        let migrated = self
            .store
            .report_location(&record, deadline, &incursions, self.config.retain_per_source)
            .await?;

        debug!(
            source_id,
            incursions = incursions.len(),
            migrated,
            "Location report committed"
        );

        Ok(IngestOutcome {
            record,
            incursions,
            migrated,
        })
    }
}

/// Reject malformed reports before any state change.
///
/// Speed has no upper bound: implausibly large values are accepted, not
/// validated.
fn validate(source_id: i64, position: GeoPoint, speed_mps: f64) -> Result<()> {
    if source_id <= 0 {
        return Err(Error::InvalidInput {
            field: "source_id",
            message: format!("must be positive, got {}", source_id),
        });
    }
    if !position.longitude_in_range() {
        return Err(Error::InvalidInput {
            field: "longitude",
            message: format!("must be finite and within [-180, 180], got {}", position.longitude),
        });
    }
    if !position.latitude_in_range() {
        return Err(Error::InvalidInput {
            field: "latitude",
            message: format!("must be finite and within [-90, 90], got {}", position.latitude),
        });
    }
    if !speed_mps.is_finite() || speed_mps < 0.0 {
        return Err(Error::InvalidInput {
            field: "speed_mps",
            message: format!("must be finite and non-negative, got {}", speed_mps),
        });
    }
    Ok(())
}
