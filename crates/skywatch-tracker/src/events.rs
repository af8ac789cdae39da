// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Alert event shapes delivered to the export sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reported location intruding into a protected zone.
///
/// One event is emitted per violated zone; a single report inside several
/// overlapping zones produces several events. Queued in the same transaction
/// as the triggering location record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncursionEvent {
    /// The reporting source.
    pub source_id: i64,
    /// When the triggering report was observed.
    pub event_timestamp: DateTime<Utc>,
    /// Reported longitude in degrees.
    pub longitude: f64,
    /// Reported latitude in degrees.
    pub latitude: f64,
    /// Reported speed in metres per second.
    pub speed_mps: f64,
    /// Name of the violated zone.
    pub zone_name: String,
    /// Great-circle distance from the zone center, in metres.
    pub distance_m: f64,
}

/// A source declared missing by the sweeper.
///
/// Carries the source's last known location record. Queued in the same
/// transaction that disarms the source's deadline, so a given expiry emits
/// at most one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingEvent {
    /// The silent source.
    pub source_id: i64,
    /// Timestamp of the last known report.
    pub event_timestamp: DateTime<Utc>,
    /// Last known longitude in degrees.
    pub longitude: f64,
    /// Last known latitude in degrees.
    pub latitude: f64,
    /// Last known speed in metres per second.
    pub speed_mps: f64,
}
