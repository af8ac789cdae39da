// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Protected zones and geofence evaluation.
//!
//! Zones are static reference data: loaded once at startup, read-only
//! afterwards. Evaluation is a pure function of the zone set and a position;
//! it has no failure modes because malformed positions are rejected by the
//! ingest validator before evaluation runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{GeoPoint, haversine_distance_m};

/// A named circular region that reporting sources must stay out of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedZone {
    /// Unique zone name.
    pub name: String,
    /// Zone center.
    pub center: GeoPoint,
    /// Exclusion radius in metres. Always positive.
    pub radius_m: f64,
}

/// A zone violated by a reported position.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneHit {
    /// Name of the violated zone.
    pub zone_name: String,
    /// Great-circle distance from the zone center, in metres. Always
    /// strictly less than the zone radius.
    pub distance_m: f64,
}

/// An immutable set of protected zones.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<ProtectedZone>,
}

impl ZoneSet {
    /// Build a zone set from already-validated zones.
    pub fn new(zones: Vec<ProtectedZone>) -> Self {
        Self { zones }
    }

    /// A zone set with no zones. Evaluation always returns no hits,
    /// degrading incursion detection to a no-op.
    pub fn empty() -> Self {
        Self { zones: Vec::new() }
    }

    /// The built-in reference deployment: three zones around London
    /// landmarks.
    pub fn reference() -> Self {
        Self::new(vec![
            ProtectedZone {
                name: "Buckingham Palace".to_string(),
                center: GeoPoint::new(-0.1436013, 51.5013606),
                radius_m: 150.0,
            },
            ProtectedZone {
                name: "10 Downing St".to_string(),
                center: GeoPoint::new(-0.1298188, 51.5033668),
                radius_m: 200.0,
            },
            ProtectedZone {
                name: "Parliament".to_string(),
                center: GeoPoint::new(-0.1276976, 51.4997138),
                radius_m: 500.0,
            },
        ])
    }

    /// Load a zone set from a JSON file holding an array of zones.
    ///
    /// Fails with [`Error::ZoneLookup`] if the file cannot be read, parsed,
    /// or contains an invalid zone. Callers treat that as "no zones" so a
    /// bad reference file never blocks location tracking.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ZoneLookup(format!("failed to read {}: {}", path.display(), e)))?;
        let zones: Vec<ProtectedZone> = serde_json::from_str(&raw)
            .map_err(|e| Error::ZoneLookup(format!("failed to parse {}: {}", path.display(), e)))?;

        for zone in &zones {
            if zone.name.is_empty() {
                return Err(Error::ZoneLookup("zone with empty name".to_string()));
            }
            if !zone.center.is_valid() {
                return Err(Error::ZoneLookup(format!(
                    "zone '{}' has an invalid center {}",
                    zone.name, zone.center
                )));
            }
            if !zone.radius_m.is_finite() || zone.radius_m <= 0.0 {
                return Err(Error::ZoneLookup(format!(
                    "zone '{}' has a non-positive radius {}",
                    zone.name, zone.radius_m
                )));
            }
        }

        debug!(zones = zones.len(), path = %path.display(), "Loaded protected zones");
        Ok(Self::new(zones))
    }

    /// Evaluate a position against every zone.
    ///
    /// Returns one hit per zone whose great-circle distance to the position
    /// is strictly less than its radius; zero, one, or many per position.
    pub fn evaluate(&self, position: GeoPoint) -> Vec<ZoneHit> {
        self.zones
            .iter()
            .filter_map(|zone| {
                let distance_m = haversine_distance_m(zone.center, position);
                (distance_m < zone.radius_m).then(|| ZoneHit {
                    zone_name: zone.name.clone(),
                    distance_m,
                })
            })
            .collect()
    }

    /// Number of zones in the set.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the set holds no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
