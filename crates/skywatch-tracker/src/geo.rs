// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Geographic primitives: coordinate pairs and great-circle distance.
//!
//! Positions span arbitrary latitude/longitude ranges, so distances use the
//! haversine formula over a mean-radius sphere rather than a planar
//! approximation.

use serde::{Deserialize, Serialize};

/// IUGG mean Earth radius, in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic position in degrees, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees, [-180, 180].
    pub longitude: f64,
    /// Latitude in degrees, [-90, 90].
    pub latitude: f64,
}

impl GeoPoint {
    /// Create a point from longitude and latitude in degrees.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Whether the longitude is finite and within [-180, 180].
    pub fn longitude_in_range(&self) -> bool {
        self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Whether the latitude is finite and within [-90, 90].
    pub fn latitude_in_range(&self) -> bool {
        self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Whether both coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.longitude_in_range() && self.latitude_in_range()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}

/// Great-circle distance between two points, in metres.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
