// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Distance and bearing helpers for placing aircraft relative to a receiver.
//!
//! All positions are in decimal degrees. Distances are in meters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Width of one bearing sector in degrees (16 sectors per turn).
pub const SECTOR_WIDTH_DEGREES: f64 = 22.5;

/// The 16 bearing sector labels, clockwise from north.
pub const BEARING_SECTORS: [&str; 16] = [
    "0.0", "22.5", "45.0", "67.5", "90.0", "112.5", "135.0", "157.5", "180.0", "202.5", "225.0",
    "247.5", "270.0", "292.5", "315.0", "337.5",
];

/// The 6 distance bucket labels, nearest band first.
pub const DISTANCE_BUCKETS: [&str; 6] = [
    "80000.0", "160000.0", "240000.0", "320000.0", "400000.0", "+Inf",
];

/// Upper bounds (meters) of the closed distance bands. Anything beyond the
/// last bound falls into the open `+Inf` band.
pub const DISTANCE_BOUNDS: [f64; 5] = [80_000.0, 160_000.0, 240_000.0, 320_000.0, 400_000.0];

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Great-circle distance in meters between two points using the haversine
/// formula on a sphere of the given radius.
#[must_use]
pub fn haversine_distance_with_radius(from: Position, to: Position, radius: f64) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let hav = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push hav a hair above 1.0 for antipodal points.
    2.0 * radius * hav.sqrt().min(1.0).asin()
}

/// Great-circle distance in meters on the mean Earth sphere.
#[must_use]
pub fn haversine_distance(from: Position, to: Position) -> f64 {
    haversine_distance_with_radius(from, to, EARTH_RADIUS_M)
}

/// Bearing of `target` as seen from `origin`, in degrees within `[0, 360)`.
///
/// This is a planar approximation on raw lat/lon deltas, not a geodesic
/// initial bearing. Sector boundaries depend on it, so keep the formula.
#[must_use]
#[allow(clippy::float_cmp, reason = "exact equality guards the division below")]
pub fn relative_bearing(origin: Position, target: Position) -> f64 {
    let (lat1, lon1) = (origin.latitude, origin.longitude);
    let (lat2, lon2) = (target.latitude, target.longitude);

    if lat2 == lat1 {
        return if lon2 > lon1 { 90.0 } else { 270.0 };
    }

    let deg = ((lon2 - lon1) / (lat2 - lat1)).atan().to_degrees();

    if lat2 > lat1 {
        (360.0 + deg) % 360.0
    } else {
        180.0 + deg
    }
}

/// Index (0..16) of the sector containing `bearing`.
///
/// Out-of-range input is wrapped into `[0, 360)` first.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is floored and wrapped into 0..16 before the cast"
)]
pub fn sector_index(bearing: f64) -> usize {
    let wrapped = bearing.rem_euclid(360.0);
    ((wrapped / SECTOR_WIDTH_DEGREES).floor() as usize).min(BEARING_SECTORS.len() - 1)
}

/// Sector label (`"0.0"` .. `"337.5"`) for a bearing in degrees.
#[must_use]
pub fn bearing_sector(bearing: f64) -> &'static str {
    BEARING_SECTORS[sector_index(bearing)]
}

/// Index (0..6) of the distance band containing `distance`.
#[must_use]
pub fn bucket_index(distance: f64) -> usize {
    DISTANCE_BOUNDS
        .iter()
        .position(|bound| distance <= *bound)
        .unwrap_or(DISTANCE_BUCKETS.len() - 1)
}

/// Distance band label for a distance in meters. Each band is named after
/// its inclusive upper bound, except the open top band `"+Inf"`.
#[must_use]
pub fn distance_bucket(distance: f64) -> &'static str {
    DISTANCE_BUCKETS[bucket_index(distance)]
}
