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

//! Aircraft geo-aggregation.
//!
//! [`summarize`] reduces one `aircraft.json` snapshot to counts and range
//! figures without touching any instrument. [`AircraftMetrics::publish`]
//! then writes a summary to the registry, with the caller choosing how
//! sectors that saw no aircraft are treated.

mod instruments;

pub use instruments::{AircraftMetrics, SectorPolicy};

use std::collections::BTreeMap;

use dump1090_client::geo::{
    bearing_sector, distance_bucket, haversine_distance, relative_bearing,
};
use dump1090_client::{AircraftSnapshot, Position};

/// Default recency threshold in seconds.
pub const DEFAULT_THRESHOLD_SECS: f64 = 15.0;

/// Result of one aggregation cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AircraftSummary {
    /// Aircraft seen within the threshold.
    pub observed: u64,
    /// Observed aircraft whose position was also updated within the threshold.
    pub with_position: u64,
    /// Positioned aircraft whose latitude came from multilateration.
    pub with_mlat: u64,
    /// Largest range per bearing sector, in metres. Only sectors that had a
    /// positioned aircraft are present.
    pub max_range: BTreeMap<&'static str, f64>,
    /// Aircraft count per `(bearing sector, distance bucket)`.
    pub by_range: BTreeMap<(&'static str, &'static str), u64>,
    /// Raw `(bearing sector, range)` observations for the range histogram.
    pub ranges: Vec<(&'static str, f64)>,
}

impl AircraftSummary {
    /// Largest range across all sectors, or zero.
    #[must_use]
    pub fn overall_max_range(&self) -> f64 {
        self.max_range.values().copied().fold(0.0, f64::max)
    }
}

/// Reduce a snapshot to an [`AircraftSummary`].
///
/// Range figures are only computed when `origin` is known.
#[must_use]
pub fn summarize(
    snapshot: &AircraftSnapshot,
    origin: Option<Position>,
    threshold: f64,
) -> AircraftSummary {
    let mut summary = AircraftSummary::default();

    for record in snapshot.aircraft.iter().filter(|a| a.seen_within(threshold)) {
        summary.observed += 1;

        if !record.position_seen_within(threshold) {
            continue;
        }
        summary.with_position += 1;
        if record.has_mlat_position() {
            summary.with_mlat += 1;
        }

        let (Some(origin), Some(position)) = (origin, record.position()) else {
            continue;
        };
        let distance = haversine_distance(origin, position);
        let sector = bearing_sector(relative_bearing(origin, position));

        let max = summary.max_range.entry(sector).or_insert(0.0);
        if distance > *max {
            *max = distance;
        }
        *summary
            .by_range
            .entry((sector, distance_bucket(distance)))
            .or_insert(0) += 1;
        summary.ranges.push((sector, distance));
    }

    summary
}
