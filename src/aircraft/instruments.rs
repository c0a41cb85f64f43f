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

use log::debug;
use prometheus::{GaugeVec, HistogramOpts, HistogramVec, IntGauge, Opts, Registry};

use dump1090_client::geo::DISTANCE_BOUNDS;

use super::AircraftSummary;
use crate::metrics::{exposed_name, lookup, MetricKind, AIRCRAFT_SPECS};

/// What happens to per-sector gauges for sectors with no aircraft this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectorPolicy {
    /// Keep the last published value.
    #[default]
    Retain,
    /// Drop every per-sector series before publishing.
    Reset,
}

impl SectorPolicy {
    #[must_use]
    pub fn from_reset_flag(reset: bool) -> Self {
        if reset {
            Self::Reset
        } else {
            Self::Retain
        }
    }
}

/// Registered aircraft instruments.
#[derive(Debug, Clone)]
pub struct AircraftMetrics {
    observed: IntGauge,
    with_position: IntGauge,
    with_mlat: IntGauge,
    max_range: GaugeVec,
    by_range: GaugeVec,
    range: HistogramVec,
}

fn gauge_opts(key: &str) -> prometheus::Result<Opts> {
    let spec = lookup(AIRCRAFT_SPECS, key, MetricKind::Gauge)?;
    Ok(Opts::new(exposed_name(spec.name), spec.help))
}

impl AircraftMetrics {
    /// Create the aircraft instruments and register them on `registry`.
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let range_spec = lookup(AIRCRAFT_SPECS, "range", MetricKind::Histogram)?;
        let metrics = Self {
            observed: IntGauge::with_opts(gauge_opts("observed")?)?,
            with_position: IntGauge::with_opts(gauge_opts("observed_with_pos")?)?,
            with_mlat: IntGauge::with_opts(gauge_opts("observed_with_mlat")?)?,
            max_range: GaugeVec::new(gauge_opts("max_range")?, &["bearing"])?,
            by_range: GaugeVec::new(gauge_opts("by_range")?, &["bearing", "distance"])?,
            range: HistogramVec::new(
                HistogramOpts::new(exposed_name(range_spec.name), range_spec.help)
                    .buckets(DISTANCE_BOUNDS.to_vec()),
                &["bearing"],
            )?,
        };

        registry.register(Box::new(metrics.observed.clone()))?;
        registry.register(Box::new(metrics.with_position.clone()))?;
        registry.register(Box::new(metrics.with_mlat.clone()))?;
        registry.register(Box::new(metrics.max_range.clone()))?;
        registry.register(Box::new(metrics.by_range.clone()))?;
        registry.register(Box::new(metrics.range.clone()))?;

        Ok(metrics)
    }

    /// Write `summary` to the instruments.
    ///
    /// Totals are always set. Per-sector gauges are only set for sectors
    /// present in the summary; `policy` decides whether the others are
    /// dropped first.
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        reason = "aircraft counts are far below i64::MAX and 2^52"
    )]
    pub fn publish(&self, summary: &AircraftSummary, policy: SectorPolicy) {
        self.observed.set(summary.observed as i64);
        self.with_position.set(summary.with_position as i64);
        self.with_mlat.set(summary.with_mlat as i64);

        if policy == SectorPolicy::Reset {
            self.max_range.reset();
            self.by_range.reset();
        }

        for (sector, range) in &summary.max_range {
            self.max_range.with_label_values(&[*sector]).set(*range);
        }
        for ((sector, bucket), count) in &summary.by_range {
            self.by_range
                .with_label_values(&[*sector, *bucket])
                .set(*count as f64);
        }
        for (sector, range) in &summary.ranges {
            self.range.with_label_values(&[*sector]).observe(*range);
        }

        debug!(
            "aircraft: observed={}, with_pos={}, with_mlat={}, max_range={}",
            summary.observed,
            summary.with_position,
            summary.with_mlat,
            summary.overall_max_range()
        );
    }
}
