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

//! Decoder statistics reduction.
//!
//! Walks a `stats.json` snapshot against [`STATS_SPECS`] and sets one
//! instrument per row. Rows are independent: a problem with one field is
//! logged and the remaining rows are still processed.

use std::fmt;

use log::warn;
use prometheus::Registry;
use serde_json::Value;

use crate::metrics::{
    exposed_name, Series, SnapshotMetric, StatsSpec, STATS_SPECS, TIME_PERIOD_LABEL,
};

/// Fields that are absent whenever no aircraft are in range.
const EXPECTED_MISSING: [&str; 2] = ["peak_signal", "signal"];

/// Why a statistics row could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The time period section is missing; the instrument is left as is.
    MissingPeriod,
    /// The field (or its group) is missing; the instrument is set to NaN.
    MissingField,
    /// The field does not have the expected shape; set to NaN.
    Malformed,
}

/// A statistics row that was logged as a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionWarning {
    pub group: &'static str,
    pub key: &'static str,
    pub period: &'static str,
    pub kind: WarningKind,
}

impl fmt::Display for ReductionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = if self.group.is_empty() {
            String::from(" ")
        } else {
            format!(" {} ", self.group)
        };
        match self.kind {
            WarningKind::MissingPeriod => {
                write!(f, "time period '{}' missing for{group}item '{}'", self.period, self.key)
            }
            WarningKind::MissingField => {
                write!(f, "{}{group}item '{}' missing", self.period, self.key)
            }
            WarningKind::Malformed => {
                write!(f, "{}{group}item '{}' malformed", self.period, self.key)
            }
        }
    }
}

struct StatsRow {
    spec: &'static StatsSpec,
    metric: SnapshotMetric,
}

/// Instruments for every statistics row.
pub struct StatsMetrics {
    rows: Vec<StatsRow>,
}

impl fmt::Debug for StatsMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsMetrics")
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl StatsMetrics {
    /// Create and register one instrument per statistics row.
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let mut rows = Vec::with_capacity(STATS_SPECS.len());
        for spec in STATS_SPECS {
            let mut labels = vec![TIME_PERIOD_LABEL];
            labels.extend(spec.shape.label());

            let metric = SnapshotMetric::new(exposed_name(spec.name), spec.help, spec.kind, &labels)?;
            registry.register(Box::new(metric.clone()))?;
            rows.push(StatsRow { spec, metric });
        }
        Ok(Self { rows })
    }

    /// Instrument for the row reading `key` from `group`.
    #[cfg(test)]
    pub fn metric(&self, group: &str, key: &str) -> Option<&SnapshotMetric> {
        self.rows
            .iter()
            .find(|row| row.spec.group == group && row.spec.key == key)
            .map(|row| &row.metric)
    }

    /// Update every instrument from `stats`, returning the rows that were
    /// logged as problems.
    pub fn process(&self, stats: &Value) -> Vec<ReductionWarning> {
        let mut warnings = Vec::new();
        for row in &self.rows {
            if let Err((warning, context)) = process_row(row, stats) {
                warn!("{}", problem_message(&warning, context));
                warnings.push(warning);
            }
        }
        warnings
    }
}

/// Log line for a problem row. `context` is the object the field was looked
/// up in, when there was one.
fn problem_message(warning: &ReductionWarning, context: Option<&Value>) -> String {
    match context {
        Some(context) => format!("Problem extracting {warning} from: {context}"),
        None => format!("Problem extracting {warning}"),
    }
}

fn process_row<'a>(
    row: &StatsRow,
    stats: &'a Value,
) -> Result<(), (ReductionWarning, Option<&'a Value>)> {
    let spec = row.spec;
    let period = spec.period.as_str();
    let warning = |kind| ReductionWarning {
        group: spec.group,
        key: spec.key,
        period,
        kind,
    };

    let Some(section) = stats.get(period) else {
        return Err((warning(WarningKind::MissingPeriod), None));
    };

    let context = if spec.group.is_empty() {
        Some(section)
    } else {
        section.get(spec.group)
    };

    let Some(value) = context.and_then(|c| c.get(spec.key)) else {
        row.metric.replace(vec![nan_series(period)]);
        if EXPECTED_MISSING.contains(&spec.key) {
            return Ok(());
        }
        return Err((warning(WarningKind::MissingField), Some(context.unwrap_or(section))));
    };

    let Some(observations) = spec.shape.extract(value) else {
        row.metric.replace(vec![nan_series(period)]);
        return Err((warning(WarningKind::Malformed), context));
    };

    let label = spec.shape.label();
    let series = observations
        .into_iter()
        .map(|(label_value, v)| {
            let mut labels = vec![(TIME_PERIOD_LABEL, period.to_string())];
            if let (Some(name), Some(label_value)) = (label, label_value) {
                labels.push((name, label_value));
            }
            Series::new(labels, v)
        })
        .collect();
    row.metric.replace(series);
    Ok(())
}

fn nan_series(period: &str) -> Series {
    Series::new(vec![(TIME_PERIOD_LABEL, period.to_string())], f64::NAN)
}
