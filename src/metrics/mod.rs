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

//! Metric definitions and instruments.
//!
//! The tables in [`specs`] are the single source of truth for what gets
//! exported. Adding a statistics metric means adding a row; the reducer
//! walks the table and needs no new code unless a field has a new shape.

mod snapshot;
pub mod specs;

pub use snapshot::{Series, SnapshotMetric};
pub use specs::{AIRCRAFT_SPECS, HTTP_SPECS, STATS_SPECS};

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

/// Prefix applied to every exported metric name.
pub const PREFIX: &str = "dump1090_";

/// Groups a statistics time period section may contain.
pub const STATS_GROUPS: [&str; 7] = ["", "adaptive", "cpr", "cpu", "local", "remote", "tracks"];

/// Label carrying the statistics time period.
pub const TIME_PERIOD_LABEL: &str = "time_period";

/// Errors in the metric tables. These are programming errors and stop
/// startup.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("duplicate metric name '{0}'")]
    DuplicateName(String),

    #[error("invalid metric name '{0}'")]
    InvalidName(String),

    #[error("unknown statistics group '{group}' for '{key}'")]
    UnknownGroup { group: String, key: String },

    #[error("statistics metric '{0}' cannot be a histogram")]
    HistogramStat(String),
}

/// Instrument type of an exported metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// Section of `stats.json` a statistics metric is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    /// Totals since dump1090 started.
    Total,
    /// Rolling last minute.
    Last1Min,
}

impl TimePeriod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Last1Min => "last1min",
        }
    }
}

/// Shape of a statistics field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single number.
    Scalar,
    /// A list of numbers; the index becomes the value of `label`.
    Indexed { label: &'static str },
    /// A list of `[key, count]` pairs; the key becomes the value of `label`.
    Paired { label: &'static str },
}

impl FieldShape {
    /// Name of the extra label this shape adds, if any.
    #[must_use]
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Scalar => None,
            Self::Indexed { label } | Self::Paired { label } => Some(*label),
        }
    }

    /// Turn a field value into `(label value, number)` observations.
    ///
    /// Returns `None` when the value does not have this shape.
    #[must_use]
    pub fn extract(&self, value: &Value) -> Option<Vec<(Option<String>, f64)>> {
        match self {
            Self::Scalar => value.as_f64().map(|v| vec![(None, v)]),
            Self::Indexed { .. } => value
                .as_array()?
                .iter()
                .enumerate()
                .map(|(index, count)| Some((Some(index.to_string()), count.as_f64()?)))
                .collect(),
            Self::Paired { .. } => value
                .as_array()?
                .iter()
                .map(|pair| match pair.as_array()?.as_slice() {
                    [key, count] => Some((Some(label_value(key)?), count.as_f64()?)),
                    _ => None,
                })
                .collect(),
        }
    }
}

fn label_value(key: &Value) -> Option<String> {
    match key {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// A metric computed by the exporter itself.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    /// Name used inside the exporter.
    pub key: &'static str,
    pub kind: MetricKind,
    /// Exported name, without [`PREFIX`].
    pub name: &'static str,
    pub help: &'static str,
}

/// A metric read from the statistics document.
#[derive(Debug, Clone, Copy)]
pub struct StatsSpec {
    /// Nested object inside the time period section, or `""`.
    pub group: &'static str,
    /// Field name inside the group.
    pub key: &'static str,
    pub kind: MetricKind,
    pub period: TimePeriod,
    pub shape: FieldShape,
    /// Exported name, without [`PREFIX`].
    pub name: &'static str,
    pub help: &'static str,
}

/// Exported name of a table entry.
#[must_use]
pub fn exposed_name(name: &str) -> String {
    format!("{PREFIX}{name}")
}

/// Find the row `key` in `table`, checking that it declares `kind`.
///
/// Instruments are built with concrete prometheus types, so a row whose
/// kind disagrees with the instrument built for it is rejected.
pub fn lookup(
    table: &'static [MetricSpec],
    key: &str,
    kind: MetricKind,
) -> prometheus::Result<&'static MetricSpec> {
    let spec = table
        .iter()
        .find(|spec| spec.key == key)
        .ok_or_else(|| prometheus::Error::Msg(format!("no metric '{key}' in table")))?;
    if spec.kind != kind {
        return Err(prometheus::Error::Msg(format!(
            "metric '{}' is declared as {:?} but built as {kind:?}",
            spec.name, spec.kind
        )));
    }
    Ok(spec)
}

/// Every exported name declared by the tables.
pub fn all_exposed_names() -> impl Iterator<Item = String> {
    AIRCRAFT_SPECS
        .iter()
        .chain(HTTP_SPECS)
        .map(|spec| spec.name)
        .chain(STATS_SPECS.iter().map(|spec| spec.name))
        .map(exposed_name)
}

/// Check the tables for internal consistency.
pub fn validate() -> Result<(), SpecError> {
    let mut seen = HashSet::new();
    for name in all_exposed_names() {
        if !is_valid_metric_name(&name) {
            return Err(SpecError::InvalidName(name));
        }
        if !seen.insert(name.clone()) {
            return Err(SpecError::DuplicateName(name));
        }
    }

    for spec in STATS_SPECS {
        if !STATS_GROUPS.contains(&spec.group) {
            return Err(SpecError::UnknownGroup {
                group: spec.group.to_string(),
                key: spec.key.to_string(),
            });
        }
        if spec.kind == MetricKind::Histogram {
            return Err(SpecError::HistogramStat(spec.name.to_string()));
        }
    }

    Ok(())
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
