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

//! A collector that republishes externally computed values.
//!
//! dump1090 already accumulates its counters, so the exporter has to *set*
//! them rather than increment them, and has to be able to publish NaN for
//! fields missing from the last document. The stock prometheus counter
//! supports neither, so statistics are exported through this collector.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, Metric, MetricFamily, MetricType};

use super::MetricKind;

/// One labelled value of a [`SnapshotMetric`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Series {
    #[must_use]
    pub fn new(labels: Vec<(&'static str, String)>, value: f64) -> Self {
        Self { labels, value }
    }
}

/// A metric whose complete set of series is replaced on every update.
///
/// Cloning yields another handle to the same values, so one handle can be
/// registered while the other is updated.
#[derive(Clone)]
pub struct SnapshotMetric {
    inner: Arc<Inner>,
}

struct Inner {
    desc: Desc,
    kind: MetricKind,
    series: RwLock<Vec<Series>>,
}

impl fmt::Debug for SnapshotMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotMetric")
            .field("name", &self.inner.desc.fq_name)
            .field("kind", &self.inner.kind)
            .finish_non_exhaustive()
    }
}

impl SnapshotMetric {
    /// Create a counter or gauge metric. `label_names` lists every label a
    /// series may carry.
    pub fn new(
        name: String,
        help: &str,
        kind: MetricKind,
        label_names: &[&str],
    ) -> prometheus::Result<Self> {
        let desc = Desc::new(
            name,
            help.to_string(),
            label_names.iter().map(|l| (*l).to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Self {
            inner: Arc::new(Inner {
                desc,
                kind,
                series: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Replace every series of this metric.
    pub fn replace(&self, series: Vec<Series>) {
        if let Ok(mut current) = self.inner.series.write() {
            *current = series;
        }
    }

    /// Current series.
    #[must_use]
    pub fn series(&self) -> Vec<Series> {
        self.inner
            .series
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Value of the series whose labels match `labels` exactly.
    #[cfg(test)]
    pub fn get(&self, labels: &[(&str, &str)]) -> Option<f64> {
        self.series()
            .into_iter()
            .find(|s| {
                s.labels.len() == labels.len()
                    && s.labels
                        .iter()
                        .zip(labels)
                        .all(|((n1, v1), (n2, v2))| n1 == n2 && v1 == v2)
            })
            .map(|s| s.value)
    }
}

impl Collector for SnapshotMetric {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut family = MetricFamily::default();
        family.set_name(self.inner.desc.fq_name.clone());
        family.set_help(self.inner.desc.help.clone());
        family.set_field_type(match self.inner.kind {
            MetricKind::Counter => MetricType::COUNTER,
            MetricKind::Gauge | MetricKind::Histogram => MetricType::GAUGE,
        });

        for series in self.series() {
            let mut metric = Metric::default();
            for (name, value) in series.labels {
                let mut pair = LabelPair::default();
                pair.set_name(name.to_string());
                pair.set_value(value);
                metric.mut_label().push(pair);
            }
            match self.inner.kind {
                MetricKind::Counter => {
                    let mut counter = proto::Counter::default();
                    counter.set_value(series.value);
                    metric.set_counter(counter);
                }
                MetricKind::Gauge | MetricKind::Histogram => {
                    let mut gauge = proto::Gauge::default();
                    gauge.set_value(series.value);
                    metric.set_gauge(gauge);
                }
            }
            family.mut_metric().push(metric);
        }

        vec![family]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, Registry, TextEncoder};

    fn render(registry: &Registry) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_counter_values_are_set_not_added() {
        let metric = SnapshotMetric::new(
            "dump1090_stats_messages_total".to_string(),
            "Number of Mode-S messages processed",
            MetricKind::Counter,
            &["time_period"],
        )
        .unwrap();
        let registry = Registry::new();
        registry.register(Box::new(metric.clone())).unwrap();

        metric.replace(vec![Series::new(vec![("time_period", "total".to_string())], 10.0)]);
        metric.replace(vec![Series::new(vec![("time_period", "total".to_string())], 7.0)]);

        let text = render(&registry);
        assert!(text.contains("# TYPE dump1090_stats_messages_total counter"));
        assert!(text.contains("dump1090_stats_messages_total{time_period=\"total\"} 7"));
        assert_eq!(metric.get(&[("time_period", "total")]), Some(7.0));
    }

    #[test]
    fn test_nan_is_rendered() {
        let metric = SnapshotMetric::new(
            "dump1090_stats_local_signal_strength_dbFS".to_string(),
            "Signal strength dbFS",
            MetricKind::Gauge,
            &["time_period"],
        )
        .unwrap();
        let registry = Registry::new();
        registry.register(Box::new(metric.clone())).unwrap();

        metric.replace(vec![Series::new(vec![("time_period", "last1min".to_string())], f64::NAN)]);

        let text = render(&registry);
        assert!(text.contains("# TYPE dump1090_stats_local_signal_strength_dbFS gauge"));
        assert!(text.contains("dump1090_stats_local_signal_strength_dbFS{time_period=\"last1min\"} NaN"));
    }

    #[test]
    fn test_replace_drops_previous_series() {
        let metric = SnapshotMetric::new(
            "dump1090_stats_local_accepted".to_string(),
            "accepted",
            MetricKind::Counter,
            &["time_period", "bit_errors"],
        )
        .unwrap();
        let labels = |index: &str| vec![("time_period", "total".to_string()), ("bit_errors", index.to_string())];
        metric.replace(vec![Series::new(labels("0"), 5.0), Series::new(labels("1"), 2.0)]);
        metric.replace(vec![Series::new(labels("0"), 6.0)]);

        assert_eq!(metric.series().len(), 1);
        assert_eq!(metric.get(&[("time_period", "total"), ("bit_errors", "0")]), Some(6.0));
        assert_eq!(metric.get(&[("time_period", "total"), ("bit_errors", "1")]), None);
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        assert!(SnapshotMetric::new("bad-name".to_string(), "x", MetricKind::Gauge, &[]).is_err());
    }
}
