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

//! Request telemetry for the fetcher.

use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use dump1090_client::{Document, FetchErrorKind, FetchObserver};

use crate::metrics::{exposed_name, lookup, MetricKind, HTTP_SPECS};

/// Counts requests, failures and durations per document.
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    requests: IntCounterVec,
    errors: IntCounterVec,
    durations: HistogramVec,
}

impl RequestMetrics {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let total = lookup(HTTP_SPECS, "total", MetricKind::Counter)?;
        let errors = lookup(HTTP_SPECS, "errors", MetricKind::Counter)?;
        let durations = lookup(HTTP_SPECS, "durations", MetricKind::Histogram)?;

        let metrics = Self {
            requests: IntCounterVec::new(
                Opts::new(exposed_name(total.name), total.help),
                &["resource"],
            )?,
            errors: IntCounterVec::new(
                Opts::new(exposed_name(errors.name), errors.help),
                &["resource", "kind"],
            )?,
            durations: HistogramVec::new(
                HistogramOpts::new(exposed_name(durations.name), durations.help),
                &["resource"],
            )?,
        };

        registry.register(Box::new(metrics.requests.clone()))?;
        registry.register(Box::new(metrics.errors.clone()))?;
        registry.register(Box::new(metrics.durations.clone()))?;

        // Every (resource, kind) series starts at zero.
        for doc in Document::ALL {
            metrics.requests.with_label_values(&[doc.as_str()]);
            metrics.durations.with_label_values(&[doc.as_str()]);
            for kind in FetchErrorKind::ALL {
                metrics.errors.with_label_values(&[doc.as_str(), kind.as_str()]);
            }
        }

        Ok(metrics)
    }
}

impl FetchObserver for RequestMetrics {
    fn on_request(&self, doc: Document) {
        self.requests.with_label_values(&[doc.as_str()]).inc();
    }

    fn on_error(&self, doc: Document, kind: FetchErrorKind) {
        self.errors
            .with_label_values(&[doc.as_str(), kind.as_str()])
            .inc();
    }

    fn on_complete(&self, doc: Document, elapsed: Duration) {
        self.durations
            .with_label_values(&[doc.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}
