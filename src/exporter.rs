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

//! Poll scheduler.
//!
//! Three independent loops poll the receiver, statistics and aircraft
//! documents and feed the reducers. Each loop measures its interval from
//! the start of a cycle, so time spent fetching and reducing is absorbed
//! into the sleep. A failed cycle is logged and the loop carries on at the
//! next tick.
//!
//! The receiver loop is the only writer of the shared origin; the aircraft
//! loop reads whatever value is current when its cycle starts.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use prometheus::Registry;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use dump1090_client::{
    AircraftSnapshot, Document, Fetcher, Position, ReceiverInfo, ResourceSet, StatsDocument,
};

use crate::aircraft::{summarize, AircraftMetrics, SectorPolicy};
use crate::config::{AppConfig, ConfigError};
use crate::metrics::{self, SpecError};
use crate::server;
use crate::stats::StatsMetrics;
use crate::telemetry::RequestMetrics;

/// Errors that stop the exporter from starting.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid metric table: {0}")]
    Spec(#[from] SpecError),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("exporter already started")]
    AlreadyStarted,
}

/// The three poll loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Receiver,
    Stats,
    Aircraft,
}

impl Task {
    fn name(self) -> &'static str {
        match self {
            Self::Receiver => "receiver",
            Self::Stats => "stats",
            Self::Aircraft => "aircraft",
        }
    }
}

/// Everything a poll cycle needs. Cheap to clone into each loop.
#[derive(Clone)]
struct Poller {
    fetcher: Fetcher,
    resources: Arc<ResourceSet>,
    origin: Arc<watch::Sender<Option<Position>>>,
    stats: Arc<StatsMetrics>,
    aircraft: Arc<AircraftMetrics>,
    threshold: f64,
    sector_policy: SectorPolicy,
    receiver_interval: Duration,
    receiver_interval_origin_ok: Duration,
    stats_interval: Duration,
    aircraft_interval: Duration,
}

impl Poller {
    /// Run one cycle of `task` and return the interval until the next one.
    async fn cycle(&self, task: Task) -> Duration {
        match task {
            Task::Receiver => self.update_receiver().await,
            Task::Stats => {
                self.update_stats().await;
                self.stats_interval
            }
            Task::Aircraft => {
                self.update_aircraft().await;
                self.aircraft_interval
            }
        }
    }

    async fn update_receiver(&self) -> Duration {
        match self
            .fetcher
            .fetch::<ReceiverInfo>(Document::Receiver, self.resources.receiver())
            .await
        {
            Ok(receiver) => {
                if let Some(origin) = receiver.origin() {
                    self.origin.send_replace(Some(origin));
                    info!("Origin successfully extracted from receiver data: {origin}");
                }
            }
            Err(e) => error!("Error fetching dump1090 receiver data: {e}"),
        }

        if self.origin.borrow().is_some() {
            self.receiver_interval_origin_ok
        } else {
            self.receiver_interval
        }
    }

    async fn update_stats(&self) {
        match self
            .fetcher
            .fetch::<StatsDocument>(Document::Stats, self.resources.stats())
            .await
        {
            Ok(stats) => {
                let warnings = self.stats.process(&stats);
                debug!("stats: processed with {} warnings", warnings.len());
            }
            Err(e) => error!("Error fetching dump1090 stats data: {e}"),
        }
    }

    async fn update_aircraft(&self) {
        match self
            .fetcher
            .fetch::<AircraftSnapshot>(Document::Aircraft, self.resources.aircraft())
            .await
        {
            Ok(snapshot) => {
                let origin = *self.origin.borrow();
                let summary = summarize(&snapshot, origin, self.threshold);
                self.aircraft.publish(&summary, self.sector_policy);
            }
            Err(e) => error!("Error fetching dump1090 aircraft data: {e}"),
        }
    }
}

/// Time left to sleep when a cycle that started `elapsed` ago should repeat
/// every `interval`. Zero means run the next cycle straight away.
fn remaining(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

async fn poll_loop(task: Task, poller: Poller, cancel: CancellationToken) {
    debug!("{} loop started", task.name());
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let start = Instant::now();
        let interval = tokio::select! {
            () = cancel.cancelled() => break,
            interval = poller.cycle(task) => interval,
        };

        let wait = remaining(interval, start.elapsed());
        if wait.is_zero() {
            continue;
        }
        tokio::select! {
            () = sleep(wait) => {}
            () = cancel.cancelled() => break,
        }
    }
    debug!("{} loop stopped", task.name());
}

/// A dump1090 Prometheus exporter.
///
/// Created with [`Exporter::new`], started with [`Exporter::start`] and
/// stopped with [`Exporter::stop`]. Dropping a running exporter cancels its
/// loops and endpoint without waiting for them.
pub struct Exporter {
    config: AppConfig,
    poller: Poller,
    registry: Registry,
    cancel: CancellationToken,
    server_shutdown: CancellationToken,
    loops: Vec<JoinHandle<()>>,
    server: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("resources", &self.poller.resources.base())
            .field("local_addr", &self.local_addr)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Validate `config` and create the instruments.
    pub fn new(config: AppConfig) -> Result<Self, ExporterError> {
        config.validate()?;
        metrics::validate()?;

        let resources = ResourceSet::new(&config.resource_path).map_err(ConfigError::from)?;
        let registry = Registry::new();

        let requests = RequestMetrics::register(&registry)?;
        let fetcher = Fetcher::new(config.fetch_timeout())?.with_observer(Arc::new(requests));
        let stats = StatsMetrics::register(&registry)?;
        let aircraft = AircraftMetrics::register(&registry)?;
        let (origin, _) = watch::channel(config.origin());

        info!("Monitoring dump1090 resources at: {}", resources.base());
        info!(
            "Refresh rates: aircraft={}s, statistics={}s",
            config.aircraft_interval, config.stats_interval
        );
        match config.origin() {
            Some(origin) => info!("Origin: {origin}"),
            None => info!("Origin: unknown"),
        }

        let poller = Poller {
            fetcher,
            resources: Arc::new(resources),
            origin: Arc::new(origin),
            stats: Arc::new(stats),
            aircraft: Arc::new(aircraft),
            threshold: config.aircraft_threshold,
            sector_policy: config.sector_policy(),
            receiver_interval: config.receiver_interval(),
            receiver_interval_origin_ok: config.receiver_interval_origin_ok(),
            stats_interval: config.stats_interval(),
            aircraft_interval: config.aircraft_interval(),
        };

        Ok(Self {
            config,
            poller,
            registry,
            cancel: CancellationToken::new(),
            server_shutdown: CancellationToken::new(),
            loops: Vec::new(),
            server: None,
            local_addr: None,
        })
    }

    /// Bind the metrics endpoint and start the poll loops.
    ///
    /// Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, ExporterError> {
        if self.server.is_some() || self.cancel.is_cancelled() {
            return Err(ExporterError::AlreadyStarted);
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let bind_error = |source| ExporterError::Bind {
            addr: addr.clone(),
            source,
        };
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        self.server = Some(server::spawn(
            listener,
            self.registry.clone(),
            self.server_shutdown.clone(),
        ));
        self.local_addr = Some(local_addr);
        info!("Serving dump1090 prometheus metrics on: http://{local_addr}/metrics");

        for task in [Task::Receiver, Task::Stats, Task::Aircraft] {
            self.loops.push(tokio::spawn(poll_loop(
                task,
                self.poller.clone(),
                self.cancel.clone(),
            )));
        }

        Ok(local_addr)
    }

    /// Stop the poll loops, then the metrics endpoint.
    ///
    /// Calling this again, or on an exporter that never started, does
    /// nothing.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        for handle in self.loops.drain(..) {
            if let Err(e) = handle.await {
                error!("Poll loop ended abnormally: {e}");
            }
        }

        self.server_shutdown.cancel();
        if let Some(server) = self.server.take() {
            if let Err(e) = server.await {
                error!("Metrics server ended abnormally: {e}");
            }
        }
    }

    /// Address of the metrics endpoint, once started.
    #[cfg(test)]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Current receiver origin.
    #[cfg(test)]
    pub fn origin(&self) -> Option<Position> {
        *self.poller.origin.borrow()
    }

    /// Render every instrument in the text exposition format.
    #[cfg(test)]
    pub fn render(&self) -> prometheus::Result<String> {
        server::render(&self.registry)
    }
}

impl Drop for Exporter {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.server_shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{exposed_name, AIRCRAFT_SPECS, HTTP_SPECS, STATS_SPECS};
    use crate::test_support::fixtures_dir;
    use axum::extract::Path;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    fn file_config() -> AppConfig {
        AppConfig {
            resource_path: fixtures_dir().display().to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            ..AppConfig::default()
        }
    }

    /// Serves the fixture documents the way dump1090 does, under `/data`.
    async fn spawn_receiver_emulator() -> (SocketAddr, CancellationToken) {
        async fn document(Path(name): Path<String>) -> impl IntoResponse {
            if !["receiver.json", "stats.json", "aircraft.json"].contains(&name.as_str()) {
                return (StatusCode::NOT_FOUND, String::new()).into_response();
            }
            match std::fs::read_to_string(fixtures_dir().join(&name)) {
                Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
                Err(_) => StatusCode::NOT_FOUND.into_response(),
            }
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/data/{name}", get(document)))
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
                .unwrap();
        });
        (addr, shutdown)
    }

    #[test]
    fn test_remaining_sleep() {
        let interval = Duration::from_secs(10);
        assert_eq!(remaining(interval, Duration::from_secs(3)), Duration::from_secs(7));
        assert_eq!(remaining(interval, Duration::from_secs(10)), Duration::ZERO);
        assert_eq!(remaining(interval, Duration::from_secs(25)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_receiver_cycle_sets_origin_and_long_interval() {
        let exporter = Exporter::new(file_config()).unwrap();
        assert!(exporter.origin().is_none());

        let next = exporter.poller.cycle(Task::Receiver).await;

        assert_eq!(exporter.origin(), Some(Position::new(-34.9, 138.6)));
        assert_eq!(next, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_receiver_failure_keeps_origin_and_short_interval() {
        let config = AppConfig {
            resource_path: fixtures_dir().join("missing").display().to_string(),
            ..file_config()
        };
        let exporter = Exporter::new(config).unwrap();

        let next = exporter.poller.cycle(Task::Receiver).await;

        assert!(exporter.origin().is_none());
        assert_eq!(next, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_receiver_failure_keeps_configured_origin() {
        let config = AppConfig {
            resource_path: fixtures_dir().join("missing").display().to_string(),
            latitude: Some(51.5),
            longitude: Some(-0.1),
            ..file_config()
        };
        let exporter = Exporter::new(config).unwrap();

        let next = exporter.poller.cycle(Task::Receiver).await;

        assert_eq!(exporter.origin(), Some(Position::new(51.5, -0.1)));
        assert_eq!(next, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_cycles_from_directory() {
        let exporter = Exporter::new(AppConfig {
            latitude: Some(-34.9),
            longitude: Some(138.6),
            ..file_config()
        })
        .unwrap();

        assert_eq!(exporter.poller.cycle(Task::Stats).await, Duration::from_secs(60));
        assert_eq!(exporter.poller.cycle(Task::Aircraft).await, Duration::from_secs(10));

        let text = exporter.render().unwrap();
        assert!(text.contains("dump1090_recent_aircraft_observed 2"));
        assert!(text.contains("dump1090_stats_messages_total{time_period=\"total\"} 7902329"));
        // File reads are not requests.
        assert!(text.contains("dump1090_exporter_requests_total{resource=\"stats\"} 0"));
        assert!(text.contains("dump1090_exporter_requests_total{resource=\"aircraft\"} 0"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = AppConfig {
            latitude: Some(-34.9),
            ..file_config()
        };
        assert!(matches!(
            Exporter::new(config),
            Err(ExporterError::Config(ConfigError::PartialOrigin))
        ));
    }

    #[tokio::test]
    async fn test_stop_before_start_is_harmless() {
        let mut exporter = Exporter::new(file_config()).unwrap();
        exporter.stop().await;
        exporter.stop().await;
        assert!(matches!(exporter.start().await, Err(ExporterError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let (emulator, emulator_shutdown) = spawn_receiver_emulator().await;
        let mut exporter = Exporter::new(AppConfig {
            resource_path: format!("http://{emulator}/data"),
            latitude: Some(-34.9),
            longitude: Some(138.6),
            ..file_config()
        })
        .unwrap();

        let addr = exporter.start().await.unwrap();
        assert_eq!(exporter.local_addr(), Some(addr));
        assert!(matches!(exporter.start().await, Err(ExporterError::AlreadyStarted)));

        let url = format!("http://{addr}/metrics");
        let mut body = String::new();
        for _ in 0..100 {
            body = reqwest::get(&url).await.unwrap().text().await.unwrap();
            if body.contains("dump1090_recent_aircraft_observed 2")
                && body.contains("dump1090_stats_messages_total")
                && body.contains("dump1090_exporter_requests_total{resource=\"receiver\"} 1")
            {
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }

        for spec in AIRCRAFT_SPECS.iter().chain(HTTP_SPECS) {
            let name = exposed_name(spec.name);
            assert!(body.contains(&name), "missing {name}");
        }
        for spec in STATS_SPECS {
            let name = exposed_name(spec.name);
            assert!(body.contains(&name), "missing {name}");
        }

        assert!(body.contains("dump1090_recent_aircraft_observed 2"));
        assert!(body.contains("dump1090_recent_aircraft_with_position 1"));
        assert!(body.contains("dump1090_recent_aircraft_with_multilateration 0"));
        assert!(body.contains(
            "dump1090_recent_aircraft_by_range{bearing=\"90.0\",distance=\"80000.0\"} 1"
        ));
        assert!(body.contains("dump1090_recent_aircraft_max_range{bearing=\"90.0\"}"));
        assert!(body.contains(
            "dump1090_aircraft_range_meters_bucket{bearing=\"90.0\",le=\"80000\"} 1"
        ));
        assert!(body.contains("dump1090_stats_messages_total{time_period=\"total\"} 7902329"));
        assert!(body.contains("dump1090_exporter_requests_total{resource=\"aircraft\"}"));
        assert!(body.contains("dump1090_exporter_request_duration_seconds_count{resource=\"stats\"} 1"));
        assert!(body.contains(
            "dump1090_exporter_request_errors_total{kind=\"bad_status\",resource=\"stats\"} 0"
        ));
        assert_eq!(exporter.origin(), Some(Position::new(-34.9, 138.6)));

        exporter.stop().await;
        exporter.stop().await;
        assert!(reqwest::get(&url).await.is_err());

        emulator_shutdown.cancel();
    }
}
