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

//! Fetching JSON documents from a web server or the local filesystem.
//!
//! A [`Fetcher`] performs exactly one attempt per call. It never retries and
//! never returns a partially parsed document; callers poll again on their
//! next tick. Network attempts are reported to an optional
//! [`FetchObserver`] so request counts, failures and durations can be
//! exported without this crate depending on a metrics library.

mod resource;

pub use resource::{Document, Resource, ResourceError, ResourceSet};

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default time allowed for one HTTP request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors that can occur while fetching a document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out to {resource}")]
    Timeout { resource: String },

    #[error("client error {reason}, {resource}")]
    Client { resource: String, reason: String },

    #[error("fetch failed {status}: {resource}")]
    BadStatus { resource: String, status: u16 },

    #[error("invalid JSON from {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// The failure class, independent of the resource.
    #[must_use]
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::Client { .. } => FetchErrorKind::ClientError,
            Self::BadStatus { .. } => FetchErrorKind::BadStatus,
            Self::Parse { .. } => FetchErrorKind::ParseError,
            Self::Io { .. } => FetchErrorKind::IoError,
        }
    }
}

/// Failure classes reported by [`FetchError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Timeout,
    ClientError,
    BadStatus,
    ParseError,
    IoError,
}

impl FetchErrorKind {
    /// Every failure class.
    pub const ALL: [Self; 5] = [
        Self::Timeout,
        Self::ClientError,
        Self::BadStatus,
        Self::ParseError,
        Self::IoError,
    ];

    /// Label value used when exporting the failure class.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ClientError => "client_error",
            Self::BadStatus => "bad_status",
            Self::ParseError => "parse_error",
            Self::IoError => "io_error",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives telemetry about network fetches.
///
/// Only HTTP attempts are reported; reading a local file is not a request.
pub trait FetchObserver: Send + Sync {
    /// A request for `doc` is about to be sent.
    fn on_request(&self, doc: Document);

    /// The request for `doc` failed.
    fn on_error(&self, doc: Document, kind: FetchErrorKind);

    /// The request for `doc` finished, successfully or not, after `elapsed`.
    fn on_complete(&self, doc: Document, elapsed: Duration);
}

/// Fetches and parses dump1090 documents.
#[derive(Clone)]
pub struct Fetcher {
    http: reqwest::Client,
    timeout: Duration,
    observer: Option<Arc<dyn FetchObserver>>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("timeout", &self.timeout)
            .field("observed", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher that allows `timeout` for each HTTP request.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            timeout,
            observer: None,
        })
    }

    /// Report network fetches to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `resource` and parse it as `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        doc: Document,
        resource: &Resource,
    ) -> Result<T, FetchError> {
        debug!("fetching {resource}");
        match resource {
            Resource::Url(url) => self.fetch_url(doc, url).await,
            Resource::File(path) => read_file(path),
        }
    }

    async fn fetch_url<T: DeserializeOwned>(
        &self,
        doc: Document,
        url: &reqwest::Url,
    ) -> Result<T, FetchError> {
        if let Some(observer) = &self.observer {
            observer.on_request(doc);
        }

        let start = Instant::now();
        let result = self.get_body(url).await;
        let elapsed = start.elapsed();

        let result = result.and_then(|body| {
            serde_json::from_slice(&body).map_err(|source| FetchError::Parse {
                resource: url.to_string(),
                source,
            })
        });

        if let Some(observer) = &self.observer {
            if let Err(e) = &result {
                observer.on_error(doc, e.kind());
            }
            observer.on_complete(doc, elapsed);
        }

        result
    }

    async fn get_body(&self, url: &reqwest::Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                resource: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| request_error(url, &e))?;
        Ok(body.to_vec())
    }
}

fn request_error(url: &reqwest::Url, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            resource: url.to_string(),
        }
    } else {
        FetchError::Client {
            resource: url.to_string(),
            reason: e.to_string(),
        }
    }
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, FetchError> {
    let resource = path.display().to_string();
    let content = std::fs::read(path).map_err(|source| FetchError::Io {
        resource: resource.clone(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| FetchError::Parse { resource, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReceiverInfo;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn fixture(name: &str) -> Resource {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../tests/fixtures")
            .join(name);
        Resource::File(path)
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl FetchObserver for RecordingObserver {
        fn on_request(&self, doc: Document) {
            self.events.lock().unwrap().push(format!("request {doc}"));
        }

        fn on_error(&self, doc: Document, kind: FetchErrorKind) {
            self.events.lock().unwrap().push(format!("error {doc} {kind}"));
        }

        fn on_complete(&self, doc: Document, _elapsed: Duration) {
            self.events.lock().unwrap().push(format!("complete {doc}"));
        }
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let fetcher = Fetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap();
        let receiver: ReceiverInfo = fetcher
            .fetch(Document::Receiver, &fixture("receiver.json"))
            .await
            .unwrap();
        assert_eq!(receiver.lat, Some(-34.9));
        assert_eq!(receiver.lon, Some(138.6));
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_io_error_without_telemetry() {
        let observer = Arc::new(RecordingObserver::default());
        let fetcher = Fetcher::new(DEFAULT_FETCH_TIMEOUT)
            .unwrap()
            .with_observer(observer.clone());
        let err = fetcher
            .fetch::<ReceiverInfo>(Document::Receiver, &fixture("does-not-exist.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::IoError);
        assert!(observer.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_malformed_file_is_parse_error() {
        let fetcher = Fetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap();
        let err = fetcher
            .fetch::<ReceiverInfo>(Document::Receiver, &fixture("malformed.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_unreachable_url_reports_error_and_duration() {
        let observer = Arc::new(RecordingObserver::default());
        let fetcher = Fetcher::new(Duration::from_millis(500))
            .unwrap()
            .with_observer(observer.clone());
        // Port 9 (discard) on localhost is expected to refuse connections.
        let resource = Resource::parse("http://127.0.0.1:9/data/stats.json").unwrap();
        let err = fetcher
            .fetch::<serde_json::Value>(Document::Stats, &resource)
            .await
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            FetchErrorKind::ClientError | FetchErrorKind::Timeout
        ));

        let events = observer.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], "request stats");
        assert!(events[1].starts_with("error stats "));
        assert_eq!(events[2], "complete stats");
    }

    /// Serves a few canned dump1090 responses on an ephemeral port.
    async fn spawn_receiver() -> std::net::SocketAddr {
        use axum::routing::get;

        let app = axum::Router::new()
            .route("/data/receiver.json", get(|| async { r#"{"lat":-34.9,"lon":138.6}"# }))
            .route("/data/stats.json", get(|| async { "{\"total\": " }))
            .route(
                "/data/aircraft.json",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "{}"
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    fn recording_fetcher(timeout: Duration) -> (Fetcher, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let fetcher = Fetcher::new(timeout).unwrap().with_observer(observer.clone());
        (fetcher, observer)
    }

    #[tokio::test]
    async fn test_fetch_url_success_reports_request_and_duration() {
        let addr = spawn_receiver().await;
        let (fetcher, observer) = recording_fetcher(DEFAULT_FETCH_TIMEOUT);
        let resource = Resource::parse(&format!("http://{addr}/data/receiver.json")).unwrap();

        let receiver: ReceiverInfo = fetcher.fetch(Document::Receiver, &resource).await.unwrap();

        assert_eq!(receiver.lat, Some(-34.9));
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["request receiver", "complete receiver"]
        );
    }

    #[tokio::test]
    async fn test_fetch_url_not_found_is_bad_status() {
        let addr = spawn_receiver().await;
        let (fetcher, observer) = recording_fetcher(DEFAULT_FETCH_TIMEOUT);
        let resource = Resource::parse(&format!("http://{addr}/data/missing.json")).unwrap();

        let err = fetcher
            .fetch::<serde_json::Value>(Document::Stats, &resource)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::BadStatus { status: 404, .. }));
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["request stats", "error stats bad_status", "complete stats"]
        );
    }

    #[tokio::test]
    async fn test_fetch_url_slow_response_is_timeout() {
        let addr = spawn_receiver().await;
        let (fetcher, observer) = recording_fetcher(Duration::from_millis(300));
        let resource = Resource::parse(&format!("http://{addr}/data/aircraft.json")).unwrap();

        let err = fetcher
            .fetch::<serde_json::Value>(Document::Aircraft, &resource)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::Timeout);
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["request aircraft", "error aircraft timeout", "complete aircraft"]
        );
    }

    #[tokio::test]
    async fn test_fetch_url_truncated_body_is_parse_error() {
        let addr = spawn_receiver().await;
        let (fetcher, observer) = recording_fetcher(DEFAULT_FETCH_TIMEOUT);
        let resource = Resource::parse(&format!("http://{addr}/data/stats.json")).unwrap();

        let err = fetcher
            .fetch::<serde_json::Value>(Document::Stats, &resource)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::ParseError);
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["request stats", "error stats parse_error", "complete stats"]
        );
    }

    #[test]
    fn test_error_kind_labels() {
        let err = FetchError::BadStatus {
            resource: "http://localhost/data/stats.json".to_string(),
            status: 404,
        };
        assert_eq!(err.kind().as_str(), "bad_status");
        assert_eq!(
            err.to_string(),
            "fetch failed 404: http://localhost/data/stats.json"
        );
        assert_eq!(FetchErrorKind::Timeout.to_string(), "timeout");
    }
}
