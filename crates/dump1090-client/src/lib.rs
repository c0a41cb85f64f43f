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

//! Client library for the JSON status documents published by dump1090.
//!
//! The library is split into layers that can be used independently:
//!
//! - **Geo layer**: haversine distance, relative bearing and the fixed
//!   bearing-sector / distance-bucket classification used for range metrics
//! - **Protocol layer**: serde models for `receiver.json` and
//!   `aircraft.json`; `stats.json` is handled as a loosely typed value
//! - **Fetch layer**: resource locators (URL or directory) and a one-shot
//!   fetcher with a bounded timeout and pluggable request telemetry
//!
//! # Quick Start
//!
//! ```no_run
//! use dump1090_client::{Document, Fetcher, ReceiverInfo, ResourceSet, DEFAULT_FETCH_TIMEOUT};
//!
//! #[tokio::main]
//! async fn main() {
//!     let resources = ResourceSet::new("http://localhost:8080/data").unwrap();
//!     let fetcher = Fetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap();
//!
//!     match fetcher
//!         .fetch::<ReceiverInfo>(Document::Receiver, resources.receiver())
//!         .await
//!     {
//!         Ok(receiver) => println!("receiver at {:?}", receiver.origin()),
//!         Err(e) => eprintln!("fetch failed: {e}"),
//!     }
//! }
//! ```
//!
//! ## Geo Layer Only
//!
//! ```
//! use dump1090_client::geo::{bearing_sector, distance_bucket, haversine_distance, relative_bearing, Position};
//!
//! let origin = Position::new(-34.9285, 138.6007);
//! let target = Position::new(-34.9285, 139.0);
//! let distance = haversine_distance(origin, target);
//! assert_eq!(bearing_sector(relative_bearing(origin, target)), "90.0");
//! assert_eq!(distance_bucket(distance), "80000.0");
//! ```

pub mod fetch;
pub mod geo;
pub mod protocol;

pub use fetch::{
    Document, FetchError, FetchErrorKind, FetchObserver, Fetcher, Resource, ResourceError,
    ResourceSet, DEFAULT_FETCH_TIMEOUT,
};
pub use geo::Position;
pub use protocol::{AircraftRecord, AircraftSnapshot, ReceiverInfo, StatsDocument};
