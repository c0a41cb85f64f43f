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

//! Models for the JSON documents published by dump1090.
//!
//! dump1090 writes three status documents next to each other:
//!
//! ```text
//! <base>/receiver.json   receiver configuration (optionally lat/lon)
//! <base>/aircraft.json   current aircraft list
//! <base>/stats.json      decoder statistics grouped by time period
//! ```
//!
//! Receiver and aircraft documents are modelled as typed structs. Every
//! optional key deserializes to `None` when absent so downstream code never
//! branches on key presence. The statistics document is irregular and stays
//! a [`serde_json::Value`].

use serde::Deserialize;
use serde_json::Value;

use crate::geo::Position;

/// Statistics document, walked field by field by the consumer.
pub type StatsDocument = Value;

/// Contents of `receiver.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReceiverInfo {
    /// dump1090 version string.
    pub version: Option<String>,
    /// Refresh interval of the aircraft document in milliseconds.
    pub refresh: Option<f64>,
    /// Number of history files written.
    pub history: Option<u64>,
    /// Receiver latitude, present when configured.
    pub lat: Option<f64>,
    /// Receiver longitude, present when configured.
    pub lon: Option<f64>,
}

impl ReceiverInfo {
    /// Receiver position, only when both coordinates are reported.
    #[must_use]
    pub fn origin(&self) -> Option<Position> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Position::new(lat, lon)),
            _ => None,
        }
    }
}

/// Contents of `aircraft.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AircraftSnapshot {
    /// Time the document was written, seconds since the epoch.
    pub now: Option<f64>,
    /// Total Mode S messages processed since start.
    pub messages: Option<u64>,
    /// Aircraft currently known to the decoder.
    pub aircraft: Vec<AircraftRecord>,
}

/// One entry of the aircraft list.
///
/// Only `seen`, `seen_pos`, `lat`, `lon` and `mlat` drive metrics; the
/// remaining keys are kept so the record mirrors the document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AircraftRecord {
    /// ICAO 24-bit address as hex.
    pub hex: String,
    pub squawk: Option<String>,
    pub flight: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub nucp: Option<f64>,
    /// Seconds since the position was last updated.
    pub seen_pos: Option<f64>,
    /// Altitude in feet, or `"ground"`.
    pub altitude: Option<Value>,
    pub vert_rate: Option<f64>,
    pub track: Option<f64>,
    pub speed: Option<f64>,
    pub category: Option<String>,
    /// Fields derived from multilateration. Newer dump1090 builds publish a
    /// list of field names, older ones an object.
    pub mlat: Option<Value>,
    pub tisb: Option<Value>,
    pub messages: Option<u64>,
    /// Seconds since any message was last received.
    pub seen: Option<f64>,
    pub rssi: Option<f64>,
}

impl AircraftRecord {
    /// Reported position, only when both coordinates are present.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Position::new(lat, lon)),
            _ => None,
        }
    }

    /// Whether the record was seen strictly less than `threshold` seconds ago.
    #[must_use]
    pub fn seen_within(&self, threshold: f64) -> bool {
        self.seen.is_some_and(|seen| seen < threshold)
    }

    /// Whether the position was updated strictly less than `threshold`
    /// seconds ago.
    #[must_use]
    pub fn position_seen_within(&self, threshold: f64) -> bool {
        self.seen_pos.is_some_and(|seen_pos| seen_pos < threshold)
    }

    /// Whether the latitude was derived by multilateration.
    #[must_use]
    pub fn has_mlat_position(&self) -> bool {
        match &self.mlat {
            Some(Value::Array(fields)) => fields.iter().any(|f| f.as_str() == Some("lat")),
            Some(Value::Object(fields)) => fields.contains_key("lat"),
            _ => false,
        }
    }
}
