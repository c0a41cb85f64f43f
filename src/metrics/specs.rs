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

//! The exported metric table.
//!
//! Every exported metric is a row here. Names are listed without the
//! `dump1090_` prefix, which is added when instruments are created.

use super::{FieldShape, MetricKind, MetricSpec, StatsSpec, TimePeriod};

/// Aircraft summary metrics, computed from `aircraft.json`.
pub const AIRCRAFT_SPECS: &[MetricSpec] = &[
    MetricSpec {
        key: "observed",
        kind: MetricKind::Gauge,
        name: "recent_aircraft_observed",
        help: "Number of aircraft recently observed",
    },
    MetricSpec {
        key: "observed_with_pos",
        kind: MetricKind::Gauge,
        name: "recent_aircraft_with_position",
        help: "Number of aircraft recently observed with position",
    },
    MetricSpec {
        key: "observed_with_mlat",
        kind: MetricKind::Gauge,
        name: "recent_aircraft_with_multilateration",
        help: "Number of aircraft recently observed with multilateration",
    },
    MetricSpec {
        key: "max_range",
        kind: MetricKind::Gauge,
        name: "recent_aircraft_max_range",
        help: "Maximum range of recently observed aircraft",
    },
    MetricSpec {
        key: "by_range",
        kind: MetricKind::Gauge,
        name: "recent_aircraft_by_range",
        help: "Number of recently observed aircraft by bearing and range band",
    },
    MetricSpec {
        key: "range",
        kind: MetricKind::Histogram,
        name: "aircraft_range_meters",
        help: "Distribution of aircraft ranges from the receiver by bearing",
    },
];

/// Request telemetry recorded by the fetcher.
pub const HTTP_SPECS: &[MetricSpec] = &[
    MetricSpec {
        key: "total",
        kind: MetricKind::Counter,
        name: "exporter_requests_total",
        help: "Number of requests made to dump1090",
    },
    MetricSpec {
        key: "errors",
        kind: MetricKind::Counter,
        name: "exporter_request_errors_total",
        help: "Number of failed requests made to dump1090",
    },
    MetricSpec {
        key: "durations",
        kind: MetricKind::Histogram,
        name: "exporter_request_duration_seconds",
        help: "Time taken by requests made to dump1090",
    },
];

/// Decoder statistics, read from `stats.json`. `group` names the nested
/// object inside the time period section; an empty group reads the
/// section itself.
pub const STATS_SPECS: &[StatsSpec] = &[
    StatsSpec {
        group: "",
        key: "messages",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_messages_total",
        help: "Number of Mode-S messages processed",
    },
    StatsSpec {
        group: "",
        key: "messages_by_df",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Indexed { label: "data_format" },
        name: "stats_messages_by_df_total",
        help: "Number of messages processed by downlink format",
    },
    StatsSpec {
        group: "adaptive",
        key: "dynamic_range_limit_db",
        kind: MetricKind::Gauge,
        period: TimePeriod::Last1Min,
        shape: FieldShape::Scalar,
        name: "stats_adaptive_dynamic_range_limit_dB",
        help: "Current dynamic range gain upper limit in dB",
    },
    StatsSpec {
        group: "adaptive",
        key: "gain_changes",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_adaptive_gain_changes",
        help: "Number of gain changes caused by adaptive gain control",
    },
    StatsSpec {
        group: "adaptive",
        key: "gain_db",
        kind: MetricKind::Gauge,
        period: TimePeriod::Last1Min,
        shape: FieldShape::Scalar,
        name: "stats_adaptive_gain_dB",
        help: "Current adaptive gain setting in dB",
    },
    StatsSpec {
        group: "adaptive",
        key: "gain_seconds",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Paired { label: "dB" },
        name: "stats_adaptive_gain_dB_seconds",
        help: "Adaptive gain dB by seconds at that level",
    },
    StatsSpec {
        group: "adaptive",
        key: "loud_decoded",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_adaptive_loud_decoded",
        help: "Number of loud decoded messages",
    },
    StatsSpec {
        group: "adaptive",
        key: "loud_undecoded",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_adaptive_loud_undecoded",
        help: "Number of loud undecoded bursts",
    },
    StatsSpec {
        group: "adaptive",
        key: "noise_dbfs",
        kind: MetricKind::Gauge,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_adaptive_noise_level_dbFS",
        help: "Noise level dbFS",
    },
    StatsSpec {
        group: "cpr",
        key: "airborne",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_airborne",
        help: "Number of airborne CPR messages received",
    },
    StatsSpec {
        group: "cpr",
        key: "surface",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_surface",
        help: "Number of surface CPR messages received",
    },
    StatsSpec {
        group: "cpr",
        key: "filtered",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_filtered",
        help: "Number of CPR messages ignored",
    },
    StatsSpec {
        group: "cpr",
        key: "global_bad",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_global_bad",
        help: "Global positions that were rejected",
    },
    StatsSpec {
        group: "cpr",
        key: "global_ok",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_global_ok",
        help: "Global positions successfully derived",
    },
    StatsSpec {
        group: "cpr",
        key: "global_range",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_global_range",
        help: "Global positions rejected due to receiver max range check",
    },
    StatsSpec {
        group: "cpr",
        key: "global_skipped",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_global_skipped",
        help: "Global position attempts skipped due to missing data",
    },
    StatsSpec {
        group: "cpr",
        key: "global_speed",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_global_speed",
        help: "Global positions rejected due to speed check",
    },
    StatsSpec {
        group: "cpr",
        key: "local_aircraft_relative",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_local_aircraft_relative",
        help: "Local positions found relative to a previous aircraft position",
    },
    StatsSpec {
        group: "cpr",
        key: "local_ok",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_local_ok",
        help: "Local (relative) positions successfully found",
    },
    StatsSpec {
        group: "cpr",
        key: "local_range",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_local_range",
        help: "Local positions rejected due to receiver max range check",
    },
    StatsSpec {
        group: "cpr",
        key: "local_receiver_relative",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_local_receiver_relative",
        help: "Local positions found relative to the receiver position",
    },
    StatsSpec {
        group: "cpr",
        key: "local_skipped",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_local_skipped",
        help: "Local (relative) positions skipped due to missing data",
    },
    StatsSpec {
        group: "cpr",
        key: "local_speed",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpr_local_speed",
        help: "Local positions rejected due to speed check",
    },
    StatsSpec {
        group: "cpu",
        key: "background",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpu_background_milliseconds",
        help: "Time spent in network I/O, processing and periodic tasks",
    },
    StatsSpec {
        group: "cpu",
        key: "demod",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpu_demod_milliseconds",
        help: "Time spent demodulation and decoding data from SDR dongle",
    },
    StatsSpec {
        group: "cpu",
        key: "reader",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_cpu_reader_milliseconds",
        help: "Time spent reading sample data from SDR dongle",
    },
    StatsSpec {
        group: "local",
        key: "accepted",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Indexed { label: "bit_errors" },
        name: "stats_local_accepted",
        help: "Number of valid Mode S messages accepted with N-bit errors corrected",
    },
    StatsSpec {
        group: "local",
        key: "signal",
        kind: MetricKind::Gauge,
        period: TimePeriod::Last1Min,
        shape: FieldShape::Scalar,
        name: "stats_local_signal_strength_dbFS",
        help: "Signal strength dbFS",
    },
    StatsSpec {
        group: "local",
        key: "peak_signal",
        kind: MetricKind::Gauge,
        period: TimePeriod::Last1Min,
        shape: FieldShape::Scalar,
        name: "stats_local_peak_signal_strength_dbFS",
        help: "Peak signal strength dbFS",
    },
    StatsSpec {
        group: "local",
        key: "noise",
        kind: MetricKind::Gauge,
        period: TimePeriod::Last1Min,
        shape: FieldShape::Scalar,
        name: "stats_local_noise_level_dbFS",
        help: "Noise level dbFS",
    },
    StatsSpec {
        group: "local",
        key: "strong_signals",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_strong_signals",
        help: "Number of messages that had a signal power above -3dBFS",
    },
    StatsSpec {
        group: "local",
        key: "bad",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_bad",
        help: "Number of Mode S preambles that didn't result in a valid message",
    },
    StatsSpec {
        group: "local",
        key: "modes",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_modes",
        help: "Number of Mode S preambles received",
    },
    StatsSpec {
        group: "local",
        key: "modeac",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_modeac",
        help: "Number of Mode A/C preambles decoded",
    },
    StatsSpec {
        group: "local",
        key: "samples_dropped",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_samples_dropped",
        help: "Number of samples dropped",
    },
    StatsSpec {
        group: "local",
        key: "samples_processed",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_samples_processed",
        help: "Number of samples processed",
    },
    StatsSpec {
        group: "local",
        key: "unknown_icao",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_local_unknown_icao",
        help: "Number of Mode S preambles containing unrecognized ICAO",
    },
    StatsSpec {
        group: "remote",
        key: "accepted",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Indexed { label: "bit_errors" },
        name: "stats_remote_accepted",
        help: "Number of valid Mode S messages accepted with N-bit errors corrected",
    },
    StatsSpec {
        group: "remote",
        key: "bad",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_remote_bad",
        help: "Number of Mode S preambles that didn't result in a valid message",
    },
    StatsSpec {
        group: "remote",
        key: "modeac",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_remote_modeac",
        help: "Number of Mode A/C preambles decoded",
    },
    StatsSpec {
        group: "remote",
        key: "modes",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_remote_modes",
        help: "Number of Mode S preambles received",
    },
    StatsSpec {
        group: "remote",
        key: "unknown_icao",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_remote_unknown_icao",
        help: "Number of Mode S preambles containing unrecognized ICAO",
    },
    StatsSpec {
        group: "tracks",
        key: "all",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_tracks_all",
        help: "Number of tracks created",
    },
    StatsSpec {
        group: "tracks",
        key: "single_message",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_tracks_single_message",
        help: "Number of tracks consisting of only a single message",
    },
    StatsSpec {
        group: "tracks",
        key: "unreliable",
        kind: MetricKind::Counter,
        period: TimePeriod::Total,
        shape: FieldShape::Scalar,
        name: "stats_tracks_unreliable",
        help: "Number of unreliable tracks",
    },
];
