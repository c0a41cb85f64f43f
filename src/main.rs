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

//! Prometheus exporter for dump1090 receivers.

mod aircraft;
mod config;
mod exporter;
mod metrics;
mod server;
mod stats;
mod telemetry;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use config::{AppConfig, Cli};
use exporter::{Exporter, ExporterError};

async fn run(config: AppConfig) -> Result<(), ExporterError> {
    let mut exporter = Exporter::new(config)?;
    exporter.start().await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    info!("Shutting down");
    exporter.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();

    let level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
