// SPDX-License-Identifier: MIT

use clap::Parser;
use tracing::error;

use cw_worker::config::{Config, LogFormat};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));

    match config.log_format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().json().with_env_filter(filter).init();
        }
    }

    if let Err(err) = cw_worker::run(config).await {
        error!("fatal: {err:#}");
        std::process::exit(1);
    }
}
