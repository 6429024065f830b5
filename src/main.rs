//! Dalal Proxy
//!
//! A round-robin HTTP reverse proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                     DALAL PROXY                      │
//!                       │                                                      │
//!   Client Request      │  ┌──────────┐   ┌─────────────┐   ┌──────────────┐   │
//!   ────────────────────┼─▶│  http    │──▶│load_balancer│──▶│  dispatch    │   │
//!                       │  │ handler  │   │ round robin │   │    queue     │   │
//!                       │  └────▲─────┘   └─────────────┘   └──────┬───────┘   │
//!                       │       │                                  │           │
//!                       │       │ completion                       ▼           │
//!   Client Response     │  ┌────┴─────┐                     ┌──────────────┐   │
//!   ◀───────────────────┼──│ response │◀────────────────────│ worker pool  │◀──┼── Upstream
//!                       │  │ rewrite  │                     │  (N tasks)   │   │   Hosts
//!                       │  └──────────┘                     └──────────────┘   │
//!                       │                                                      │
//!                       │  config · observability · lifecycle                  │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use dalal_proxy::config::{Cli, ConfigError};
use dalal_proxy::lifecycle::{startup, BANNER};
use dalal_proxy::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", BANNER);

    // logging depends on the config, so config errors go straight to stderr
    let config = match Cli::parse().into_validated_config() {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("dalal-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
