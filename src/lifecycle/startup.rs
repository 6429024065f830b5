//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when configured
//! - Build the server (upstream client, selector, dispatch queue)
//! - Bind the listener and serve until a termination signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Configuration is validated before this module is entered
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Usage banner printed when the binary starts.
pub const BANNER: &str = r#"
Dalal Proxy
------------
Simple round-robin reverse proxy <->
Usage:
--workers (default: 1)
==> Number of workers (maximum concurrent upstream requests)
--hosts (required)
==> Upstream server(s), comma separated
--scheme (default: https)
==> Protocol scheme for upstream servers
--port (default: 65535)
==> Port the proxy listens on
--disable-cache (default: false)
==> Remove Cache-Control header from responses

Example:
dalal-proxy --workers=40 --hosts=service1.com,service2.com --scheme=https --disable-cache
"#;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the proxy with a validated configuration until shutdown.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    if let Some(addr) = config.observability.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let addr = config.listener.socket_addr();
    let workers = config.workers;
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(workers, "workers: {}", workers);
    tracing::info!(port = addr.port(), "listening on port: {}", addr.port());

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown.listener()).await?;
    Ok(())
}
