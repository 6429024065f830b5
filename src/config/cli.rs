//! Command-line interface.
//!
//! Flags mirror the configuration file; any flag given on the command line
//! overrides the value loaded from `--config`.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{ProxyConfig, UpstreamScheme};
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "dalal-proxy")]
#[command(version, about = "Round-robin HTTP reverse proxy with a fixed worker pool", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of workers (maximum concurrent upstream requests)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Upstream host(s), comma separated: service1.com,service2.com
    #[arg(long)]
    pub hosts: Option<String>,

    /// Upstream protocol scheme [http, https]
    #[arg(long)]
    pub scheme: Option<UpstreamScheme>,

    /// Port the proxy listens on
    #[arg(long)]
    pub port: Option<u16>,

    /// Address the proxy binds to
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Remove the Cache-Control header from responses
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub disable_cache: Option<bool>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Maximum inbound request body size in bytes
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Default log level when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub log_json: Option<bool>,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<SocketAddr>,
}

impl Cli {
    /// Build the effective configuration: file (if any), then flag overrides.
    ///
    /// The result is not validated; see [`Cli::into_validated_config`].
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(hosts) = self.hosts.as_deref() {
            config.upstream.hosts = split_hosts(hosts);
        }
        if let Some(scheme) = self.scheme {
            config.upstream.scheme = scheme;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_ip = bind;
        }
        if let Some(disable_cache) = self.disable_cache {
            config.upstream.disable_cache = disable_cache;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.upstream.timeout_secs = timeout_secs;
        }
        if let Some(max_body_bytes) = self.max_body_bytes {
            config.listener.max_body_bytes = max_body_bytes;
        }
        if let Some(log_level) = self.log_level {
            config.observability.log_level = log_level;
        }
        if let Some(log_json) = self.log_json {
            config.observability.log_json = log_json;
        }
        if self.metrics_address.is_some() {
            config.observability.metrics_address = self.metrics_address;
        }

        Ok(config)
    }

    /// Build the effective configuration and run semantic validation on it.
    pub fn into_validated_config(self) -> Result<ProxyConfig, ConfigError> {
        let config = self.into_config()?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Split a comma-separated host list. Entries are trimmed; an empty input
/// yields no hosts, while empty entries are kept so validation reports them.
pub fn split_hosts(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|h| h.trim().to_string()).collect()
}
