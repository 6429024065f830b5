//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and clap handle syntactic)
//! - Validate value ranges (workers > 0, ports valid, timeouts > 0)
//! - Validate upstream host names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before the listener is bound

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("worker size should be greater than 0 (got {0})")]
    InvalidWorkerCount(usize),

    #[error("please supply hostname(s), multiple names are comma separated")]
    NoHosts,

    #[error("invalid hostname {0:?}")]
    InvalidHostname(String),

    #[error("invalid protocol scheme {0:?}, supported: http, https")]
    InvalidScheme(String),

    #[error("invalid port number {0}")]
    InvalidPort(u16),

    #[error("upstream timeout must be greater than 0 seconds")]
    InvalidTimeout,

    #[error("maximum request body size must be greater than 0 bytes")]
    InvalidBodyLimit,
}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers == 0 {
        errors.push(ValidationError::InvalidWorkerCount(config.workers));
    }

    if config.upstream.hosts.is_empty() {
        errors.push(ValidationError::NoHosts);
    }
    for host in &config.upstream.hosts {
        if !is_valid_host(host) {
            errors.push(ValidationError::InvalidHostname(host.clone()));
        }
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort(config.listener.port));
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::InvalidTimeout);
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::InvalidBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts `name`, `name:port`, `ipv4`, `ipv4:port`, `[ipv6]` and `[ipv6]:port`.
pub fn is_valid_host(entry: &str) -> bool {
    if let Some(rest) = entry.strip_prefix('[') {
        let Some((addr, tail)) = rest.split_once(']') else {
            return false;
        };
        if addr.parse::<Ipv6Addr>().is_err() {
            return false;
        }
        return tail.is_empty() || tail.strip_prefix(':').is_some_and(is_valid_port);
    }

    let (name, port) = match entry.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (entry, None),
    };
    if let Some(port) = port {
        if !is_valid_port(port) {
            return false;
        }
    }

    name.parse::<Ipv4Addr>().is_ok() || is_dns_name(name)
}

/// Syntactic DNS name check: dot-separated labels of at most 63 characters,
/// each starting with an alphanumeric or underscore. A trailing dot is allowed.
pub fn is_dns_name(name: &str) -> bool {
    if name.is_empty() || name.chars().filter(|c| *c != '.').count() > 255 {
        return false;
    }
    if name.parse::<IpAddr>().is_ok() {
        return false;
    }

    let name = name.strip_suffix('.').unwrap_or(name);
    name.split('.').all(is_dns_label)
}

fn is_dns_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            bytes.len() <= 63
                && (first.is_ascii_alphanumeric() || *first == b'_')
                && rest
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
        }
        None => false,
    }
}

fn is_valid_port(port: &str) -> bool {
    !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit())
        && matches!(port.parse::<u16>(), Ok(p) if p != 0)
}
