//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Build the upstream URI for a chosen host
//! - Prepare request headers for forwarding to the upstream
//!
//! # Design Decisions
//! - Request ID assigned together with the upstream host, before enqueueing
//! - Method, path, query and body are forwarded unchanged; the raw
//!   path-and-query is reused as-is, never normalized or re-encoded

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::PathAndQuery;
use axum::http::Uri;
use std::fmt;
use uuid::Uuid;

use crate::config::UpstreamScheme;
use crate::http::headers::is_hop_by_hop;

/// Header carrying the request id to the upstream.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Unique id correlating an inbound request with its work item and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Build `scheme://host` followed by the inbound path and query, byte for byte.
pub fn upstream_uri(
    scheme: UpstreamScheme,
    host: &str,
    inbound: &Uri,
) -> Result<Uri, axum::http::Error> {
    let path_and_query = inbound
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/");

    Uri::builder()
        .scheme(scheme.as_str())
        .authority(host)
        .path_and_query(path_and_query)
        .build()
}

/// Copy end-to-end request headers for the upstream call.
///
/// `host` is dropped because it names the proxy, `content-length` because the
/// client recomputes it from the buffered body.
pub fn forwarded_headers(inbound: &HeaderMap, request_id: RequestId) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if is_hop_by_hop(name) || name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(X_REQUEST_ID, value);
    }
    headers
}
