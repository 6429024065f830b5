//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy upstream response headers for the client
//! - Remove headers that leak upstream details (Server, Via, X-Powered-By)
//! - Optionally remove Cache-Control
//! - Stamp the proxy's own Server header
//!
//! # Design Decisions
//! - Bodies are fully buffered before the response is built
//! - Hop-by-hop headers stripped automatically

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::Response;

use crate::http::headers::is_hop_by_hop;

/// Value of the `server` header on every proxied response.
pub const PROXY_NAME: &str = "Dalal Proxy";

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Headers removed from upstream responses.
const STRIPPED: [HeaderName; 3] = [header::SERVER, header::VIA, X_POWERED_BY];

/// Which upstream response headers reach the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderPolicy {
    /// Also remove `cache-control`.
    pub disable_cache: bool,
}

impl HeaderPolicy {
    pub fn new(disable_cache: bool) -> Self {
        Self { disable_cache }
    }

    fn keeps(&self, name: &HeaderName) -> bool {
        if is_hop_by_hop(name) || STRIPPED.contains(name) {
            return false;
        }
        !(self.disable_cache && name == header::CACHE_CONTROL)
    }

    /// Copy every permitted upstream header and add the proxy `server` header.
    pub fn rewrite(&self, upstream: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(upstream.len() + 1);
        for (name, value) in upstream {
            if self.keeps(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        headers.insert(header::SERVER, HeaderValue::from_static(PROXY_NAME));
        headers
    }
}

/// Assemble the client response from a buffered upstream response.
pub fn buffered_response(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
