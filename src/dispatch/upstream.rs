//! Upstream HTTP calls.
//!
//! # Responsibilities
//! - Resolve a host index against the fixed host list
//! - Send the buffered request with a bounded timeout
//! - Buffer the whole upstream body and rewrite response headers
//! - Map failures to the proxy's synthesized 500 responses
//!
//! # Design Decisions
//! - One shared client for all workers (it pools connections internally)
//! - The target is built as an `http::Uri` from the raw inbound path-and-query
//! - Redirects are returned to the caller, never followed
//! - No retries and no fallback host

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};

use crate::config::{UpstreamConfig, UpstreamScheme};
use crate::dispatch::work_item::ProxyRequest;
use crate::http::request::{forwarded_headers, upstream_uri, RequestId};
use crate::http::response::{buffered_response, HeaderPolicy};

/// Body sent when the upstream could not be reached.
pub const PROXY_ERROR_BODY: &str = "error while proxy";
/// Body sent when the upstream response body could not be read.
pub const READ_ERROR_BODY: &str = "error while reading response from proxy";

type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Failure of a single upstream call. Terminal for that request only.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Transport(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to read upstream response body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("upstream body not received within {0:?}")]
    BodyTimeout(Duration),

    #[error("invalid upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("no upstream host at index {0}")]
    UnknownHost(usize),
}

impl ProxyError {
    /// Plain-text body returned to the caller.
    pub fn client_message(&self) -> &'static str {
        match self {
            ProxyError::BodyRead(_) | ProxyError::BodyTimeout(_) => READ_ERROR_BODY,
            _ => PROXY_ERROR_BODY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.client_message()).into_response()
    }
}

/// Fully buffered upstream response with rewritten headers.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        buffered_response(self.status, self.headers, self.body)
    }
}

/// Client for the fixed set of upstream hosts.
pub struct UpstreamClient {
    client: HttpClient,
    scheme: UpstreamScheme,
    hosts: Arc<[String]>,
    timeout: Duration,
    header_policy: HeaderPolicy,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, rustls::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(timeout));

        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(https),
            scheme: config.scheme,
            hosts: config.hosts.iter().cloned().collect(),
            timeout,
            header_policy: HeaderPolicy::new(config.disable_cache),
        })
    }

    pub fn host(&self, index: usize) -> Option<&str> {
        self.hosts.get(index).map(String::as_str)
    }

    /// Forward `request` to the host at `host_index` and buffer the answer.
    ///
    /// The timeout covers the whole exchange, body included.
    pub async fn forward(
        &self,
        request: &ProxyRequest,
        request_id: RequestId,
        host_index: usize,
    ) -> Result<UpstreamResponse, ProxyError> {
        let host = self.host(host_index).ok_or(ProxyError::UnknownHost(host_index))?;
        let deadline = Instant::now() + self.timeout;

        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(upstream_uri(self.scheme, host, &request.uri)?);
        if let Some(headers) = builder.headers_mut() {
            *headers = forwarded_headers(&request.headers, request_id);
        }
        let body = if request.body.is_empty() {
            Body::empty()
        } else {
            Body::from(request.body.clone())
        };
        let outbound = builder.body(body)?;

        let upstream = timeout_at(deadline, self.client.request(outbound))
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout))?
            .map_err(ProxyError::Transport)?;

        let (parts, incoming): (_, hyper::body::Incoming) = upstream.into_parts();
        let headers = self.header_policy.rewrite(&parts.headers);
        let body = timeout_at(deadline, axum::body::to_bytes(Body::new(incoming), usize::MAX))
            .await
            .map_err(|_| ProxyError::BodyTimeout(self.timeout))?
            .map_err(ProxyError::BodyRead)?;

        Ok(UpstreamResponse {
            status: parts.status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    fn client(hosts: &[&str]) -> UpstreamClient {
        let config = UpstreamConfig {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            scheme: UpstreamScheme::Http,
            ..UpstreamConfig::default()
        };
        UpstreamClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_host_lookup() {
        let upstream = client(&["a.com", "b.com"]);
        assert_eq!(upstream.host(0), Some("a.com"));
        assert_eq!(upstream.host(1), Some("b.com"));
        assert_eq!(upstream.host(2), None);
    }

    #[tokio::test]
    async fn test_unknown_host_index() {
        let upstream = client(&["a.com"]);
        let request = ProxyRequest {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        let err = upstream.forward(&request, RequestId::new(), 5).await.unwrap_err();
        assert!(matches!(err, ProxyError::UnknownHost(5)));
        assert_eq!(err.client_message(), PROXY_ERROR_BODY);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_body_failures_use_read_error_body() {
        let err = ProxyError::BodyTimeout(Duration::from_secs(1));
        assert_eq!(err.client_message(), READ_ERROR_BODY);
        let err = ProxyError::Timeout(Duration::from_secs(1));
        assert_eq!(err.client_message(), PROXY_ERROR_BODY);
    }
}
