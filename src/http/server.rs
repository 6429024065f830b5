//! HTTP server setup and the inbound proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, body limit)
//! - Own the worker pool for the lifetime of the server
//! - Hand each inbound request to the pool and wait for its completion

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::dispatch::{
    completion, queue, DispatchReceiver, DispatchSender, ProxyRequest, UpstreamClient, WorkItem,
    WorkerPool,
};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::load_balancer::HostSelector;
use crate::observability::metrics::InFlightGuard;

/// Error building the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no upstream hosts configured")]
    NoHosts,

    #[error("failed to build upstream TLS config: {0}")]
    Tls(#[from] rustls::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<HostSelector>,
    pub queue: DispatchSender,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    receiver: DispatchReceiver,
    upstream: Arc<UpstreamClient>,
}

impl HttpServer {
    /// Create a new HTTP server from a validated configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let host_count =
            NonZeroUsize::new(config.upstream.hosts.len()).ok_or(ServerError::NoHosts)?;
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);
        let (sender, receiver) = queue::unbounded();

        let state = AppState {
            selector: Arc::new(HostSelector::new(host_count)),
            queue: sender,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            receiver,
            upstream,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes)),
            )
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// After the HTTP side has drained, the dispatch queue closes and the
    /// workers finish whatever is left before this returns.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let pool = WorkerPool::spawn(self.config.workers, self.receiver, self.upstream);

        tracing::info!(
            address = %addr,
            workers = pool.size(),
            hosts = ?self.config.upstream.hosts,
            scheme = %self.config.upstream.scheme,
            "HTTP server starting"
        );

        // the router owns the only queue sender; dropping it closes the queue
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.signalled().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped, draining workers");
        pool.join().await;
        Ok(())
    }
}

/// Inbound handler: assign a host, enqueue, wait for a worker to complete.
///
/// The body is buffered by the extractor; oversized bodies are rejected with
/// 413 by the body limit layer before a host is assigned.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _in_flight = InFlightGuard::new();
    let assignment = state.selector.assign();
    let request_id = assignment.request_id;

    tracing::debug!(
        request_id = %request_id,
        host_index = assignment.host_index,
        method = %method,
        path = %uri.path(),
        "Dispatching request"
    );

    let (completer, completion) = completion::channel(request_id);
    let request = ProxyRequest {
        method,
        uri,
        headers,
        body,
    };

    if let Err(e) = state.queue.enqueue(WorkItem::new(request, assignment, completer)) {
        tracing::warn!(request_id = %request_id, error = %e, "Dispatch queue rejected request");
        return e.into_response();
    }

    match completion.wait().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Request was not completed");
            e.into_response()
        }
    }
}
