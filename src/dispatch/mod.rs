//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound handler
//!     → completion.rs (private one-shot pair per request)
//!     → work_item.rs (buffered request + host index + completer)
//!     → queue.rs (unbounded MPMC handoff)
//!     → worker.rs (fixed pool of N tasks)
//!     → upstream.rs (HTTP call, header rewrite)
//!     → completer fires, inbound handler returns the response
//! ```
//!
//! # Design Decisions
//! - Inbound tasks never call upstream; only workers do, bounding
//!   concurrent upstream work to the pool size
//! - Completion is signalled per request; there is no shared registry
//! - Every work item resolves: a response is delivered, or its completer is
//!   dropped and the waiting handler answers 500

pub mod completion;
pub mod queue;
pub mod upstream;
pub mod work_item;
pub mod worker;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::request::RequestId;

pub use completion::{Completer, Completion};
pub use queue::{DispatchReceiver, DispatchSender};
pub use upstream::{ProxyError, UpstreamClient, UpstreamResponse};
pub use work_item::{ProxyRequest, WorkItem};
pub use worker::WorkerPool;

/// Failure to get a request through the dispatch pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch queue closed, request {0} rejected")]
    QueueClosed(RequestId),

    #[error("request {0} dropped before completion")]
    Abandoned(RequestId),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::QueueClosed(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "proxy is shutting down").into_response()
            }
            DispatchError::Abandoned(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, upstream::PROXY_ERROR_BODY).into_response()
            }
        }
    }
}
