//! The unit of work handed from an inbound handler to a worker.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use std::time::Instant;

use crate::dispatch::completion::Completer;
use crate::http::request::RequestId;
use crate::load_balancer::Assignment;

/// Buffered inbound request, as forwarded upstream.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A request waiting for a worker. Consumed exactly once.
pub struct WorkItem {
    pub request: ProxyRequest,
    pub request_id: RequestId,
    /// Index into the upstream host list; fixed once enqueued.
    pub host_index: usize,
    pub enqueued_at: Instant,
    pub completer: Completer,
}

impl WorkItem {
    pub fn new(request: ProxyRequest, assignment: Assignment, completer: Completer) -> Self {
        Self {
            request,
            request_id: assignment.request_id,
            host_index: assignment.host_index,
            enqueued_at: Instant::now(),
            completer,
        }
    }
}
