//! Per-request completion signalling.
//!
//! Each inbound request gets a private one-shot pair: the [`Completer`]
//! travels with the work item to a worker, the [`Completion`] stays with the
//! inbound handler. Completing consumes the completer, so a request can be
//! marked done at most once and never reset.

use axum::response::Response;
use tokio::sync::oneshot;

use crate::dispatch::DispatchError;
use crate::http::request::RequestId;

/// Create a linked completer/completion pair for one request.
pub fn channel(request_id: RequestId) -> (Completer, Completion) {
    let (tx, rx) = oneshot::channel();
    (
        Completer { request_id, tx },
        Completion { request_id, rx },
    )
}

/// Worker side: delivers the finished response.
pub struct Completer {
    request_id: RequestId,
    tx: oneshot::Sender<Response>,
}

impl Completer {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Mark the request done and hand over its response.
    ///
    /// Returns `false` when the caller has already gone away; the response is
    /// dropped in that case.
    pub fn complete(self, response: Response) -> bool {
        self.tx.send(response).is_ok()
    }

    /// Whether the waiting handler is still interested.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Handler side: resolves once the worker completes the request.
pub struct Completion {
    request_id: RequestId,
    rx: oneshot::Receiver<Response>,
}

impl Completion {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Wait for the response. Fails only if the completer was dropped
    /// without completing, e.g. the queue was torn down with the item in it.
    pub async fn wait(self) -> Result<Response, DispatchError> {
        self.rx.await.map_err(|_| DispatchError::Abandoned(self.request_id))
    }
}
