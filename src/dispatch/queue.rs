//! Unbounded dispatch queue between inbound handlers and workers.
//!
//! Any number of handlers enqueue through cloned [`DispatchSender`]s; all
//! workers share one receiver, so each item is taken by exactly one worker.
//! The queue closes once every sender is dropped and the remaining items
//! have been drained.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::dispatch::work_item::WorkItem;
use crate::dispatch::DispatchError;

/// Create a new dispatch queue.
pub fn unbounded() -> (DispatchSender, DispatchReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DispatchSender { tx },
        DispatchReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

#[derive(Clone)]
pub struct DispatchSender {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl DispatchSender {
    /// Hand a work item to the worker pool. Never waits.
    pub fn enqueue(&self, item: WorkItem) -> Result<(), DispatchError> {
        let request_id = item.request_id;
        self.tx
            .send(item)
            .map_err(|_| DispatchError::QueueClosed(request_id))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Clone)]
pub struct DispatchReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>,
}

impl DispatchReceiver {
    /// Take the next work item, waiting while the queue is empty.
    /// Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<WorkItem> {
        self.rx.lock().await.recv().await
    }
}
