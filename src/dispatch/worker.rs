//! Fixed-size pool of workers performing upstream calls.
//!
//! Every worker loops on the shared dispatch queue: take an item, call the
//! upstream, complete the item. Failures resolve into a 500 response for that
//! one request and the worker moves on. Workers exit once the queue is closed
//! and drained.

use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::dispatch::queue::DispatchReceiver;
use crate::dispatch::upstream::UpstreamClient;
use crate::dispatch::work_item::WorkItem;
use crate::observability::metrics;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers consuming from `receiver`.
    pub fn spawn(size: usize, receiver: DispatchReceiver, upstream: Arc<UpstreamClient>) -> Self {
        let handles = (0..size)
            .map(|id| {
                let worker = Worker {
                    id,
                    receiver: receiver.clone(),
                    upstream: upstream.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        tracing::info!(workers = size, "Worker pool started");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

struct Worker {
    id: usize,
    receiver: DispatchReceiver,
    upstream: Arc<UpstreamClient>,
}

impl Worker {
    async fn run(self) {
        tracing::debug!(worker = self.id, "Worker started");
        while let Some(item) = self.receiver.next().await {
            self.process(item).await;
        }
        tracing::debug!(worker = self.id, "Dispatch queue closed, worker exiting");
    }

    async fn process(&self, item: WorkItem) {
        let WorkItem {
            request,
            request_id,
            host_index,
            enqueued_at,
            completer,
        } = item;
        metrics::record_queue_wait(enqueued_at);

        let started = Instant::now();
        let host = self.upstream.host(host_index).unwrap_or("unknown");

        let outcome = self.upstream.forward(&request, request_id, host_index).await;
        let response: Response = match outcome {
            Ok(upstream) => {
                tracing::info!(
                    request_id = %request_id,
                    worker = self.id,
                    method = %request.method,
                    host = %host,
                    status = upstream.status.as_u16(),
                    path = %request.uri.path(),
                    "Proxied request"
                );
                metrics::record_request(
                    request.method.as_str(),
                    upstream.status.as_u16(),
                    host,
                    started,
                );
                upstream.into_response()
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    worker = self.id,
                    method = %request.method,
                    host = %host,
                    path = %request.uri.path(),
                    error = %e,
                    "Upstream request failed"
                );
                let response = e.into_response();
                metrics::record_request(
                    request.method.as_str(),
                    response.status().as_u16(),
                    host,
                    started,
                );
                response
            }
        };

        if !completer.complete(response) {
            tracing::debug!(request_id = %request_id, "Caller went away before completion");
        }
    }
}
