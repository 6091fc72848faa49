//! Request identity and result delivery.
//!
//! Every request gets a generation number. Only the newest request may
//! deliver its outcome; older ones finish quietly.

use crate::model::{AppInfo, ExtractionOutcome, RequestId, RequestOrigin};
use crate::orchestrator::{ExtractionRequest, SelectionOrchestrator};
use crate::ports::SelectionListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info};

/// Identity of an in-flight request, able to tell when a newer one started.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    id: RequestId,
    latest: Arc<AtomicU64>,
}

impl RequestTicket {
    /// A ticket that is never superseded.
    pub fn standalone(id: RequestId) -> Self {
        Self {
            id,
            latest: Arc::new(AtomicU64::new(id)),
        }
    }

    /// A ticket whose request has already been replaced.
    pub fn superseded(id: RequestId) -> Self {
        Self {
            id,
            latest: Arc::new(AtomicU64::new(id + 1)),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.id
    }
}

/// A delayed extraction that has not fired yet.
///
/// Cancelled on [`PendingExtraction::cancel`] or when dropped.
#[derive(Debug)]
pub struct PendingExtraction {
    handle: AbortHandle,
}

impl PendingExtraction {
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PendingExtraction {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Submits extraction requests and delivers their outcomes.
#[derive(Clone)]
pub struct SelectionEngine {
    orchestrator: Arc<SelectionOrchestrator>,
    listener: Arc<dyn SelectionListener>,
    runtime: Handle,
    generation: Arc<AtomicU64>,
}

impl SelectionEngine {
    pub fn new(
        orchestrator: Arc<SelectionOrchestrator>,
        listener: Arc<dyn SelectionListener>,
        runtime: Handle,
    ) -> Self {
        Self {
            orchestrator,
            listener,
            runtime,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Id of the newest request.
    pub fn latest_request(&self) -> RequestId {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start an extraction now. Any older request becomes stale.
    pub fn submit(&self, origin: RequestOrigin, app: Option<AppInfo>) -> RequestId {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = RequestTicket {
            id,
            latest: self.generation.clone(),
        };
        info!(request_id = id, ?origin, "Extraction requested");

        let orchestrator = self.orchestrator.clone();
        let listener = self.listener.clone();
        self.runtime.spawn(async move {
            let request = ExtractionRequest {
                origin,
                app: app.clone(),
                ticket: ticket.clone(),
            };
            let snapshot = orchestrator.run(request).await;

            if ticket.is_superseded() {
                debug!(request_id = id, "Discarding stale extraction result");
                return;
            }
            listener.selection_extracted(ExtractionOutcome {
                request_id: id,
                origin,
                app,
                snapshot,
            });
        });
        id
    }

    /// Start an extraction after `delay` unless cancelled first.
    pub fn schedule(
        &self,
        origin: RequestOrigin,
        app: Option<AppInfo>,
        delay: Duration,
    ) -> PendingExtraction {
        let engine = self.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            engine.submit(origin, app);
        });
        PendingExtraction {
            handle: task.abort_handle(),
        }
    }
}
