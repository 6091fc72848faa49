//! Strategy executors.
//!
//! Each executor bounds its OS port call with a strategy-local timeout;
//! blocking ports run under `spawn_blocking`. A timed-out strategy is not
//! retried.

mod accessibility;
mod clipboard;
mod scripting;

pub use accessibility::{AccessibilityQuery, AxSelection};
pub use clipboard::{ClipboardCapture, ClipboardSession, MenuActionCapture, SimulatedShortcutCapture};
pub use scripting::{selection_script, ScriptingBridgeQuery};

use crate::engine::RequestTicket;
use crate::error::{ExtractionError, ExtractionResult};
use crate::model::ExtractionStrategy;
use async_trait::async_trait;
use std::time::Duration;

/// Per-request data handed to a strategy.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub bundle_id: String,
    pub ticket: RequestTicket,
}

/// A single way of obtaining the selected text.
#[async_trait]
pub trait StrategyExecutor: Send + Sync {
    fn strategy(&self) -> ExtractionStrategy;

    /// Returns trimmed, non-empty text or the reason there is none.
    async fn extract(&self, ctx: &StrategyContext) -> ExtractionResult<String>;
}

/// Run a blocking port call on the blocking pool, bounded by `limit`.
pub(crate) async fn run_blocking<T, F>(
    strategy: ExtractionStrategy,
    limit: Duration,
    f: F,
) -> ExtractionResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(ExtractionError::Aborted(strategy)),
        Err(_) => Err(ExtractionError::Timeout(strategy)),
    }
}
