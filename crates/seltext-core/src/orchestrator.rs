//! Strategy selection for one extraction request.
//!
//! Runs as a single sequential async state machine:
//! `Idle -> Querying -> Escalating -> Done`.

use crate::config::EngineConfig;
use crate::engine::RequestTicket;
use crate::error::ExtractionError;
use crate::model::{
    AppInfo, ExtractionStrategy, FailureCategory, RequestOrigin, SelectedTextSnapshot,
};
use crate::policy::AppPolicyTable;
use crate::ports::{AccessibilityApi, Clipboard, FrontmostApp, KeySynthesizer, ScriptRunner};
use crate::strategy::{
    AccessibilityQuery, AxSelection, ClipboardCapture, MenuActionCapture, ScriptingBridgeQuery,
    SimulatedShortcutCapture, StrategyContext, StrategyExecutor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Orchestrator state for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    Idle,
    Querying(ExtractionStrategy),
    Escalating(ExtractionStrategy),
    /// Finished; `true` when a snapshot was produced.
    Done(bool),
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::Idle
    }
}

/// OS-facing ports the orchestrator is built from.
#[derive(Clone)]
pub struct PlatformPorts {
    pub accessibility: Arc<dyn AccessibilityApi>,
    pub scripts: Arc<dyn ScriptRunner>,
    pub clipboard: Arc<dyn Clipboard>,
    pub keys: Arc<dyn KeySynthesizer>,
    pub frontmost: Arc<dyn FrontmostApp>,
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub origin: RequestOrigin,
    /// Frontmost app as seen by the dispatcher; looked up again when absent.
    pub app: Option<AppInfo>,
    pub ticket: RequestTicket,
}

struct Run {
    request_id: u64,
    state: OrchestratorState,
}

impl Run {
    fn transition_state(&mut self, new_state: OrchestratorState) {
        let old_state = self.state;
        if old_state != new_state {
            debug!(request_id = self.request_id, ?old_state, ?new_state, "Orchestrator state");
            self.state = new_state;
        }
    }
}

pub struct SelectionOrchestrator {
    config: EngineConfig,
    policy: Arc<AppPolicyTable>,
    frontmost: Arc<dyn FrontmostApp>,
    accessibility: AccessibilityQuery,
    scripting: ScriptingBridgeQuery,
    shortcut: SimulatedShortcutCapture,
    menu: MenuActionCapture,
}

impl SelectionOrchestrator {
    pub fn new(config: EngineConfig, policy: Arc<AppPolicyTable>, ports: PlatformPorts) -> Self {
        // One lock for every clipboard strategy of every request.
        let capture = ClipboardCapture::new(
            ports.clipboard,
            Arc::new(Mutex::new(())),
            config.copy_poll_interval(),
            config.copy_timeout(),
        );
        Self {
            accessibility: AccessibilityQuery::new(
                ports.accessibility.clone(),
                config.accessibility_timeout(),
            ),
            scripting: ScriptingBridgeQuery::new(ports.scripts, config.scripting_timeout()),
            shortcut: SimulatedShortcutCapture::new(ports.keys, capture.clone()),
            menu: MenuActionCapture::new(
                ports.accessibility,
                config.accessibility_timeout(),
                capture,
            ),
            frontmost: ports.frontmost,
            policy,
            config,
        }
    }

    /// Executor for an escalation step. Only the clipboard strategies escalate.
    fn escalation_executor(&self, strategy: ExtractionStrategy) -> Option<&dyn StrategyExecutor> {
        match strategy {
            ExtractionStrategy::MenuAction => Some(&self.menu),
            ExtractionStrategy::SimulatedShortcut => Some(&self.shortcut),
            ExtractionStrategy::Accessibility | ExtractionStrategy::ScriptingBridge => None,
        }
    }

    /// Extract the current selection, or `None` when no strategy may or can.
    pub async fn run(&self, request: ExtractionRequest) -> Option<SelectedTextSnapshot> {
        let mut run = Run {
            request_id: request.ticket.id(),
            state: OrchestratorState::Idle,
        };
        let snapshot = self.run_inner(&request, &mut run).await;
        run.transition_state(OrchestratorState::Done(snapshot.is_some()));
        if let Some(snapshot) = &snapshot {
            info!(
                request_id = run.request_id,
                strategy = ?snapshot.strategy_used(),
                editable = snapshot.is_editable(),
                "Selection extracted"
            );
        }
        snapshot
    }

    async fn run_inner(
        &self,
        request: &ExtractionRequest,
        run: &mut Run,
    ) -> Option<SelectedTextSnapshot> {
        let app = match &request.app {
            Some(app) => Some(app.clone()),
            None => {
                let frontmost = self.frontmost.clone();
                tokio::task::spawn_blocking(move || frontmost.frontmost_app())
                    .await
                    .ok()
                    .flatten()
            }
        };
        let bundle_id = app.map(|a| a.bundle_id).unwrap_or_default();

        // The host's own windows only get the non-invasive query.
        if self.is_host(&bundle_id) {
            debug!(request_id = run.request_id, "Host app is frontmost");
            run.transition_state(OrchestratorState::Querying(ExtractionStrategy::Accessibility));
            let selection = self.accessibility.query_selection().await.ok()?;
            return accessibility_snapshot(selection);
        }

        let editable = self.accessibility.probe_editable().await.unwrap_or(false);

        run.transition_state(OrchestratorState::Querying(ExtractionStrategy::Accessibility));
        let ax = self.accessibility.query_selection().await;

        let browser = self.policy.browser(&bundle_id);
        let prefers_bridge = browser
            .map(|b| b.prefer_scripting_bridge && self.config.prefer_scripting_bridge)
            .unwrap_or(false);

        // The query read the element's role alongside its text.
        if let Ok(selection) = &ax {
            if !prefers_bridge {
                return accessibility_snapshot(selection.clone());
            }
        }

        if let Some(browser) = browser {
            run.transition_state(OrchestratorState::Querying(ExtractionStrategy::ScriptingBridge));
            match self.scripting.query(browser).await {
                Ok(text) => {
                    return self
                        .snapshot(text, ExtractionStrategy::ScriptingBridge, editable)
                        .await
                }
                Err(err) => debug!(request_id = run.request_id, error = %err, "Scripting bridge failed"),
            }
            if let Ok(selection) = &ax {
                return accessibility_snapshot(selection.clone());
            }
            if !request.origin.is_shortcut_query() {
                debug!(request_id = run.request_id, %bundle_id, "No clipboard escalation for browser gesture");
                return None;
            }
        }

        let category = match &ax {
            Err(failure) => failure.category,
            Ok(_) => FailureCategory::EmptyResult,
        };
        if !self.escalation_eligible(request.origin, &bundle_id, category) {
            debug!(request_id = run.request_id, %bundle_id, ?category, "Escalation not allowed");
            return None;
        }

        let ctx = StrategyContext {
            bundle_id,
            ticket: request.ticket.clone(),
        };
        for strategy in self.config.escalation_order.strategies() {
            if ctx.ticket.is_superseded() {
                debug!(request_id = run.request_id, "Request superseded, skipping escalation");
                return None;
            }
            let Some(executor) = self.escalation_executor(strategy) else {
                continue;
            };
            run.transition_state(OrchestratorState::Escalating(strategy));
            match executor.extract(&ctx).await {
                Ok(text) => return self.snapshot(text, strategy, editable).await,
                Err(err @ ExtractionError::PreconditionUnmet(_)) => {
                    debug!(request_id = run.request_id, ?strategy, error = %err, "Falling back")
                }
                Err(err) => {
                    debug!(request_id = run.request_id, ?strategy, error = %err, "Strategy failed")
                }
            }
        }
        None
    }

    fn is_host(&self, bundle_id: &str) -> bool {
        self.config
            .host_bundle_id
            .as_deref()
            .is_some_and(|host| !bundle_id.is_empty() && host == bundle_id)
    }

    fn escalation_eligible(
        &self,
        origin: RequestOrigin,
        bundle_id: &str,
        category: FailureCategory,
    ) -> bool {
        if origin.is_shortcut_query() {
            return true;
        }
        self.config.force_extraction_enabled && self.policy.allows_escalation(bundle_id, category)
    }

    /// Build the final snapshot with a fresh editability reading, falling
    /// back to `editable` when the probe fails.
    async fn snapshot(
        &self,
        text: String,
        strategy: ExtractionStrategy,
        editable: bool,
    ) -> Option<SelectedTextSnapshot> {
        let editable = self.accessibility.probe_editable().await.unwrap_or(editable);
        SelectedTextSnapshot::new(text, strategy, editable)
    }
}

fn accessibility_snapshot(selection: AxSelection) -> Option<SelectedTextSnapshot> {
    SelectedTextSnapshot::new(
        selection.text,
        ExtractionStrategy::Accessibility,
        selection.editable,
    )
}
