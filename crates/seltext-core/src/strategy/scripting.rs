use crate::error::{ExtractionError, ExtractionResult, ScriptingBridgeFailure};
use crate::model::{normalize_text, ExtractionStrategy};
use crate::policy::{BrowserEntry, BrowserFlavor};
use crate::ports::ScriptRunner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

const SELECTION_JS: &str = "window.getSelection().toString()";

/// The statement, sent inside a `tell application` block, that returns the
/// page selection.
pub fn selection_script(flavor: BrowserFlavor) -> String {
    match flavor {
        BrowserFlavor::Safari => format!("do JavaScript \"{SELECTION_JS}\" in document 1"),
        BrowserFlavor::Chromium => {
            format!("execute front window's active tab javascript \"{SELECTION_JS}\"")
        }
    }
}

/// Asks a browser for its page selection through the scripting bridge.
pub struct ScriptingBridgeQuery {
    runner: Arc<dyn ScriptRunner>,
    timeout: Duration,
}

impl ScriptingBridgeQuery {
    pub fn new(runner: Arc<dyn ScriptRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    /// Dropping the script future on timeout stops the script.
    pub async fn query(&self, browser: &BrowserEntry) -> ExtractionResult<String> {
        let script = selection_script(browser.flavor);
        debug!(bundle_id = %browser.bundle_id, flavor = ?browser.flavor, "Running selection script");

        let output = tokio::time::timeout(self.timeout, self.runner.run(&browser.bundle_id, &script))
            .await
            .map_err(|_| ExtractionError::Timeout(ExtractionStrategy::ScriptingBridge))?
            .map_err(ScriptingBridgeFailure::from)?;

        let text = normalize_text(&output).ok_or(ScriptingBridgeFailure::Empty)?;
        trace!(%text, "Scripting bridge selection");
        Ok(text)
    }
}
