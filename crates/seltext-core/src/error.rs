//! Error taxonomy for the extraction pipeline.
//!
//! Nothing here reaches the consumer: the orchestrator turns every error into
//! "try the next eligible strategy" or "no text".

use crate::model::{ExtractionStrategy, FailureCategory};
use thiserror::Error;

/// Error reported by an accessibility port call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("accessibility error {code} ({category:?})")]
pub struct AxError {
    pub category: FailureCategory,
    /// Raw platform error code, 0 when not applicable.
    pub code: i32,
}

impl AxError {
    pub fn new(category: FailureCategory, code: i32) -> Self {
        Self { category, code }
    }

    pub fn generic(code: i32) -> Self {
        Self::new(FailureCategory::GenericFailure, code)
    }
}

/// A failed accessibility strategy, classified for the escalation decision.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("accessibility query failed: {category:?}")]
pub struct AccessibilityFailure {
    pub category: FailureCategory,
}

impl From<AxError> for AccessibilityFailure {
    fn from(err: AxError) -> Self {
        Self {
            category: err.category,
        }
    }
}

/// Error reported by the automation-script port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("scripting bridge is not available on this platform")]
    Unsupported,
    #[error("failed to launch script runner: {0}")]
    Launch(String),
    #[error("script failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptingBridgeFailure {
    #[error("application is not a scriptable browser")]
    NotABrowser,
    #[error("script returned no text")]
    Empty,
    #[error(transparent)]
    Script(#[from] ScriptError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard read failed: {0}")]
    Read(String),
    #[error("clipboard write failed: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("keystroke synthesis failed: {0}")]
pub struct SynthesisError(pub String);

/// Failure of a single strategy run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error(transparent)]
    Accessibility(#[from] AccessibilityFailure),
    #[error(transparent)]
    ScriptingBridge(#[from] ScriptingBridgeFailure),
    #[error("failed to restore clipboard: {0}")]
    ClipboardRestore(String),
    #[error("precondition unmet: {0}")]
    PreconditionUnmet(&'static str),
    #[error("{0:?} timed out")]
    Timeout(ExtractionStrategy),
    #[error("{strategy:?} produced no text")]
    Empty { strategy: ExtractionStrategy },
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error("{0:?} task aborted")]
    Aborted(ExtractionStrategy),
}

impl ExtractionError {
    pub fn is_precondition_unmet(&self) -> bool {
        matches!(self, ExtractionError::PreconditionUnmet(_))
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Configuration parsing errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid hotkey: {0}")]
    InvalidHotkey(String),
}
