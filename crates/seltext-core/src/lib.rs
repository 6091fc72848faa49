//! seltext-core: selected-text acquisition engine.
//!
//! Design goal: keep this crate UI-agnostic and platform-agnostic.
//! Everything that talks to the OS sits behind the traits in [`ports`] and
//! is implemented in `seltext-platform`.

mod config;
mod dispatcher;
mod engine;
mod error;
mod gesture;
mod input;
mod model;
mod orchestrator;
mod policy;
pub mod ports;
mod strategy;

#[cfg(test)]
mod testing;

pub use config::{AppPolicyConfig, BrowserConfig, EngineConfig, EscalationOrder, PolicyConfig};
pub use dispatcher::{AffordanceHandle, EventDispatcher};
pub use engine::{PendingExtraction, RequestTicket, SelectionEngine};
pub use error::{
    AccessibilityFailure, AxError, ClipboardError, ConfigError, ExtractionError,
    ExtractionResult, ScriptError, ScriptingBridgeFailure, SynthesisError,
};
pub use gesture::{
    ClickCounter, GestureClassifier, ModifierEdge, PointerEventKind, DOUBLE_CLICK_INTERVAL_MS,
    DOUBLE_CLICK_RADIUS,
};
pub use input::{
    Hotkey, InputEvent, InputEventKind, ModifierKey, Modifiers, MouseButton, Point, Rect,
};
pub use model::{
    normalize_text, AppInfo, ClipboardContents, ClipboardImage, ExtractionOutcome,
    ExtractionStrategy, FailureCategory, FocusedElementInfo, RequestId, RequestOrigin,
    SelectedTextSnapshot, TextRange, TriggerKind, TEXT_FIELD_ROLES,
};
pub use orchestrator::{
    ExtractionRequest, OrchestratorState, PlatformPorts, SelectionOrchestrator,
};
pub use policy::{AppPolicyEntry, AppPolicyTable, BrowserEntry, BrowserFlavor};
pub use ports::{
    AccessibilityApi, Clipboard, FrontmostApp, KeySynthesizer, MenuItemState, ScriptRunner,
    SelectionListener,
};
pub use strategy::{
    selection_script, AccessibilityQuery, AxSelection, ClipboardCapture, ClipboardSession,
    MenuActionCapture, ScriptingBridgeQuery, SimulatedShortcutCapture, StrategyContext,
    StrategyExecutor,
};
