use crate::error::ConfigError;
use crate::input::Hotkey;
use crate::model::{ExtractionStrategy, FailureCategory, TriggerKind};
use crate::policy::BrowserFlavor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Order in which the clipboard-based strategies are attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationOrder {
    #[default]
    MenuActionFirst,
    ShortcutFirst,
}

impl EscalationOrder {
    pub fn strategies(self) -> [ExtractionStrategy; 2] {
        match self {
            EscalationOrder::MenuActionFirst => [
                ExtractionStrategy::MenuAction,
                ExtractionStrategy::SimulatedShortcut,
            ],
            EscalationOrder::ShortcutFirst => [
                ExtractionStrategy::SimulatedShortcut,
                ExtractionStrategy::MenuAction,
            ],
        }
    }
}

/// Engine tuning and feature switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extract automatically after selection gestures.
    pub auto_select_enabled: bool,

    /// Allow clipboard escalation for ambient gestures in listed apps.
    pub force_extraction_enabled: bool,

    pub escalation_order: EscalationOrder,

    /// Query browsers through their scripting bridge before trusting AX text.
    pub prefer_scripting_bridge: bool,

    pub accessibility_timeout_ms: u64,
    pub scripting_timeout_ms: u64,

    /// Wait after a double/triple click before querying (milliseconds)
    pub click_settle_delay_ms: u64,

    /// Maximum wait for the clipboard to change after a copy (milliseconds)
    pub copy_timeout_ms: u64,
    pub copy_poll_interval_ms: u64,

    /// Window for four Command transitions to count as a double tap (milliseconds)
    pub double_tap_window_ms: u64,

    /// Minimum press-to-release distance for a drag selection (points)
    pub min_drag_distance: f64,

    /// Pointer distance from the affordance before it is dismissed (points)
    pub affordance_expand_radius: f64,

    /// Global shortcut for an explicit query, e.g. `Alt+D`.
    pub query_hotkey: Option<String>,

    /// Bundle identifier of the host application.
    pub host_bundle_id: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_select_enabled: true,
            force_extraction_enabled: true,
            escalation_order: EscalationOrder::default(),
            prefer_scripting_bridge: true,
            accessibility_timeout_ms: 200,
            scripting_timeout_ms: 200,
            click_settle_delay_ms: 200,
            copy_timeout_ms: 250,
            copy_poll_interval_ms: 10,
            double_tap_window_ms: 500,
            min_drag_distance: 5.0,
            affordance_expand_radius: 120.0,
            query_hotkey: None,
            host_bundle_id: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn accessibility_timeout(&self) -> Duration {
        Duration::from_millis(self.accessibility_timeout_ms)
    }

    pub fn scripting_timeout(&self) -> Duration {
        Duration::from_millis(self.scripting_timeout_ms)
    }

    pub fn click_settle_delay(&self) -> Duration {
        Duration::from_millis(self.click_settle_delay_ms)
    }

    pub fn copy_timeout(&self) -> Duration {
        Duration::from_millis(self.copy_timeout_ms)
    }

    pub fn copy_poll_interval(&self) -> Duration {
        Duration::from_millis(self.copy_poll_interval_ms.max(1))
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    /// Parsed query hotkey. An absent hotkey is `Ok(None)`.
    pub fn hotkey(&self) -> Result<Option<Hotkey>, ConfigError> {
        self.query_hotkey.as_deref().map(Hotkey::parse).transpose()
    }
}

/// Per-application policy as written in `policy.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppPolicyConfig {
    /// Triggers honoured for this app; absent means the table default.
    pub triggers: Option<Vec<TriggerKind>>,

    /// Accessibility failure categories that permit clipboard escalation.
    pub escalate_on: Vec<FailureCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub bundle_id: String,
    pub flavor: BrowserFlavor,
    #[serde(default = "default_prefer_scripting_bridge")]
    pub prefer_scripting_bridge: bool,
}

fn default_prefer_scripting_bridge() -> bool {
    true
}

/// Static application policy data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub default_triggers: Vec<TriggerKind>,
    pub apps: HashMap<String, AppPolicyConfig>,
    pub browsers: Vec<BrowserConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_triggers: vec![
                TriggerKind::DoubleClick,
                TriggerKind::TripleClick,
                TriggerKind::ShiftClick,
                TriggerKind::DragRelease,
            ],
            apps: HashMap::new(),
            browsers: Vec::new(),
        }
    }
}

impl PolicyConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
