//! Per-application trigger and escalation policy.
//!
//! All app-specific special-casing lives here. The table is built once from
//! static configuration and is read-only afterwards.

use crate::config::PolicyConfig;
use crate::model::{FailureCategory, TriggerKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Script dialect spoken by a browser's automation bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserFlavor {
    Safari,
    Chromium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEntry {
    pub bundle_id: String,
    pub flavor: BrowserFlavor,
    pub prefer_scripting_bridge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppPolicyEntry {
    /// `None` means the table's default trigger set.
    pub allowed_triggers: Option<HashSet<TriggerKind>>,
    pub allowed_failure_categories: HashSet<FailureCategory>,
}

#[derive(Debug, Clone, Default)]
pub struct AppPolicyTable {
    entries: HashMap<String, AppPolicyEntry>,
    default_triggers: HashSet<TriggerKind>,
    browsers: HashMap<String, BrowserEntry>,
}

impl AppPolicyTable {
    pub fn new(default_triggers: impl IntoIterator<Item = TriggerKind>) -> Self {
        Self {
            entries: HashMap::new(),
            default_triggers: default_triggers.into_iter().collect(),
            browsers: HashMap::new(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut table = Self::new(config.default_triggers.iter().copied());
        for (bundle_id, app) in &config.apps {
            table.insert(
                bundle_id.clone(),
                AppPolicyEntry {
                    allowed_triggers: app
                        .triggers
                        .as_ref()
                        .map(|triggers| triggers.iter().copied().collect()),
                    allowed_failure_categories: app.escalate_on.iter().copied().collect(),
                },
            );
        }
        for browser in &config.browsers {
            table.insert_browser(BrowserEntry {
                bundle_id: browser.bundle_id.clone(),
                flavor: browser.flavor,
                prefer_scripting_bridge: browser.prefer_scripting_bridge,
            });
        }
        table
    }

    pub fn insert(&mut self, bundle_id: impl Into<String>, entry: AppPolicyEntry) {
        self.entries.insert(bundle_id.into(), entry);
    }

    pub fn insert_browser(&mut self, browser: BrowserEntry) {
        self.browsers.insert(browser.bundle_id.clone(), browser);
    }

    pub fn allows_trigger(&self, bundle_id: &str, trigger: TriggerKind) -> bool {
        match self.entries.get(bundle_id).and_then(|e| e.allowed_triggers.as_ref()) {
            Some(triggers) => triggers.contains(&trigger),
            None => self.default_triggers.contains(&trigger),
        }
    }

    /// Whether an accessibility failure of `category` may escalate to the
    /// clipboard strategies in this app.
    ///
    /// `NoValue` is eligible everywhere. Any other category must be listed
    /// for the app; unknown apps never escalate.
    pub fn allows_escalation(&self, bundle_id: &str, category: FailureCategory) -> bool {
        if category == FailureCategory::NoValue {
            return true;
        }
        self.entries
            .get(bundle_id)
            .map(|e| e.allowed_failure_categories.contains(&category))
            .unwrap_or(false)
    }

    pub fn browser(&self, bundle_id: &str) -> Option<&BrowserEntry> {
        self.browsers.get(bundle_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AppPolicyTable {
        let mut table = AppPolicyTable::new([TriggerKind::DoubleClick, TriggerKind::DragRelease]);
        table.insert(
            "com.example.editor",
            AppPolicyEntry {
                allowed_triggers: None,
                allowed_failure_categories: [FailureCategory::AttributeUnsupported]
                    .into_iter()
                    .collect(),
            },
        );
        table.insert(
            "com.example.terminal",
            AppPolicyEntry {
                allowed_triggers: Some([TriggerKind::ShiftClick].into_iter().collect()),
                allowed_failure_categories: HashSet::new(),
            },
        );
        table
    }

    #[test]
    fn test_unknown_app_never_escalates() {
        let table = table();
        assert!(!table.allows_escalation("com.unknown", FailureCategory::AttributeUnsupported));
        assert!(!table.allows_escalation("com.unknown", FailureCategory::GenericFailure));
        assert!(!table.allows_escalation("com.unknown", FailureCategory::EmptyResult));
    }

    #[test]
    fn test_no_value_always_eligible() {
        let table = table();
        assert!(table.allows_escalation("com.unknown", FailureCategory::NoValue));
        assert!(table.allows_escalation("com.example.terminal", FailureCategory::NoValue));
    }

    #[test]
    fn test_listed_category_only() {
        let table = table();
        assert!(table.allows_escalation("com.example.editor", FailureCategory::AttributeUnsupported));
        assert!(!table.allows_escalation("com.example.editor", FailureCategory::GenericFailure));
    }

    #[test]
    fn test_allows_trigger_falls_back_to_default() {
        let table = table();
        assert!(table.allows_trigger("com.unknown", TriggerKind::DoubleClick));
        assert!(!table.allows_trigger("com.unknown", TriggerKind::ShiftClick));
        assert!(table.allows_trigger("com.example.editor", TriggerKind::DragRelease));
        assert!(table.allows_trigger("com.example.terminal", TriggerKind::ShiftClick));
        assert!(!table.allows_trigger("com.example.terminal", TriggerKind::DoubleClick));
    }

    #[test]
    fn test_from_config() {
        let config = PolicyConfig::from_yaml(
            r#"
apps:
  com.example.editor:
    escalate_on: [generic_failure]
browsers:
  - bundle_id: com.apple.Safari
    flavor: safari
"#,
        )
        .unwrap();
        let table = AppPolicyTable::from_config(&config);
        assert!(table.allows_escalation("com.example.editor", FailureCategory::GenericFailure));
        assert!(table.allows_trigger("com.example.editor", TriggerKind::TripleClick));
        let safari = table.browser("com.apple.Safari").unwrap();
        assert_eq!(safari.flavor, BrowserFlavor::Safari);
        assert!(safari.prefer_scripting_bridge);
        assert!(table.browser("com.example.editor").is_none());
    }
}
