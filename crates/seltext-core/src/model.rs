//! Value types shared by the classifier, the policy table and the orchestrator.

use serde::{Deserialize, Serialize};

/// The classified user gesture that initiates an extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    DoubleClick,
    TripleClick,
    ShiftClick,
    DragRelease,
    DoubleModifierTap,
}

impl TriggerKind {
    /// Triggers that wait for the OS to settle the selection before querying.
    pub fn needs_settle_delay(self) -> bool {
        matches!(self, TriggerKind::DoubleClick | TriggerKind::TripleClick)
    }
}

/// Why an extraction request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "trigger")]
pub enum RequestOrigin {
    /// Ambient auto-detection after a pointer/modifier gesture.
    Gesture(TriggerKind),
    /// Explicit query invoked by the user through the global hotkey.
    ShortcutQuery,
}

impl RequestOrigin {
    pub fn is_shortcut_query(self) -> bool {
        matches!(self, RequestOrigin::ShortcutQuery)
    }
}

/// Extraction strategies, ordered by invasiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Accessibility,
    ScriptingBridge,
    SimulatedShortcut,
    MenuAction,
}

/// Classification of an accessibility query failure.
///
/// Only used to decide escalation eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The attribute exists but genuinely has no value.
    NoValue,
    /// The focused element does not implement the attribute.
    AttributeUnsupported,
    /// Any other AX error (API disabled, cannot complete, invalid element...).
    GenericFailure,
    /// The query succeeded but produced no text.
    EmptyResult,
}

/// The immutable result of one completed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTextSnapshot {
    text: String,
    strategy_used: ExtractionStrategy,
    is_editable: bool,
}

impl SelectedTextSnapshot {
    /// Build a snapshot from raw text. Returns `None` when the text is blank.
    pub fn new(
        text: impl AsRef<str>,
        strategy_used: ExtractionStrategy,
        is_editable: bool,
    ) -> Option<Self> {
        let text = normalize_text(text.as_ref())?;
        Some(Self {
            text,
            strategy_used,
            is_editable,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn strategy_used(&self) -> ExtractionStrategy {
        self.strategy_used
    }

    pub fn is_editable(&self) -> bool {
        self.is_editable
    }
}

/// Trim surrounding whitespace; blank text counts as no text.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A text range as reported by the accessibility API (UTF-16 code units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub offset: usize,
    pub length: usize,
}

/// Roles whose elements accept typed text.
pub const TEXT_FIELD_ROLES: &[&str] = &[
    "AXTextField",
    "AXTextArea",
    "AXComboBox",
    "AXSearchField",
    "AXSecureTextField",
];

/// Snapshot of the focused UI element, valid for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusedElementInfo {
    pub full_text: Option<String>,
    pub selected_range: Option<TextRange>,
    pub selected_text: Option<String>,
    pub role: Option<String>,
}

impl FocusedElementInfo {
    /// The current selection: `selected_text` if non-empty, otherwise the
    /// range sliced out of `full_text`.
    pub fn selection(&self) -> Option<String> {
        if let Some(selected) = self.selected_text.as_deref().filter(|s| !s.is_empty()) {
            return Some(selected.to_string());
        }
        self.selection_from_range()
    }

    /// The selection if there is one, otherwise the element's full text.
    pub fn focused_text(&self) -> Option<String> {
        self.selection()
            .or_else(|| self.full_text.clone().filter(|s| !s.is_empty()))
    }

    /// Slice `full_text` by `selected_range`. Empty or out-of-bounds ranges yield `None`.
    pub fn selection_from_range(&self) -> Option<String> {
        let range = self.selected_range?;
        if range.length == 0 {
            return None;
        }
        let full = self.full_text.as_deref()?;
        let units: Vec<u16> = full.encode_utf16().collect();
        let end = range.offset.checked_add(range.length)?;
        if end > units.len() {
            return None;
        }
        String::from_utf16(&units[range.offset..end]).ok()
    }

    pub fn is_text_field(&self) -> bool {
        self.role
            .as_deref()
            .map(|role| TEXT_FIELD_ROLES.contains(&role))
            .unwrap_or(false)
    }
}

/// The frontmost application at the time of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Bundle identifier on macOS, executable name elsewhere.
    pub bundle_id: String,
    pub name: Option<String>,
    pub pid: Option<i32>,
}

impl AppInfo {
    pub fn new(bundle_id: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            name: None,
            pid: None,
        }
    }
}

/// Identity of one extraction request; later requests have larger ids.
pub type RequestId = u64;

/// What the consumer receives once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    pub request_id: RequestId,
    pub origin: RequestOrigin,
    pub app: Option<AppInfo>,
    pub snapshot: Option<SelectedTextSnapshot>,
}

/// RGBA pixels of an image held on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

/// What a clipboard capture saves up front and puts back afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardContents {
    pub text: Option<String>,
    pub html: Option<String>,
    pub image: Option<ClipboardImage>,
}

impl ClipboardContents {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.html.is_none() && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_rejects_blank_text() {
        assert!(SelectedTextSnapshot::new("  \n\t", ExtractionStrategy::Accessibility, false).is_none());

        let snapshot =
            SelectedTextSnapshot::new("  hello \n", ExtractionStrategy::MenuAction, true).unwrap();
        assert_eq!(snapshot.text(), "hello");
        assert_eq!(snapshot.strategy_used(), ExtractionStrategy::MenuAction);
        assert!(snapshot.is_editable());
    }

    #[test]
    fn test_focused_text_prefers_selection() {
        let info = FocusedElementInfo {
            full_text: Some("the whole paragraph".into()),
            selected_text: Some("whole".into()),
            ..Default::default()
        };
        assert_eq!(info.focused_text().as_deref(), Some("whole"));

        let info = FocusedElementInfo {
            full_text: Some("the whole paragraph".into()),
            selected_text: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(info.selection(), None);
        assert_eq!(info.focused_text().as_deref(), Some("the whole paragraph"));
    }

    #[test]
    fn test_selection_from_range_uses_utf16_offsets() {
        let info = FocusedElementInfo {
            full_text: Some("😀 hello world".into()),
            selected_range: Some(TextRange { offset: 3, length: 5 }),
            ..Default::default()
        };
        assert_eq!(info.selection_from_range().as_deref(), Some("hello"));
        assert_eq!(info.focused_text().as_deref(), Some("hello"));

        let out_of_bounds = FocusedElementInfo {
            full_text: Some("short".into()),
            selected_range: Some(TextRange { offset: 3, length: 10 }),
            ..Default::default()
        };
        assert_eq!(out_of_bounds.selection_from_range(), None);
    }

    #[test]
    fn test_clipboard_contents_empty() {
        assert!(ClipboardContents::default().is_empty());
        assert!(!ClipboardContents::from_text("a").is_empty());

        let image_only = ClipboardContents {
            image: Some(ClipboardImage {
                width: 1,
                height: 1,
                bytes: vec![0, 0, 0, 255],
            }),
            ..Default::default()
        };
        assert!(!image_only.is_empty());
    }

    #[test]
    fn test_is_text_field() {
        let mut info = FocusedElementInfo {
            role: Some("AXTextArea".into()),
            ..Default::default()
        };
        assert!(info.is_text_field());

        info.role = Some("AXStaticText".into());
        assert!(!info.is_text_field());

        info.role = None;
        assert!(!info.is_text_field());
    }

    #[test]
    fn test_strategy_order_follows_invasiveness() {
        assert!(ExtractionStrategy::Accessibility < ExtractionStrategy::ScriptingBridge);
        assert!(ExtractionStrategy::ScriptingBridge < ExtractionStrategy::SimulatedShortcut);
        assert!(ExtractionStrategy::SimulatedShortcut < ExtractionStrategy::MenuAction);
    }
}
