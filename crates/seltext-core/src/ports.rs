//! Boundaries between the engine and the operating system / UI.
//!
//! OS ports are synchronous and may block; the strategy executors move them
//! onto the blocking pool. The script runner is the exception: it drives a
//! child process and is abandoned by dropping its future. Implementations
//! live in `seltext-platform`.

use crate::error::{AxError, ClipboardError, ScriptError, SynthesisError};
use crate::model::{AppInfo, ClipboardContents, ExtractionOutcome, FocusedElementInfo};
use async_trait::async_trait;

/// State of the frontmost app's "Copy" menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemState {
    Enabled,
    Disabled,
    Missing,
}

pub trait AccessibilityApi: Send + Sync {
    /// Read the focused element of the frontmost application.
    fn focused_element(&self) -> Result<FocusedElementInfo, AxError>;

    /// Role of the focused element only, whatever state its text is in.
    fn focused_role(&self) -> Result<Option<String>, AxError>;

    /// Look up the frontmost app's "Copy" menu item.
    fn copy_menu_item(&self) -> Result<MenuItemState, AxError>;

    /// Press the "Copy" menu item.
    fn press_copy_menu_item(&self) -> Result<(), AxError>;
}

#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run an automation script against the application `bundle_id`.
    ///
    /// Dropping the returned future must stop the script.
    async fn run(&self, bundle_id: &str, script: &str) -> Result<String, ScriptError>;
}

pub trait Clipboard: Send + Sync {
    /// Current plain-text contents, `None` when the clipboard holds no text.
    fn read_text(&self) -> Result<Option<String>, ClipboardError>;

    /// Everything on the clipboard that [`Clipboard::restore`] can put back.
    fn save(&self) -> Result<ClipboardContents, ClipboardError>;

    /// Replace the clipboard with `contents`. Empty contents clear it.
    fn restore(&self, contents: &ClipboardContents) -> Result<(), ClipboardError>;

    fn clear(&self) -> Result<(), ClipboardError>;
}

pub trait KeySynthesizer: Send + Sync {
    /// Post the platform copy shortcut to the frontmost application.
    fn send_copy(&self) -> Result<(), SynthesisError>;
}

pub trait FrontmostApp: Send + Sync {
    fn frontmost_app(&self) -> Option<AppInfo>;
}

/// Receives everything the engine reports to the presentation layer.
pub trait SelectionListener: Send + Sync {
    fn selection_extracted(&self, outcome: ExtractionOutcome);

    fn dismiss_affordance(&self);

    fn double_modifier_tapped(&self);
}
