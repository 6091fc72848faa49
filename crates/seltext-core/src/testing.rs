//! Hand-written port doubles shared by the unit tests.

use crate::error::{AxError, ClipboardError, ScriptError, SynthesisError};
use crate::model::{
    AppInfo, ClipboardContents, ExtractionOutcome, FailureCategory, FocusedElementInfo,
};
use crate::ports::{
    AccessibilityApi, Clipboard, FrontmostApp, KeySynthesizer, MenuItemState, ScriptRunner,
    SelectionListener,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FakeClipboard {
    contents: Mutex<ClipboardContents>,
    fail_writes: AtomicBool,
}

impl FakeClipboard {
    pub fn empty() -> Self {
        Self::with_contents(ClipboardContents::default())
    }

    pub fn with_text(text: &str) -> Self {
        Self::with_contents(ClipboardContents::from_text(text))
    }

    pub fn with_contents(contents: ClipboardContents) -> Self {
        Self {
            contents: Mutex::new(contents),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn text(&self) -> Option<String> {
        self.contents.lock().unwrap().text.clone()
    }

    pub fn contents(&self) -> ClipboardContents {
        self.contents.lock().unwrap().clone()
    }

    /// Simulate another app copying text, which replaces every format.
    pub fn set_text(&self, text: &str) {
        *self.contents.lock().unwrap() = ClipboardContents::from_text(text);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl Clipboard for FakeClipboard {
    fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        Ok(self.text())
    }

    fn save(&self) -> Result<ClipboardContents, ClipboardError> {
        Ok(self.contents())
    }

    fn restore(&self, contents: &ClipboardContents) -> Result<(), ClipboardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClipboardError::Write("pasteboard locked".into()));
        }
        *self.contents.lock().unwrap() = contents.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        *self.contents.lock().unwrap() = ClipboardContents::default();
        Ok(())
    }
}

/// Copy shortcut that puts fixed text on the clipboard, or does nothing.
pub struct FakeKeys {
    target: Option<(Arc<FakeClipboard>, String)>,
    copies: AtomicUsize,
}

impl FakeKeys {
    pub fn copying(clipboard: Arc<FakeClipboard>, text: &str) -> Self {
        Self {
            target: Some((clipboard, text.to_string())),
            copies: AtomicUsize::new(0),
        }
    }

    pub fn silent() -> Self {
        Self {
            target: None,
            copies: AtomicUsize::new(0),
        }
    }

    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

impl KeySynthesizer for FakeKeys {
    fn send_copy(&self) -> Result<(), SynthesisError> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        if let Some((clipboard, text)) = &self.target {
            clipboard.set_text(text);
        }
        Ok(())
    }
}

pub struct FakeAccessibility {
    element: Result<FocusedElementInfo, AxError>,
    /// Role reported by the role-only read when the element read fails.
    role: Option<String>,
    delay: Option<Duration>,
    menu: MenuItemState,
    menu_target: Option<(Arc<FakeClipboard>, String)>,
    menu_presses: AtomicUsize,
    queries: AtomicUsize,
}

impl Default for FakeAccessibility {
    fn default() -> Self {
        Self {
            element: Err(AxError::new(FailureCategory::NoValue, -25212)),
            role: None,
            delay: None,
            menu: MenuItemState::Missing,
            menu_target: None,
            menu_presses: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }
}

impl FakeAccessibility {
    pub fn with_element(info: FocusedElementInfo) -> Self {
        Self {
            element: Ok(info),
            ..Self::default()
        }
    }

    pub fn with_selection(text: &str) -> Self {
        Self::with_element(FocusedElementInfo {
            selected_text: Some(text.to_string()),
            role: Some("AXStaticText".into()),
            ..Default::default()
        })
    }

    pub fn with_error(err: AxError) -> Self {
        Self {
            element: Err(err),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_menu(mut self, state: MenuItemState) -> Self {
        self.menu = state;
        self
    }

    pub fn copying_into(mut self, clipboard: Arc<FakeClipboard>, text: &str) -> Self {
        self.menu_target = Some((clipboard, text.to_string()));
        self
    }

    pub fn menu_presses(&self) -> usize {
        self.menu_presses.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl AccessibilityApi for FakeAccessibility {
    fn focused_element(&self) -> Result<FocusedElementInfo, AxError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.element.clone()
    }

    fn focused_role(&self) -> Result<Option<String>, AxError> {
        if let Some(role) = &self.role {
            return Ok(Some(role.clone()));
        }
        self.element.as_ref().map(|info| info.role.clone()).map_err(Clone::clone)
    }

    fn copy_menu_item(&self) -> Result<MenuItemState, AxError> {
        Ok(self.menu)
    }

    fn press_copy_menu_item(&self) -> Result<(), AxError> {
        self.menu_presses.fetch_add(1, Ordering::SeqCst);
        if let Some((clipboard, text)) = &self.menu_target {
            clipboard.set_text(text);
        }
        Ok(())
    }
}

pub struct FakeScriptRunner {
    result: Result<String, ScriptError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeScriptRunner {
    pub fn returning(result: Result<String, ScriptError>) -> Self {
        Self {
            result,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer only after `delay`, like a browser busy running page scripts.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptRunner for FakeScriptRunner {
    async fn run(&self, bundle_id: &str, script: &str) -> Result<String, ScriptError> {
        self.calls
            .lock()
            .unwrap()
            .push((bundle_id.to_string(), script.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

#[derive(Default)]
pub struct FakeFrontmost {
    app: Mutex<Option<AppInfo>>,
}

impl FakeFrontmost {
    pub fn new(bundle_id: &str) -> Self {
        Self {
            app: Mutex::new(Some(AppInfo::new(bundle_id))),
        }
    }
}

impl FrontmostApp for FakeFrontmost {
    fn frontmost_app(&self) -> Option<AppInfo> {
        self.app.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct RecordingListener {
    outcomes: Mutex<Vec<ExtractionOutcome>>,
    dismissals: AtomicUsize,
    double_taps: AtomicUsize,
}

impl RecordingListener {
    pub fn outcomes(&self) -> Vec<ExtractionOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }

    pub fn double_taps(&self) -> usize {
        self.double_taps.load(Ordering::SeqCst)
    }
}

impl SelectionListener for RecordingListener {
    fn selection_extracted(&self, outcome: ExtractionOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }

    fn dismiss_affordance(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }

    fn double_modifier_tapped(&self) {
        self.double_taps.fetch_add(1, Ordering::SeqCst);
    }
}
