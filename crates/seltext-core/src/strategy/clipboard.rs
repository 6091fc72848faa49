//! Clipboard-based capture: trigger a copy in the foreground app, read the
//! clipboard, put the user's contents back.

use super::{run_blocking, StrategyContext, StrategyExecutor};
use crate::error::{ClipboardError, ExtractionError, ExtractionResult};
use crate::model::{normalize_text, ClipboardContents, ExtractionStrategy};
use crate::ports::{AccessibilityApi, Clipboard, KeySynthesizer, MenuItemState};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Exclusive use of the system clipboard for one capture.
///
/// Holding a session keeps every other clipboard strategy out. The saved
/// contents are written back by [`ClipboardSession::finish`], or by `Drop`
/// when the capture is cut short.
pub struct ClipboardSession {
    clipboard: Arc<dyn Clipboard>,
    saved: ClipboardContents,
    restored: bool,
    _guard: OwnedMutexGuard<()>,
}

impl ClipboardSession {
    /// Take the clipboard lock, save the current contents and clear the clipboard.
    pub async fn begin(
        clipboard: Arc<dyn Clipboard>,
        lock: Arc<Mutex<()>>,
        strategy: ExtractionStrategy,
    ) -> ExtractionResult<Self> {
        let guard = lock.lock_owned().await;

        let cb = clipboard.clone();
        let saved = tokio::task::spawn_blocking(move || -> Result<ClipboardContents, ClipboardError> {
            let saved = cb.save()?;
            cb.clear()?;
            Ok(saved)
        })
        .await
        .map_err(|_| ExtractionError::Aborted(strategy))??;

        debug!(
            has_text = saved.text.is_some(),
            has_html = saved.html.is_some(),
            has_image = saved.image.is_some(),
            "Clipboard session started"
        );
        Ok(Self {
            clipboard,
            saved,
            restored: false,
            _guard: guard,
        })
    }

    pub fn saved(&self) -> &ClipboardContents {
        &self.saved
    }

    /// Restore the saved contents and release the lock.
    pub async fn finish(mut self) -> ExtractionResult<()> {
        self.restored = true;
        let clipboard = self.clipboard.clone();
        let saved = std::mem::take(&mut self.saved);
        let result = tokio::task::spawn_blocking(move || restore(clipboard.as_ref(), &saved))
            .await
            .unwrap_or_else(|e| Err(ExtractionError::ClipboardRestore(e.to_string())));
        if let Err(err) = &result {
            warn!(error = %err, "ClipboardRestoreFailure");
        }
        result
    }
}

impl Drop for ClipboardSession {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(err) = restore(self.clipboard.as_ref(), &self.saved) {
            warn!(error = %err, "ClipboardRestoreFailure");
        }
    }
}

fn restore(clipboard: &dyn Clipboard, saved: &ClipboardContents) -> ExtractionResult<()> {
    clipboard
        .restore(saved)
        .map_err(|e| ExtractionError::ClipboardRestore(e.to_string()))
}

/// Shared clipboard plumbing for the copy-shortcut and menu strategies.
#[derive(Clone)]
pub struct ClipboardCapture {
    clipboard: Arc<dyn Clipboard>,
    lock: Arc<Mutex<()>>,
    poll_interval: Duration,
    copy_timeout: Duration,
}

impl ClipboardCapture {
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        lock: Arc<Mutex<()>>,
        poll_interval: Duration,
        copy_timeout: Duration,
    ) -> Self {
        Self {
            clipboard,
            lock,
            poll_interval,
            copy_timeout,
        }
    }

    /// Run `trigger` inside a clipboard session and wait for the copied text.
    pub async fn capture<F>(
        &self,
        strategy: ExtractionStrategy,
        ctx: &StrategyContext,
        trigger: F,
    ) -> ExtractionResult<String>
    where
        F: FnOnce() -> ExtractionResult<()> + Send + 'static,
    {
        if ctx.ticket.is_superseded() {
            return Err(ExtractionError::Aborted(strategy));
        }
        let session = ClipboardSession::begin(self.clipboard.clone(), self.lock.clone(), strategy).await?;

        // The lock may have been held by an older request for a while.
        if ctx.ticket.is_superseded() {
            debug!(request_id = ctx.ticket.id(), ?strategy, "Request superseded before copy");
            session.finish().await.ok();
            return Err(ExtractionError::Aborted(strategy));
        }

        let copied = match run_blocking(strategy, self.copy_timeout, trigger).await {
            Ok(Ok(())) => self.poll().await,
            Ok(Err(err)) | Err(err) => {
                session.finish().await.ok();
                return Err(err);
            }
        };

        // A failed restore is logged by the session and does not void the text.
        session.finish().await.ok();

        let text = copied.ok_or(ExtractionError::Empty { strategy })?;
        trace!(%text, ?strategy, "Captured clipboard text");
        Ok(text)
    }

    /// Poll until the clipboard holds non-blank text or the copy timeout passes.
    async fn poll(&self) -> Option<String> {
        let deadline = Instant::now() + self.copy_timeout;
        loop {
            let clipboard = self.clipboard.clone();
            if let Ok(Ok(Some(text))) = tokio::task::spawn_blocking(move || clipboard.read_text()).await {
                if let Some(text) = normalize_text(&text) {
                    return Some(text);
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Posts the platform copy shortcut and reads the clipboard.
pub struct SimulatedShortcutCapture {
    keys: Arc<dyn KeySynthesizer>,
    capture: ClipboardCapture,
}

impl SimulatedShortcutCapture {
    pub fn new(keys: Arc<dyn KeySynthesizer>, capture: ClipboardCapture) -> Self {
        Self { keys, capture }
    }
}

#[async_trait]
impl StrategyExecutor for SimulatedShortcutCapture {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::SimulatedShortcut
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractionResult<String> {
        let keys = self.keys.clone();
        self.capture
            .capture(self.strategy(), ctx, move || keys.send_copy().map_err(ExtractionError::from))
            .await
    }
}

/// Presses the app's own "Copy" menu item and reads the clipboard.
pub struct MenuActionCapture {
    api: Arc<dyn AccessibilityApi>,
    menu_timeout: Duration,
    capture: ClipboardCapture,
}

impl MenuActionCapture {
    pub fn new(api: Arc<dyn AccessibilityApi>, menu_timeout: Duration, capture: ClipboardCapture) -> Self {
        Self {
            api,
            menu_timeout,
            capture,
        }
    }

    async fn copy_item_enabled(&self) -> bool {
        let api = self.api.clone();
        match run_blocking(ExtractionStrategy::MenuAction, self.menu_timeout, move || {
            api.copy_menu_item()
        })
        .await
        {
            Ok(Ok(MenuItemState::Enabled)) => true,
            Ok(Ok(state)) => {
                debug!(?state, "Copy menu item not usable");
                false
            }
            Ok(Err(err)) => {
                debug!(code = err.code, "Copy menu lookup failed");
                false
            }
            Err(err) => {
                debug!(error = %err, "Copy menu lookup did not complete");
                false
            }
        }
    }
}

#[async_trait]
impl StrategyExecutor for MenuActionCapture {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::MenuAction
    }

    async fn extract(&self, ctx: &StrategyContext) -> ExtractionResult<String> {
        if !self.copy_item_enabled().await {
            return Err(ExtractionError::PreconditionUnmet("enabled Copy menu item"));
        }
        let api = self.api.clone();
        self.capture
            .capture(self.strategy(), ctx, move || {
                api.press_copy_menu_item()
                    .map_err(|e| ExtractionError::Accessibility(e.into()))
            })
            .await
    }
}
