//! Stdout consumer: one JSON object per line for every engine report.

use serde::Serialize;
use seltext_core::{ExtractionOutcome, SelectionListener};
use std::io::Write;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HostEvent<'a> {
    Selection(&'a ExtractionOutcome),
    DismissAffordance,
    DoubleModifierTap,
}

/// Writes engine reports as JSON lines to any writer (stdout in the binary).
pub struct JsonLinesListener<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonLinesListener<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesListener<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, event: HostEvent<'_>) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize host event");
                return;
            }
        };
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!(error = %e, "Failed to write host event");
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> SelectionListener for JsonLinesListener<W> {
    fn selection_extracted(&self, outcome: ExtractionOutcome) {
        debug!(
            request_id = outcome.request_id,
            found = outcome.snapshot.is_some(),
            "Delivering extraction outcome"
        );
        self.emit(HostEvent::Selection(&outcome));
    }

    fn dismiss_affordance(&self) {
        self.emit(HostEvent::DismissAffordance);
    }

    fn double_modifier_tapped(&self) {
        self.emit(HostEvent::DoubleModifierTap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seltext_core::{AppInfo, ExtractionStrategy, RequestOrigin, SelectedTextSnapshot, TriggerKind};

    fn lines(listener: JsonLinesListener<Vec<u8>>) -> Vec<serde_json::Value> {
        String::from_utf8(listener.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_selection_line() {
        let listener = JsonLinesListener::new(Vec::new());
        listener.selection_extracted(ExtractionOutcome {
            request_id: 7,
            origin: RequestOrigin::Gesture(TriggerKind::DoubleClick),
            app: Some(AppInfo::new("com.apple.TextEdit")),
            snapshot: SelectedTextSnapshot::new("  hello ", ExtractionStrategy::Accessibility, true),
        });

        let lines = lines(listener);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "selection");
        assert_eq!(lines[0]["requestId"], 7);
        assert_eq!(lines[0]["origin"]["trigger"], "double_click");
        assert_eq!(lines[0]["snapshot"]["text"], "hello");
        assert_eq!(lines[0]["snapshot"]["strategyUsed"], "accessibility");
    }

    #[test]
    fn test_notifications_and_empty_outcome() {
        let listener = JsonLinesListener::new(Vec::new());
        listener.selection_extracted(ExtractionOutcome {
            request_id: 1,
            origin: RequestOrigin::ShortcutQuery,
            app: None,
            snapshot: None,
        });
        listener.dismiss_affordance();
        listener.double_modifier_tapped();

        let lines = lines(listener);
        assert!(lines[0]["snapshot"].is_null());
        assert_eq!(lines[1]["event"], "dismiss_affordance");
        assert_eq!(lines[2]["event"], "double_modifier_tap");
    }
}
