//! Gesture classification from raw pointer and modifier events.

use crate::input::{Modifiers, Point};
use crate::model::TriggerKind;
use std::collections::VecDeque;
use std::time::Duration;

const POINTER_BUFFER_LEN: usize = 3;
const MODIFIER_BUFFER_LEN: usize = 4;

/// Default interval for a press to count as the next click of a series.
pub const DOUBLE_CLICK_INTERVAL_MS: u64 = 500;
/// Default radius for a press to count as the next click of a series.
pub const DOUBLE_CLICK_RADIUS: f64 = 4.0;

/// Pointer event kinds kept in the short history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Dragged,
    Up,
}

/// A Command-key flag transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierEdge {
    pub timestamp_ms: u64,
    pub pressed: bool,
}

/// Bounded histories of recent pointer and Command-key events.
#[derive(Debug)]
pub struct GestureClassifier {
    pointer_events: VecDeque<PointerEventKind>,
    modifier_events: VecDeque<ModifierEdge>,
    double_tap_window: Duration,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl GestureClassifier {
    pub fn new(double_tap_window: Duration) -> Self {
        Self {
            pointer_events: VecDeque::with_capacity(POINTER_BUFFER_LEN),
            modifier_events: VecDeque::with_capacity(MODIFIER_BUFFER_LEN),
            double_tap_window,
        }
    }

    pub fn record_pointer_event(&mut self, kind: PointerEventKind) {
        if self.pointer_events.len() == POINTER_BUFFER_LEN {
            self.pointer_events.pop_front();
        }
        self.pointer_events.push_back(kind);
    }

    pub fn clear_pointer_events(&mut self) {
        self.pointer_events.clear();
    }

    /// True when the last three pointer events were all drags.
    pub fn is_drag_sequence(&self) -> bool {
        self.pointer_events.len() == POINTER_BUFFER_LEN
            && self
                .pointer_events
                .iter()
                .all(|kind| *kind == PointerEventKind::Dragged)
    }

    pub fn record_modifier_event(&mut self, edge: ModifierEdge) {
        if self.modifier_events.len() == MODIFIER_BUFFER_LEN {
            self.modifier_events.pop_front();
        }
        self.modifier_events.push_back(edge);
    }

    pub fn clear_modifier_events(&mut self) {
        self.modifier_events.clear();
    }

    /// Four Command transitions (down, up, down, up) inside the window.
    ///
    /// A positive detection clears the history so a held third press cannot
    /// fire again.
    pub fn is_double_modifier_tap(&mut self) -> bool {
        if self.modifier_events.len() < MODIFIER_BUFFER_LEN {
            return false;
        }
        let (Some(first), Some(last)) = (self.modifier_events.front(), self.modifier_events.back())
        else {
            return false;
        };
        let span = last.timestamp_ms.saturating_sub(first.timestamp_ms);
        if span < self.double_tap_window.as_millis() as u64 {
            self.modifier_events.clear();
            true
        } else {
            false
        }
    }

    /// Classify a release from its native click count and modifiers.
    pub fn classify_click(click_count: u32, modifiers: Modifiers) -> Option<TriggerKind> {
        match click_count {
            2 => Some(TriggerKind::DoubleClick),
            3 => Some(TriggerKind::TripleClick),
            1 if modifiers.shift => Some(TriggerKind::ShiftClick),
            _ => None,
        }
    }
}

/// Synthesizes click counts for hooks that do not report one.
#[derive(Debug)]
pub struct ClickCounter {
    interval_ms: u64,
    radius: f64,
    last_press: Option<(u64, Point)>,
    count: u32,
}

impl Default for ClickCounter {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_INTERVAL_MS, DOUBLE_CLICK_RADIUS)
    }
}

impl ClickCounter {
    pub fn new(interval_ms: u64, radius: f64) -> Self {
        Self {
            interval_ms,
            radius,
            last_press: None,
            count: 0,
        }
    }

    /// Register a press and return its position in the click series.
    pub fn press(&mut self, timestamp_ms: u64, at: Point) -> u32 {
        let continues = self.last_press.is_some_and(|(ts, point)| {
            timestamp_ms.saturating_sub(ts) <= self.interval_ms
                && point.distance_to(at) <= self.radius
        });
        self.count = if continues { self.count + 1 } else { 1 };
        self.last_press = Some((timestamp_ms, at));
        self.count
    }

    /// Click count of the most recent press, reported on release.
    pub fn current(&self) -> u32 {
        self.count.max(1)
    }
}
