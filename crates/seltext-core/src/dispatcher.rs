//! Turns the raw input stream into extraction requests and affordance
//! dismissals. Runs on a single thread and owns all of its state.

use crate::config::EngineConfig;
use crate::engine::{PendingExtraction, SelectionEngine};
use crate::error::ConfigError;
use crate::gesture::{GestureClassifier, ModifierEdge, PointerEventKind};
use crate::input::{Hotkey, InputEvent, InputEventKind, ModifierKey, Modifiers, MouseButton, Point, Rect};
use crate::model::{AppInfo, RequestOrigin, TriggerKind};
use crate::policy::AppPolicyTable;
use crate::ports::{FrontmostApp, SelectionListener};
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Shared view of the affordance window's frame.
///
/// The presentation layer sets the frame when it shows the affordance and
/// clears it when hidden; the dispatcher reads it on pointer events.
#[derive(Debug, Clone, Default)]
pub struct AffordanceHandle {
    frame: Arc<Mutex<Option<Rect>>>,
}

impl AffordanceHandle {
    pub fn show(&self, frame: Rect) {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame);
    }

    pub fn hide(&self) {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn frame(&self) -> Option<Rect> {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct EventDispatcher {
    engine: SelectionEngine,
    policy: Arc<AppPolicyTable>,
    frontmost: Arc<dyn FrontmostApp>,
    listener: Arc<dyn SelectionListener>,
    affordance: AffordanceHandle,
    classifier: GestureClassifier,
    hotkey: Option<Hotkey>,
    auto_select_enabled: bool,
    click_settle_delay: Duration,
    min_drag_distance: f64,
    affordance_expand_radius: f64,
    press_point: Option<Point>,
    frontmost_app: Option<AppInfo>,
    pending: Option<PendingExtraction>,
}

impl EventDispatcher {
    pub fn new(
        config: &EngineConfig,
        engine: SelectionEngine,
        policy: Arc<AppPolicyTable>,
        frontmost: Arc<dyn FrontmostApp>,
        listener: Arc<dyn SelectionListener>,
        affordance: AffordanceHandle,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            engine,
            policy,
            frontmost,
            listener,
            affordance,
            classifier: GestureClassifier::new(config.double_tap_window()),
            hotkey: config.hotkey()?,
            auto_select_enabled: config.auto_select_enabled,
            click_settle_delay: config.click_settle_delay(),
            min_drag_distance: config.min_drag_distance,
            affordance_expand_radius: config.affordance_expand_radius,
            press_point: None,
            frontmost_app: None,
            pending: None,
        })
    }

    /// Consume events until the sender side disconnects.
    pub fn run(&mut self, events: Receiver<InputEvent>) {
        info!("Event dispatcher started");
        for event in events.iter() {
            self.handle(event);
        }
        self.cancel_pending();
        info!("Event dispatcher stopped");
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event.kind {
            InputEventKind::MouseDown {
                at,
                button: MouseButton::Left,
                ..
            } => self.on_mouse_down(at),
            InputEventKind::MouseDragged { .. } => {
                self.classifier.record_pointer_event(PointerEventKind::Dragged)
            }
            InputEventKind::MouseMoved { at } => self.on_mouse_moved(at),
            InputEventKind::MouseUp {
                at,
                button: MouseButton::Left,
                click_count,
                modifiers,
            } => self.on_mouse_up(at, click_count, modifiers),
            InputEventKind::FlagsChanged { key, pressed, .. } => {
                self.on_flags_changed(event.timestamp_ms, key, pressed)
            }
            InputEventKind::KeyDown { key, modifiers } => self.on_key_down(&key, modifiers),
            InputEventKind::Scroll { .. } => self.dismiss_affordance(),
            InputEventKind::MouseDown { .. }
            | InputEventKind::MouseUp { .. }
            | InputEventKind::KeyUp { .. } => {}
        }
    }

    fn on_mouse_down(&mut self, at: Point) {
        self.cancel_pending();
        self.press_point = Some(at);
        self.classifier.clear_pointer_events();
        self.classifier.record_pointer_event(PointerEventKind::Down);

        if let Some(frame) = self.affordance.frame() {
            if !frame.contains(at) {
                self.dismiss_affordance();
            }
        }
    }

    fn on_mouse_moved(&mut self, at: Point) {
        if let Some(frame) = self.affordance.frame() {
            if !frame.expanded(self.affordance_expand_radius).contains(at) {
                self.dismiss_affordance();
            }
        }
    }

    fn on_mouse_up(&mut self, at: Point, click_count: u32, modifiers: Modifiers) {
        let dragged_far = self
            .press_point
            .is_some_and(|press| press.distance_to(at) >= self.min_drag_distance);

        let trigger = if self.classifier.is_drag_sequence() && dragged_far {
            Some(TriggerKind::DragRelease)
        } else {
            GestureClassifier::classify_click(click_count, modifiers)
        };
        self.classifier.record_pointer_event(PointerEventKind::Up);

        if let Some(trigger) = trigger {
            self.trigger(trigger);
        }
    }

    fn on_flags_changed(&mut self, timestamp_ms: u64, key: ModifierKey, pressed: bool) {
        if key != ModifierKey::Command {
            return;
        }
        self.classifier.record_modifier_event(ModifierEdge {
            timestamp_ms,
            pressed,
        });
        if self.classifier.is_double_modifier_tap() {
            debug!("Double Command tap");
            self.dismiss_affordance();
            self.listener.double_modifier_tapped();
        }
    }

    fn on_key_down(&mut self, key: &str, modifiers: Modifiers) {
        // Command held for a shortcut is not part of a double tap.
        self.classifier.clear_modifier_events();

        if self.hotkey.as_ref().is_some_and(|h| h.matches(key, modifiers)) {
            self.cancel_pending();
            let app = self.refresh_frontmost();
            self.engine.submit(RequestOrigin::ShortcutQuery, app);
            return;
        }
        self.dismiss_affordance();
    }

    fn trigger(&mut self, trigger: TriggerKind) {
        if !self.auto_select_enabled {
            debug!(?trigger, "Auto selection disabled");
            return;
        }
        let app = self.refresh_frontmost();
        let bundle_id = app.as_ref().map(|a| a.bundle_id.as_str()).unwrap_or_default();
        if !self.policy.allows_trigger(bundle_id, trigger) {
            debug!(?trigger, %bundle_id, "Trigger not enabled for app");
            return;
        }

        let origin = RequestOrigin::Gesture(trigger);
        if trigger.needs_settle_delay() {
            // Replacing the pending run aborts it.
            self.pending = Some(self.engine.schedule(origin, app, self.click_settle_delay));
        } else {
            self.cancel_pending();
            self.engine.submit(origin, app);
        }
    }

    fn refresh_frontmost(&mut self) -> Option<AppInfo> {
        self.frontmost_app = self.frontmost.frontmost_app();
        self.frontmost_app.clone()
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }

    fn dismiss_affordance(&mut self) {
        if self.affordance.frame().is_some() {
            self.affordance.hide();
            self.listener.dismiss_affordance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{PlatformPorts, SelectionOrchestrator};
    use crate::policy::AppPolicyEntry;
    use crate::testing::{
        FakeAccessibility, FakeClipboard, FakeFrontmost, FakeKeys, FakeScriptRunner,
        RecordingListener,
    };
    use tokio::runtime::Handle;

    const EDITOR: &str = "com.example.editor";

    struct Harness {
        dispatcher: EventDispatcher,
        listener: Arc<RecordingListener>,
        affordance: AffordanceHandle,
    }

    fn harness(config: EngineConfig, policy: AppPolicyTable) -> Harness {
        let listener = Arc::new(RecordingListener::default());
        let frontmost = Arc::new(FakeFrontmost::new(EDITOR));
        let ports = PlatformPorts {
            accessibility: Arc::new(FakeAccessibility::with_selection("selected")),
            scripts: Arc::new(FakeScriptRunner::returning(Ok(String::new()))),
            clipboard: Arc::new(FakeClipboard::empty()),
            keys: Arc::new(FakeKeys::silent()),
            frontmost: frontmost.clone(),
        };
        let policy = Arc::new(policy);
        let orchestrator = SelectionOrchestrator::new(config.clone(), policy.clone(), ports);
        let engine = SelectionEngine::new(Arc::new(orchestrator), listener.clone(), Handle::current());
        let affordance = AffordanceHandle::default();
        let dispatcher = EventDispatcher::new(
            &config,
            engine,
            policy,
            frontmost,
            listener.clone(),
            affordance.clone(),
        )
        .unwrap();
        Harness {
            dispatcher,
            listener,
            affordance,
        }
    }

    fn default_harness() -> Harness {
        harness(
            EngineConfig {
                query_hotkey: Some("Alt+D".into()),
                ..EngineConfig::default()
            },
            AppPolicyTable::new([
                TriggerKind::DoubleClick,
                TriggerKind::TripleClick,
                TriggerKind::ShiftClick,
                TriggerKind::DragRelease,
            ]),
        )
    }

    fn down(ts: u64, x: f64, y: f64, click_count: u32) -> InputEvent {
        InputEvent::new(
            ts,
            InputEventKind::MouseDown {
                at: Point::new(x, y),
                button: MouseButton::Left,
                click_count,
                modifiers: Modifiers::NONE,
            },
        )
    }

    fn up(ts: u64, x: f64, y: f64, click_count: u32, modifiers: Modifiers) -> InputEvent {
        InputEvent::new(
            ts,
            InputEventKind::MouseUp {
                at: Point::new(x, y),
                button: MouseButton::Left,
                click_count,
                modifiers,
            },
        )
    }

    fn dragged(ts: u64, x: f64, y: f64) -> InputEvent {
        InputEvent::new(ts, InputEventKind::MouseDragged { at: Point::new(x, y) })
    }

    fn command(ts: u64, pressed: bool) -> InputEvent {
        InputEvent::new(
            ts,
            InputEventKind::FlagsChanged {
                key: ModifierKey::Command,
                pressed,
                modifiers: Modifiers {
                    command: pressed,
                    ..Modifiers::NONE
                },
            },
        )
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn origins(listener: &RecordingListener) -> Vec<RequestOrigin> {
        listener.outcomes().iter().map(|o| o.origin).collect()
    }

    #[tokio::test]
    async fn test_triple_click_cancels_double_click() {
        let mut h = default_harness();
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(up(40, 10.0, 10.0, 1, Modifiers::NONE));
        h.dispatcher.handle(down(120, 10.0, 10.0, 2));
        h.dispatcher.handle(up(160, 10.0, 10.0, 2, Modifiers::NONE));
        settle(50).await;
        h.dispatcher.handle(down(240, 10.0, 10.0, 3));
        h.dispatcher.handle(up(280, 10.0, 10.0, 3, Modifiers::NONE));
        settle(500).await;

        assert_eq!(
            origins(&h.listener),
            vec![RequestOrigin::Gesture(TriggerKind::TripleClick)]
        );
    }

    #[tokio::test]
    async fn test_double_click_waits_for_settle_delay() {
        let mut h = default_harness();
        h.dispatcher.handle(down(0, 10.0, 10.0, 2));
        h.dispatcher.handle(up(30, 10.0, 10.0, 2, Modifiers::NONE));
        settle(100).await;
        assert!(h.listener.outcomes().is_empty());

        settle(400).await;
        let outcomes = h.listener.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].origin, RequestOrigin::Gesture(TriggerKind::DoubleClick));
        assert_eq!(outcomes[0].snapshot.as_ref().unwrap().text(), "selected");
        assert_eq!(outcomes[0].app.as_ref().unwrap().bundle_id, EDITOR);
    }

    #[tokio::test]
    async fn test_drag_release_fires_immediately() {
        let mut h = default_harness();
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(dragged(10, 14.0, 10.0));
        h.dispatcher.handle(dragged(20, 20.0, 10.0));
        h.dispatcher.handle(dragged(30, 40.0, 10.0));
        h.dispatcher.handle(up(40, 40.0, 10.0, 1, Modifiers::NONE));
        settle(150).await;

        assert_eq!(
            origins(&h.listener),
            vec![RequestOrigin::Gesture(TriggerKind::DragRelease)]
        );
    }

    #[tokio::test]
    async fn test_short_drag_is_plain_click() {
        let mut h = default_harness();
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(dragged(10, 11.0, 10.0));
        h.dispatcher.handle(dragged(20, 12.0, 10.0));
        h.dispatcher.handle(dragged(30, 13.0, 10.0));
        h.dispatcher.handle(up(40, 13.0, 10.0, 1, Modifiers::NONE));
        settle(150).await;
        assert!(h.listener.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_two_drag_events_are_not_a_drag() {
        let mut h = default_harness();
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(dragged(10, 30.0, 10.0));
        h.dispatcher.handle(dragged(20, 60.0, 10.0));
        h.dispatcher.handle(up(30, 60.0, 10.0, 1, Modifiers::NONE));
        settle(150).await;
        assert!(h.listener.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_shift_click_fires_immediately() {
        let mut h = default_harness();
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(up(30, 10.0, 10.0, 1, Modifiers::shift()));
        settle(150).await;
        assert_eq!(
            origins(&h.listener),
            vec![RequestOrigin::Gesture(TriggerKind::ShiftClick)]
        );
    }

    #[tokio::test]
    async fn test_policy_denied_trigger_is_dropped() {
        let mut policy = AppPolicyTable::new([TriggerKind::DoubleClick]);
        policy.insert(
            EDITOR,
            AppPolicyEntry {
                allowed_triggers: Some([TriggerKind::DoubleClick].into_iter().collect()),
                ..Default::default()
            },
        );
        let mut h = harness(EngineConfig::default(), policy);
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(up(30, 10.0, 10.0, 1, Modifiers::shift()));
        settle(150).await;
        assert!(h.listener.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_auto_select_disabled_still_answers_hotkey() {
        let mut h = harness(
            EngineConfig {
                auto_select_enabled: false,
                query_hotkey: Some("Alt+D".into()),
                ..EngineConfig::default()
            },
            AppPolicyTable::new([TriggerKind::ShiftClick]),
        );
        h.dispatcher.handle(down(0, 10.0, 10.0, 1));
        h.dispatcher.handle(up(30, 10.0, 10.0, 1, Modifiers::shift()));
        h.dispatcher.handle(InputEvent::new(
            60,
            InputEventKind::KeyDown {
                key: "d".into(),
                modifiers: Modifiers {
                    alt: true,
                    ..Modifiers::NONE
                },
            },
        ));
        settle(150).await;
        assert_eq!(origins(&h.listener), vec![RequestOrigin::ShortcutQuery]);
    }

    #[tokio::test]
    async fn test_double_command_tap_invokes_callback() {
        let mut h = default_harness();
        h.affordance.show(Rect::new(0.0, 0.0, 10.0, 10.0));
        h.dispatcher.handle(command(0, true));
        h.dispatcher.handle(command(60, false));
        h.dispatcher.handle(command(150, true));
        h.dispatcher.handle(command(210, false));
        settle(50).await;

        assert_eq!(h.listener.double_taps(), 1);
        assert_eq!(h.listener.dismissals(), 1);
        assert!(h.listener.outcomes().is_empty());
    }

    #[tokio::test]
    async fn test_typing_between_command_presses_is_not_a_tap() {
        let mut h = default_harness();
        h.dispatcher.handle(command(0, true));
        h.dispatcher.handle(InputEvent::new(
            20,
            InputEventKind::KeyDown {
                key: "c".into(),
                modifiers: Modifiers {
                    command: true,
                    ..Modifiers::NONE
                },
            },
        ));
        h.dispatcher.handle(command(60, false));
        h.dispatcher.handle(command(150, true));
        h.dispatcher.handle(command(210, false));
        assert_eq!(h.listener.double_taps(), 0);
    }

    #[tokio::test]
    async fn test_affordance_dismissal() {
        let mut h = default_harness();
        h.affordance.show(Rect::new(100.0, 100.0, 40.0, 20.0));

        // Near the frame: stays.
        h.dispatcher
            .handle(InputEvent::new(0, InputEventKind::MouseMoved { at: Point::new(200.0, 110.0) }));
        assert_eq!(h.listener.dismissals(), 0);

        // Inside the frame: a press does not dismiss.
        h.dispatcher.handle(down(10, 110.0, 110.0, 1));
        assert_eq!(h.listener.dismissals(), 0);

        // Far away: dismissed.
        h.dispatcher
            .handle(InputEvent::new(20, InputEventKind::MouseMoved { at: Point::new(400.0, 110.0) }));
        assert_eq!(h.listener.dismissals(), 1);
        assert!(h.affordance.frame().is_none());

        h.affordance.show(Rect::new(100.0, 100.0, 40.0, 20.0));
        h.dispatcher
            .handle(InputEvent::new(30, InputEventKind::Scroll { delta_x: 0, delta_y: -3 }));
        assert_eq!(h.listener.dismissals(), 2);

        h.affordance.show(Rect::new(100.0, 100.0, 40.0, 20.0));
        h.dispatcher.handle(InputEvent::new(
            40,
            InputEventKind::KeyDown {
                key: "a".into(),
                modifiers: Modifiers::NONE,
            },
        ));
        assert_eq!(h.listener.dismissals(), 3);

        h.affordance.show(Rect::new(100.0, 100.0, 40.0, 20.0));
        h.dispatcher.handle(down(50, 10.0, 10.0, 1));
        assert_eq!(h.listener.dismissals(), 4);
    }
}
