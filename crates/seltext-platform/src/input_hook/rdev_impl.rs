//! rdev-based input hook for Windows/Linux.
//!
//! rdev reports neither pointer position on button events nor click counts,
//! so both are reconstructed here.

use crossbeam_channel::{Receiver, Sender};
use rdev::{listen, Event, EventType};
use seltext_core::{
    ClickCounter, InputEvent, InputEventKind, ModifierKey, Modifiers, MouseButton, Point,
};
use std::time::Instant;
use tracing::{error, info, warn};

fn button(button: rdev::Button) -> MouseButton {
    match button {
        rdev::Button::Left => MouseButton::Left,
        rdev::Button::Right => MouseButton::Right,
        rdev::Button::Middle => MouseButton::Middle,
        _ => MouseButton::Unknown,
    }
}

/// Pointer and modifier state carried between rdev callbacks.
#[derive(Default)]
struct HookState {
    position: Point,
    left_down: bool,
    modifiers: Modifiers,
    clicks: ClickCounter,
}

impl HookState {
    fn convert(&mut self, timestamp_ms: u64, event_type: EventType) -> Option<InputEventKind> {
        let kind = match event_type {
            EventType::MouseMove { x, y } => {
                self.position = Point::new(x, y);
                if self.left_down {
                    InputEventKind::MouseDragged { at: self.position }
                } else {
                    InputEventKind::MouseMoved { at: self.position }
                }
            }
            EventType::ButtonPress(b) => {
                let button = button(b);
                let click_count = if button == MouseButton::Left {
                    self.left_down = true;
                    self.clicks.press(timestamp_ms, self.position)
                } else {
                    1
                };
                InputEventKind::MouseDown {
                    at: self.position,
                    button,
                    click_count,
                    modifiers: self.modifiers,
                }
            }
            EventType::ButtonRelease(b) => {
                let button = button(b);
                let click_count = if button == MouseButton::Left {
                    self.left_down = false;
                    self.clicks.current()
                } else {
                    1
                };
                InputEventKind::MouseUp {
                    at: self.position,
                    button,
                    click_count,
                    modifiers: self.modifiers,
                }
            }
            EventType::Wheel { delta_x, delta_y } => InputEventKind::Scroll { delta_x, delta_y },
            EventType::KeyPress(key) => {
                let name = format_key(key);
                match ModifierKey::from_key_name(&name) {
                    Some(modifier) => return self.modifier_changed(modifier, true),
                    None => InputEventKind::KeyDown {
                        key: name,
                        modifiers: self.modifiers,
                    },
                }
            }
            EventType::KeyRelease(key) => {
                let name = format_key(key);
                match ModifierKey::from_key_name(&name) {
                    Some(modifier) => return self.modifier_changed(modifier, false),
                    None => InputEventKind::KeyUp { key: name },
                }
            }
        };
        Some(kind)
    }

    /// Emit a flags change only on real edges; held keys auto-repeat.
    fn modifier_changed(&mut self, key: ModifierKey, pressed: bool) -> Option<InputEventKind> {
        let slot = match key {
            ModifierKey::Command => &mut self.modifiers.command,
            ModifierKey::Shift => &mut self.modifiers.shift,
            ModifierKey::Control => &mut self.modifiers.control,
            ModifierKey::Alt => &mut self.modifiers.alt,
            ModifierKey::Function => return None,
        };
        if *slot == pressed {
            return None;
        }
        *slot = pressed;
        Some(InputEventKind::FlagsChanged {
            key,
            pressed,
            modifiers: self.modifiers,
        })
    }
}

pub fn start_hook(event_tx: Sender<InputEvent>, stop_rx: Receiver<()>) {
    info!("Input hook thread started (rdev)");
    let start_time = Instant::now();
    let mut state = HookState::default();

    let callback = move |event: Event| {
        if stop_rx.try_recv().is_ok() {
            return;
        }
        let timestamp_ms = start_time.elapsed().as_millis() as u64;
        if let Some(kind) = state.convert(timestamp_ms, event.event_type) {
            if let Err(e) = event_tx.try_send(InputEvent::new(timestamp_ms, kind)) {
                warn!("Failed to send input event: {}", e);
            }
        }
    };

    if let Err(error) = listen(callback) {
        error!(?error, "Input hook error");
    }

    info!("Input hook thread exiting");
}

/// Key names shared with the macOS hook and the hotkey parser.
fn format_key(key: rdev::Key) -> String {
    use rdev::Key;
    let name = match key {
        Key::Alt => "Alt",
        Key::AltGr => "AltGr",
        Key::ControlLeft => "ControlLeft",
        Key::ControlRight => "ControlRight",
        Key::MetaLeft => "MetaLeft",
        Key::MetaRight => "MetaRight",
        Key::ShiftLeft => "ShiftLeft",
        Key::ShiftRight => "ShiftRight",
        Key::Function => "Function",
        Key::CapsLock => "CapsLock",
        Key::Backspace => "Backspace",
        Key::Delete => "Delete",
        Key::Escape => "Escape",
        Key::Return => "Return",
        Key::Space => "Space",
        Key::Tab => "Tab",
        Key::UpArrow => "Up",
        Key::DownArrow => "Down",
        Key::LeftArrow => "Left",
        Key::RightArrow => "Right",
        Key::Home => "Home",
        Key::End => "End",
        Key::PageUp => "PageUp",
        Key::PageDown => "PageDown",
        Key::F1 => "F1",
        Key::F2 => "F2",
        Key::F3 => "F3",
        Key::F4 => "F4",
        Key::F5 => "F5",
        Key::F6 => "F6",
        Key::F7 => "F7",
        Key::F8 => "F8",
        Key::F9 => "F9",
        Key::F10 => "F10",
        Key::F11 => "F11",
        Key::F12 => "F12",
        Key::Num1 => "1",
        Key::Num2 => "2",
        Key::Num3 => "3",
        Key::Num4 => "4",
        Key::Num5 => "5",
        Key::Num6 => "6",
        Key::Num7 => "7",
        Key::Num8 => "8",
        Key::Num9 => "9",
        Key::Num0 => "0",
        Key::KeyQ => "q",
        Key::KeyW => "w",
        Key::KeyE => "e",
        Key::KeyR => "r",
        Key::KeyT => "t",
        Key::KeyY => "y",
        Key::KeyU => "u",
        Key::KeyI => "i",
        Key::KeyO => "o",
        Key::KeyP => "p",
        Key::KeyA => "a",
        Key::KeyS => "s",
        Key::KeyD => "d",
        Key::KeyF => "f",
        Key::KeyG => "g",
        Key::KeyH => "h",
        Key::KeyJ => "j",
        Key::KeyK => "k",
        Key::KeyL => "l",
        Key::KeyZ => "z",
        Key::KeyX => "x",
        Key::KeyC => "c",
        Key::KeyV => "v",
        Key::KeyB => "b",
        Key::KeyN => "n",
        Key::KeyM => "m",
        Key::Minus => "-",
        Key::Equal => "=",
        Key::LeftBracket => "[",
        Key::RightBracket => "]",
        Key::SemiColon => ";",
        Key::Quote => "'",
        Key::BackSlash | Key::IntlBackslash => "\\",
        Key::Comma => ",",
        Key::Dot => ".",
        Key::Slash => "/",
        Key::BackQuote => "`",
        Key::Unknown(code) => return format!("Unknown({})", code),
        other => return format!("{:?}", other),
    };
    name.to_string()
}
