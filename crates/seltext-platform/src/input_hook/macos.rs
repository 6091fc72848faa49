//! macOS input hook on top of the shared event tap.
//!
//! The subscription is dropped when `start_hook` returns.

use crate::events::{
    keycode_to_name, subscribe_events, MacOSEventType, FLAG_ALTERNATE, FLAG_COMMAND,
    FLAG_CONTROL, FLAG_SHIFT,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use seltext_core::{InputEvent, InputEventKind, ModifierKey, Modifiers, MouseButton, Point};
use std::time::Duration;
use tracing::{info, warn};

const FLAG_FUNCTION: u64 = 0x0080_0000;

fn modifiers_from_flags(flags: u64) -> Modifiers {
    Modifiers {
        shift: flags & FLAG_SHIFT != 0,
        control: flags & FLAG_CONTROL != 0,
        alt: flags & FLAG_ALTERNATE != 0,
        command: flags & FLAG_COMMAND != 0,
    }
}

fn modifier_flag(key: ModifierKey) -> u64 {
    match key {
        ModifierKey::Command => FLAG_COMMAND,
        ModifierKey::Shift => FLAG_SHIFT,
        ModifierKey::Control => FLAG_CONTROL,
        ModifierKey::Alt => FLAG_ALTERNATE,
        ModifierKey::Function => FLAG_FUNCTION,
    }
}

fn button(button: u8) -> MouseButton {
    match button {
        0 => MouseButton::Left,
        1 => MouseButton::Right,
        2 => MouseButton::Middle,
        _ => MouseButton::Unknown,
    }
}

fn convert(event_type: MacOSEventType) -> Option<InputEventKind> {
    let kind = match event_type {
        MacOSEventType::MouseMove { x, y } => InputEventKind::MouseMoved { at: Point::new(x, y) },
        MacOSEventType::MouseDragged { x, y } => {
            InputEventKind::MouseDragged { at: Point::new(x, y) }
        }
        MacOSEventType::MouseDown {
            x,
            y,
            button: b,
            click_count,
            flags,
        } => InputEventKind::MouseDown {
            at: Point::new(x, y),
            button: button(b),
            click_count,
            modifiers: modifiers_from_flags(flags),
        },
        MacOSEventType::MouseUp {
            x,
            y,
            button: b,
            click_count,
            flags,
        } => InputEventKind::MouseUp {
            at: Point::new(x, y),
            button: button(b),
            click_count,
            modifiers: modifiers_from_flags(flags),
        },
        MacOSEventType::Scroll { delta_x, delta_y } => InputEventKind::Scroll { delta_x, delta_y },
        MacOSEventType::KeyDown { keycode, flags } => InputEventKind::KeyDown {
            key: keycode_to_name(keycode),
            modifiers: modifiers_from_flags(flags),
        },
        MacOSEventType::KeyUp { keycode } => InputEventKind::KeyUp {
            key: keycode_to_name(keycode),
        },
        MacOSEventType::FlagsChanged { keycode, flags } => {
            let key = ModifierKey::from_key_name(&keycode_to_name(keycode))?;
            InputEventKind::FlagsChanged {
                key,
                pressed: flags & modifier_flag(key) != 0,
                modifiers: modifiers_from_flags(flags),
            }
        }
    };
    Some(kind)
}

pub fn start_hook(event_tx: Sender<InputEvent>, stop_rx: Receiver<()>) {
    info!("Input hook thread started (macOS native, using global listener)");

    let start_timestamp_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let subscription = subscribe_events();

    loop {
        if stop_rx.try_recv().is_ok() {
            info!("Input hook received stop signal");
            break;
        }

        match subscription.recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                let timestamp_ms = event.timestamp_ms.saturating_sub(start_timestamp_ms);
                if let Some(kind) = convert(event.event_type) {
                    if let Err(e) = event_tx.try_send(InputEvent::new(timestamp_ms, kind)) {
                        warn!("Failed to send input event: {}", e);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Event subscription disconnected");
                break;
            }
        }
    }

    info!("Input hook thread exiting");
}
