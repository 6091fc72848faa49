//! Platform-neutral input events fed to the dispatcher.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// A point in global screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Screen rectangle of the floating affordance shown by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Grow the rectangle by `radius` on every side.
    pub fn expanded(&self, radius: f64) -> Rect {
        Rect {
            x: self.x - radius,
            y: self.y - radius,
            width: self.width + radius * 2.0,
            height: self.height + radius * 2.0,
        }
    }
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub command: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
        command: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Unknown,
}

/// Modifier keys tracked through flags-changed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    Command,
    Shift,
    Control,
    Alt,
    Function,
}

impl ModifierKey {
    /// Map a key name produced by the input hook to a modifier.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "MetaLeft" | "MetaRight" => Some(ModifierKey::Command),
            "ShiftLeft" | "ShiftRight" => Some(ModifierKey::Shift),
            "ControlLeft" | "ControlRight" => Some(ModifierKey::Control),
            "Alt" | "AltGr" => Some(ModifierKey::Alt),
            "Function" => Some(ModifierKey::Function),
            _ => None,
        }
    }
}

/// A raw input event captured by the hook.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    /// Milliseconds on a monotonic-enough clock shared by all events.
    pub timestamp_ms: u64,
    pub kind: InputEventKind,
}

impl InputEvent {
    pub fn new(timestamp_ms: u64, kind: InputEventKind) -> Self {
        Self { timestamp_ms, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEventKind {
    MouseDown {
        at: Point,
        button: MouseButton,
        click_count: u32,
        modifiers: Modifiers,
    },
    MouseUp {
        at: Point,
        button: MouseButton,
        click_count: u32,
        modifiers: Modifiers,
    },
    /// Pointer moved while a button is held.
    MouseDragged { at: Point },
    MouseMoved { at: Point },
    Scroll { delta_x: i64, delta_y: i64 },
    KeyDown { key: String, modifiers: Modifiers },
    KeyUp { key: String },
    /// A modifier key changed state.
    FlagsChanged {
        key: ModifierKey,
        pressed: bool,
        modifiers: Modifiers,
    },
}

/// A key chord such as `Alt+D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    /// Lower-cased key name.
    pub key: String,
}

impl Hotkey {
    /// Parse `Modifier+...+Key`. Modifier names are case-insensitive.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut modifiers = Modifiers::NONE;
        let mut key = None;

        for part in spec.split('+').map(str::trim) {
            match part.to_lowercase().as_str() {
                "" => return Err(ConfigError::InvalidHotkey(spec.to_string())),
                "cmd" | "command" | "meta" | "super" => modifiers.command = true,
                "ctrl" | "control" => modifiers.control = true,
                "alt" | "option" | "opt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                other => {
                    if key.replace(other.to_string()).is_some() {
                        return Err(ConfigError::InvalidHotkey(spec.to_string()));
                    }
                }
            }
        }

        match key {
            Some(key) if !modifiers.is_empty() => Ok(Self { modifiers, key }),
            _ => Err(ConfigError::InvalidHotkey(spec.to_string())),
        }
    }

    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.modifiers == modifiers && self.key.eq_ignore_ascii_case(key)
    }
}
