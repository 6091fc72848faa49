//! macOS-native global event listening.
//!
//! A single listen-only CGEventTap runs on its own CFRunLoop thread and
//! broadcasts to any number of subscribers. Only one tap ever exists.
//!
//! Keyboard events carry the virtual keycode only; names come from
//! [`keycode_to_name`], so no input-source lookup happens off the main thread.

use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_graphics::event::{CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::ffi::c_void;
use std::ptr;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

type CFMachPortRef = *mut c_void;
type CFRunLoopSourceRef = *mut c_void;
type CFAllocatorRef = *const c_void;
type CFIndex = i64;
type CGEventRef = *mut c_void;
type CGEventFlags = u64;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct CGPoint {
    x: f64,
    y: f64,
}

// CGEventField values
const MOUSE_EVENT_CLICK_STATE: u32 = 1;
const KEYBOARD_EVENT_KEYCODE: u32 = 9;
const SCROLL_WHEEL_EVENT_DELTA_AXIS_1: u32 = 11;
const SCROLL_WHEEL_EVENT_DELTA_AXIS_2: u32 = 12;

// CGEventFlags masks
pub const FLAG_SHIFT: u64 = 0x0002_0000;
pub const FLAG_CONTROL: u64 = 0x0004_0000;
pub const FLAG_ALTERNATE: u64 = 0x0008_0000;
pub const FLAG_COMMAND: u64 = 0x0010_0000;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: CGEventTapCallback,
        user_info: *mut c_void,
    ) -> CFMachPortRef;

    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);

    fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
    fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
    fn CGEventGetFlags(event: CGEventRef) -> CGEventFlags;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFMachPortCreateRunLoopSource(
        allocator: CFAllocatorRef,
        port: CFMachPortRef,
        order: CFIndex,
    ) -> CFRunLoopSourceRef;
}

type CGEventTapCallback = extern "C" fn(
    proxy: *mut c_void,
    event_type: CGEventType,
    cg_event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef;

/// Raw event types from macOS.
#[derive(Debug, Clone)]
pub enum MacOSEventType {
    MouseMove { x: f64, y: f64 },
    /// Pointer moved with a button held.
    MouseDragged { x: f64, y: f64 },
    MouseDown {
        x: f64,
        y: f64,
        button: u8,
        click_count: u32,
        flags: u64,
    },
    MouseUp {
        x: f64,
        y: f64,
        button: u8,
        click_count: u32,
        flags: u64,
    },
    Scroll { delta_x: i64, delta_y: i64 },
    KeyDown { keycode: u16, flags: u64 },
    KeyUp { keycode: u16 },
    FlagsChanged { keycode: u16, flags: u64 },
}

/// A macOS event with timestamp.
#[derive(Debug, Clone)]
pub struct MacOSEvent {
    pub event_type: MacOSEventType,
    pub timestamp_ms: u64,
}

// ============================================================================
// SINGLETON GLOBAL EVENT LISTENER
// ============================================================================

static GLOBAL_LISTENER: OnceLock<Arc<GlobalEventListener>> = OnceLock::new();

struct GlobalEventListener {
    /// Keeps the broadcast channel open.
    _broadcast_rx: Receiver<MacOSEvent>,
    subscribers: Mutex<Vec<Sender<MacOSEvent>>>,
}

impl GlobalEventListener {
    fn new() -> Arc<Self> {
        let (broadcast_tx, broadcast_rx) = bounded::<MacOSEvent>(2048);

        let listener = Arc::new(Self {
            _broadcast_rx: broadcast_rx.clone(),
            subscribers: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&listener);
        thread::spawn(move || {
            while let Ok(event) = broadcast_rx.recv() {
                let Some(listener) = weak.upgrade() else {
                    break;
                };
                let subs = listener.subscribers.lock().unwrap_or_else(|e| e.into_inner());
                for sub in subs.iter() {
                    let _ = sub.try_send(event.clone());
                }
            }
        });

        thread::spawn(move || {
            info!("Global macOS event listener thread starting");
            if let Err(e) = run_event_tap(broadcast_tx) {
                error!("Event tap error: {}", e);
            }
            info!("Global macOS event listener thread exiting");
        });

        listener
    }

    fn subscribe(&self) -> Receiver<MacOSEvent> {
        let (tx, rx) = bounded::<MacOSEvent>(1024);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    fn cleanup_dead_subscribers(&self) {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|s| !s.is_full());
    }
}

fn get_global_listener() -> Arc<GlobalEventListener> {
    GLOBAL_LISTENER.get_or_init(GlobalEventListener::new).clone()
}

thread_local! {
    static EVENT_SENDER: std::cell::RefCell<Option<Sender<MacOSEvent>>> = const { std::cell::RefCell::new(None) };
}

/// Runs on the CFRunLoop thread.
extern "C" fn event_tap_callback(
    _proxy: *mut c_void,
    event_type: CGEventType,
    cg_event: CGEventRef,
    _user_info: *mut c_void,
) -> CGEventRef {
    if let Some(evt) = convert_event_raw(event_type, cg_event) {
        EVENT_SENDER.with(|sender| {
            if let Some(ref tx) = *sender.borrow() {
                let _ = tx.try_send(evt);
            }
        });
    }
    // Listen-only: pass the event through untouched.
    cg_event
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn convert_event_raw(event_type: CGEventType, event: CGEventRef) -> Option<MacOSEvent> {
    let mouse = |button: u8, down: bool| {
        let (loc, click_count, flags) = unsafe {
            (
                CGEventGetLocation(event),
                CGEventGetIntegerValueField(event, MOUSE_EVENT_CLICK_STATE).max(0) as u32,
                CGEventGetFlags(event),
            )
        };
        if down {
            MacOSEventType::MouseDown {
                x: loc.x,
                y: loc.y,
                button,
                click_count,
                flags,
            }
        } else {
            MacOSEventType::MouseUp {
                x: loc.x,
                y: loc.y,
                button,
                click_count,
                flags,
            }
        }
    };
    let keycode = || unsafe { CGEventGetIntegerValueField(event, KEYBOARD_EVENT_KEYCODE) } as u16;

    let evt_type = match event_type {
        CGEventType::MouseMoved => {
            let loc = unsafe { CGEventGetLocation(event) };
            MacOSEventType::MouseMove { x: loc.x, y: loc.y }
        }
        CGEventType::LeftMouseDragged | CGEventType::RightMouseDragged => {
            let loc = unsafe { CGEventGetLocation(event) };
            MacOSEventType::MouseDragged { x: loc.x, y: loc.y }
        }
        CGEventType::LeftMouseDown => mouse(0, true),
        CGEventType::LeftMouseUp => mouse(0, false),
        CGEventType::RightMouseDown => mouse(1, true),
        CGEventType::RightMouseUp => mouse(1, false),
        CGEventType::OtherMouseDown => mouse(2, true),
        CGEventType::OtherMouseUp => mouse(2, false),
        CGEventType::ScrollWheel => {
            let (delta_y, delta_x) = unsafe {
                (
                    CGEventGetIntegerValueField(event, SCROLL_WHEEL_EVENT_DELTA_AXIS_1),
                    CGEventGetIntegerValueField(event, SCROLL_WHEEL_EVENT_DELTA_AXIS_2),
                )
            };
            MacOSEventType::Scroll { delta_x, delta_y }
        }
        CGEventType::KeyDown => MacOSEventType::KeyDown {
            keycode: keycode(),
            flags: unsafe { CGEventGetFlags(event) },
        },
        CGEventType::KeyUp => MacOSEventType::KeyUp { keycode: keycode() },
        CGEventType::FlagsChanged => MacOSEventType::FlagsChanged {
            keycode: keycode(),
            flags: unsafe { CGEventGetFlags(event) },
        },
        _ => return None,
    };

    Some(MacOSEvent {
        event_type: evt_type,
        timestamp_ms: now_ms(),
    })
}

fn run_event_tap(sender: Sender<MacOSEvent>) -> Result<(), String> {
    EVENT_SENDER.with(|s| {
        *s.borrow_mut() = Some(sender);
    });

    let event_mask: u64 = (1 << CGEventType::LeftMouseDown as u64)
        | (1 << CGEventType::LeftMouseUp as u64)
        | (1 << CGEventType::RightMouseDown as u64)
        | (1 << CGEventType::RightMouseUp as u64)
        | (1 << CGEventType::OtherMouseDown as u64)
        | (1 << CGEventType::OtherMouseUp as u64)
        | (1 << CGEventType::MouseMoved as u64)
        | (1 << CGEventType::LeftMouseDragged as u64)
        | (1 << CGEventType::RightMouseDragged as u64)
        | (1 << CGEventType::KeyDown as u64)
        | (1 << CGEventType::KeyUp as u64)
        | (1 << CGEventType::FlagsChanged as u64)
        | (1 << CGEventType::ScrollWheel as u64);

    let tap = unsafe {
        CGEventTapCreate(
            CGEventTapLocation::HID as u32,
            CGEventTapPlacement::HeadInsertEventTap as u32,
            CGEventTapOptions::ListenOnly as u32,
            event_mask,
            event_tap_callback,
            ptr::null_mut(),
        )
    };
    if tap.is_null() {
        error!("Failed to create event tap - accessibility permission may not be granted");
        return Err("Failed to create event tap".to_string());
    }
    debug!("Event tap created");

    let run_loop_source = unsafe { CFMachPortCreateRunLoopSource(ptr::null(), tap, 0) };
    if run_loop_source.is_null() {
        return Err("Failed to create run loop source".to_string());
    }
    let cf_source = unsafe { CFRunLoopSource::wrap_under_create_rule(run_loop_source as *mut _) };

    let run_loop = CFRunLoop::get_current();
    run_loop.add_source(&cf_source, unsafe { kCFRunLoopCommonModes });
    unsafe {
        CGEventTapEnable(tap, true);
    }

    info!("macOS event listener started, running CFRunLoop");
    CFRunLoop::run_current();
    Ok(())
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Receives global macOS events; unsubscribes when dropped.
pub struct MacOSEventSubscription {
    receiver: Receiver<MacOSEvent>,
}

impl MacOSEventSubscription {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<MacOSEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

impl Drop for MacOSEventSubscription {
    fn drop(&mut self) {
        get_global_listener().cleanup_dead_subscribers();
    }
}

pub fn subscribe_events() -> MacOSEventSubscription {
    MacOSEventSubscription {
        receiver: get_global_listener().subscribe(),
    }
}

// Virtual keycodes from HIToolbox/Events.h.
const KEY_NAMES: &[(u16, &str)] = &[
    (0x00, "a"), (0x01, "s"), (0x02, "d"), (0x03, "f"), (0x04, "h"), (0x05, "g"),
    (0x06, "z"), (0x07, "x"), (0x08, "c"), (0x09, "v"), (0x0B, "b"), (0x0C, "q"),
    (0x0D, "w"), (0x0E, "e"), (0x0F, "r"), (0x10, "y"), (0x11, "t"), (0x12, "1"),
    (0x13, "2"), (0x14, "3"), (0x15, "4"), (0x16, "6"), (0x17, "5"), (0x18, "="),
    (0x19, "9"), (0x1A, "7"), (0x1B, "-"), (0x1C, "8"), (0x1D, "0"), (0x1E, "]"),
    (0x1F, "o"), (0x20, "u"), (0x21, "["), (0x22, "i"), (0x23, "p"), (0x24, "Return"),
    (0x25, "l"), (0x26, "j"), (0x27, "'"), (0x28, "k"), (0x29, ";"), (0x2A, "\\"),
    (0x2B, ","), (0x2C, "/"), (0x2D, "n"), (0x2E, "m"), (0x2F, "."), (0x30, "Tab"),
    (0x31, "Space"), (0x32, "`"), (0x33, "Backspace"), (0x35, "Escape"),
    (0x36, "MetaRight"), (0x37, "MetaLeft"), (0x38, "ShiftLeft"), (0x39, "CapsLock"),
    (0x3A, "Alt"), (0x3B, "ControlLeft"), (0x3C, "ShiftRight"), (0x3D, "AltGr"),
    (0x3E, "ControlRight"), (0x3F, "Function"),
    (0x7A, "F1"), (0x78, "F2"), (0x63, "F3"), (0x76, "F4"), (0x60, "F5"), (0x61, "F6"),
    (0x62, "F7"), (0x64, "F8"), (0x65, "F9"), (0x6D, "F10"), (0x67, "F11"), (0x6F, "F12"),
    (0x73, "Home"), (0x74, "PageUp"), (0x75, "Delete"), (0x77, "End"), (0x79, "PageDown"),
    (0x7B, "Left"), (0x7C, "Right"), (0x7D, "Down"), (0x7E, "Up"),
];

/// Map a macOS virtual keycode to the key names used across the crate.
pub fn keycode_to_name(keycode: u16) -> String {
    KEY_NAMES
        .iter()
        .find(|(code, _)| *code == keycode)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Unknown(0x{:02X})", keycode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keycode_to_name() {
        assert_eq!(keycode_to_name(0x02), "d");
        assert_eq!(keycode_to_name(0x37), "MetaLeft");
        assert_eq!(keycode_to_name(0xFF), "Unknown(0xFF)");
    }
}
