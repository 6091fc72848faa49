//! seltext-platform: OS boundary for the selection engine.
//!
//! This crate provides:
//! - Global input hook via `rdev` (or a native event tap on macOS)
//! - Accessibility queries and the Copy menu action (macOS AX API)
//! - Browser scripting through `osascript`
//! - Clipboard access via `arboard`
//! - Copy keystroke synthesis via `enigo`
//! - Frontmost application lookup
//!
//! ## Module Structure
//!
//! - `error` - Common error types
//! - `events` - Shared macOS event tap
//! - `input_hook` - Raw input events for the dispatcher
//! - `accessibility` - `AccessibilityApi` implementations
//! - `scripting` - `ScriptRunner` implementation
//! - `clipboard` - `Clipboard` implementation
//! - `injector` - `KeySynthesizer` implementations
//! - `frontmost` - `FrontmostApp` implementation

mod accessibility;
mod clipboard;
mod error;
mod frontmost;
mod injector;
mod input_hook;
mod scripting;

#[cfg(target_os = "macos")]
mod events;

pub use accessibility::{is_accessibility_trusted, system_accessibility, UnsupportedAccessibility};
#[cfg(target_os = "macos")]
pub use accessibility::MacAccessibility;

pub use clipboard::ArboardClipboard;
pub use error::{PlatformError, PlatformResult};
pub use frontmost::SystemFrontmostApp;
pub use injector::{EnigoInjector, NoopInjector};
pub use input_hook::{start_input_hook, InputHookHandle};
pub use scripting::{wrap_for_bundle, OsaScriptRunner};
