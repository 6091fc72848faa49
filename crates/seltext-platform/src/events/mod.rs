//! Global event listening.
//!
//! - **macOS**: native CGEventTap (singleton), see `macos.rs`. `rdev` resolves
//!   key characters off the main thread there, which is not safe.
//! - **Windows/Linux**: not used; `input_hook` listens through `rdev` directly.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::*;
