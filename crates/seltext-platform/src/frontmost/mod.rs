//! Frontmost application lookup.
//!
//! Platform implementations:
//! - macOS: `NSWorkspace.frontmostApplication` (`macos.rs`)
//! - Windows: foreground window owner process (`windows.rs`)
//! - Linux: not available

use seltext_core::{AppInfo, FrontmostApp};

#[cfg(windows)]
mod windows;

#[cfg(target_os = "macos")]
mod macos;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFrontmostApp;

impl SystemFrontmostApp {
    pub fn new() -> Self {
        Self
    }
}

impl FrontmostApp for SystemFrontmostApp {
    fn frontmost_app(&self) -> Option<AppInfo> {
        #[cfg(target_os = "macos")]
        {
            macos::frontmost_app()
        }
        #[cfg(windows)]
        {
            windows::frontmost_app()
        }
        #[cfg(not(any(target_os = "macos", windows)))]
        {
            None
        }
    }
}
