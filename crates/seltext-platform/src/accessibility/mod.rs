//! Accessibility port implementations.
//!
//! Platform implementations:
//! - macOS: AX API (`macos.rs`)
//! - Windows/Linux: unsupported, every query reports a generic failure

use seltext_core::{AccessibilityApi, AxError, FocusedElementInfo, MenuItemState};
use std::sync::Arc;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::MacAccessibility;

/// Accessibility port for platforms without an AX equivalent.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedAccessibility;

impl AccessibilityApi for UnsupportedAccessibility {
    fn focused_element(&self) -> Result<FocusedElementInfo, AxError> {
        Err(AxError::generic(0))
    }

    fn focused_role(&self) -> Result<Option<String>, AxError> {
        Err(AxError::generic(0))
    }

    fn copy_menu_item(&self) -> Result<MenuItemState, AxError> {
        Ok(MenuItemState::Missing)
    }

    fn press_copy_menu_item(&self) -> Result<(), AxError> {
        Err(AxError::generic(0))
    }
}

/// The accessibility port for the current platform.
pub fn system_accessibility() -> Arc<dyn AccessibilityApi> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(MacAccessibility::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(UnsupportedAccessibility)
    }
}

/// Whether the process may query other applications' UI.
pub fn is_accessibility_trusted() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::is_trusted()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
