//! macOS Accessibility (AX) adapter.
//!
//! Every call is bounded by the AX messaging timeout so a hung target app
//! cannot stall a blocking worker for long.

use accessibility_sys::{
    kAXErrorAttributeUnsupported, kAXErrorNoValue, kAXErrorSuccess, kAXValueTypeCFRange,
    AXIsProcessTrusted, AXUIElementCopyAttributeValue, AXUIElementCreateSystemWide,
    AXUIElementPerformAction, AXUIElementRef, AXUIElementSetMessagingTimeout, AXValueGetValue,
    AXValueRef,
};
use core_foundation::array::{CFArrayGetCount, CFArrayGetValueAtIndex, CFArrayRef};
use core_foundation::base::{CFRange, CFRelease, CFRetain, CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use seltext_core::{
    AccessibilityApi, AxError, FailureCategory, FocusedElementInfo, MenuItemState, TextRange,
};
use std::ffi::c_void;
use tracing::{debug, trace};

const MESSAGING_TIMEOUT_SECS: f32 = 0.2;

const FOCUSED_ELEMENT: &str = "AXFocusedUIElement";
const FOCUSED_APPLICATION: &str = "AXFocusedApplication";
const SELECTED_TEXT: &str = "AXSelectedText";
const SELECTED_TEXT_RANGE: &str = "AXSelectedTextRange";
const VALUE: &str = "AXValue";
const ROLE: &str = "AXRole";
const MENU_BAR: &str = "AXMenuBar";
const CHILDREN: &str = "AXChildren";
const ENABLED: &str = "AXEnabled";
const MENU_CMD_CHAR: &str = "AXMenuItemCmdChar";
const MENU_CMD_MODIFIERS: &str = "AXMenuItemCmdModifiers";
const PRESS: &str = "AXPress";

/// Modifier mask meaning "Command only".
const CMD_MODIFIERS_NONE: i64 = 0;

fn map_error(code: i32) -> AxError {
    let category = match code {
        kAXErrorNoValue => FailureCategory::NoValue,
        kAXErrorAttributeUnsupported => FailureCategory::AttributeUnsupported,
        _ => FailureCategory::GenericFailure,
    };
    AxError::new(category, code)
}

/// Whether this process has been granted accessibility access.
pub fn is_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

/// Owned reference to an AX element, released on drop.
struct AxElement(AXUIElementRef);

impl AxElement {
    fn system_wide() -> Self {
        let element = unsafe { AXUIElementCreateSystemWide() };
        unsafe { AXUIElementSetMessagingTimeout(element, MESSAGING_TIMEOUT_SECS) };
        Self(element)
    }

    /// Retain a borrowed element pointer (e.g. out of a CFArray).
    fn retained(raw: *const c_void) -> Self {
        unsafe { CFRetain(raw as CFTypeRef) };
        Self(raw as AXUIElementRef)
    }

    fn attribute(&self, name: &'static str) -> Result<CFType, AxError> {
        let attr = CFString::from_static_string(name);
        let mut value: CFTypeRef = std::ptr::null();
        let code = unsafe {
            AXUIElementCopyAttributeValue(self.0, attr.as_concrete_TypeRef(), &mut value)
        };
        if code != kAXErrorSuccess {
            trace!(attribute = name, code, "AX attribute read failed");
            return Err(map_error(code));
        }
        if value.is_null() {
            return Err(AxError::new(FailureCategory::NoValue, kAXErrorNoValue));
        }
        Ok(unsafe { CFType::wrap_under_create_rule(value) })
    }

    fn string(&self, name: &'static str) -> Result<Option<String>, AxError> {
        Ok(self
            .attribute(name)?
            .downcast::<CFString>()
            .map(|s| s.to_string()))
    }

    fn number(&self, name: &'static str) -> Option<i64> {
        self.attribute(name)
            .ok()?
            .downcast::<CFNumber>()
            .and_then(|n| n.to_i64())
    }

    fn flag(&self, name: &'static str) -> Option<bool> {
        self.attribute(name)
            .ok()?
            .downcast::<CFBoolean>()
            .map(bool::from)
    }

    fn element(&self, name: &'static str) -> Result<AxElement, AxError> {
        let value = self.attribute(name)?;
        Ok(AxElement::retained(value.as_CFTypeRef()))
    }

    fn text_range(&self) -> Option<TextRange> {
        let value = self.attribute(SELECTED_TEXT_RANGE).ok()?;
        let mut range = CFRange {
            location: 0,
            length: 0,
        };
        let ok = unsafe {
            AXValueGetValue(
                value.as_CFTypeRef() as AXValueRef,
                kAXValueTypeCFRange,
                &mut range as *mut CFRange as *mut c_void,
            )
        };
        if !ok || range.location < 0 || range.length < 0 {
            return None;
        }
        Some(TextRange {
            offset: range.location as usize,
            length: range.length as usize,
        })
    }

    fn children(&self) -> Vec<AxElement> {
        let Ok(value) = self.attribute(CHILDREN) else {
            return Vec::new();
        };
        let array = value.as_CFTypeRef() as CFArrayRef;
        let count = unsafe { CFArrayGetCount(array) };
        (0..count)
            .map(|i| AxElement::retained(unsafe { CFArrayGetValueAtIndex(array, i) }))
            .collect()
    }

    fn perform(&self, action: &'static str) -> Result<(), AxError> {
        let action = CFString::from_static_string(action);
        let code = unsafe { AXUIElementPerformAction(self.0, action.as_concrete_TypeRef()) };
        if code == kAXErrorSuccess {
            Ok(())
        } else {
            Err(map_error(code))
        }
    }

    fn is_copy_item(&self) -> bool {
        let cmd_char = self.string(MENU_CMD_CHAR).ok().flatten();
        cmd_char.is_some_and(|c| c.eq_ignore_ascii_case("c"))
            && self.number(MENU_CMD_MODIFIERS) == Some(CMD_MODIFIERS_NONE)
    }
}

impl Drop for AxElement {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { CFRelease(self.0 as CFTypeRef) };
        }
    }
}

/// Accessibility port backed by the system-wide AX element.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacAccessibility;

impl MacAccessibility {
    pub fn new() -> Self {
        Self
    }

    /// Walk menu bar > menus > items for the item bound to Cmd+C.
    fn find_copy_item(&self) -> Result<Option<AxElement>, AxError> {
        let system = AxElement::system_wide();
        let app = system.element(FOCUSED_APPLICATION)?;
        let menu_bar = app.element(MENU_BAR)?;

        for bar_item in menu_bar.children() {
            for menu in bar_item.children() {
                if let Some(item) = menu.children().into_iter().find(AxElement::is_copy_item) {
                    return Ok(Some(item));
                }
            }
        }
        Ok(None)
    }
}

impl AccessibilityApi for MacAccessibility {
    fn focused_element(&self) -> Result<FocusedElementInfo, AxError> {
        let system = AxElement::system_wide();
        let focused = system.element(FOCUSED_ELEMENT)?;

        let (selected_text, text_error) = match focused.string(SELECTED_TEXT) {
            Ok(text) => (text, None),
            Err(e) => (None, Some(e)),
        };

        let info = FocusedElementInfo {
            full_text: focused.string(VALUE).ok().flatten(),
            selected_range: focused.text_range(),
            selected_text,
            role: focused.string(ROLE).ok().flatten(),
        };

        match text_error {
            Some(err) if info.selection().is_none() => {
                debug!(?err, role = ?info.role, "AX selected text unavailable");
                Err(err)
            }
            _ => Ok(info),
        }
    }

    fn focused_role(&self) -> Result<Option<String>, AxError> {
        let system = AxElement::system_wide();
        system.element(FOCUSED_ELEMENT)?.string(ROLE)
    }

    fn copy_menu_item(&self) -> Result<MenuItemState, AxError> {
        let state = match self.find_copy_item()? {
            None => MenuItemState::Missing,
            Some(item) if item.flag(ENABLED).unwrap_or(false) => MenuItemState::Enabled,
            Some(_) => MenuItemState::Disabled,
        };
        debug!(?state, "Copy menu item");
        Ok(state)
    }

    fn press_copy_menu_item(&self) -> Result<(), AxError> {
        match self.find_copy_item()? {
            Some(item) => item.perform(PRESS),
            None => Err(AxError::new(FailureCategory::NoValue, kAXErrorNoValue)),
        }
    }
}
