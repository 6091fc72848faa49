//! macOS frontmost application via AppKit.

use objc::runtime::Object;
use objc::{class, msg_send, sel, sel_impl};
use seltext_core::AppInfo;
use std::ffi::CStr;
use std::os::raw::c_char;

#[link(name = "AppKit", kind = "framework")]
extern "C" {}

unsafe fn ns_string(value: *mut Object) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let c_str: *const c_char = msg_send![value, UTF8String];
    if c_str.is_null() {
        return None;
    }
    Some(CStr::from_ptr(c_str).to_string_lossy().into_owned())
}

pub fn frontmost_app() -> Option<AppInfo> {
    unsafe {
        let workspace: *mut Object = msg_send![class!(NSWorkspace), sharedWorkspace];
        if workspace.is_null() {
            return None;
        }
        let app: *mut Object = msg_send![workspace, frontmostApplication];
        if app.is_null() {
            return None;
        }

        let bundle_id: *mut Object = msg_send![app, bundleIdentifier];
        let name: *mut Object = msg_send![app, localizedName];
        let pid: i32 = msg_send![app, processIdentifier];

        Some(AppInfo {
            bundle_id: ns_string(bundle_id)?,
            name: ns_string(name),
            pid: Some(pid),
        })
    }
}
