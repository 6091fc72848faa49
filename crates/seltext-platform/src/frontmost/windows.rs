//! Windows frontmost application via the foreground window's owner process.

use seltext_core::AppInfo;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::ptr;
use windows_sys::Win32::Foundation::CloseHandle;
use windows_sys::Win32::System::ProcessStatus::GetModuleBaseNameW;
use windows_sys::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

pub fn frontmost_app() -> Option<AppInfo> {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.is_null() {
            return None;
        }
        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, &mut pid);
        if pid == 0 {
            return None;
        }
        let process_name = get_process_name(pid)?;
        Some(AppInfo {
            bundle_id: process_name.to_lowercase(),
            name: Some(process_name),
            pid: Some(pid as i32),
        })
    }
}

fn get_process_name(pid: u32) -> Option<String> {
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, 0, pid);
        if handle.is_null() {
            return None;
        }

        let mut name_buf: Vec<u16> = vec![0; 260];
        let len = GetModuleBaseNameW(
            handle,
            ptr::null_mut(),
            name_buf.as_mut_ptr(),
            name_buf.len() as u32,
        );
        CloseHandle(handle);

        if len == 0 {
            return None;
        }
        name_buf.truncate(len as usize);
        Some(OsString::from_wide(&name_buf).to_string_lossy().into_owned())
    }
}
