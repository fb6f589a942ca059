//! Foreground window lookup through user32 and the process API.

#![cfg(target_os = "windows")]

use std::path::Path;

use keyrepeat_core::FocusedWindow;
use tracing::trace;
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, HWND};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
};

use crate::application::dispatch_macros::FocusedWindowProvider;

/// Reports the foreground window.  Any field whose query fails is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForegroundWindowProvider;

impl FocusedWindowProvider for ForegroundWindowProvider {
    fn focused_window(&self) -> FocusedWindow {
        // SAFETY: GetForegroundWindow has no preconditions; it may return a
        // null handle, which is checked below.
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_invalid() {
            trace!("no foreground window");
            return FocusedWindow::default();
        }

        FocusedWindow {
            process: process_name(hwnd).unwrap_or_default(),
            title: window_title(hwnd),
            class: window_class(hwnd),
        }
    }
}

/// Executable file name of the process owning `hwnd`, e.g. `notepad.exe`.
fn process_name(hwnd: HWND) -> Option<String> {
    let mut pid: u32 = 0;
    // SAFETY: `pid` outlives the call; an invalid hwnd leaves it at 0.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    if pid == 0 {
        return None;
    }

    // SAFETY: querying limited information needs no handle from us; a
    // failed open is reported through the Result.
    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }.ok()?;
    if handle.is_invalid() {
        return None;
    }

    let mut buffer = vec![0u16; 1024];
    let mut size = buffer.len() as u32;
    // SAFETY: `buffer` holds `size` u16 slots and stays alive for the call;
    // the handle is open until CloseHandle below.
    let queried = unsafe {
        QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut size,
        )
    }
    .is_ok();
    // SAFETY: the handle was opened above and is closed exactly once.
    let _ = unsafe { CloseHandle(handle) };
    if !queried {
        return None;
    }

    let full_path = String::from_utf16_lossy(&buffer[..size as usize]);
    Path::new(&full_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn window_title(hwnd: HWND) -> String {
    let mut buffer = vec![0u16; 512];
    // SAFETY: the buffer is a valid writable slice for the call.
    let len = unsafe { GetWindowTextW(hwnd, &mut buffer) };
    utf16_prefix(&buffer, len)
}

fn window_class(hwnd: HWND) -> String {
    let mut buffer = vec![0u16; 256];
    // SAFETY: the buffer is a valid writable slice for the call.
    let len = unsafe { GetClassNameW(hwnd, &mut buffer) };
    utf16_prefix(&buffer, len)
}

fn utf16_prefix(buffer: &[u16], len: i32) -> String {
    match usize::try_from(len) {
        Ok(len) if len > 0 => String::from_utf16_lossy(&buffer[..len.min(buffer.len())]),
        _ => String::new(),
    }
}
