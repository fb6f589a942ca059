//! Windows low-level keyboard and mouse hook implementation.
//!
//! This module installs WH_KEYBOARD_LL and WH_MOUSE_LL hooks using the
//! Windows API.  Both hooks share a dedicated Win32 message-loop thread.
//! `stop` posts `WM_QUIT` to that thread, which unhooks both and exits.
//!
//! Events synthesized by this engine are tagged twice: Windows sets the
//! `*_INJECTED` flag on anything produced by `SendInput`, and the injector
//! stamps [`INJECTION_MARKER`] into `dwExtraInfo`.  Either one marks the
//! event as injected.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::mpsc::{self, Sender};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS,
    LLKHF_INJECTED, MSG, MSLLHOOKSTRUCT, PM_NOREMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN,
    WM_KEYUP, WM_LBUTTONDOWN, WM_MBUTTONDOWN, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN,
    WM_SYSKEYDOWN, WM_SYSKEYUP, WM_XBUTTONDOWN, XBUTTON1,
};

use crate::application::listen_hotkeys::{
    CaptureError, InputSource, MouseButton, RawInputEvent,
};
use crate::infrastructure::input_injection::INJECTION_MARKER;

/// `LLMHF_INJECTED` from `MSLLHOOKSTRUCT::flags`.
const LLMHF_INJECTED: u32 = 0x0000_0001;

/// Sender used by hook callbacks to deliver events to the listener thread.
///
/// Cleared on `stop`, which closes the channel and lets the listener exit.
static EVENT_SENDER: Mutex<Option<Sender<RawInputEvent>>> = parking_lot::const_mutex(None);

/// Running hook thread: its Win32 thread id (for `PostThreadMessageW`) and
/// join handle.
struct HookThread {
    thread_id: u32,
    handle: thread::JoinHandle<()>,
}

/// Windows low-level input capture service.
///
/// Only one instance can hold the hooks at a time because the callbacks reach
/// the channel through a process-wide static.
#[derive(Default)]
pub struct WindowsInputSource {
    hook_thread: Mutex<Option<HookThread>>,
}

impl WindowsInputSource {
    /// Creates a new (unstarted) source.
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for WindowsInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        let mut hook_thread = self.hook_thread.lock();
        if hook_thread.is_some() {
            return Err(CaptureError::AlreadyInstalled);
        }

        let (tx, rx) = mpsc::channel::<RawInputEvent>();
        {
            let mut sender = EVENT_SENDER.lock();
            if sender.is_some() {
                return Err(CaptureError::AlreadyInstalled);
            }
            *sender = Some(tx);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, CaptureError>>();
        let handle = match thread::Builder::new()
            .name("keyrepeat-hooks".to_string())
            .spawn(move || run_hook_message_loop(ready_tx))
        {
            Ok(handle) => handle,
            Err(e) => {
                EVENT_SENDER.lock().take();
                return Err(CaptureError::ThreadSpawn(e.to_string()));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                debug!(thread_id, "low-level hooks installed");
                *hook_thread = Some(HookThread { thread_id, handle });
                Ok(rx)
            }
            Ok(Err(e)) => {
                EVENT_SENDER.lock().take();
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                EVENT_SENDER.lock().take();
                let _ = handle.join();
                Err(CaptureError::KeyboardHookInstallFailed(
                    "hook thread exited before reporting".to_string(),
                ))
            }
        }
    }

    fn stop(&self) {
        if let Some(HookThread { thread_id, handle }) = self.hook_thread.lock().take() {
            // SAFETY: posting WM_QUIT to a thread id we created is always valid;
            // failure only means the thread already exited.
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                warn!("failed to post WM_QUIT to hook thread: {e}");
            }
            if handle.join().is_err() {
                error!("hook thread panicked");
            }
        }
        // Dropping the sender closes the listener's channel.
        EVENT_SENDER.lock().take();
    }
}

impl Drop for WindowsInputSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Entry point for the dedicated Win32 message loop thread.
///
/// Reports the thread id on `ready` once both hooks are installed, or the
/// error if either fails.  A keyboard hook is removed again when the mouse
/// hook cannot be installed.
fn run_hook_message_loop(ready: Sender<Result<u32, CaptureError>>) {
    let mut msg = MSG::default();

    // SAFETY: forces creation of this thread's message queue so that a
    // WM_QUIT posted right after start is not lost.
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }
    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };

    // SAFETY: SetWindowsHookExW requires the calling thread to pump messages,
    // which it does below.
    let kbd_hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) } {
        Ok(hook) => hook,
        Err(e) => {
            let _ = ready.send(Err(CaptureError::KeyboardHookInstallFailed(e.to_string())));
            return;
        }
    };
    // SAFETY: as above.
    let mouse_hook = match unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0) } {
        Ok(hook) => hook,
        Err(e) => {
            // SAFETY: kbd_hook was returned by SetWindowsHookExW above.
            unsafe {
                let _ = UnhookWindowsHookEx(kbd_hook);
            }
            let _ = ready.send(Err(CaptureError::MouseHookInstallFailed(e.to_string())));
            return;
        }
    };

    let _ = ready.send(Ok(thread_id));

    // Win32 message loop; blocks until WM_QUIT is posted by `stop`.
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        let _ = UnhookWindowsHookEx(kbd_hook);
        let _ = UnhookWindowsHookEx(mouse_hook);
    }
    debug!("low-level hooks removed");
}

fn deliver(event: RawInputEvent) {
    if let Some(sender) = EVENT_SENDER.lock().as_ref() {
        // Ignore send errors (listener gone during shutdown).
        let _ = sender.send(event);
    }
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread.  It must return
/// quickly (< ~300ms) to avoid hook removal by the OS.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
    let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);

    let vk_code = kbs.vkCode as u8;
    let injected = (kbs.flags & LLKHF_INJECTED) != KBDLLHOOKSTRUCT_FLAGS(0)
        || kbs.dwExtraInfo == INJECTION_MARKER;

    let event = match w_param.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(RawInputEvent::KeyDown { vk_code, injected }),
        WM_KEYUP | WM_SYSKEYUP => Some(RawInputEvent::KeyUp { vk_code, injected }),
        _ => None,
    };
    if let Some(event) = event {
        deliver(event);
    }

    // SAFETY: Forward the event to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}

/// Low-level mouse hook callback.
///
/// Only button-down and vertical wheel messages are forwarded; moves and
/// releases never form combos.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread; must return quickly.
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code != HC_ACTION as i32 {
        // SAFETY: Must call CallNextHookEx when n_code < 0.
        return CallNextHookEx(None, n_code, w_param, l_param);
    }

    // SAFETY: l_param points to a MSLLHOOKSTRUCT when n_code == HC_ACTION.
    let mhs = &*(l_param.0 as *const MSLLHOOKSTRUCT);
    let injected = (mhs.flags & LLMHF_INJECTED) != 0 || mhs.dwExtraInfo == INJECTION_MARKER;
    let high_word = (mhs.mouseData >> 16) as u16;

    let button = |button| Some(RawInputEvent::MouseButtonDown { button, injected });
    let event = match w_param.0 as u32 {
        WM_LBUTTONDOWN => button(MouseButton::Left),
        WM_RBUTTONDOWN => button(MouseButton::Right),
        WM_MBUTTONDOWN => button(MouseButton::Middle),
        WM_XBUTTONDOWN if high_word == XBUTTON1 => button(MouseButton::X1),
        WM_XBUTTONDOWN => button(MouseButton::X2),
        WM_MOUSEWHEEL => Some(RawInputEvent::MouseWheel {
            delta: high_word as i16,
            injected,
        }),
        _ => None,
    };
    if let Some(event) = event {
        deliver(event);
    }

    // SAFETY: Forward to the next hook in the chain.
    CallNextHookEx(None, n_code, w_param, l_param)
}
