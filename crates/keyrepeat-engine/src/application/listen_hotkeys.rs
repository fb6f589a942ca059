//! HotkeyListener: owns the input hooks and publishes combo changes.
//!
//! # Threading
//!
//! ```text
//! hook thread (OS)  ──RawInputEvent──▶  listener thread  ──KeyCombo──▶  dispatcher task
//!   std::sync::mpsc                      PressedKeyTracker               tokio::sync::mpsc
//! ```
//!
//! The hook callbacks only copy the event into a channel, so they return to
//! the OS immediately.  A dedicated listener thread owns the
//! [`PressedKeyTracker`] and is the only writer of the pressed-key set.  It
//! forwards combos through an unbounded Tokio channel, which never blocks,
//! so slow macro execution can never stall hook processing.
//!
//! # Testability
//!
//! The OS side is hidden behind the [`InputSource`] trait.  Tests drive the
//! listener with `MockInputSource` from the infrastructure layer.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use keyrepeat_core::{KeyCode, KeyCombo};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, trace};

use super::track_keys::PressedKeyTracker;

/// A raw input event produced by the input capture infrastructure.
///
/// `injected` is `true` when the OS reports the event as synthesized or the
/// event carries this engine's injection marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    /// A key was pressed down (or auto-repeated).
    KeyDown { vk_code: u8, injected: bool },
    /// A key was released.
    KeyUp { vk_code: u8, injected: bool },
    /// A mouse button was pressed.  Releases are not reported.
    MouseButtonDown { button: MouseButton, injected: bool },
    /// The vertical wheel moved; positive is away from the user.
    MouseWheel { delta: i16, injected: bool },
}

impl RawInputEvent {
    pub fn is_injected(&self) -> bool {
        match *self {
            RawInputEvent::KeyDown { injected, .. }
            | RawInputEvent::KeyUp { injected, .. }
            | RawInputEvent::MouseButtonDown { injected, .. }
            | RawInputEvent::MouseWheel { injected, .. } => injected,
        }
    }
}

/// Mouse button identifier used in [`RawInputEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    /// The pseudo key code this button occupies in the shared code space.
    pub fn key_code(self) -> KeyCode {
        match self {
            MouseButton::Left => KeyCode::MOUSE_LEFT,
            MouseButton::Right => KeyCode::MOUSE_RIGHT,
            MouseButton::Middle => KeyCode::MOUSE_MIDDLE,
            MouseButton::X1 => KeyCode::x_button(1),
            MouseButton::X2 => KeyCode::x_button(2),
        }
    }
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to install keyboard hook: {0}")]
    KeyboardHookInstallFailed(String),
    #[error("failed to install mouse hook: {0}")]
    MouseHookInstallFailed(String),
    #[error("input hooks are already installed by another source")]
    AlreadyInstalled,
    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Startup failure of the hook layer.
pub type HookInstallError = CaptureError;

/// Trait abstracting raw input event production.
///
/// The production implementation uses Windows hooks; tests use `MockInputSource`.
pub trait InputSource: Send + Sync {
    /// Installs the keyboard and mouse hooks and returns a receiver for
    /// captured events.  If either hook fails, neither stays installed.
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError>;
    /// Uninstalls the hooks and closes the event channel.  Safe to call when
    /// not started.
    fn stop(&self);
}

/// Listens to an [`InputSource`] and emits the pressed-key combo on every
/// state change.
pub struct HotkeyListener {
    source: Arc<dyn InputSource>,
    pressed: Arc<RwLock<KeyCombo>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl HotkeyListener {
    pub fn new(source: Arc<dyn InputSource>) -> Self {
        Self {
            source,
            pressed: Arc::new(RwLock::new(KeyCombo::new())),
            worker: Mutex::new(None),
        }
    }

    /// Installs the hooks and starts forwarding combos to `sink`.
    ///
    /// Calling `start` while already running is a successful no-op and
    /// `sink` is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`HookInstallError`] if the hooks cannot be installed or the
    /// listener thread cannot be spawned.  Nothing stays installed on error.
    pub fn start(&self, sink: UnboundedSender<KeyCombo>) -> Result<(), HookInstallError> {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("listener already running; start ignored");
            return Ok(());
        }

        let events = self.source.start()?;
        let pressed = Arc::clone(&self.pressed);

        let spawned = thread::Builder::new()
            .name("keyrepeat-listener".to_string())
            .spawn(move || run_listener_loop(events, pressed, sink));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!("hotkey listener started");
                Ok(())
            }
            Err(e) => {
                self.source.stop();
                error!("failed to spawn listener thread: {e}");
                Err(CaptureError::ThreadSpawn(e.to_string()))
            }
        }
    }

    /// Uninstalls the hooks and waits for the listener thread to exit.
    ///
    /// Safe to call when not running.
    pub fn stop(&self) {
        let handle = self.worker.lock().take();
        self.source.stop();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("listener thread panicked");
            }
            info!("hotkey listener stopped");
        }
        *self.pressed.write() = KeyCombo::new();
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Returns a copy of the keys currently held, as seen by the listener.
    pub fn pressed_snapshot(&self) -> KeyCombo {
        self.pressed.read().clone()
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the listener thread.  Runs until the source closes its channel or
/// the combo receiver is dropped.
fn run_listener_loop(
    events: mpsc::Receiver<RawInputEvent>,
    pressed: Arc<RwLock<KeyCombo>>,
    sink: UnboundedSender<KeyCombo>,
) {
    let mut tracker = PressedKeyTracker::new();

    while let Ok(event) = events.recv() {
        let Some(combo) = tracker.apply(&event) else {
            continue;
        };
        trace!(combo = %combo, "combo changed");
        *pressed.write() = tracker.snapshot();
        if sink.send(combo).is_err() {
            debug!("combo receiver dropped; listener exiting");
            break;
        }
    }

    tracker.clear();
    debug!("listener loop finished");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::input_capture::mock::MockInputSource;
    use tokio::sync::mpsc::unbounded_channel;

    const RECV_TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_listener_forwards_combo_for_each_state_change() {
        // Arrange
        let source = Arc::new(MockInputSource::new());
        let listener = HotkeyListener::new(source.clone());
        let (tx, mut rx) = unbounded_channel();
        listener.start(tx).expect("start should succeed");

        // Act
        source.key_down(0xA2);
        source.key_down(0x41);
        source.key_down(0x41);
        source.key_up(0x41);

        // Assert
        let first = tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().unwrap();
        let second = tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().unwrap();
        let third = tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first, KeyCombo::single(KeyCode::LEFT_CTRL));
        assert_eq!(second, [KeyCode::LEFT_CTRL, KeyCode(0x41)].into());
        assert_eq!(third, KeyCombo::single(KeyCode::LEFT_CTRL));

        listener.stop();
    }

    #[tokio::test]
    async fn test_start_twice_is_a_no_op() {
        // Arrange
        let source = Arc::new(MockInputSource::new());
        let listener = HotkeyListener::new(source.clone());
        let (tx, _rx) = unbounded_channel();
        let (tx2, _rx2) = unbounded_channel();

        // Act
        listener.start(tx).expect("first start");
        listener.start(tx2).expect("second start");

        // Assert
        assert_eq!(source.start_count(), 1);
        assert!(listener.is_running());
        listener.stop();
    }

    #[test]
    fn test_stop_when_not_running_is_safe() {
        let source = Arc::new(MockInputSource::new());
        let listener = HotkeyListener::new(source);
        listener.stop();
        listener.stop();
        assert!(!listener.is_running());
    }

    #[test]
    fn test_start_failure_is_surfaced() {
        // Arrange
        let source = Arc::new(MockInputSource::failing());
        let listener = HotkeyListener::new(source);
        let (tx, _rx) = unbounded_channel();

        // Act
        let result = listener.start(tx);

        // Assert
        assert!(matches!(result, Err(CaptureError::KeyboardHookInstallFailed(_))));
        assert!(!listener.is_running());
    }

    #[tokio::test]
    async fn test_pressed_snapshot_reflects_held_keys() {
        // Arrange
        let source = Arc::new(MockInputSource::new());
        let listener = HotkeyListener::new(source.clone());
        let (tx, mut rx) = unbounded_channel();
        listener.start(tx).expect("start should succeed");

        // Act
        source.key_down(0x41);
        tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await.unwrap();

        // Assert
        assert_eq!(listener.pressed_snapshot(), KeyCombo::single(KeyCode(0x41)));
        listener.stop();
        assert!(listener.pressed_snapshot().is_empty());
    }

    #[test]
    fn test_mouse_button_key_codes() {
        assert_eq!(MouseButton::Left.key_code(), KeyCode::MOUSE_LEFT);
        assert_eq!(MouseButton::X2.key_code(), KeyCode::MOUSE_X2);
    }
}
