//! Mock input source for unit and integration testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without requiring
//! a running Windows message loop or OS hooks.  `MockInjector` can also be
//! wired to a `MockInputSource` so synthesized chords come back as injected
//! events, the way the real hooks would see them.

use std::sync::mpsc::{self, Sender};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::application::listen_hotkeys::{
    CaptureError, InputSource, MouseButton, RawInputEvent,
};

/// A mock implementation of [`InputSource`] that lets tests inject events.
#[derive(Default)]
pub struct MockInputSource {
    sender: Mutex<Option<Sender<RawInputEvent>>>,
    start_count: AtomicU32,
    fail_start: bool,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source whose `start` fails as if the keyboard hook could not
    /// be installed.
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    /// Injects an event as if captured from the OS.
    ///
    /// Returns `false` when the source is not started or the receiver is gone.
    pub fn inject_event(&self, event: RawInputEvent) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Simulates a physical key press.
    pub fn key_down(&self, vk_code: u8) -> bool {
        self.inject_event(RawInputEvent::KeyDown { vk_code, injected: false })
    }

    /// Simulates a physical key release.
    pub fn key_up(&self, vk_code: u8) -> bool {
        self.inject_event(RawInputEvent::KeyUp { vk_code, injected: false })
    }

    /// Simulates a physical mouse button press.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.inject_event(RawInputEvent::MouseButtonDown { button, injected: false })
    }

    /// Number of times `start` has succeeded.
    pub fn start_count(&self) -> u32 {
        self.start_count.load(Ordering::SeqCst)
    }

    /// `true` between a successful `start` and the next `stop`.
    pub fn is_started(&self) -> bool {
        self.sender.lock().is_some()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        if self.fail_start {
            return Err(CaptureError::KeyboardHookInstallFailed(
                "mock hook failure".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel();
        *self.sender.lock() = Some(tx);
        self.start_count.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.sender.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_input_source_starts_and_receives_events() {
        // Arrange
        let source = MockInputSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.key_down(0x41);

        // Assert
        let event = rx.recv().expect("should receive event");
        assert_eq!(event, RawInputEvent::KeyDown { vk_code: 0x41, injected: false });
    }

    #[test]
    fn test_mock_input_source_stop_closes_channel() {
        // Arrange
        let source = MockInputSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert
        assert!(rx.recv().is_err(), "channel should be closed after stop()");
        assert!(!source.is_started());
    }

    #[test]
    fn test_inject_before_start_reports_not_delivered() {
        let source = MockInputSource::new();
        assert!(!source.key_down(0x41));
    }

    #[test]
    fn test_failing_source_does_not_start() {
        let source = MockInputSource::failing();
        assert!(source.start().is_err());
        assert_eq!(source.start_count(), 0);
    }

    #[test]
    fn test_mock_input_source_delivers_mouse_events_in_order() {
        // Arrange
        let source = MockInputSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.mouse_down(MouseButton::Left);
        source.inject_event(RawInputEvent::MouseWheel { delta: 120, injected: false });

        // Assert
        assert!(matches!(
            rx.recv().unwrap(),
            RawInputEvent::MouseButtonDown { button: MouseButton::Left, .. }
        ));
        assert!(matches!(rx.recv().unwrap(), RawInputEvent::MouseWheel { delta: 120, .. }));
    }
}
