//! Recording injector for unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use keyrepeat_core::KeyCode;
use parking_lot::Mutex;

use crate::application::execute_macro::{InjectionError, InputInjector};
use crate::application::listen_hotkeys::{MouseButton, RawInputEvent};
use crate::infrastructure::input_capture::mock::MockInputSource;

/// Records every chord it is asked to press.
///
/// With [`MockInjector::looped_back`] each chord is also replayed into a
/// [`MockInputSource`] as injected events, the way the OS hooks would report
/// the output of `SendInput`.
#[derive(Default)]
pub struct MockInjector {
    chords: Mutex<Vec<Vec<KeyCode>>>,
    attempts: AtomicUsize,
    fail: bool,
    loopback: Option<Arc<MockInputSource>>,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An injector whose every call fails.  Attempts are still counted.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// An injector that echoes chords into `source` as injected events.
    pub fn looped_back(source: Arc<MockInputSource>) -> Self {
        Self {
            loopback: Some(source),
            ..Self::default()
        }
    }

    /// Chords pressed successfully, in order.
    pub fn chords(&self) -> Vec<Vec<KeyCode>> {
        self.chords.lock().clone()
    }

    /// Number of `press_chord` calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn echo(&self, source: &MockInputSource, keys: &[KeyCode]) {
        for &key in keys {
            let event = match (key.as_vk(), mouse_button(key)) {
                (Some(vk_code), _) => RawInputEvent::KeyDown { vk_code, injected: true },
                (None, Some(button)) => RawInputEvent::MouseButtonDown { button, injected: true },
                (None, None) => continue,
            };
            source.inject_event(event);
        }
        for &key in keys.iter().rev() {
            if let Some(vk_code) = key.as_vk() {
                source.inject_event(RawInputEvent::KeyUp { vk_code, injected: true });
            }
        }
    }
}

impl InputInjector for MockInjector {
    fn press_chord(&self, keys: &[KeyCode]) -> Result<(), InjectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InjectionError::Platform("mock injection failure".to_string()));
        }
        self.chords.lock().push(keys.to_vec());
        if let Some(source) = &self.loopback {
            self.echo(source, keys);
        }
        Ok(())
    }
}

fn mouse_button(key: KeyCode) -> Option<MouseButton> {
    [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::X1,
        MouseButton::X2,
    ]
    .into_iter()
    .find(|button| button.key_code() == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::listen_hotkeys::InputSource;

    #[test]
    fn test_records_chords_in_order() {
        // Arrange
        let injector = MockInjector::new();

        // Act
        injector.press_chord(&[KeyCode::LEFT_CTRL, KeyCode(0x43)]).expect("press");
        injector.press_chord(&[KeyCode::SPACE]).expect("press");

        // Assert
        assert_eq!(
            injector.chords(),
            vec![vec![KeyCode::LEFT_CTRL, KeyCode(0x43)], vec![KeyCode::SPACE]]
        );
        assert_eq!(injector.attempts(), 2);
    }

    #[test]
    fn test_failing_injector_counts_attempts_only() {
        let injector = MockInjector::failing();
        assert!(injector.press_chord(&[KeyCode::SPACE]).is_err());
        assert_eq!(injector.attempts(), 1);
        assert!(injector.chords().is_empty());
    }

    #[test]
    fn test_loopback_releases_in_reverse_order() {
        // Arrange
        let source = Arc::new(MockInputSource::new());
        let rx = source.start().expect("start");
        let injector = MockInjector::looped_back(Arc::clone(&source));

        // Act
        injector
            .press_chord(&[KeyCode::LEFT_SHIFT, KeyCode(0x58)])
            .expect("press");

        // Assert
        let events: Vec<RawInputEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RawInputEvent::KeyDown { vk_code: 0xA0, injected: true },
                RawInputEvent::KeyDown { vk_code: 0x58, injected: true },
                RawInputEvent::KeyUp { vk_code: 0x58, injected: true },
                RawInputEvent::KeyUp { vk_code: 0xA0, injected: true },
            ]
        );
    }

    #[test]
    fn test_loopback_reports_mouse_buttons_as_injected() {
        let source = Arc::new(MockInputSource::new());
        let rx = source.start().expect("start");
        let injector = MockInjector::looped_back(Arc::clone(&source));

        injector.press_chord(&[KeyCode::MOUSE_LEFT]).expect("press");

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![RawInputEvent::MouseButtonDown { button: MouseButton::Left, injected: true }]
        );
    }
}
