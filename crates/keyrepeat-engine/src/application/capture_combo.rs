//! Capture mode: lets the editor record an activation combo.
//!
//! While capture mode is active the dispatcher hands every combo to the
//! [`CaptureSession`] instead of matching macros.  The session filters out the
//! noise of a chord being released key by key and publishes the remaining
//! combos as [`UiEvent::ComboCaptured`] on a broadcast channel.

use std::sync::atomic::{AtomicBool, Ordering};

use keyrepeat_core::KeyCombo;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

/// Capacity of the UI event channel; slow subscribers lose the oldest events.
const UI_EVENT_CAPACITY: usize = 64;

/// Events pushed to UI subscribers.
///
/// Serialized as `{"event": "combo_captured", "payload": [162, 65]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum UiEvent {
    ComboCaptured(KeyCombo),
}

/// Decides which combos seen during capture are worth reporting.
#[derive(Debug, Default)]
pub struct CaptureFilter {
    last: KeyCombo,
}

impl CaptureFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the combo to report, if any.
    ///
    /// - An empty combo (everything released) resets the filter.
    /// - A combo with fewer keys than the last reported one is ignored.
    /// - A combo equal to the last reported one is ignored.
    /// - Anything else becomes the new last combo and is reported.
    pub fn offer(&mut self, combo: &KeyCombo) -> Option<KeyCombo> {
        if combo.is_empty() {
            self.reset();
            return None;
        }
        if combo.len() < self.last.len() || *combo == self.last {
            return None;
        }
        self.last = combo.clone();
        Some(combo.clone())
    }

    pub fn reset(&mut self) {
        self.last = KeyCombo::new();
    }
}

/// Capture-mode switch, filter, and UI event publisher.
pub struct CaptureSession {
    active: AtomicBool,
    filter: Mutex<CaptureFilter>,
    events: broadcast::Sender<UiEvent>,
}

impl CaptureSession {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(UI_EVENT_CAPACITY);
        Self {
            active: AtomicBool::new(false),
            filter: Mutex::new(CaptureFilter::new()),
            events,
        }
    }

    /// Enters capture mode.  No macro fires until [`Self::stop`].
    pub fn start(&self) {
        self.filter.lock().reset();
        if !self.active.swap(true, Ordering::SeqCst) {
            info!("capture mode started");
        }
    }

    /// Leaves capture mode and clears the filter.
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("capture mode stopped");
        }
        self.filter.lock().reset();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Subscribes to UI events.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Offers a combo to capture mode.
    ///
    /// Returns `true` if capture mode is active and the combo was consumed,
    /// in which case the caller must not match it against macros.
    pub fn offer(&self, combo: &KeyCombo) -> bool {
        if !self.is_active() {
            return false;
        }
        let captured = self.filter.lock().offer(combo);
        if let Some(combo) = captured {
            debug!(combo = %combo, "combo captured");
            if self.events.send(UiEvent::ComboCaptured(combo)).is_err() {
                trace!("no UI subscribers for captured combo");
            }
        }
        true
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}
