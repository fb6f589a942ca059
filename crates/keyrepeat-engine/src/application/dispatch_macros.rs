//! MacroDispatcher: matches combos against macros and starts executions.
//!
//! The dispatcher is the single consumer of the listener's combo channel, so
//! combos are handled strictly in event order.  For each combo it:
//!
//! 1. hands the combo to capture mode, and stops there if capture is active;
//! 2. reads the current [`AppData`] snapshot;
//! 3. for every enabled macro whose activation keys equal the combo (set
//!    equality), checks the window scope against the focused window;
//! 4. starts the macro with the strategy selected by its kind.
//!
//! Matching never waits on execution: strategies spawn their own tasks.

use std::sync::Arc;

use keyrepeat_core::{scope_allows, AppData, FocusedWindow, KeyCombo};
use parking_lot::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use super::capture_combo::CaptureSession;
use super::execute_macro::{strategy_for, ExecutionContext};

/// Reports the window that currently has keyboard focus.
#[cfg_attr(test, mockall::automock)]
pub trait FocusedWindowProvider: Send + Sync {
    /// Returns the focused window; fields are empty when unknown.
    fn focused_window(&self) -> FocusedWindow;

    /// Executable name of the focused process; empty when unknown.
    fn focused_process(&self) -> String {
        self.focused_window().process
    }
}

/// Routes combos to macro executions.
pub struct MacroDispatcher {
    data: RwLock<Arc<AppData>>,
    capture: Arc<CaptureSession>,
    windows: Arc<dyn FocusedWindowProvider>,
    ctx: ExecutionContext,
    own_process: String,
}

impl MacroDispatcher {
    pub fn new(
        data: AppData,
        capture: Arc<CaptureSession>,
        windows: Arc<dyn FocusedWindowProvider>,
        ctx: ExecutionContext,
        own_process: impl Into<String>,
    ) -> Self {
        Self {
            data: RwLock::new(Arc::new(data)),
            capture,
            windows,
            ctx,
            own_process: own_process.into(),
        }
    }

    /// The macro list currently used for matching.
    pub fn snapshot(&self) -> Arc<AppData> {
        Arc::clone(&self.data.read())
    }

    /// Atomically replaces the macro list.  Combos handled after this call
    /// see the new list; executions already running are not affected.
    pub fn replace_data(&self, data: AppData) {
        let count = data.macros.len();
        *self.data.write() = Arc::new(data);
        info!(macros = count, "macro list replaced");
    }

    /// Executable name of the focused process; empty when unknown.
    pub fn focused_process(&self) -> String {
        self.windows.focused_process()
    }

    /// Handles one combo and returns how many macros were started.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn handle_combo(&self, combo: &KeyCombo) -> usize {
        if self.capture.offer(combo) || combo.is_empty() {
            return 0;
        }

        let data = self.snapshot();
        let mut focused: Option<FocusedWindow> = None;
        let mut started = 0;

        for macro_def in data.matching(combo) {
            let window = focused.get_or_insert_with(|| self.windows.focused_window());
            if !scope_allows(window, &self.own_process, &macro_def.include_title) {
                debug!(
                    macro_id = %macro_def.id,
                    process = %window.process,
                    "macro skipped: focused window out of scope"
                );
                continue;
            }

            debug!(macro_id = %macro_def.id, kind = %macro_def.kind, combo = %combo, "macro matched");
            strategy_for(macro_def.kind).trigger(&self.ctx, Arc::new(macro_def.clone()));
            started += 1;
        }
        started
    }

    /// Consumes combos until the channel closes.
    pub async fn run(self: Arc<Self>, mut combos: UnboundedReceiver<KeyCombo>) {
        while let Some(combo) = combos.recv().await {
            self.handle_combo(&combo);
        }
        debug!("combo channel closed; dispatcher exiting");
    }
}
