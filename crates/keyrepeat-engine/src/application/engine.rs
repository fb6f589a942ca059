//! Engine facade: wires the listener, dispatcher and execution strategies
//! together and owns their lifecycle.
//!
//! ```text
//! InputSource ─► HotkeyListener ─(KeyCombo)─► MacroDispatcher ─► strategies
//!                                                   │
//!                                                   └─► CaptureSession ─► UI
//! ```

use std::sync::Arc;
use std::time::Duration;

use keyrepeat_core::AppData;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::capture_combo::{CaptureSession, UiEvent};
use super::dispatch_macros::{FocusedWindowProvider, MacroDispatcher};
use super::execute_macro::{ExecutionContext, ExecutionSettings, InputInjector, KeyStateProbe};
use super::listen_hotkeys::{CaptureError, HotkeyListener, InputSource};
use super::registry::ExecutionRegistry;

/// Errors raised while starting the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start input capture: {0}")]
    Hook(#[from] CaptureError),
}

/// Engine-wide tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub execution: ExecutionSettings,
    /// Executable name of this program; macros never fire into it.
    pub own_process: String,
    /// Wait after stopping toggles on shutdown, for in-flight chords to finish.
    pub shutdown_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            execution: ExecutionSettings::default(),
            own_process: "keyrepeat.exe".to_string(),
            shutdown_grace: Duration::from_millis(100),
        }
    }
}

/// The OS-facing adapters the engine runs on.
pub struct EnginePorts {
    pub source: Arc<dyn InputSource>,
    pub injector: Arc<dyn InputInjector>,
    pub key_state: Arc<dyn KeyStateProbe>,
    pub windows: Arc<dyn FocusedWindowProvider>,
}

pub struct Engine {
    listener: HotkeyListener,
    dispatcher: Arc<MacroDispatcher>,
    capture: Arc<CaptureSession>,
    registry: Arc<ExecutionRegistry>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_grace: Duration,
}

impl Engine {
    pub fn new(ports: EnginePorts, data: AppData, settings: EngineSettings) -> Self {
        let registry = ExecutionRegistry::new();
        let capture = Arc::new(CaptureSession::new());
        let ctx = ExecutionContext {
            injector: ports.injector,
            key_state: ports.key_state,
            registry: Arc::clone(&registry),
            settings: settings.execution,
        };
        let dispatcher = Arc::new(MacroDispatcher::new(
            data,
            Arc::clone(&capture),
            ports.windows,
            ctx,
            settings.own_process,
        ));

        Self {
            listener: HotkeyListener::new(ports.source),
            dispatcher,
            capture,
            registry,
            dispatch_task: Mutex::new(None),
            shutdown_grace: settings.shutdown_grace,
        }
    }

    /// Installs the hooks and starts dispatching.  A second call while
    /// running is a no-op.  Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Hook`] if input capture cannot be started; the
    /// engine is left stopped.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut task = self.dispatch_task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("engine already running; start ignored");
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.listener.start(tx)?;
        *task = Some(tokio::spawn(Arc::clone(&self.dispatcher).run(rx)));

        let macros = self.dispatcher.snapshot().macros.len();
        info!(macros, "engine started");
        Ok(())
    }

    /// Uninstalls the hooks, waits for the dispatcher to drain, then stops
    /// every toggle loop and waits the grace period.
    ///
    /// Combos still queued when the hooks go away are dispatched before the
    /// toggles are stopped, so no toggle outlives shutdown.  Sequences and
    /// holds already running are left to finish on their own.
    pub async fn shutdown(&self) {
        self.listener.stop();
        self.capture.stop();

        let task = self.dispatch_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("dispatcher task failed: {e}");
            }
        }

        let stopped = self.registry.stop_all_toggles();
        if stopped > 0 {
            info!(toggles = stopped, "stopped running toggles");
        }
        tokio::time::sleep(self.shutdown_grace).await;
        info!("engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.listener.is_running()
    }

    /// The macro list currently used for matching.
    pub fn data(&self) -> Arc<AppData> {
        self.dispatcher.snapshot()
    }

    /// Replaces the macro list used for matching.
    pub fn replace_data(&self, data: AppData) {
        self.dispatcher.replace_data(data);
    }

    /// Executable name of the focused process; empty when unknown.
    pub fn focused_process(&self) -> String {
        self.dispatcher.focused_process()
    }

    pub fn capture(&self) -> &Arc<CaptureSession> {
        &self.capture
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.capture.subscribe()
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }
}
