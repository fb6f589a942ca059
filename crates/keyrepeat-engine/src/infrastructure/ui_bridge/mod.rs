//! Command bridge: the operations the editor UI invokes on the engine.
//!
//! Every command is a free async function taking the shared [`AppState`] and
//! returning a [`CommandResult`], so each response has the same JSON shape:
//! `{ success: bool, data: T | null, error: string | null }`.
//!
//! Capture-mode events are not returned by commands; the UI follows them
//! through [`subscribe_events`], which yields serialized [`UiEvent`]s such as
//! `{"event":"combo_captured","payload":[65,162]}`.

use std::path::PathBuf;
use std::sync::Arc;

use keyrepeat_core::{AppData, KeyCode, KeyCombo};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::application::capture_combo::UiEvent;
use crate::application::engine::Engine;
use crate::infrastructure::storage::macros::write_macros;

// ── Shared application state ──────────────────────────────────────────────────

/// State shared between command handlers.
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Where `update_data` persists the macro list.
    pub data_path: PathBuf,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, data_path: PathBuf) -> Arc<Self> {
        Arc::new(Self { engine, data_path })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// A combo with its human-readable rendering, for the editor's key fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboDto {
    pub keys: Vec<u32>,
    pub display: String,
}

impl From<&KeyCombo> for ComboDto {
    fn from(combo: &KeyCombo) -> Self {
        Self {
            keys: combo.iter().map(|k| k.0).collect(),
            display: combo.display(),
        }
    }
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the macro list currently in use.
pub async fn get_data(state: Arc<AppState>) -> CommandResult<AppData> {
    CommandResult::ok(state.engine.data().as_ref().clone())
}

/// Replaces the macro list and persists it.
///
/// The new list takes effect immediately.  If writing the file fails the
/// in-memory list stays in use, the failure is logged, and the error is
/// returned so the UI can tell the user.
pub async fn update_data(state: Arc<AppState>, data: AppData) -> CommandResult<()> {
    state.engine.replace_data(data.clone());

    let path = state.data_path.clone();
    let written = tokio::task::spawn_blocking(move || write_macros(&path, &data)).await;
    match written {
        Ok(Ok(())) => CommandResult::ok(()),
        Ok(Err(e)) => {
            error!("failed to persist macros: {e}");
            CommandResult::err(format!("macros updated but not saved: {e}"))
        }
        Err(e) => {
            error!("macro writer task failed: {e}");
            CommandResult::err(format!("macros updated but not saved: {e}"))
        }
    }
}

/// Enters capture mode.  No macro fires until `stop_capture`.
pub async fn start_capture(state: Arc<AppState>) -> CommandResult<()> {
    state.engine.capture().start();
    CommandResult::ok(())
}

pub async fn stop_capture(state: Arc<AppState>) -> CommandResult<()> {
    state.engine.capture().stop();
    CommandResult::ok(())
}

/// Executable name of the focused process, for the editor's window picker.
/// Empty when unknown.
pub async fn get_focused_process(state: Arc<AppState>) -> CommandResult<String> {
    CommandResult::ok(state.engine.focused_process())
}

/// Renders raw key codes the way the editor displays them.
pub async fn describe_combo(keys: Vec<u32>) -> CommandResult<ComboDto> {
    let combo: KeyCombo = keys.into_iter().map(KeyCode).collect();
    CommandResult::ok(ComboDto::from(&combo))
}

/// Forwards UI events as JSON strings until the receiver of the returned
/// channel is dropped.
pub fn subscribe_events(state: &AppState) -> tokio::sync::mpsc::UnboundedReceiver<String> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let mut events = state.engine.subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(json) = event_json(&event) {
                        if tx.send(json).is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    info!(skipped, "UI subscriber lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    rx
}

fn event_json(event: &UiEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("failed to serialize UI event: {e}");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::{EnginePorts, EngineSettings};
    use crate::infrastructure::input_capture::mock::MockInputSource;
    use crate::infrastructure::input_injection::mock::MockInjector;
    use crate::infrastructure::key_state::mock::MockKeyState;
    use crate::infrastructure::storage::macros::read_macros;
    use crate::application::dispatch_macros::FocusedWindowProvider;
    use crate::infrastructure::window_info::UnknownWindowProvider;
    use keyrepeat_core::{FocusedWindow, Macro, MacroAction, MacroKind};
    use uuid::Uuid;

    struct NotepadWindow;

    impl FocusedWindowProvider for NotepadWindow {
        fn focused_window(&self) -> FocusedWindow {
            FocusedWindow::from_process("notepad.exe")
        }
    }

    fn make_state(data_path: PathBuf) -> Arc<AppState> {
        make_state_with_windows(data_path, Arc::new(UnknownWindowProvider))
    }

    fn make_state_with_windows(
        data_path: PathBuf,
        windows: Arc<dyn FocusedWindowProvider>,
    ) -> Arc<AppState> {
        let ports = EnginePorts {
            source: Arc::new(MockInputSource::new()),
            injector: Arc::new(MockInjector::new()),
            key_state: Arc::new(MockKeyState::new()),
            windows,
        };
        let engine = Engine::new(ports, AppData::default(), EngineSettings::default());
        AppState::new(Arc::new(engine), data_path)
    }

    fn temp_data_path() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("keyrepeat_ui_{}", Uuid::new_v4()));
        let file = dir.join("data.json");
        (dir, file)
    }

    fn one_macro() -> AppData {
        AppData::new(vec![Macro::new(
            "type x",
            KeyCombo::single(KeyCode::F1),
            MacroKind::Sequence,
            vec![MacroAction::new(vec![KeyCode(0x58)], 0)],
        )])
    }

    #[tokio::test]
    async fn test_get_data_is_empty_initially() {
        // Arrange
        let (_, file) = temp_data_path();
        let state = make_state(file);

        // Act
        let result = get_data(state).await;

        // Assert
        assert!(result.success);
        assert!(result.data.expect("data").macros.is_empty());
    }

    #[tokio::test]
    async fn test_update_data_swaps_and_persists() {
        // Arrange
        let (dir, file) = temp_data_path();
        let state = make_state(file.clone());
        let data = one_macro();

        // Act
        let result = update_data(Arc::clone(&state), data.clone()).await;

        // Assert
        assert!(result.success, "unexpected error: {:?}", result.error);
        assert_eq!(*state.engine.data(), data);
        assert_eq!(read_macros(&file).expect("read back"), data);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_update_data_keeps_memory_copy_when_write_fails() {
        // Arrange: the data path is an existing directory, so the write fails.
        let (dir, _) = temp_data_path();
        std::fs::create_dir_all(&dir).expect("mkdir");
        let state = make_state(dir.clone());

        // Act
        let result = update_data(Arc::clone(&state), one_macro()).await;

        // Assert
        assert!(!result.success);
        assert_eq!(state.engine.data().macros.len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_capture_commands_toggle_capture_mode() {
        let (_, file) = temp_data_path();
        let state = make_state(file);

        assert!(start_capture(Arc::clone(&state)).await.success);
        assert!(state.engine.capture().is_active());
        assert!(stop_capture(Arc::clone(&state)).await.success);
        assert!(!state.engine.capture().is_active());
    }

    #[tokio::test]
    async fn test_subscribed_ui_receives_captured_combo_json() {
        // Arrange
        let (_, file) = temp_data_path();
        let state = make_state(file);
        let mut events = subscribe_events(&state);
        state.engine.capture().start();

        // Act
        state.engine.capture().offer(&[KeyCode::LEFT_CTRL, KeyCode(0x41)].into());

        // Assert
        let json = events.recv().await.expect("event");
        assert_eq!(json, r#"{"event":"combo_captured","payload":[65,162]}"#);
    }

    #[tokio::test]
    async fn test_get_focused_process_reports_provider_process() {
        // Arrange
        let (_, file) = temp_data_path();
        let state = make_state_with_windows(file, Arc::new(NotepadWindow));

        // Act
        let result = get_focused_process(state).await;

        // Assert
        assert_eq!(result.data.as_deref(), Some("notepad.exe"));
    }

    #[tokio::test]
    async fn test_get_focused_process_is_empty_when_unknown() {
        let (_, file) = temp_data_path();
        let state = make_state(file);

        let result = get_focused_process(state).await;

        assert!(result.success);
        assert_eq!(result.data.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_describe_combo_renders_modifiers_first() {
        let result = describe_combo(vec![0x41, 0xA2]).await;
        let dto = result.data.expect("dto");
        assert_eq!(dto.keys, vec![0x41, 0xA2]);
        assert!(dto.display.starts_with("CTRL"), "got {}", dto.display);
    }

    #[test]
    fn test_command_result_err_shape() {
        let result: CommandResult<()> = CommandResult::err("boom");
        let json = serde_json::to_string(&result).expect("serialize");
        assert_eq!(json, r#"{"success":false,"data":null,"error":"boom"}"#);
    }
}
