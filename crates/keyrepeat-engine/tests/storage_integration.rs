//! Integration tests for config and macro file handling as the binary uses
//! them: config first, then the macro file it points at.

use std::path::PathBuf;

use keyrepeat_core::{AppData, KeyCode, KeyCombo, Macro, MacroAction, MacroKind};
use keyrepeat_engine::infrastructure::storage::config::{load_config_from, save_config_to, EngineConfig};
use keyrepeat_engine::infrastructure::storage::macros::{read_macros, write_macros};
use uuid::Uuid;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("keyrepeat_it_{}", Uuid::new_v4()))
}

#[test]
fn test_first_run_has_default_config_and_no_macros() {
    // Arrange
    let dir = temp_dir();

    // Act
    let config = load_config_from(&dir.join("config.toml")).expect("config");
    let data = read_macros(&config.data_path(&dir)).expect("macros");

    // Assert
    assert_eq!(config, EngineConfig::default());
    assert!(data.macros.is_empty());
}

#[test]
fn test_configured_data_file_is_used_for_macros() {
    // Arrange
    let dir = temp_dir();
    let mut config = EngineConfig::default();
    config.storage.data_file = PathBuf::from("profiles").join("games.json");
    save_config_to(&dir.join("config.toml"), &config).expect("save config");

    let data = AppData::new(vec![
        Macro::new(
            "burst",
            KeyCombo::single(KeyCode::F1),
            MacroKind::Toggle,
            vec![MacroAction::new(vec![KeyCode::MOUSE_LEFT], 25)],
        ),
        Macro::new(
            "run",
            [KeyCode::LEFT_SHIFT, KeyCode(0x57)].into(),
            MacroKind::Hold,
            vec![MacroAction::new(vec![KeyCode(0x57)], 15)],
        ),
    ]);

    // Act
    let loaded_config = load_config_from(&dir.join("config.toml")).expect("load config");
    let data_path = loaded_config.data_path(&dir);
    write_macros(&data_path, &data).expect("write macros");
    let restored = read_macros(&data_path).expect("read macros");

    // Assert
    assert_eq!(data_path, dir.join("profiles").join("games.json"));
    assert_eq!(restored, data);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_editor_document_with_extra_fields_loads() {
    // Arrange
    let dir = temp_dir();
    let path = dir.join("data.json");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(
        &path,
        r##"{
  "version": 3,
  "macros": [
    {
      "id": "7f0c",
      "name": "Spam F",
      "activation_keys": [162, 65],
      "type": 0,
      "actions": [{ "id": "a1", "keys": [70], "delay": 50, "note": "ignored" }],
      "include_title": ["notepad.exe"],
      "color": "#ff0000"
    }
  ]
}"##,
    )
    .expect("write");

    // Act
    let data = read_macros(&path).expect("read");

    // Assert
    assert_eq!(data.macros.len(), 1);
    let m = &data.macros[0];
    assert_eq!(m.kind, MacroKind::Sequence);
    assert!(!m.disabled);
    assert_eq!(m.activation_keys, [KeyCode::LEFT_CTRL, KeyCode(0x41)].into());
    std::fs::remove_dir_all(&dir).ok();
}
