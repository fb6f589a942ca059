//! Macro definitions and the persisted `AppData` aggregate.
//!
//! The JSON shape is shared with the editor:
//!
//! ```json
//! { "macros": [ {
//!     "id": "9b0d…", "name": "Spam F", "disabled": false,
//!     "activation_keys": [162, 65],
//!     "type": 0,
//!     "actions": [ { "id": "a1", "keys": [88], "delay": 50 } ],
//!     "include_title": ["notepad.exe"]
//! } ] }
//! ```
//!
//! Unknown fields are ignored on read, and every field added after the first
//! release carries a `#[serde(default)]` so older files keep loading.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::combo::KeyCombo;
use crate::keymap::KeyCode;

/// Stable unique identifier of a macro.
///
/// The editor stores it as a string; fresh ids are UUID v4.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroId(String);

impl MacroId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MacroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacroId({})", self.0)
    }
}

impl fmt::Display for MacroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MacroId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Error returned when a persisted macro type tag is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown macro type tag {0}")]
pub struct UnknownMacroKind(pub u8);

/// How a macro behaves once its activation combo is matched.
///
/// Persisted as the integer tag `0`, `1`, `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MacroKind {
    /// Plays the action list once per trigger.
    Sequence,
    /// First trigger starts an endless loop, the next one stops it.
    Toggle,
    /// Loops while the activation keys stay physically held.
    Hold,
}

impl TryFrom<u8> for MacroKind {
    type Error = UnknownMacroKind;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(MacroKind::Sequence),
            1 => Ok(MacroKind::Toggle),
            2 => Ok(MacroKind::Hold),
            other => Err(UnknownMacroKind(other)),
        }
    }
}

impl From<MacroKind> for u8 {
    fn from(kind: MacroKind) -> Self {
        match kind {
            MacroKind::Sequence => 0,
            MacroKind::Toggle => 1,
            MacroKind::Hold => 2,
        }
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MacroKind::Sequence => "sequence",
            MacroKind::Toggle => "toggle",
            MacroKind::Hold => "hold",
        };
        f.write_str(label)
    }
}

/// One replay step: press every key in order, release them in reverse order,
/// then wait `delay` milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroAction {
    /// Editor-assigned row id; carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Keys pressed together as one chord.  Order matters for the press order.
    #[serde(default)]
    pub keys: Vec<KeyCode>,
    /// Milliseconds to wait after the chord.
    #[serde(default)]
    pub delay: u64,
}

impl MacroAction {
    pub fn new(keys: Vec<KeyCode>, delay_ms: u64) -> Self {
        Self {
            id: None,
            keys,
            delay: delay_ms,
        }
    }

    /// Delay after this step as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    /// `true` when the step presses nothing.
    pub fn is_noop(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A user-defined macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    pub id: MacroId,
    #[serde(default)]
    pub name: String,
    /// Keys that must be held, exactly, to trigger the macro.
    #[serde(default)]
    pub activation_keys: KeyCombo,
    #[serde(rename = "type")]
    pub kind: MacroKind,
    #[serde(default)]
    pub actions: Vec<MacroAction>,
    #[serde(default)]
    pub disabled: bool,
    /// Window/process restriction; empty means "any window".
    #[serde(default)]
    pub include_title: Vec<String>,
}

impl Macro {
    /// Creates an enabled, unrestricted macro with a fresh id.
    pub fn new(
        name: impl Into<String>,
        activation_keys: KeyCombo,
        kind: MacroKind,
        actions: Vec<MacroAction>,
    ) -> Self {
        Self {
            id: MacroId::generate(),
            name: name.into(),
            activation_keys,
            kind,
            actions,
            disabled: false,
            include_title: Vec::new(),
        }
    }

    /// `true` when the macro is enabled and `combo` equals its activation keys.
    ///
    /// An empty activation combo never matches; otherwise releasing every key
    /// would fire it.
    pub fn is_triggered_by(&self, combo: &KeyCombo) -> bool {
        !self.disabled && !self.activation_keys.is_empty() && self.activation_keys == *combo
    }
}

/// The full ordered macro list; the sole persisted aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub macros: Vec<Macro>,
}

impl AppData {
    pub fn new(macros: Vec<Macro>) -> Self {
        Self { macros }
    }

    /// Iterates macros whose activation combo equals `combo`, in list order.
    pub fn matching<'a>(&'a self, combo: &'a KeyCombo) -> impl Iterator<Item = &'a Macro> + 'a {
        self.macros.iter().filter(move |m| m.is_triggered_by(combo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: KeyCode = KeyCode(0x41);
    const X: KeyCode = KeyCode(0x58);

    fn ctrl_a(kind: MacroKind) -> Macro {
        Macro::new(
            "test",
            [KeyCode::LEFT_CTRL, A].into(),
            kind,
            vec![MacroAction::new(vec![X], 50)],
        )
    }

    #[test]
    fn test_macro_kind_tags_round_trip() {
        for kind in [MacroKind::Sequence, MacroKind::Toggle, MacroKind::Hold] {
            let tag: u8 = kind.into();
            assert_eq!(MacroKind::try_from(tag), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_macro_kind_tag_is_rejected() {
        assert_eq!(MacroKind::try_from(7), Err(UnknownMacroKind(7)));
        let result: Result<MacroKind, _> = serde_json::from_str("7");
        assert!(result.is_err());
    }

    #[test]
    fn test_is_triggered_by_uses_set_equality() {
        let m = ctrl_a(MacroKind::Sequence);
        let reversed: KeyCombo = [A, KeyCode::LEFT_CTRL].into();
        assert!(m.is_triggered_by(&reversed));
    }

    #[test]
    fn test_disabled_macro_is_never_triggered() {
        let mut m = ctrl_a(MacroKind::Sequence);
        m.disabled = true;
        assert!(!m.is_triggered_by(&[KeyCode::LEFT_CTRL, A].into()));
    }

    #[test]
    fn test_empty_activation_never_matches_empty_combo() {
        let m = Macro::new("empty", KeyCombo::new(), MacroKind::Sequence, Vec::new());
        assert!(!m.is_triggered_by(&KeyCombo::new()));
    }

    #[test]
    fn test_matching_returns_all_macros_sharing_a_combo_in_list_order() {
        // Arrange
        let first = ctrl_a(MacroKind::Sequence);
        let second = ctrl_a(MacroKind::Toggle);
        let other = Macro::new("other", [X].into(), MacroKind::Hold, Vec::new());
        let data = AppData::new(vec![first.clone(), other, second.clone()]);
        let combo: KeyCombo = [A, KeyCode::LEFT_CTRL].into();

        // Act
        let ids: Vec<&MacroId> = data.matching(&combo).map(|m| &m.id).collect();

        // Assert
        assert_eq!(ids, vec![&first.id, &second.id]);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{"macros":[{"id":"m1","type":1,"activation_keys":[65]}]}"#;
        let data: AppData = serde_json::from_str(json).expect("deserialize");
        let m = &data.macros[0];
        assert_eq!(m.kind, MacroKind::Toggle);
        assert!(!m.disabled);
        assert!(m.actions.is_empty());
        assert!(m.include_title.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let json = r#"{"version":3,"macros":[{"id":"m1","type":0,"color":"red",
            "actions":[{"keys":[88],"delay":10,"repeat":2}]}]}"#;
        let data: AppData = serde_json::from_str(json).expect("deserialize");
        assert_eq!(data.macros[0].actions[0].keys, vec![X]);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(MacroId::generate(), MacroId::generate());
    }
}
