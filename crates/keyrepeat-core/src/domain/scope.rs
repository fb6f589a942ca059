//! Window-scope rule deciding whether a macro may fire in the focused window.

use serde::{Deserialize, Serialize};

/// What the OS reports about the window that currently has focus.
///
/// Every field may be empty when the query fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusedWindow {
    /// Executable file name, e.g. `"notepad.exe"`.
    pub process: String,
    pub title: String,
    pub class: String,
}

impl FocusedWindow {
    pub fn from_process(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            ..Self::default()
        }
    }
}

/// Returns `true` when a macro restricted to `scope` may fire while `focused`
/// has focus.
///
/// The engine's own process never matches, so macros cannot fire into the
/// editor.  An empty scope is unrestricted.  Otherwise an entry matches if it
/// equals the process name or is contained in the title, class, or process
/// name; all comparisons ignore ASCII case and blank entries are skipped.
pub fn scope_allows(focused: &FocusedWindow, own_process: &str, scope: &[String]) -> bool {
    let process = focused.process.to_lowercase();
    if !process.is_empty() && process == own_process.to_lowercase() {
        return false;
    }
    if scope.is_empty() {
        return true;
    }

    let title = focused.title.to_lowercase();
    let class = focused.class.to_lowercase();

    scope
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .any(|entry| {
            entry == process
                || title.contains(&entry)
                || class.contains(&entry)
                || process.contains(&entry)
        })
}
