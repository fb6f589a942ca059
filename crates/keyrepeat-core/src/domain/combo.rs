//! `KeyCombo`: the set of keys held down at one instant.
//!
//! Combos are compared as sets.  The backing store is a `BTreeSet`, so two
//! combos built from the same keys in a different order are equal, hash the
//! same, and serialize to the same sorted JSON array.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keymap::KeyCode;

/// A de-duplicated, order-independent set of [`KeyCode`]s.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCombo(BTreeSet<KeyCode>);

impl KeyCombo {
    /// Creates an empty combo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a combo containing exactly one key (used for mouse events).
    pub fn single(key: KeyCode) -> Self {
        let mut set = BTreeSet::new();
        set.insert(key);
        Self(set)
    }

    /// Adds `key`; returns `false` if it was already present.
    pub fn insert(&mut self, key: KeyCode) -> bool {
        self.0.insert(key)
    }

    /// Removes `key`; returns `false` if it was not present.
    pub fn remove(&mut self, key: KeyCode) -> bool {
        self.0.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the keys in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.0.iter().copied()
    }

    /// Renders the combo for humans: modifiers first, then the remaining keys
    /// by code, joined with `" + "`.
    pub fn display(&self) -> String {
        let (mut modifiers, mut rest): (Vec<KeyCode>, Vec<KeyCode>) =
            self.0.iter().copied().partition(|k| k.is_modifier());
        modifiers.append(&mut rest);
        modifiers
            .into_iter()
            .map(KeyCode::name)
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl FromIterator<KeyCode> for KeyCombo {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[KeyCode; N]> for KeyCombo {
    fn from(keys: [KeyCode; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl fmt::Debug for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter().map(|k| k.0)).finish()
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
