//! Macro execution: the three per-kind strategies and what they share.
//!
//! # Sub-modules
//!
//! - **`sequence`** – plays the action list once per trigger, never twice at
//!   the same time for one macro.
//! - **`toggle`**   – first trigger starts an endless replay loop, the next
//!   trigger stops it.
//! - **`hold`**     – replays while the activation keys stay physically held,
//!   using several staggered workers that each poll the hardware key state.
//!
//! The dispatcher picks a strategy once per trigger with [`strategy_for`] and
//! hands it an [`ExecutionContext`].  Strategies never block the caller: all
//! replay work runs in tasks started by [`spawn_supervised`], whose panics
//! are logged and contained.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use keyrepeat_core::{KeyCode, KeyCombo, Macro, MacroKind};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::registry::ExecutionRegistry;

pub mod hold;
pub mod sequence;
pub mod toggle;

/// Error type for synthesized input.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The key code has no synthesizable equivalent on this platform.
    #[error("key code {0:?} cannot be synthesized")]
    UnsupportedKey(KeyCode),
    /// The OS accepted fewer events than were submitted.
    #[error("platform rejected input: {0}")]
    Platform(String),
}

/// Synthesizes key chords.
///
/// Implementations must mark every event they produce so the hook layer can
/// recognise it as injected.
pub trait InputInjector: Send + Sync {
    /// Presses every key of `keys` in order, then releases them in reverse
    /// order, as one uninterrupted unit.
    fn press_chord(&self, keys: &[KeyCode]) -> Result<(), InjectionError>;
}

/// Reads the physical (hardware) state of keys.
pub trait KeyStateProbe: Send + Sync {
    /// `true` while `key` is physically held down.
    fn is_down(&self, key: KeyCode) -> bool;

    /// `true` if every key in `combo` is held.  An empty combo is never held.
    fn all_down(&self, combo: &KeyCombo) -> bool {
        !combo.is_empty() && combo.iter().all(|key| self.is_down(key))
    }
}

/// Tunables for the execution strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Number of redundant workers started for a hold macro.
    pub hold_workers: usize,
    /// Sleep between a hold worker's passes, and stagger between worker starts.
    pub hold_poll_interval: Duration,
    /// Pause between two passes of a toggle loop.
    pub toggle_pass_pause: Duration,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            hold_workers: 4,
            hold_poll_interval: Duration::from_millis(10),
            toggle_pass_pause: Duration::from_millis(50),
        }
    }
}

/// Everything a strategy needs to run a macro.
#[derive(Clone)]
pub struct ExecutionContext {
    pub injector: Arc<dyn InputInjector>,
    pub key_state: Arc<dyn KeyStateProbe>,
    pub registry: Arc<ExecutionRegistry>,
    pub settings: ExecutionSettings,
}

/// Behaviour of one macro kind.
pub trait ExecutionStrategy: Send + Sync {
    /// The kind this strategy executes.
    fn kind(&self) -> MacroKind;

    /// Handles one trigger of `macro_def`.  Returns immediately; any replay
    /// happens in spawned tasks.  Must be called from within a Tokio runtime.
    fn trigger(&self, ctx: &ExecutionContext, macro_def: Arc<Macro>);
}

/// Selects the strategy for a macro kind.
pub fn strategy_for(kind: MacroKind) -> &'static dyn ExecutionStrategy {
    match kind {
        MacroKind::Sequence => &sequence::SequenceStrategy,
        MacroKind::Toggle => &toggle::ToggleStrategy,
        MacroKind::Hold => &hold::HoldStrategy,
    }
}

/// How a pass over the action list ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    Interrupted,
}

/// Plays every action of `macro_def` once.
///
/// `should_stop` is checked before each action; when it returns `true` the
/// pass ends early.  A chord that has started is always pressed and released
/// in full.  Injector failures are logged and the pass continues with the
/// next action.
pub async fn play_actions<F>(
    injector: &dyn InputInjector,
    macro_def: &Macro,
    mut should_stop: F,
) -> PassOutcome
where
    F: FnMut() -> bool,
{
    for (index, action) in macro_def.actions.iter().enumerate() {
        if should_stop() {
            return PassOutcome::Interrupted;
        }
        if !action.is_noop() {
            if let Err(e) = injector.press_chord(&action.keys) {
                warn!(
                    macro_id = %macro_def.id,
                    action = index,
                    "action failed, continuing: {e}"
                );
            }
        }
        if action.delay > 0 {
            tokio::time::sleep(action.delay()).await;
        }
    }
    PassOutcome::Completed
}

/// Spawns `fut` as a named execution task and watches it.
///
/// A panic inside the task is caught at the task boundary and logged with its
/// payload; it never propagates to the caller or to other tasks.  The
/// returned handle belongs to the watcher and resolves once the task has
/// ended either way.
pub fn spawn_supervised<F>(name: String, fut: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(fut);
    tokio::spawn(async move {
        match task.await {
            Ok(()) => trace!(task = %name, "execution task finished"),
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic().as_ref());
                error!(task = %name, panic = %message, "execution task panicked");
            }
            Err(e) => debug!(task = %name, "execution task cancelled: {e}"),
        }
    })
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
