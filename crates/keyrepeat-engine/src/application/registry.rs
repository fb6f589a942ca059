//! ExecutionRegistry: bookkeeping for macros that are currently executing.
//!
//! Every running execution holds a handle obtained from the registry, and the
//! handle's `Drop` releases its entry.  Entries therefore disappear when a
//! task finishes, is aborted, or panics.
//!
//! | Kind     | Entry                          | Handle             |
//! |----------|--------------------------------|--------------------|
//! | Sequence | in-flight marker               | [`SequenceGuard`]  |
//! | Toggle   | stop signal + run generation   | [`ToggleRun`]      |
//! | Hold     | live worker count              | [`HoldWorker`]     |
//!
//! The internal mutex is only held for short read-modify-write sections and
//! never across an `.await`, a sleep, or an injector call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use keyrepeat_core::MacroId;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Default)]
struct RegistryState {
    sequences: HashSet<MacroId>,
    toggles: HashMap<MacroId, ToggleEntry>,
    holds: HashMap<MacroId, usize>,
    next_generation: u64,
}

#[derive(Debug)]
struct ToggleEntry {
    generation: u64,
    stop: watch::Sender<bool>,
}

/// Shared registry of live executions, keyed by macro id.
#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    state: Mutex<RegistryState>,
}

/// Result of [`ExecutionRegistry::toggle`].
#[derive(Debug)]
pub enum ToggleTransition {
    /// The macro was idle and is now registered as running.  The caller must
    /// drive the loop with the returned handle.
    Started(ToggleRun),
    /// The macro was running; its stop signal has been raised.
    Stopped,
}

impl ExecutionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ── Sequence ─────────────────────────────────────────────────────────────

    /// Marks a sequence macro as in flight.
    ///
    /// Returns `None` if it already is; the trigger must then be dropped.
    pub fn try_begin_sequence(self: &Arc<Self>, id: &MacroId) -> Option<SequenceGuard> {
        let inserted = self.state.lock().sequences.insert(id.clone());
        inserted.then(|| SequenceGuard {
            registry: Arc::clone(self),
            id: id.clone(),
        })
    }

    pub fn is_sequence_running(&self, id: &MacroId) -> bool {
        self.state.lock().sequences.contains(id)
    }

    // ── Toggle ───────────────────────────────────────────────────────────────

    /// Flips a toggle macro between idle and running.
    pub fn toggle(self: &Arc<Self>, id: &MacroId) -> ToggleTransition {
        let mut state = self.state.lock();

        if let Some(entry) = state.toggles.remove(id) {
            let _ = entry.stop.send(true);
            return ToggleTransition::Stopped;
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        let (tx, rx) = watch::channel(false);
        state.toggles.insert(
            id.clone(),
            ToggleEntry {
                generation,
                stop: tx,
            },
        );

        ToggleTransition::Started(ToggleRun {
            registry: Arc::clone(self),
            id: id.clone(),
            generation,
            stop: rx,
        })
    }

    pub fn is_toggle_running(&self, id: &MacroId) -> bool {
        self.state.lock().toggles.contains_key(id)
    }

    /// Raises the stop signal of every running toggle and clears them.
    ///
    /// Returns how many toggles were running.
    pub fn stop_all_toggles(&self) -> usize {
        let drained: Vec<ToggleEntry> = {
            let mut state = self.state.lock();
            state.toggles.drain().map(|(_, entry)| entry).collect()
        };
        for entry in &drained {
            let _ = entry.stop.send(true);
        }
        drained.len()
    }

    // ── Hold ─────────────────────────────────────────────────────────────────

    /// Activates a hold macro with `workers` redundant workers.
    ///
    /// Returns `None` if the macro is already active.  At least one worker
    /// handle is always returned on success.
    pub fn begin_hold(self: &Arc<Self>, id: &MacroId, workers: usize) -> Option<Vec<HoldWorker>> {
        let workers = workers.max(1);
        {
            let mut state = self.state.lock();
            if state.holds.contains_key(id) {
                return None;
            }
            state.holds.insert(id.clone(), workers);
        }
        Some(
            (0..workers)
                .map(|index| HoldWorker {
                    registry: Arc::clone(self),
                    id: id.clone(),
                    index,
                })
                .collect(),
        )
    }

    /// Number of hold workers still alive for `id`; 0 when idle.
    pub fn hold_workers(&self, id: &MacroId) -> usize {
        self.state.lock().holds.get(id).copied().unwrap_or(0)
    }

    /// `true` if no execution of any kind is registered.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.sequences.is_empty() && state.toggles.is_empty() && state.holds.is_empty()
    }

    fn release_hold_worker(&self, id: &MacroId) {
        let mut state = self.state.lock();
        if let Some(count) = state.holds.get_mut(id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.holds.remove(id);
                debug!(macro_id = %id, "last hold worker exited");
            }
        }
    }
}

// ── Handles ──────────────────────────────────────────────────────────────────

/// In-flight marker for a sequence macro; cleared on drop.
#[derive(Debug)]
pub struct SequenceGuard {
    registry: Arc<ExecutionRegistry>,
    id: MacroId,
}

impl Drop for SequenceGuard {
    fn drop(&mut self) {
        self.registry.state.lock().sequences.remove(&self.id);
    }
}

/// Handle held by a running toggle loop.
///
/// Dropping it removes the registry entry if it still belongs to this run,
/// so a loop that ends on its own (or panics) leaves the macro idle.
#[derive(Debug)]
pub struct ToggleRun {
    registry: Arc<ExecutionRegistry>,
    id: MacroId,
    generation: u64,
    stop: watch::Receiver<bool>,
}

impl ToggleRun {
    pub fn id(&self) -> &MacroId {
        &self.id
    }

    /// `true` once the stop signal was raised or its sender is gone.
    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow() || self.stop.has_changed().is_err()
    }

    /// Resolves when the stop signal is raised.
    pub async fn stopped(&mut self) {
        loop {
            if *self.stop.borrow_and_update() {
                return;
            }
            if self.stop.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for ToggleRun {
    fn drop(&mut self) {
        let mut state = self.registry.state.lock();
        let owned = state
            .toggles
            .get(&self.id)
            .is_some_and(|entry| entry.generation == self.generation);
        if owned {
            state.toggles.remove(&self.id);
        }
    }
}

/// One live hold worker; decrements the worker count on drop.
#[derive(Debug)]
pub struct HoldWorker {
    registry: Arc<ExecutionRegistry>,
    id: MacroId,
    index: usize,
}

impl HoldWorker {
    /// Position of this worker among its siblings, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for HoldWorker {
    fn drop(&mut self) {
        self.registry.release_hold_worker(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> MacroId {
        MacroId::new(s)
    }

    #[test]
    fn test_sequence_guard_blocks_reentry_until_dropped() {
        // Arrange
        let registry = ExecutionRegistry::new();

        // Act
        let guard = registry.try_begin_sequence(&id("m1"));
        let second = registry.try_begin_sequence(&id("m1"));

        // Assert
        assert!(guard.is_some());
        assert!(second.is_none());
        drop(guard);
        assert!(!registry.is_sequence_running(&id("m1")));
        assert!(registry.try_begin_sequence(&id("m1")).is_some());
    }

    #[test]
    fn test_sequences_with_different_ids_are_independent() {
        let registry = ExecutionRegistry::new();
        let _a = registry.try_begin_sequence(&id("a")).expect("a");
        assert!(registry.try_begin_sequence(&id("b")).is_some());
    }

    #[test]
    fn test_sequence_guard_is_released_on_panic() {
        // Arrange
        let registry = ExecutionRegistry::new();
        let cloned = Arc::clone(&registry);

        // Act
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.try_begin_sequence(&id("m1"));
            panic!("boom");
        }));

        // Assert
        assert!(result.is_err());
        assert!(!registry.is_sequence_running(&id("m1")));
    }

    #[test]
    fn test_toggle_alternates_between_started_and_stopped() {
        // Arrange
        let registry = ExecutionRegistry::new();

        // Act
        let first = registry.toggle(&id("t"));
        let running_after_first = registry.is_toggle_running(&id("t"));
        let second = registry.toggle(&id("t"));

        // Assert
        let ToggleTransition::Started(run) = first else {
            panic!("first toggle must start");
        };
        assert!(running_after_first);
        assert!(matches!(second, ToggleTransition::Stopped));
        assert!(run.is_stopped());
        assert!(!registry.is_toggle_running(&id("t")));
    }

    #[test]
    fn test_stale_toggle_run_does_not_remove_newer_entry() {
        // Arrange
        let registry = ExecutionRegistry::new();
        let ToggleTransition::Started(old_run) = registry.toggle(&id("t")) else {
            panic!("must start");
        };
        registry.toggle(&id("t"));
        let ToggleTransition::Started(_new_run) = registry.toggle(&id("t")) else {
            panic!("must start again");
        };

        // Act
        drop(old_run);

        // Assert
        assert!(registry.is_toggle_running(&id("t")));
    }

    #[test]
    fn test_dropping_toggle_run_leaves_macro_idle() {
        let registry = ExecutionRegistry::new();
        let transition = registry.toggle(&id("t"));
        drop(transition);
        assert!(!registry.is_toggle_running(&id("t")));
    }

    #[test]
    fn test_stop_all_toggles_raises_every_signal() {
        // Arrange
        let registry = ExecutionRegistry::new();
        let ToggleTransition::Started(a) = registry.toggle(&id("a")) else { panic!() };
        let ToggleTransition::Started(b) = registry.toggle(&id("b")) else { panic!() };

        // Act
        let stopped = registry.stop_all_toggles();

        // Assert
        assert_eq!(stopped, 2);
        assert!(a.is_stopped());
        assert!(b.is_stopped());
        assert!(registry.is_idle());
    }

    #[tokio::test]
    async fn test_toggle_run_stopped_resolves_after_stop() {
        // Arrange
        let registry = ExecutionRegistry::new();
        let ToggleTransition::Started(mut run) = registry.toggle(&id("t")) else { panic!() };

        // Act
        registry.toggle(&id("t"));

        // Assert
        tokio::time::timeout(std::time::Duration::from_secs(1), run.stopped())
            .await
            .expect("stopped() must resolve");
    }

    #[test]
    fn test_toggle_run_stopped_is_pending_while_running() {
        // Arrange
        let registry = ExecutionRegistry::new();
        let ToggleTransition::Started(mut run) = registry.toggle(&id("t")) else { panic!() };

        {
            let mut stopped = tokio_test::task::spawn(run.stopped());

            // Act / Assert
            tokio_test::assert_pending!(stopped.poll());
            registry.toggle(&id("t"));
            assert!(stopped.is_woken());
            tokio_test::assert_ready!(stopped.poll());
        }
        assert!(run.is_stopped());
    }

    #[test]
    fn test_hold_count_reaches_zero_and_removes_entry() {
        // Arrange
        let registry = ExecutionRegistry::new();
        let workers = registry.begin_hold(&id("h"), 4).expect("idle hold must start");
        assert_eq!(registry.hold_workers(&id("h")), 4);

        // Act
        let mut workers = workers.into_iter();
        drop(workers.next());
        drop(workers.next());

        // Assert
        assert_eq!(registry.hold_workers(&id("h")), 2);
        drop(workers);
        assert_eq!(registry.hold_workers(&id("h")), 0);
        assert!(registry.is_idle());
    }

    #[test]
    fn test_hold_trigger_while_active_is_rejected() {
        let registry = ExecutionRegistry::new();
        let _workers = registry.begin_hold(&id("h"), 4).expect("start");
        assert!(registry.begin_hold(&id("h"), 4).is_none());
    }

    #[test]
    fn test_hold_with_zero_workers_still_gets_one() {
        let registry = ExecutionRegistry::new();
        let workers = registry.begin_hold(&id("h"), 0).expect("start");
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].index(), 0);
    }
}
