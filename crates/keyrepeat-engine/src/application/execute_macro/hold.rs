//! Hold execution: replay while the activation keys stay held.
//!
//! Release is detected by polling the hardware key state rather than by
//! listening for key-up events, so a key-up lost by the hook chain cannot
//! leave a macro running.  Several workers run the same loop with staggered
//! starts; together they shorten the gap between release and the last
//! synthesized action to roughly one action delay divided by the worker
//! count.

use std::sync::Arc;

use keyrepeat_core::{Macro, MacroKind};
use tracing::{debug, info};

use super::{play_actions, spawn_supervised, ExecutionContext, ExecutionStrategy, PassOutcome};

/// Replays the action list while the activation keys are physically held.
pub struct HoldStrategy;

impl ExecutionStrategy for HoldStrategy {
    fn kind(&self) -> MacroKind {
        MacroKind::Hold
    }

    fn trigger(&self, ctx: &ExecutionContext, macro_def: Arc<Macro>) {
        let Some(workers) = ctx
            .registry
            .begin_hold(&macro_def.id, ctx.settings.hold_workers)
        else {
            debug!(macro_id = %macro_def.id, "hold already active; trigger ignored");
            return;
        };

        info!(
            macro_id = %macro_def.id,
            name = %macro_def.name,
            workers = workers.len(),
            "hold started"
        );

        let poll = ctx.settings.hold_poll_interval;
        for worker in workers {
            let injector = Arc::clone(&ctx.injector);
            let key_state = Arc::clone(&ctx.key_state);
            let macro_def = Arc::clone(&macro_def);
            let stagger = poll.saturating_mul(u32::try_from(worker.index()).unwrap_or(u32::MAX));
            let name = format!("hold:{}#{}", macro_def.id, worker.index());

            spawn_supervised(name, async move {
                // Dropping the worker handle decrements the live count.
                let worker = worker;
                let combo = &macro_def.activation_keys;
                tokio::time::sleep(stagger).await;

                let mut passes: u64 = 0;
                while key_state.all_down(combo) {
                    let outcome =
                        play_actions(injector.as_ref(), &macro_def, || !key_state.all_down(combo))
                            .await;
                    if outcome == PassOutcome::Interrupted {
                        break;
                    }
                    passes += 1;
                    tokio::time::sleep(poll).await;
                }
                debug!(macro_id = %macro_def.id, worker = worker.index(), passes, "hold worker exited");
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::execute_macro::ExecutionSettings;
    use crate::application::registry::ExecutionRegistry;
    use crate::infrastructure::input_injection::mock::MockInjector;
    use crate::infrastructure::key_state::mock::MockKeyState;
    use keyrepeat_core::{KeyCode, MacroAction};

    const SPACE: KeyCode = KeyCode::SPACE;
    const ACTION_DELAY_MS: u64 = 40;

    struct Fixture {
        injector: Arc<MockInjector>,
        key_state: Arc<MockKeyState>,
        ctx: ExecutionContext,
        m: Arc<Macro>,
    }

    fn fixture() -> Fixture {
        let injector = Arc::new(MockInjector::new());
        let key_state = Arc::new(MockKeyState::new());
        let ctx = ExecutionContext {
            injector: injector.clone(),
            key_state: key_state.clone(),
            registry: ExecutionRegistry::new(),
            settings: ExecutionSettings::default(),
        };
        let m = Arc::new(Macro::new(
            "spam space",
            [KeyCode::MOUSE_X1].into(),
            MacroKind::Hold,
            vec![MacroAction::new(vec![SPACE], ACTION_DELAY_MS)],
        ));
        Fixture { injector, key_state, ctx, m }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_repeats_while_held_and_stops_after_release() {
        // Arrange
        let f = fixture();
        f.key_state.press(KeyCode::MOUSE_X1);

        // Act
        HoldStrategy.trigger(&f.ctx, f.m.clone());
        tokio::time::sleep(Duration::from_millis(200)).await;
        let while_held = f.injector.chords().len();
        f.key_state.release(KeyCode::MOUSE_X1);
        tokio::time::sleep(Duration::from_millis(ACTION_DELAY_MS + 1)).await;
        let shortly_after = f.injector.chords().len();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Assert
        assert!(while_held >= 4, "expected redundant workers to repeat, got {while_held}");
        assert_eq!(f.injector.chords().len(), shortly_after, "no chords once released");
        assert_eq!(f.ctx.registry.hold_workers(&f.m.id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_starts_configured_number_of_workers() {
        // Arrange
        let f = fixture();
        f.key_state.press(KeyCode::MOUSE_X1);

        // Act
        HoldStrategy.trigger(&f.ctx, f.m.clone());
        tokio::time::sleep(Duration::from_millis(1)).await;

        // Assert
        assert_eq!(f.ctx.registry.hold_workers(&f.m.id), 4);
        f.key_state.release_all();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(f.ctx.registry.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_while_active_is_a_no_op() {
        // Arrange
        let f = fixture();
        f.key_state.press(KeyCode::MOUSE_X1);
        HoldStrategy.trigger(&f.ctx, f.m.clone());

        // Act
        HoldStrategy.trigger(&f.ctx, f.m.clone());

        // Assert
        assert_eq!(f.ctx.registry.hold_workers(&f.m.id), 4);
        f.key_state.release_all();
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_poll_interval_does_not_panic_trigger() {
        // Arrange
        let mut f = fixture();
        f.ctx.settings.hold_poll_interval = Duration::MAX;
        f.key_state.press(KeyCode::MOUSE_X1);

        // Act
        HoldStrategy.trigger(&f.ctx, f.m.clone());
        tokio::time::sleep(Duration::from_millis(1)).await;

        // Assert: the first worker starts at once and plays.
        assert_eq!(f.ctx.registry.hold_workers(&f.m.id), 4);
        assert!(!f.injector.chords().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_released_before_workers_start_plays_nothing() {
        // Arrange
        let f = fixture();

        // Act: the keys are no longer down when the workers first look.
        HoldStrategy.trigger(&f.ctx, f.m.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert!(f.injector.chords().is_empty());
        assert!(f.ctx.registry.is_idle());
    }
}
