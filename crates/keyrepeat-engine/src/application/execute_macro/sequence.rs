//! One-shot sequence execution.

use std::sync::Arc;

use keyrepeat_core::{Macro, MacroKind};
use tracing::{debug, info};

use super::{play_actions, spawn_supervised, ExecutionContext, ExecutionStrategy};

/// Plays the action list once per trigger.
///
/// A trigger that arrives while the same macro is still playing is dropped.
pub struct SequenceStrategy;

impl ExecutionStrategy for SequenceStrategy {
    fn kind(&self) -> MacroKind {
        MacroKind::Sequence
    }

    fn trigger(&self, ctx: &ExecutionContext, macro_def: Arc<Macro>) {
        let Some(guard) = ctx.registry.try_begin_sequence(&macro_def.id) else {
            debug!(macro_id = %macro_def.id, "sequence already in flight; trigger dropped");
            return;
        };

        let injector = Arc::clone(&ctx.injector);
        let name = format!("sequence:{}", macro_def.id);
        spawn_supervised(name, async move {
            // Held for the whole pass; dropping it (also on panic) clears the marker.
            let _guard = guard;
            info!(macro_id = %macro_def.id, name = %macro_def.name, "sequence started");
            play_actions(injector.as_ref(), &macro_def, || false).await;
            debug!(macro_id = %macro_def.id, "sequence finished");
        });
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

    const X: KeyCode = KeyCode(0x58);

    fn context(injector: Arc<MockInjector>) -> ExecutionContext {
        ExecutionContext {
            injector,
            key_state: Arc::new(MockKeyState::new()),
            registry: ExecutionRegistry::new(),
            settings: ExecutionSettings::default(),
        }
    }

    fn press_x_then_wait() -> Arc<Macro> {
        Arc::new(Macro::new(
            "x",
            [KeyCode::LEFT_CTRL, KeyCode(0x41)].into(),
            MacroKind::Sequence,
            vec![MacroAction::new(vec![X], 50)],
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_plays_once_per_trigger() {
        // Arrange
        let injector = Arc::new(MockInjector::new());
        let ctx = context(injector.clone());
        let m = press_x_then_wait();

        // Act
        SequenceStrategy.trigger(&ctx, m.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(injector.chords(), vec![vec![X]]);
        assert!(!ctx.registry.is_sequence_running(&m.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_while_in_flight_is_dropped() {
        // Arrange
        let injector = Arc::new(MockInjector::new());
        let ctx = context(injector.clone());
        let m = press_x_then_wait();

        // Act
        SequenceStrategy.trigger(&ctx, m.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        SequenceStrategy.trigger(&ctx, m.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(injector.chords().len(), 1, "second trigger must not overlap");
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_after_completion_plays_again() {
        let injector = Arc::new(MockInjector::new());
        let ctx = context(injector.clone());
        let m = press_x_then_wait();

        SequenceStrategy.trigger(&ctx, m.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        SequenceStrategy.trigger(&ctx, m.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(injector.chords().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_actions_still_clear_the_marker() {
        // Arrange
        let injector = Arc::new(MockInjector::failing());
        let ctx = context(injector.clone());
        let m = press_x_then_wait();

        // Act
        SequenceStrategy.trigger(&ctx, m.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Assert
        assert_eq!(injector.attempts(), 1);
        assert!(ctx.registry.is_idle());
    }
}
