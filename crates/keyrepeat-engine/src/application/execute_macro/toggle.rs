//! Toggle execution: Idle ⇄ Running, flipped by each trigger.

use std::sync::Arc;

use keyrepeat_core::{Macro, MacroKind};
use tracing::info;

use super::{play_actions, spawn_supervised, ExecutionContext, ExecutionStrategy, PassOutcome};
use crate::application::registry::ToggleTransition;

/// Starts an endless replay loop on one trigger and stops it on the next.
///
/// The stop signal is checked before every action and during the pause
/// between passes.
pub struct ToggleStrategy;

impl ExecutionStrategy for ToggleStrategy {
    fn kind(&self) -> MacroKind {
        MacroKind::Toggle
    }

    fn trigger(&self, ctx: &ExecutionContext, macro_def: Arc<Macro>) {
        let mut run = match ctx.registry.toggle(&macro_def.id) {
            ToggleTransition::Started(run) => run,
            ToggleTransition::Stopped => {
                info!(macro_id = %macro_def.id, "toggle stop requested");
                return;
            }
        };

        let injector = Arc::clone(&ctx.injector);
        let pause = ctx.settings.toggle_pass_pause;
        let name = format!("toggle:{}", macro_def.id);
        spawn_supervised(name, async move {
            info!(macro_id = %macro_def.id, name = %macro_def.name, "toggle started");
            let mut passes: u64 = 0;
            while !run.is_stopped() {
                let outcome = play_actions(injector.as_ref(), &macro_def, || run.is_stopped()).await;
                if outcome == PassOutcome::Interrupted {
                    break;
                }
                passes += 1;
                tokio::select! {
                    _ = run.stopped() => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
            info!(macro_id = %macro_def.id, passes, "toggle stopped");
        });
    }
}
