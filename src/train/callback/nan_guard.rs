//! Terminate a run on numeric divergence

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Stops the current run as soon as the loss goes NaN or infinite.
///
/// Divergence ends only the affected run; the sweep orchestrator records
/// it as failed and moves on to the next configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NanGuard;

impl NanGuard {
    pub fn new() -> Self {
        Self
    }
}

impl TrainerCallback for NanGuard {
    fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if !ctx.loss.is_finite() {
            eprintln!(
                "NaN guard: non-finite loss at epoch {} step {}, terminating run",
                ctx.epoch, ctx.step
            );
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if !ctx.loss.is_finite() {
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    fn name(&self) -> &'static str {
        "NanGuard"
    }
}
