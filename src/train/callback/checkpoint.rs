//! Best-validation checkpoint writer

use std::path::PathBuf;

use serde::Serialize;

use crate::model::WeightSnapshot;

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

#[derive(Serialize)]
struct CheckpointRecord<'a> {
    epoch: usize,
    val_loss: f32,
    timestamp: u64,
    weights: &'a WeightSnapshot,
}

/// Saves the model weights whenever the monitored validation loss improves.
///
/// The trainer attaches a weight snapshot to the epoch-end context; this
/// callback persists it as `checkpoint_best.json` in the run directory.
/// Falls back to training loss when no validation set is attached.
#[derive(Clone, Debug)]
pub struct CheckpointCallback {
    checkpoint_dir: PathBuf,
    best_loss: f32,
    pub(crate) last_saved_epoch: Option<usize>,
}

impl CheckpointCallback {
    /// Create checkpoint callback saving into `checkpoint_dir`
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), best_loss: f32::INFINITY, last_saved_epoch: None }
    }

    /// Path of the best checkpoint
    pub fn best_checkpoint_path(&self) -> PathBuf {
        self.checkpoint_dir.join("checkpoint_best.json")
    }

    fn save(&mut self, epoch: usize, val_loss: f32, weights: &WeightSnapshot) {
        std::fs::create_dir_all(&self.checkpoint_dir).ok();
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let record = CheckpointRecord { epoch, val_loss, timestamp, weights };
        if let Ok(json) = serde_json::to_string(&record) {
            std::fs::write(self.best_checkpoint_path(), json).ok();
            self.last_saved_epoch = Some(epoch);
        }
    }
}

impl TrainerCallback for CheckpointCallback {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let loss = ctx.val_loss.unwrap_or(ctx.loss);
        if loss < self.best_loss {
            self.best_loss = loss;
            if let Some(weights) = &ctx.weights {
                self.save(ctx.epoch, loss, weights);
            }
        }
        CallbackAction::Continue
    }

    fn name(&self) -> &'static str {
        "CheckpointCallback"
    }
}
