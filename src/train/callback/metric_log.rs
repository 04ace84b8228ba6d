//! Structured metric logging to the run directory

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

#[derive(Serialize)]
struct MetricEvent<'a> {
    epoch: usize,
    global_step: u64,
    loss: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    val_loss: Option<f32>,
    lr: f32,
    elapsed_secs: f64,
    metrics: BTreeMap<&'a str, f32>,
}

/// Appends one JSON line per epoch to `metrics.jsonl` in the run directory.
///
/// The file is the machine-readable training curve used by downstream
/// sweep analysis; write failures degrade to dropped lines rather than
/// aborting the run.
#[derive(Debug)]
pub struct MetricLogger {
    path: PathBuf,
    file: Option<File>,
}

impl MetricLogger {
    /// Log into `run_dir/metrics.jsonl`, creating the directory if needed
    pub fn new(run_dir: impl AsRef<Path>) -> Self {
        let path = run_dir.as_ref().join("metrics.jsonl");
        std::fs::create_dir_all(run_dir.as_ref()).ok();
        let file = OpenOptions::new().create(true).append(true).open(&path).ok();
        Self { path, file }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrainerCallback for MetricLogger {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if let Some(file) = &mut self.file {
            let event = MetricEvent {
                epoch: ctx.epoch,
                global_step: ctx.global_step,
                loss: ctx.loss,
                val_loss: ctx.val_loss,
                lr: ctx.lr,
                elapsed_secs: ctx.elapsed_secs,
                metrics: ctx.metrics.iter().map(|&(k, v)| (k, v)).collect(),
            };
            if let Ok(line) = serde_json::to_string(&event) {
                writeln!(file, "{line}").ok();
                file.flush().ok();
            }
        }
        CallbackAction::Continue
    }

    fn name(&self) -> &'static str {
        "MetricLogger"
    }
}
