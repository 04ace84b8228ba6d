//! Callback system for training events
//!
//! Hooks fire at `on_train_begin/end`, `on_epoch_begin/end` and
//! `on_step_begin/end`. Each callback is an independent unit the trainer
//! invokes through the [`CallbackManager`]; side effects (checkpointing,
//! metric logging) live in the hooks, not the training loop.
//!
//! # Example
//!
//! ```rust
//! use kinetrain::train::{TrainerCallback, CallbackContext, CallbackAction};
//!
//! struct PrintCallback;
//!
//! impl TrainerCallback for PrintCallback {
//!     fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
//!         println!("epoch {} finished with loss {:.4}", ctx.epoch, ctx.loss);
//!         CallbackAction::Continue
//!     }
//! }
//! ```

mod checkpoint;
mod early_stopping;
mod manager;
mod metric_log;
mod nan_guard;
mod progress;
mod traits;

pub use checkpoint::CheckpointCallback;
pub use early_stopping::EarlyStopping;
pub use manager::CallbackManager;
pub use metric_log::MetricLogger;
pub use nan_guard::NanGuard;
pub use progress::ProgressCallback;
pub use traits::{CallbackAction, CallbackContext, TrainerCallback};
