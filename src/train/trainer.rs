//! Training loop driving models, optimizers and callbacks
//!
//! The [`Trainer`] owns the run-level state: the global step counter, the
//! shuffle RNG, the metric history and the callback list. Models plug in
//! through the [`Trainable`] trait and stay ignorant of epochs, batching
//! and checkpointing.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::model::WeightSnapshot;
use crate::optim::{clip_grad_norm, Optimizer, ParamMut};

use super::callback::{CallbackAction, CallbackContext, CallbackManager, TrainerCallback};
use super::metrics::MetricsTracker;

/// Loss and auxiliary metrics from one forward/backward pass
#[derive(Clone, Debug)]
pub struct StepOutput {
    pub loss: f32,
    /// Named metrics alongside the loss, e.g. `("kl", 0.03)`
    pub metrics: Vec<(&'static str, f32)>,
}

/// A model the [`Trainer`] can fit.
///
/// `train_step` runs forward and backward for one batch and leaves the
/// gradients accumulated in the parameters; the trainer clips them and
/// applies the optimizer afterwards. `eval_step` must be deterministic
/// (no sampling, no dropout).
pub trait Trainable {
    type Batch;

    /// Forward/backward pass over one batch, accumulating gradients
    fn train_step(&mut self, batch: &Self::Batch, global_step: u64, rng: &mut StdRng)
        -> StepOutput;

    /// Deterministic evaluation pass over one batch
    fn eval_step(&mut self, batch: &Self::Batch) -> StepOutput;

    /// All trainable parameters with their gradient buffers
    fn params_mut(&mut self) -> Vec<ParamMut<'_>>;

    /// Copy of the current weights, in `params_mut` order
    fn snapshot(&mut self) -> WeightSnapshot {
        WeightSnapshot {
            tensors: self.params_mut().iter().map(|p| p.value.to_vec()).collect(),
        }
    }
}

/// Run-level knobs that are not model hyperparameters
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Upper bound on epochs; callbacks may end the run earlier
    pub max_epochs: usize,
    /// Global gradient-norm clip, disabled when `None`
    pub max_grad_norm: Option<f32>,
    /// Seed for batch shuffling and stochastic model steps
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { max_epochs: 15, max_grad_norm: Some(5.0), seed: 42 }
    }
}

/// Outcome of one training run
#[derive(Clone, Debug)]
pub struct TrainResult {
    /// Last epoch that ran (0-indexed)
    pub final_epoch: usize,
    /// Mean training loss of the last epoch
    pub final_loss: f32,
    /// Best validation loss seen, if a validation set was attached
    pub best_val_loss: Option<f32>,
    /// True when a callback ended the run before `max_epochs`
    pub stopped_early: bool,
    /// True when the loss went non-finite
    pub diverged: bool,
    pub elapsed_secs: f64,
}

/// Drives the epoch/step loop for any [`Trainable`] model
pub struct Trainer {
    config: TrainConfig,
    metrics: MetricsTracker,
    callbacks: CallbackManager,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, metrics: MetricsTracker::new(), callbacks: CallbackManager::new(), rng }
    }

    /// Register a callback; they run in registration order
    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Mean evaluation loss over a batch set
    fn evaluate<M: Trainable>(model: &mut M, batches: &[M::Batch]) -> Option<f32> {
        if batches.is_empty() {
            return None;
        }
        let total: f32 = batches.iter().map(|b| model.eval_step(b).loss).sum();
        Some(total / batches.len() as f32)
    }

    /// Run the full training loop.
    ///
    /// `batch_fn` is called once per epoch with the shuffle RNG and must
    /// return that epoch's training batches. Validation batches, when
    /// given, are evaluated after every epoch and drive `val_loss` in the
    /// callback context.
    pub fn fit<M, F>(
        &mut self,
        model: &mut M,
        optimizer: &mut dyn Optimizer,
        mut batch_fn: F,
        val_batches: Option<&[M::Batch]>,
    ) -> TrainResult
    where
        M: Trainable,
        F: FnMut(&mut StdRng) -> Vec<M::Batch>,
    {
        let start = Instant::now();
        let mut ctx = CallbackContext {
            max_epochs: self.config.max_epochs,
            lr: optimizer.lr(),
            ..Default::default()
        };

        let mut final_loss = f32::NAN;
        let mut final_epoch = 0;
        let mut best_val_loss: Option<f32> = None;
        let mut stopped_early = false;
        let mut diverged = false;

        if self.callbacks.on_train_begin(&ctx) == CallbackAction::Stop {
            return TrainResult {
                final_epoch: 0,
                final_loss,
                best_val_loss,
                stopped_early: true,
                diverged,
                elapsed_secs: start.elapsed().as_secs_f64(),
            };
        }

        'epochs: for epoch in 0..self.config.max_epochs {
            final_epoch = epoch;
            let batches = batch_fn(&mut self.rng);
            ctx.epoch = epoch;
            ctx.steps_per_epoch = batches.len();
            ctx.weights = None;
            ctx.metrics.clear();
            ctx.elapsed_secs = start.elapsed().as_secs_f64();

            match self.callbacks.on_epoch_begin(&ctx) {
                CallbackAction::Stop => {
                    stopped_early = true;
                    break 'epochs;
                }
                CallbackAction::SkipEpoch => continue 'epochs,
                CallbackAction::Continue => {}
            }

            let mut loss_sum = 0.0_f32;
            let mut steps_run = 0usize;

            for (step, batch) in batches.iter().enumerate() {
                ctx.step = step;
                ctx.global_step = self.metrics.global_step;

                if self.callbacks.on_step_begin(&ctx) == CallbackAction::Stop {
                    stopped_early = true;
                    break 'epochs;
                }

                optimizer.zero_grad(&mut model.params_mut());
                let out = model.train_step(batch, self.metrics.global_step, &mut self.rng);
                if let Some(max_norm) = self.config.max_grad_norm {
                    clip_grad_norm(&mut model.params_mut(), max_norm);
                }
                optimizer.step(&mut model.params_mut());
                self.metrics.increment_step();

                loss_sum += out.loss;
                steps_run += 1;
                ctx.loss = out.loss;
                ctx.metrics = out.metrics;
                ctx.global_step = self.metrics.global_step;
                ctx.elapsed_secs = start.elapsed().as_secs_f64();

                if !out.loss.is_finite() {
                    diverged = true;
                }
                if self.callbacks.on_step_end(&ctx) == CallbackAction::Stop {
                    stopped_early = true;
                    final_loss = ctx.loss;
                    break 'epochs;
                }
                if diverged {
                    final_loss = ctx.loss;
                    break 'epochs;
                }
            }

            let epoch_loss =
                if steps_run > 0 { loss_sum / steps_run as f32 } else { f32::NAN };
            final_loss = epoch_loss;

            let val_loss = val_batches.and_then(|vb| Self::evaluate(model, vb));
            if let Some(v) = val_loss {
                if best_val_loss.map_or(true, |best| v < best) {
                    best_val_loss = Some(v);
                }
            }

            self.metrics.record_epoch(epoch_loss, val_loss, optimizer.lr());

            ctx.loss = epoch_loss;
            ctx.val_loss = val_loss;
            ctx.best_loss = self.metrics.best_loss();
            ctx.lr = optimizer.lr();
            ctx.weights = Some(Arc::new(model.snapshot()));
            ctx.elapsed_secs = start.elapsed().as_secs_f64();

            if self.callbacks.on_epoch_end(&ctx) == CallbackAction::Stop {
                stopped_early = true;
                break 'epochs;
            }
        }

        ctx.elapsed_secs = start.elapsed().as_secs_f64();
        self.callbacks.on_train_end(&ctx);

        TrainResult {
            final_epoch,
            final_loss,
            best_val_loss,
            stopped_early,
            diverged,
            elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::callback::{EarlyStopping, NanGuard};

    /// One scalar parameter with quadratic loss, minimum at zero
    struct QuadraticModel {
        w: Vec<f32>,
        g: Vec<f32>,
    }

    impl QuadraticModel {
        fn new(w0: f32) -> Self {
            Self { w: vec![w0], g: vec![0.0] }
        }
    }

    impl Trainable for QuadraticModel {
        type Batch = ();

        fn train_step(&mut self, _batch: &(), _global_step: u64, _rng: &mut StdRng) -> StepOutput {
            let w = self.w[0];
            self.g[0] += 2.0 * w;
            StepOutput { loss: w * w, metrics: vec![] }
        }

        fn eval_step(&mut self, _batch: &()) -> StepOutput {
            let w = self.w[0];
            StepOutput { loss: w * w, metrics: vec![] }
        }

        fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
            vec![ParamMut { value: &mut self.w, grad: &mut self.g }]
        }
    }

    /// Model whose loss goes NaN on the third step
    struct ExplodingModel {
        w: Vec<f32>,
        g: Vec<f32>,
        steps: u32,
    }

    impl Trainable for ExplodingModel {
        type Batch = ();

        fn train_step(&mut self, _batch: &(), _global_step: u64, _rng: &mut StdRng) -> StepOutput {
            self.steps += 1;
            let loss = if self.steps >= 3 { f32::NAN } else { 1.0 };
            StepOutput { loss, metrics: vec![] }
        }

        fn eval_step(&mut self, _batch: &()) -> StepOutput {
            StepOutput { loss: 1.0, metrics: vec![] }
        }

        fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
            vec![ParamMut { value: &mut self.w, grad: &mut self.g }]
        }
    }

    #[test]
    fn test_fit_reduces_quadratic_loss() {
        let mut model = QuadraticModel::new(5.0);
        let mut optimizer = crate::optim::Sgd::new(0.1, 0.0);
        let mut trainer = Trainer::new(TrainConfig {
            max_epochs: 20,
            max_grad_norm: None,
            seed: 0,
        });

        let result = trainer.fit(&mut model, &mut optimizer, |_| vec![(), (), ()], None);
        assert!(!result.diverged);
        assert!(!result.stopped_early);
        assert_eq!(result.final_epoch, 19);
        assert!(result.final_loss < 0.01, "loss {} did not converge", result.final_loss);
        assert_eq!(trainer.metrics().global_step, 60);
    }

    #[test]
    fn test_nan_guard_stops_run() {
        let mut model = ExplodingModel { w: vec![1.0], g: vec![0.0], steps: 0 };
        let mut optimizer = crate::optim::Sgd::new(0.01, 0.0);
        let mut trainer =
            Trainer::new(TrainConfig { max_epochs: 10, max_grad_norm: None, seed: 0 });
        trainer.add_callback(NanGuard::new());

        let result = trainer.fit(&mut model, &mut optimizer, |_| vec![(), (), (), ()], None);
        assert!(result.diverged);
        assert!(result.stopped_early);
        assert_eq!(result.final_epoch, 0);
    }

    #[test]
    fn test_divergence_flagged_without_guard() {
        let mut model = ExplodingModel { w: vec![1.0], g: vec![0.0], steps: 0 };
        let mut optimizer = crate::optim::Sgd::new(0.01, 0.0);
        let mut trainer =
            Trainer::new(TrainConfig { max_epochs: 10, max_grad_norm: None, seed: 0 });

        let result = trainer.fit(&mut model, &mut optimizer, |_| vec![(), (), (), ()], None);
        assert!(result.diverged);
        assert!(result.final_loss.is_nan());
    }

    #[test]
    fn test_early_stopping_ends_plateau() {
        // eval loss equals train loss; once near zero it plateaus below min_delta
        let mut model = QuadraticModel::new(1.0);
        let mut optimizer = crate::optim::Sgd::new(0.5, 0.0);
        let mut trainer = Trainer::new(TrainConfig {
            max_epochs: 100,
            max_grad_norm: None,
            seed: 0,
        });
        trainer.add_callback(EarlyStopping::new(3, 1e-4));

        let result = trainer.fit(&mut model, &mut optimizer, |_| vec![()], Some(&[()]));
        assert!(result.stopped_early);
        assert!(result.final_epoch < 99);
        assert!(result.best_val_loss.unwrap() < 0.01);
    }

    #[test]
    fn test_val_loss_tracked() {
        let mut model = QuadraticModel::new(2.0);
        let mut optimizer = crate::optim::Sgd::new(0.1, 0.0);
        let mut trainer =
            Trainer::new(TrainConfig { max_epochs: 5, max_grad_norm: None, seed: 0 });

        let result = trainer.fit(&mut model, &mut optimizer, |_| vec![()], Some(&[()]));
        let best = result.best_val_loss.unwrap();
        assert!(best.is_finite());
        assert!(best < 4.0);
        assert_eq!(trainer.metrics().history().len(), 5);
    }

    #[test]
    fn test_snapshot_matches_params() {
        let mut model = QuadraticModel::new(3.5);
        let snap = model.snapshot();
        assert_eq!(snap.tensors, vec![vec![3.5]]);
    }
}
