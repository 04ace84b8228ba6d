//! Sequential sweep orchestration over a configuration grid
//!
//! One run per configuration: skip if its directory already exists, build
//! the model and optimizer from the typed hyperparameters, train with the
//! standard callback set, and persist the run record under
//! `log_root/<dir_name>`.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::model::rnn::{RegressorConfig, RnnRegressor};
use crate::model::vae::{Vae, VaeConfig};
use crate::model::ModelError;
use crate::optim::Adam;
use crate::train::{
    dense_batches, seq_batches, CheckpointCallback, CyclicalAnnealing, EarlyStopping,
    MetricLogger, NanGuard, TrainConfig, TrainResult, Trainer,
};

use super::config::{Configuration, RegressorHparams, VaeHparams};
use super::error::Result;
use super::grid::GridSweep;
use super::space::SweepSpace;

/// How one configuration's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Trained to completion (possibly stopped early by a callback)
    Completed,
    /// Run directory already existed; nothing was trained
    Skipped,
    /// Loss went non-finite; recorded as failed
    Diverged,
}

/// Per-configuration outcome
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub dir_name: String,
    pub status: RunStatus,
    /// Mean training loss of the last epoch, absent for skipped runs
    pub final_loss: Option<f32>,
    pub best_val_loss: Option<f32>,
    /// Epochs actually run, absent for skipped runs
    pub epochs_run: Option<usize>,
}

/// Tally of a whole sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub runs: Vec<RunOutcome>,
}

impl SweepReport {
    pub fn completed(&self) -> usize {
        self.runs.iter().filter(|r| r.status == RunStatus::Completed).count()
    }

    pub fn skipped(&self) -> usize {
        self.runs.iter().filter(|r| r.status == RunStatus::Skipped).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|r| r.status == RunStatus::Diverged).count()
    }

    /// Completed run with the lowest best validation loss
    pub fn best_run(&self) -> Option<&RunOutcome> {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Completed)
            .filter_map(|r| r.best_val_loss.map(|v| (r, v)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(r, _)| r)
    }
}

/// Runs every grid configuration strictly sequentially.
///
/// Restartable: rerunning a sweep against the same `log_root` skips all
/// configurations whose run directory already exists, so an interrupted
/// sweep resumes where it left off.
#[derive(Debug, Clone)]
pub struct SweepRunner {
    log_root: PathBuf,
    epochs: usize,
    patience: usize,
    seed: u64,
    grid_points: usize,
}

impl SweepRunner {
    pub fn new(log_root: impl Into<PathBuf>) -> Self {
        Self { log_root: log_root.into(), epochs: 15, patience: 15, seed: 42, grid_points: 10 }
    }

    /// Epoch budget per run
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Early-stopping patience in epochs
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Seed for weight init and batch shuffling, shared by every run
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Grid points per continuous domain
    pub fn with_grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }

    pub fn log_root(&self) -> &Path {
        &self.log_root
    }

    fn trainer_for(&self, run_dir: &Path) -> Trainer {
        let mut trainer = Trainer::new(TrainConfig {
            max_epochs: self.epochs,
            max_grad_norm: Some(5.0),
            seed: self.seed,
        });
        trainer.add_callback(NanGuard::new());
        trainer.add_callback(EarlyStopping::new(self.patience, 1e-4));
        trainer.add_callback(CheckpointCallback::new(run_dir));
        trainer.add_callback(MetricLogger::new(run_dir));
        trainer
    }

    /// Prepare a run directory, or `None` when it already exists
    fn claim_run_dir(&self, config: &Configuration) -> Result<Option<PathBuf>> {
        let dir = self.log_root.join(config.dir_name());
        if dir.exists() {
            eprintln!("sweep: run directory exists, skipping {}", dir.display());
            return Ok(None);
        }
        std::fs::create_dir_all(&dir)?;
        Ok(Some(dir))
    }

    fn write_hparams<H: Serialize>(dir: &Path, hparams: &H) -> Result<()> {
        let json = serde_json::to_string_pretty(hparams)?;
        std::fs::write(dir.join("hparams.json"), json)?;
        Ok(())
    }

    fn outcome(config: &Configuration, result: &TrainResult) -> RunOutcome {
        let status = if result.diverged { RunStatus::Diverged } else { RunStatus::Completed };
        RunOutcome {
            dir_name: config.dir_name(),
            status,
            final_loss: Some(result.final_loss),
            best_val_loss: result.best_val_loss,
            epochs_run: Some(result.final_epoch + 1),
        }
    }

    fn skipped(config: &Configuration) -> RunOutcome {
        RunOutcome {
            dir_name: config.dir_name(),
            status: RunStatus::Skipped,
            final_loss: None,
            best_val_loss: None,
            epochs_run: None,
        }
    }

    /// Sweep the autoencoder grid over feature matrices `(rows, features)`.
    ///
    /// Targets equal inputs; `val` drives validation loss, early stopping
    /// and checkpoint selection. A `val` whose feature width differs from
    /// `train` fails with a shape error before any training step runs.
    pub fn run_vae_sweep(
        &self,
        space: &SweepSpace,
        train: &Array2<f32>,
        val: &Array2<f32>,
    ) -> Result<SweepReport> {
        let grid = GridSweep::new(space, self.grid_points)?;

        // parse every configuration up front so a malformed space fails
        // before any training starts
        let parsed: Vec<(Configuration, VaeHparams)> = grid
            .iter()
            .map(|config| VaeHparams::from_configuration(&config).map(|hp| (config, hp)))
            .collect::<Result<_>>()?;

        let mut report = SweepReport::default();
        for (config, hp) in &parsed {
            let Some(dir) = self.claim_run_dir(config)? else {
                report.runs.push(Self::skipped(config));
                continue;
            };
            Self::write_hparams(&dir, hp)?;

            let mut rng = StdRng::seed_from_u64(self.seed);
            let vae_config = VaeConfig {
                input_dim: train.ncols(),
                intermediate_dim: hp.intermediate_dim,
                latent_dim: hp.latent_dim,
            };
            let mut model = Vae::new(vae_config, CyclicalAnnealing::default(), &mut rng);
            model.validate_input_shape(val.dim())?;
            let mut optimizer = Adam::with_lr(hp.learning_rate as f32);
            let mut trainer = self.trainer_for(&dir);

            let val_batches = dense_batches(val, val, hp.batch_size, None);
            let result = trainer.fit(
                &mut model,
                &mut optimizer,
                |rng| dense_batches(train, train, hp.batch_size, Some(rng)),
                Some(&val_batches),
            );
            report.runs.push(Self::outcome(config, &result));
        }
        Ok(report)
    }

    /// Sweep the regressor grid over windowed sequences.
    ///
    /// `train_x`/`val_x` are `(examples, window, features)`; targets are
    /// scalar angle deltas. An unsupported architecture anywhere in the
    /// grid fails the whole sweep before any run starts.
    pub fn run_regressor_sweep(
        &self,
        space: &SweepSpace,
        train_x: &Array3<f32>,
        train_y: &Array1<f32>,
        val_x: &Array3<f32>,
        val_y: &Array1<f32>,
    ) -> Result<SweepReport> {
        let grid = GridSweep::new(space, self.grid_points)?;
        let feature_dim = train_x.dim().2;

        let parsed: Vec<(Configuration, RegressorHparams)> = grid
            .iter()
            .map(|config| RegressorHparams::from_configuration(&config).map(|hp| (config, hp)))
            .collect::<Result<_>>()?;
        for (_, hp) in &parsed {
            if !(1..=2).contains(&hp.hidden_layers) {
                return Err(ModelError::UnsupportedHiddenLayers(hp.hidden_layers).into());
            }
        }

        let mut report = SweepReport::default();
        for (config, hp) in &parsed {
            let Some(dir) = self.claim_run_dir(config)? else {
                report.runs.push(Self::skipped(config));
                continue;
            };
            Self::write_hparams(&dir, hp)?;

            let mut rng = StdRng::seed_from_u64(self.seed);
            let regressor_config = RegressorConfig {
                cell: hp.cell,
                hidden_layers: hp.hidden_layers,
                hidden_units: hp.hidden_units,
                dropout: hp.dropout as f32,
                window_size: hp.window_size,
                feature_dim,
            };
            let mut model = RnnRegressor::build(regressor_config, &mut rng)?;
            model.validate_input_shape(train_x.dim().1, feature_dim)?;
            model.validate_input_shape(val_x.dim().1, val_x.dim().2)?;
            let mut optimizer = Adam::with_lr(hp.learning_rate as f32);
            let mut trainer = self.trainer_for(&dir);

            let val_batches = seq_batches(val_x, val_y, hp.batch_size, None);
            let result = trainer.fit(
                &mut model,
                &mut optimizer,
                |rng| seq_batches(train_x, train_y, hp.batch_size, Some(rng)),
                Some(&val_batches),
            );
            report.runs.push(Self::outcome(config, &result));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::space::ParameterDomain;
    use ndarray::{Array1, Array2, Array3};

    fn tiny_vae_space() -> SweepSpace {
        let mut space = SweepSpace::new();
        space.add("lr", ParameterDomain::Levels(vec![0.001]));
        space.add("hd", ParameterDomain::Discrete(vec![8]));
        space.add("lat_dim", ParameterDomain::Discrete(vec![2]));
        space.add("b", ParameterDomain::Discrete(vec![8]));
        space
    }

    fn features(rows: usize) -> Array2<f32> {
        Array2::from_shape_fn((rows, 6), |(i, j)| ((i * 7 + j * 3) % 10) as f32 * 0.1)
    }

    #[test]
    fn test_vae_sweep_trains_and_persists() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1).with_seed(3);
        let train = features(24);
        let val = features(8);

        let report = runner.run_vae_sweep(&tiny_vae_space(), &train, &val).unwrap();
        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.completed(), 1);
        assert!(report.runs[0].final_loss.unwrap().is_finite());

        let run_dir = root.path().join("lr=0.00100-hd=8-lat_dim=2-b=8");
        assert!(run_dir.join("hparams.json").exists());
        assert!(run_dir.join("metrics.jsonl").exists());
    }

    #[test]
    fn test_vae_sweep_skips_existing_run() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1).with_seed(3);
        let train = features(24);
        let val = features(8);

        let first = runner.run_vae_sweep(&tiny_vae_space(), &train, &val).unwrap();
        assert_eq!(first.completed(), 1);

        let second = runner.run_vae_sweep(&tiny_vae_space(), &train, &val).unwrap();
        assert_eq!(second.skipped(), 1);
        assert_eq!(second.completed(), 0);
    }

    #[test]
    fn test_regressor_sweep_rejects_bad_depth_before_training() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1);

        let mut space = SweepSpace::new();
        space.add("rnn", ParameterDomain::Categorical(vec!["gru".to_string()]));
        space.add("hidden_layers", ParameterDomain::Discrete(vec![1, 3]));
        space.add("hidden_units", ParameterDomain::Discrete(vec![4]));
        space.add("dropout", ParameterDomain::Levels(vec![0.0]));
        space.add("lr", ParameterDomain::Levels(vec![0.001]));
        space.add("b", ParameterDomain::Discrete(vec![4]));
        space.add("window", ParameterDomain::Discrete(vec![5]));

        let x = Array3::<f32>::zeros((8, 5, 3));
        let y = Array1::<f32>::zeros(8);
        let err = runner.run_regressor_sweep(&space, &x, &y, &x, &y).unwrap_err();
        assert!(matches!(err, crate::sweep::SweepError::Model(_)));
        // fail-fast: not even the valid depth-1 run directory was created
        assert!(std::fs::read_dir(root.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_regressor_sweep_single_run() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1).with_seed(9);

        let mut space = SweepSpace::new();
        space.add("rnn", ParameterDomain::Categorical(vec!["vanilla".to_string()]));
        space.add("hidden_layers", ParameterDomain::Discrete(vec![1]));
        space.add("hidden_units", ParameterDomain::Discrete(vec![6]));
        space.add("dropout", ParameterDomain::Levels(vec![0.0]));
        space.add("lr", ParameterDomain::Levels(vec![0.001]));
        space.add("b", ParameterDomain::Discrete(vec![8]));
        space.add("window", ParameterDomain::Discrete(vec![4]));

        let x = Array3::from_shape_fn((16, 4, 3), |(i, t, f)| ((i + t + f) % 5) as f32 * 0.2);
        let y = Array1::from_shape_fn(16, |i| (i % 3) as f32 * 0.1);

        let report = runner.run_regressor_sweep(&space, &x, &y, &x, &y).unwrap();
        assert_eq!(report.completed(), 1);
        let outcome = &report.runs[0];
        assert!(outcome.final_loss.unwrap().is_finite());
        assert!(outcome.best_val_loss.unwrap().is_finite());
        assert_eq!(outcome.epochs_run, Some(1));
    }

    #[test]
    fn test_vae_sweep_rejects_val_width_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1);
        let train = features(24);
        // validation matrix one feature narrower than the training data
        let val = Array2::<f32>::zeros((8, 5));

        let err = runner.run_vae_sweep(&tiny_vae_space(), &train, &val).unwrap_err();
        assert!(matches!(
            err,
            crate::sweep::SweepError::Model(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_regressor_sweep_rejects_val_window_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1);

        let mut space = SweepSpace::new();
        space.add("rnn", ParameterDomain::Categorical(vec!["gru".to_string()]));
        space.add("hidden_layers", ParameterDomain::Discrete(vec![1]));
        space.add("hidden_units", ParameterDomain::Discrete(vec![4]));
        space.add("dropout", ParameterDomain::Levels(vec![0.0]));
        space.add("lr", ParameterDomain::Levels(vec![0.001]));
        space.add("b", ParameterDomain::Discrete(vec![4]));
        space.add("window", ParameterDomain::Discrete(vec![5]));

        let train_x = Array3::<f32>::zeros((8, 5, 3));
        let train_y = Array1::<f32>::zeros(8);
        // validation windows are one timestep short
        let val_x = Array3::<f32>::zeros((8, 4, 3));
        let val_y = Array1::<f32>::zeros(8);

        let err = runner
            .run_regressor_sweep(&space, &train_x, &train_y, &val_x, &val_y)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::sweep::SweepError::Model(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_regressor_sweep_rejects_window_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let runner = SweepRunner::new(root.path()).with_epochs(1);

        let mut space = SweepSpace::new();
        space.add("rnn", ParameterDomain::Categorical(vec!["vanilla".to_string()]));
        space.add("hidden_layers", ParameterDomain::Discrete(vec![1]));
        space.add("hidden_units", ParameterDomain::Discrete(vec![4]));
        space.add("dropout", ParameterDomain::Levels(vec![0.0]));
        space.add("lr", ParameterDomain::Levels(vec![0.001]));
        space.add("b", ParameterDomain::Discrete(vec![4]));
        // data windows are 5 timesteps long, configuration asks for 9
        space.add("window", ParameterDomain::Discrete(vec![9]));

        let x = Array3::<f32>::zeros((8, 5, 3));
        let y = Array1::<f32>::zeros(8);
        let err = runner.run_regressor_sweep(&space, &x, &y, &x, &y).unwrap_err();
        assert!(matches!(err, crate::sweep::SweepError::Model(_)));
    }

    #[test]
    fn test_report_best_run() {
        let report = SweepReport {
            runs: vec![
                RunOutcome {
                    dir_name: "a".to_string(),
                    status: RunStatus::Completed,
                    final_loss: Some(0.5),
                    best_val_loss: Some(0.4),
                    epochs_run: Some(3),
                },
                RunOutcome {
                    dir_name: "b".to_string(),
                    status: RunStatus::Completed,
                    final_loss: Some(0.3),
                    best_val_loss: Some(0.2),
                    epochs_run: Some(3),
                },
                RunOutcome {
                    dir_name: "c".to_string(),
                    status: RunStatus::Diverged,
                    final_loss: Some(f32::NAN),
                    best_val_loss: None,
                    epochs_run: Some(1),
                },
            ],
        };
        assert_eq!(report.best_run().unwrap().dir_name, "b");
        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 1);
    }
}
