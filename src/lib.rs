//! Training and hyperparameter sweeps for kinematic time-series models.
//!
//! Two model families over kinematic/muscle recordings:
//! - a variational autoencoder compressing per-frame joint-angle vectors
//!   into a small latent space, trained with cyclically annealed KL
//! - recurrent regressors (vanilla RNN / GRU / LSTM) predicting a scalar
//!   angle delta from a windowed feature sequence
//!
//! The crate's core is the sweep machinery: ordered hyperparameter spaces,
//! lazy grid enumeration, deterministic run-directory naming, and a
//! sequential runner that trains one model per configuration with early
//! stopping, best checkpointing and JSON metric logs.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use kinetrain::sweep::{default_vae_space, SweepRunner};
//! use ndarray::Array2;
//!
//! let train = Array2::<f32>::zeros((1000, 18));
//! let val = Array2::<f32>::zeros((200, 18));
//!
//! let runner = SweepRunner::new("logs/vae").with_epochs(15);
//! let report = runner.run_vae_sweep(&default_vae_space(), &train, &val).unwrap();
//! println!("{} runs completed, {} skipped", report.completed(), report.skipped());
//! ```

pub mod model;
pub mod optim;
pub mod sweep;
pub mod train;

pub use model::rnn::{CellKind, RegressorConfig, RnnRegressor};
pub use model::vae::{Vae, VaeConfig};
pub use model::{ModelError, WeightSnapshot};
pub use optim::{Adam, Optimizer, ParamMut, Sgd};
pub use sweep::{GridSweep, SweepError, SweepRunner, SweepSpace};
pub use train::{CyclicalAnnealing, TrainConfig, Trainable, Trainer};
