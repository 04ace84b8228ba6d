//! Training infrastructure: batching, the trainer loop, callbacks,
//! metrics and KL annealing
//!
//! # Example
//!
//! ```rust,no_run
//! use kinetrain::model::vae::{Vae, VaeConfig};
//! use kinetrain::optim::Adam;
//! use kinetrain::train::{dense_batches, CyclicalAnnealing, EarlyStopping, TrainConfig, Trainer};
//! use ndarray::Array2;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let features = Array2::<f32>::zeros((128, 18));
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut model = Vae::new(VaeConfig::default(), CyclicalAnnealing::default(), &mut rng);
//! let mut optimizer = Adam::with_lr(0.001);
//! let mut trainer = Trainer::new(TrainConfig::default());
//! trainer.add_callback(EarlyStopping::new(15, 1e-4));
//!
//! let result = trainer.fit(
//!     &mut model,
//!     &mut optimizer,
//!     |rng| dense_batches(&features, &features, 32, Some(rng)),
//!     None,
//! );
//! println!("final loss {:.4}", result.final_loss);
//! ```

mod annealing;
mod batch;
pub mod callback;
mod metrics;
mod trainer;

pub use annealing::CyclicalAnnealing;
pub use batch::{dense_batches, seq_batches, DenseBatch, SeqBatch};
pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, CheckpointCallback, EarlyStopping,
    MetricLogger, NanGuard, ProgressCallback, TrainerCallback,
};
pub use metrics::{EpochRecord, Mae, Metric, MetricsTracker, Mse, R2Score, Rmse};
pub use trainer::{StepOutput, TrainConfig, TrainResult, Trainable, Trainer};
