//! Model families and their building blocks
//!
//! Two model families share the primitives in this module:
//! - `vae` - variational autoencoder over kinematic feature vectors
//! - `rnn` - recurrent regressors (vanilla/GRU/LSTM) for angle-delta prediction
//!
//! Layers are plain weight structs with explicit `forward`/`backward`
//! methods. Gradients accumulate next to the weights and are exposed to
//! optimizers through [`crate::optim::ParamMut`] views.

mod dense;
mod error;
mod init;
pub mod rnn;
pub mod vae;

pub use dense::Dense;
pub use error::ModelError;
pub use init::{normal_matrix, standard_normal, xavier_init};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Flat copy of every parameter tensor in a model, in `params_mut` order.
///
/// Used for best-checkpoint persistence: cheap to clone for the models in
/// this crate (tens of thousands of floats at most).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightSnapshot {
    /// One flat vector per parameter tensor
    pub tensors: Vec<Vec<f32>>,
}

impl WeightSnapshot {
    /// Total number of scalar parameters
    pub fn num_params(&self) -> usize {
        self.tensors.iter().map(Vec::len).sum()
    }
}

pub(crate) fn relu(x: &Array2<f32>) -> Array2<f32> {
    x.mapv(|v| v.max(0.0))
}

/// Upstream gradient masked by the ReLU derivative at `pre`
pub(crate) fn relu_backward(pre: &Array2<f32>, upstream: &Array2<f32>) -> Array2<f32> {
    let mut out = upstream.clone();
    out.zip_mut_with(pre, |g, &a| {
        if a <= 0.0 {
            *g = 0.0;
        }
    });
    out
}

pub(crate) fn sigmoid(x: &Array2<f32>) -> Array2<f32> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}
