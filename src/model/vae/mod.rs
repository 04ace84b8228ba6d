//! Variational autoencoder over kinematic feature vectors
//!
//! Wires encoder → reparameterized sampling → decoder, with the KL term
//! fed by the encoder's `(mean, log_var)` output and scaled by the
//! cyclical annealing weight for the current global step. Reconstruction
//! and KL losses stay separately visible in the step metrics so training
//! curves can be inspected independently.

mod decoder;
mod encoder;
mod sampling;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use sampling::{kl_divergence, reparameterize};

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::optim::ParamMut;
use crate::train::{CyclicalAnnealing, DenseBatch, StepOutput, Trainable};

use super::error::Result;
use super::ModelError;

/// Architecture of the autoencoder
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VaeConfig {
    /// Feature dimension of the input (18 kinematic joint angles)
    pub input_dim: usize,
    /// Width of the shared hidden projection
    pub intermediate_dim: usize,
    /// Latent space dimension
    pub latent_dim: usize,
}

impl Default for VaeConfig {
    fn default() -> Self {
        Self { input_dim: 18, intermediate_dim: 64, latent_dim: 2 }
    }
}

/// End-to-end trainable autoencoder
pub struct Vae {
    encoder: Encoder,
    decoder: Decoder,
    annealing: CyclicalAnnealing,
    config: VaeConfig,
}

impl Vae {
    pub fn new<R: Rng>(config: VaeConfig, annealing: CyclicalAnnealing, rng: &mut R) -> Self {
        Self {
            encoder: Encoder::new(config.input_dim, config.intermediate_dim, config.latent_dim, rng),
            decoder: Decoder::new(config.input_dim, config.intermediate_dim, config.latent_dim, rng),
            annealing,
            config,
        }
    }

    pub fn config(&self) -> &VaeConfig {
        &self.config
    }

    /// Check a dataset's `(rows, features)` against the declared input width
    pub fn validate_input_shape(&self, shape: (usize, usize)) -> Result<()> {
        let expected = (shape.0, self.config.input_dim);
        if shape != expected {
            return Err(ModelError::ShapeMismatch { expected, actual: shape });
        }
        Ok(())
    }

    /// Encode a batch without touching gradient state
    pub fn encode(&self, x: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        self.encoder.infer(x)
    }

    /// Deterministic reconstruction through the latent mean
    pub fn reconstruct(&self, x: &Array2<f32>) -> Array2<f32> {
        let (mean, _) = self.encoder.infer(x);
        self.decoder.infer(&mean)
    }
}

impl Trainable for Vae {
    type Batch = DenseBatch;

    fn train_step(&mut self, batch: &DenseBatch, global_step: u64, rng: &mut StdRng) -> StepOutput {
        let x = &batch.inputs;
        assert_eq!(x.ncols(), self.config.input_dim, "VAE input width mismatch");

        let (batch_size, input_dim) = x.dim();
        let latent_dim = self.config.latent_dim;

        // forward
        let (mean, log_var) = self.encoder.forward(x);
        let (z, eps) = reparameterize(&mean, &log_var, rng);
        let recon = self.decoder.forward(&z);

        let diff = &recon - x;
        let n_recon = (batch_size * input_dim) as f32;
        let recon_mse = diff.mapv(|v| v * v).sum() / n_recon;
        let recon_mae = diff.mapv(f32::abs).sum() / n_recon;
        let kl = kl_divergence(&mean, &log_var);
        let weight = self.annealing.weight(global_step);
        let total = recon_mse + weight * kl;

        // backward: reconstruction path through the decoder into z
        let d_recon = diff.mapv(|v| 2.0 * v / n_recon);
        let dz = self.decoder.backward(&d_recon);

        // sampling path: z = mean + exp(0.5 log_var) * eps
        // d_mean gets dz directly, d_log_var gets dz * eps * 0.5 exp(0.5 log_var)
        let n_latent = (batch_size * latent_dim) as f32;
        let half_std = log_var.mapv(|v| 0.5 * (0.5 * v).exp());
        let mut d_mean = dz.clone();
        let mut d_log_var = &dz * &eps * &half_std;

        // KL path, scaled by the annealing weight:
        // d(kl)/d(mean) = mean / n, d(kl)/d(log_var) = 0.5 (exp(log_var) - 1) / n
        d_mean += &mean.mapv(|m| weight * m / n_latent);
        d_log_var += &log_var.mapv(|v| weight * 0.5 * (v.exp() - 1.0) / n_latent);

        self.encoder.backward(&d_mean, &d_log_var);

        StepOutput {
            loss: total,
            metrics: vec![
                ("recon_mse", recon_mse),
                ("recon_mae", recon_mae),
                ("kl", kl),
                ("kl_weight", weight),
            ],
        }
    }

    fn eval_step(&mut self, batch: &DenseBatch) -> StepOutput {
        let x = &batch.inputs;
        let (mean, log_var) = self.encoder.infer(x);
        // evaluation decodes the latent mean instead of sampling
        let recon = self.decoder.infer(&mean);

        let diff = &recon - x;
        let n = x.len() as f32;
        let recon_mse = diff.mapv(|v| v * v).sum() / n;
        let recon_mae = diff.mapv(f32::abs).sum() / n;
        let kl = kl_divergence(&mean, &log_var);

        StepOutput {
            loss: recon_mse + kl,
            metrics: vec![("recon_mse", recon_mse), ("recon_mae", recon_mae), ("kl", kl)],
        }
    }

    fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = self.encoder.params_mut();
        params.extend(self.decoder.params_mut());
        params
    }
}
