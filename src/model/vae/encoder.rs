//! Encoder: kinematic features to latent distribution parameters

use ndarray::Array2;
use rand::Rng;

use crate::model::{relu, relu_backward, Dense};
use crate::optim::ParamMut;

/// Maps an input batch to the `(mean, log_var)` parameters of the latent
/// Gaussian: one shared ReLU projection followed by two parallel linear
/// heads.
#[derive(Debug, Clone)]
pub struct Encoder {
    proj: Dense,
    mean_head: Dense,
    log_var_head: Dense,
    pre: Option<Array2<f32>>,
}

impl Encoder {
    pub fn new<R: Rng>(
        input_dim: usize,
        intermediate_dim: usize,
        latent_dim: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            proj: Dense::new(input_dim, intermediate_dim, rng),
            mean_head: Dense::new(intermediate_dim, latent_dim, rng),
            log_var_head: Dense::new(intermediate_dim, latent_dim, rng),
            pre: None,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.proj.in_dim()
    }

    pub fn latent_dim(&self) -> usize {
        self.mean_head.out_dim()
    }

    /// Forward pass caching activations for `backward`
    pub fn forward(&mut self, x: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let pre = self.proj.forward(x);
        let h = relu(&pre);
        self.pre = Some(pre);
        (self.mean_head.forward(&h), self.log_var_head.forward(&h))
    }

    /// Gradient-free forward pass
    pub fn infer(&self, x: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let h = relu(&self.proj.infer(x));
        (self.mean_head.infer(&h), self.log_var_head.infer(&h))
    }

    /// Backpropagate head gradients through the shared projection
    pub fn backward(&mut self, d_mean: &Array2<f32>, d_log_var: &Array2<f32>) -> Array2<f32> {
        let dh = self.mean_head.backward(d_mean) + self.log_var_head.backward(d_log_var);
        let pre = self.pre.take().expect("backward called before forward");
        let da = relu_backward(&pre, &dh);
        self.proj.backward(&da)
    }

    pub fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = self.proj.params_mut();
        params.extend(self.mean_head.params_mut());
        params.extend(self.log_var_head.params_mut());
        params
    }
}
