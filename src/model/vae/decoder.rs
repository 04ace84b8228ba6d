//! Decoder: latent vector back to reconstructed features

use ndarray::Array2;
use rand::Rng;

use crate::model::{relu, relu_backward, Dense};
use crate::optim::ParamMut;

/// Mirror of the encoder: ReLU projection from latent space, then a linear
/// output with no non-linearity, since reconstructed kinematic angles are
/// unbounded continuous values.
#[derive(Debug, Clone)]
pub struct Decoder {
    proj: Dense,
    out: Dense,
    pre: Option<Array2<f32>>,
}

impl Decoder {
    pub fn new<R: Rng>(
        original_dim: usize,
        intermediate_dim: usize,
        latent_dim: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            proj: Dense::new(latent_dim, intermediate_dim, rng),
            out: Dense::new(intermediate_dim, original_dim, rng),
            pre: None,
        }
    }

    pub fn output_dim(&self) -> usize {
        self.out.out_dim()
    }

    pub fn forward(&mut self, z: &Array2<f32>) -> Array2<f32> {
        let pre = self.proj.forward(z);
        let h = relu(&pre);
        self.pre = Some(pre);
        self.out.forward(&h)
    }

    pub fn infer(&self, z: &Array2<f32>) -> Array2<f32> {
        self.out.infer(&relu(&self.proj.infer(z)))
    }

    /// Backpropagate reconstruction gradients, returning `d_z`
    pub fn backward(&mut self, d_recon: &Array2<f32>) -> Array2<f32> {
        let dh = self.out.backward(d_recon);
        let pre = self.pre.take().expect("backward called before forward");
        let da = relu_backward(&pre, &dh);
        self.proj.backward(&da)
    }

    pub fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = self.proj.params_mut();
        params.extend(self.out.params_mut());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_forward_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dec = Decoder::new(18, 30, 2, &mut rng);
        let z = Array2::zeros((16, 2));
        assert_eq!(dec.forward(&z).dim(), (16, 18));
    }

    #[test]
    fn test_backward_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dec = Decoder::new(18, 30, 2, &mut rng);
        let z = Array2::ones((4, 2));
        let recon = dec.forward(&z);
        let dz = dec.backward(&Array2::ones(recon.dim()));
        assert_eq!(dz.dim(), (4, 2));
    }
}
