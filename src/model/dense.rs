//! Fully-connected layer with explicit backward pass

use ndarray::{Array1, Array2, Axis};
use rand::Rng;

use crate::optim::ParamMut;

use super::init::xavier_init;

/// Linear layer `y = x W^T + b`
///
/// `forward` caches its input for the subsequent `backward` call, which
/// accumulates weight gradients and returns the gradient with respect to
/// the input. Use `infer` for gradient-free evaluation.
#[derive(Debug, Clone)]
pub struct Dense {
    w: Array2<f32>,
    b: Array1<f32>,
    dw: Array2<f32>,
    db: Array1<f32>,
    input: Option<Array2<f32>>,
}

impl Dense {
    /// Create a layer mapping `in_dim` features to `out_dim`, Xavier-initialized
    pub fn new<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self {
        Self {
            w: xavier_init(out_dim, in_dim, rng),
            b: Array1::zeros(out_dim),
            dw: Array2::zeros((out_dim, in_dim)),
            db: Array1::zeros(out_dim),
            input: None,
        }
    }

    pub fn in_dim(&self) -> usize {
        self.w.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.w.nrows()
    }

    /// Forward pass over a `(batch, in_dim)` matrix, caching the input
    pub fn forward(&mut self, x: &Array2<f32>) -> Array2<f32> {
        assert_eq!(x.ncols(), self.in_dim(), "dense input width mismatch");
        self.input = Some(x.clone());
        x.dot(&self.w.t()) + &self.b
    }

    /// Forward pass without caching, for evaluation
    pub fn infer(&self, x: &Array2<f32>) -> Array2<f32> {
        assert_eq!(x.ncols(), self.in_dim(), "dense input width mismatch");
        x.dot(&self.w.t()) + &self.b
    }

    /// Backward pass: accumulate `dw`/`db` and return the input gradient
    pub fn backward(&mut self, dy: &Array2<f32>) -> Array2<f32> {
        let x = self.input.take().expect("backward called before forward");
        self.dw += &dy.t().dot(&x);
        self.db += &dy.sum_axis(Axis(0));
        dy.dot(&self.w)
    }

    /// Weight/gradient views for the optimizer
    pub fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        vec![
            ParamMut {
                value: self.w.as_slice_mut().expect("contiguous weights"),
                grad: self.dw.as_slice_mut().expect("contiguous gradients"),
            },
            ParamMut {
                value: self.b.as_slice_mut().expect("contiguous bias"),
                grad: self.db.as_slice_mut().expect("contiguous bias gradients"),
            },
        ]
    }
}
