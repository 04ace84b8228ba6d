//! Weight initialization and Gaussian sampling helpers

use ndarray::Array2;
use rand::Rng;

/// Draw one standard-normal sample via the Box-Muller transform
pub fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z as f32
}

/// Xavier-initialized weight matrix of shape `(out_dim, in_dim)`
pub fn xavier_init<R: Rng>(out_dim: usize, in_dim: usize, rng: &mut R) -> Array2<f32> {
    let std = (2.0 / (in_dim + out_dim) as f64).sqrt() as f32;
    Array2::from_shape_fn((out_dim, in_dim), |_| standard_normal(rng) * std)
}

/// Matrix of independent `N(0, 1)` draws
pub fn normal_matrix<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |_| standard_normal(rng))
}
