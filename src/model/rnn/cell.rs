//! Recurrent cell abstraction and the vanilla RNN cell

use ndarray::{Array1, Array2, Axis};
use rand::Rng;

use crate::model::init::xavier_init;
use crate::model::{relu, relu_backward};
use crate::optim::ParamMut;

/// One recurrent cell stepped across a sequence.
///
/// `step` caches what its matching `backstep` needs; `backstep` consumes
/// cached steps in reverse order, so callers must unwind exactly as many
/// backsteps as steps taken since the last `reset`.
pub(crate) trait Cell: std::fmt::Debug {
    fn hidden_units(&self) -> usize;
    fn feature_dim(&self) -> usize;

    /// Clear caches and per-sequence state for a new batch
    fn reset(&mut self, batch: usize);

    /// Advance one timestep: `(B, F)` input and `(B, H)` previous hidden
    fn step(&mut self, x_t: &Array2<f32>, h_prev: &Array2<f32>) -> Array2<f32>;

    /// Reverse the most recent un-consumed `step`, returning `(dx_t, dh_prev)`
    fn backstep(&mut self, dh: &Array2<f32>) -> (Array2<f32>, Array2<f32>);

    fn params_mut(&mut self) -> Vec<ParamMut<'_>>;
}

/// Per-gate weight bundle: input kernel, recurrent kernel, bias
#[derive(Debug, Clone)]
pub(crate) struct Gate {
    pub wx: Array2<f32>,
    pub wh: Array2<f32>,
    pub b: Array1<f32>,
    pub dwx: Array2<f32>,
    pub dwh: Array2<f32>,
    pub db: Array1<f32>,
}

impl Gate {
    pub fn new<R: Rng>(features: usize, hidden: usize, rng: &mut R) -> Self {
        Self {
            wx: xavier_init(hidden, features, rng),
            wh: xavier_init(hidden, hidden, rng),
            b: Array1::zeros(hidden),
            dwx: Array2::zeros((hidden, features)),
            dwh: Array2::zeros((hidden, hidden)),
            db: Array1::zeros(hidden),
        }
    }

    /// Pre-activation `x Wx^T + h Wh^T + b`
    pub fn pre(&self, x: &Array2<f32>, h: &Array2<f32>) -> Array2<f32> {
        x.dot(&self.wx.t()) + h.dot(&self.wh.t()) + &self.b
    }

    /// Accumulate gradients for a pre-activation gradient `dpre`
    pub fn accumulate(&mut self, dpre: &Array2<f32>, x: &Array2<f32>, h: &Array2<f32>) {
        self.dwx += &dpre.t().dot(x);
        self.dwh += &dpre.t().dot(h);
        self.db += &dpre.sum_axis(Axis(0));
    }

    pub fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        vec![
            ParamMut {
                value: self.wx.as_slice_mut().expect("contiguous"),
                grad: self.dwx.as_slice_mut().expect("contiguous"),
            },
            ParamMut {
                value: self.wh.as_slice_mut().expect("contiguous"),
                grad: self.dwh.as_slice_mut().expect("contiguous"),
            },
            ParamMut {
                value: self.b.as_slice_mut().expect("contiguous"),
                grad: self.db.as_slice_mut().expect("contiguous"),
            },
        ]
    }
}

#[derive(Debug)]
struct VanillaCache {
    x: Array2<f32>,
    h_prev: Array2<f32>,
    pre: Array2<f32>,
}

/// Simple recurrent cell: `h_t = relu(x_t Wx^T + h_{t-1} Wh^T + b)`
#[derive(Debug)]
pub(crate) struct VanillaCell {
    gate: Gate,
    features: usize,
    hidden: usize,
    caches: Vec<VanillaCache>,
}

impl VanillaCell {
    pub fn new<R: Rng>(features: usize, hidden: usize, rng: &mut R) -> Self {
        Self { gate: Gate::new(features, hidden, rng), features, hidden, caches: Vec::new() }
    }
}

impl Cell for VanillaCell {
    fn hidden_units(&self) -> usize {
        self.hidden
    }

    fn feature_dim(&self) -> usize {
        self.features
    }

    fn reset(&mut self, _batch: usize) {
        self.caches.clear();
    }

    fn step(&mut self, x_t: &Array2<f32>, h_prev: &Array2<f32>) -> Array2<f32> {
        let pre = self.gate.pre(x_t, h_prev);
        let h = relu(&pre);
        self.caches.push(VanillaCache { x: x_t.clone(), h_prev: h_prev.clone(), pre });
        h
    }

    fn backstep(&mut self, dh: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let cache = self.caches.pop().expect("backstep without matching step");
        let dpre = relu_backward(&cache.pre, dh);
        self.gate.accumulate(&dpre, &cache.x, &cache.h_prev);
        (dpre.dot(&self.gate.wx), dpre.dot(&self.gate.wh))
    }

    fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        self.gate.params_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_vanilla_step_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cell = VanillaCell::new(4, 8, &mut rng);
        cell.reset(3);
        let x = Array2::ones((3, 4));
        let h0 = Array2::zeros((3, 8));
        let h1 = cell.step(&x, &h0);
        assert_eq!(h1.dim(), (3, 8));
        assert!(h1.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_vanilla_backstep_unwinds() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cell = VanillaCell::new(2, 3, &mut rng);
        cell.reset(1);
        let x = Array2::ones((1, 2));
        let h0 = Array2::zeros((1, 3));
        let h1 = cell.step(&x, &h0);
        let h2 = cell.step(&x, &h1);
        assert_eq!(h2.dim(), (1, 3));

        let dh = Array2::ones((1, 3));
        let (dx2, dh1) = cell.backstep(&dh);
        assert_eq!(dx2.dim(), (1, 2));
        assert_eq!(dh1.dim(), (1, 3));
        let (dx1, _) = cell.backstep(&dh1);
        assert_eq!(dx1.dim(), (1, 2));
    }

    #[test]
    #[should_panic(expected = "backstep without matching step")]
    fn test_backstep_without_step_panics() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cell = VanillaCell::new(2, 3, &mut rng);
        cell.reset(1);
        cell.backstep(&Array2::ones((1, 3)));
    }
}
