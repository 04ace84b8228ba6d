//! Gated recurrent unit cell

use ndarray::Array2;
use rand::Rng;

use crate::model::{relu, relu_backward, sigmoid};
use crate::optim::ParamMut;

use super::cell::{Cell, Gate};

#[derive(Debug)]
struct GruCache {
    x: Array2<f32>,
    h_prev: Array2<f32>,
    z: Array2<f32>,
    r: Array2<f32>,
    hh: Array2<f32>,
    hh_pre: Array2<f32>,
}

/// GRU cell with sigmoid update/reset gates and a ReLU candidate:
///
/// ```text
/// z = σ(x Wz + h Uz + bz)
/// r = σ(x Wr + h Ur + br)
/// ĥ = relu(x Wh + (r ⊙ h) Uh + bh)
/// h' = z ⊙ h + (1 - z) ⊙ ĥ
/// ```
#[derive(Debug)]
pub(crate) struct GruCell {
    update: Gate,
    reset: Gate,
    candidate: Gate,
    features: usize,
    hidden: usize,
    caches: Vec<GruCache>,
}

impl GruCell {
    pub fn new<R: Rng>(features: usize, hidden: usize, rng: &mut R) -> Self {
        Self {
            update: Gate::new(features, hidden, rng),
            reset: Gate::new(features, hidden, rng),
            candidate: Gate::new(features, hidden, rng),
            features,
            hidden,
            caches: Vec::new(),
        }
    }
}

impl Cell for GruCell {
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
        let z = sigmoid(&self.update.pre(x_t, h_prev));
        let r = sigmoid(&self.reset.pre(x_t, h_prev));
        let rh = &r * h_prev;
        let hh_pre = self.candidate.pre(x_t, &rh);
        let hh = relu(&hh_pre);
        let h_new = &z * h_prev + &(&hh - &(&z * &hh));

        self.caches.push(GruCache {
            x: x_t.clone(),
            h_prev: h_prev.clone(),
            z,
            r,
            hh,
            hh_pre,
        });
        h_new
    }

    fn backstep(&mut self, dh: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let c = self.caches.pop().expect("backstep without matching step");

        // h' = z h + (1 - z) ĥ
        let dz = dh * &(&c.h_prev - &c.hh);
        let dhh = dh * &c.z.mapv(|v| 1.0 - v);
        let mut dh_prev = dh * &c.z;

        // candidate: ĥ = relu(x Wh + (r ⊙ h) Uh + bh)
        let dhh_pre = relu_backward(&c.hh_pre, &dhh);
        let rh = &c.r * &c.h_prev;
        self.candidate.accumulate(&dhh_pre, &c.x, &rh);
        let drh = dhh_pre.dot(&self.candidate.wh);
        let dr = &drh * &c.h_prev;
        dh_prev += &(&drh * &c.r);

        // gate sigmoids
        let dz_pre = &dz * &c.z.mapv(|v| v * (1.0 - v));
        let dr_pre = &dr * &c.r.mapv(|v| v * (1.0 - v));
        self.update.accumulate(&dz_pre, &c.x, &c.h_prev);
        self.reset.accumulate(&dr_pre, &c.x, &c.h_prev);

        let dx = dhh_pre.dot(&self.candidate.wx)
            + dz_pre.dot(&self.update.wx)
            + dr_pre.dot(&self.reset.wx);
        dh_prev += &dz_pre.dot(&self.update.wh);
        dh_prev += &dr_pre.dot(&self.reset.wh);

        (dx, dh_prev)
    }

    fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = self.update.params_mut();
        params.extend(self.reset.params_mut());
        params.extend(self.candidate.params_mut());
        params
    }
}
