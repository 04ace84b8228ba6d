//! Long short-term memory cell

use ndarray::Array2;
use rand::Rng;

use crate::model::{relu, relu_backward, sigmoid};
use crate::optim::ParamMut;

use super::cell::{Cell, Gate};

#[derive(Debug)]
struct LstmCache {
    x: Array2<f32>,
    h_prev: Array2<f32>,
    c_prev: Array2<f32>,
    i: Array2<f32>,
    f: Array2<f32>,
    g: Array2<f32>,
    o: Array2<f32>,
    g_pre: Array2<f32>,
    c_new: Array2<f32>,
}

/// LSTM cell with sigmoid gates and ReLU candidate/output activation:
///
/// ```text
/// i = σ(..)  f = σ(..)  o = σ(..)  g = relu(..)
/// c' = f ⊙ c + i ⊙ g
/// h' = o ⊙ relu(c')
/// ```
///
/// Cell state lives on the struct and is rebuilt by `reset` per sequence;
/// the backward pass threads `dc` across backsteps the same way.
#[derive(Debug)]
pub(crate) struct LstmCell {
    input_gate: Gate,
    forget_gate: Gate,
    candidate: Gate,
    output_gate: Gate,
    features: usize,
    hidden: usize,
    c: Array2<f32>,
    dc: Array2<f32>,
    caches: Vec<LstmCache>,
}

impl LstmCell {
    pub fn new<R: Rng>(features: usize, hidden: usize, rng: &mut R) -> Self {
        Self {
            input_gate: Gate::new(features, hidden, rng),
            forget_gate: Gate::new(features, hidden, rng),
            candidate: Gate::new(features, hidden, rng),
            output_gate: Gate::new(features, hidden, rng),
            features,
            hidden,
            c: Array2::zeros((0, hidden)),
            dc: Array2::zeros((0, hidden)),
            caches: Vec::new(),
        }
    }
}

impl Cell for LstmCell {
    fn hidden_units(&self) -> usize {
        self.hidden
    }

    fn feature_dim(&self) -> usize {
        self.features
    }

    fn reset(&mut self, batch: usize) {
        self.c = Array2::zeros((batch, self.hidden));
        self.dc = Array2::zeros((batch, self.hidden));
        self.caches.clear();
    }

    fn step(&mut self, x_t: &Array2<f32>, h_prev: &Array2<f32>) -> Array2<f32> {
        let i = sigmoid(&self.input_gate.pre(x_t, h_prev));
        let f = sigmoid(&self.forget_gate.pre(x_t, h_prev));
        let g_pre = self.candidate.pre(x_t, h_prev);
        let g = relu(&g_pre);
        let o = sigmoid(&self.output_gate.pre(x_t, h_prev));

        let c_prev = self.c.clone();
        let c_new = &f * &c_prev + &(&i * &g);
        let h_new = &o * &relu(&c_new);

        self.c = c_new.clone();
        self.caches.push(LstmCache {
            x: x_t.clone(),
            h_prev: h_prev.clone(),
            c_prev,
            i,
            f,
            g,
            o,
            g_pre,
            c_new,
        });
        h_new
    }

    fn backstep(&mut self, dh: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let cache = self.caches.pop().expect("backstep without matching step");

        // h' = o ⊙ relu(c'), plus dc carried from the later timestep
        let do_ = dh * &relu(&cache.c_new);
        let dc_from_h = relu_backward(&cache.c_new, &(dh * &cache.o));
        let dc = &self.dc + &dc_from_h;

        // c' = f ⊙ c + i ⊙ g
        let di = &dc * &cache.g;
        let dg = &dc * &cache.i;
        let df = &dc * &cache.c_prev;
        self.dc = &dc * &cache.f;

        let di_pre = &di * &cache.i.mapv(|v| v * (1.0 - v));
        let df_pre = &df * &cache.f.mapv(|v| v * (1.0 - v));
        let dg_pre = relu_backward(&cache.g_pre, &dg);
        let do_pre = &do_ * &cache.o.mapv(|v| v * (1.0 - v));

        self.input_gate.accumulate(&di_pre, &cache.x, &cache.h_prev);
        self.forget_gate.accumulate(&df_pre, &cache.x, &cache.h_prev);
        self.candidate.accumulate(&dg_pre, &cache.x, &cache.h_prev);
        self.output_gate.accumulate(&do_pre, &cache.x, &cache.h_prev);

        let dx = di_pre.dot(&self.input_gate.wx)
            + df_pre.dot(&self.forget_gate.wx)
            + dg_pre.dot(&self.candidate.wx)
            + do_pre.dot(&self.output_gate.wx);
        let dh_prev = di_pre.dot(&self.input_gate.wh)
            + df_pre.dot(&self.forget_gate.wh)
            + dg_pre.dot(&self.candidate.wh)
            + do_pre.dot(&self.output_gate.wh);

        (dx, dh_prev)
    }

    fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = self.input_gate.params_mut();
        params.extend(self.forget_gate.params_mut());
        params.extend(self.candidate.params_mut());
        params.extend(self.output_gate.params_mut());
        params
    }
}
