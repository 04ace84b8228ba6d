//! Stochastic gradient descent with optional momentum

use super::{Optimizer, ParamMut};

/// SGD optimizer with optional momentum
pub struct Sgd {
    lr: f32,
    momentum: f32,
    velocities: Vec<Vec<f32>>,
}

impl Sgd {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self { lr, momentum, velocities: Vec::new() }
    }

    fn ensure_state(&mut self, params: &[ParamMut<'_>]) {
        if self.velocities.len() != params.len() {
            self.velocities = params.iter().map(|p| vec![0.0; p.value.len()]).collect();
        }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [ParamMut<'_>]) {
        self.ensure_state(params);
        for (i, p) in params.iter_mut().enumerate() {
            if self.momentum > 0.0 {
                let vel = &mut self.velocities[i];
                for ((w, &g), v) in p.value.iter_mut().zip(p.grad.iter()).zip(vel.iter_mut()) {
                    *v = self.momentum * *v - self.lr * g;
                    *w += *v;
                }
            } else {
                for (w, &g) in p.value.iter_mut().zip(p.grad.iter()) {
                    *w -= self.lr * g;
                }
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgd_descends_quadratic() {
        let mut x = vec![4.0_f32];
        let mut grad = vec![0.0_f32];
        let mut sgd = Sgd::new(0.1, 0.0);
        for _ in 0..100 {
            grad[0] = 2.0 * x[0];
            let mut params = vec![ParamMut { value: &mut x, grad: &mut grad }];
            sgd.step(&mut params);
        }
        assert!(x[0].abs() < 1e-3);
    }

    #[test]
    fn test_momentum_accelerates() {
        let mut x_plain = vec![4.0_f32];
        let mut x_mom = vec![4.0_f32];
        let mut grad = vec![0.0_f32];
        let mut plain = Sgd::new(0.01, 0.0);
        let mut mom = Sgd::new(0.01, 0.9);

        for _ in 0..20 {
            grad[0] = 2.0 * x_plain[0];
            plain.step(&mut [ParamMut { value: &mut x_plain, grad: &mut grad }]);
        }
        for _ in 0..20 {
            grad[0] = 2.0 * x_mom[0];
            mom.step(&mut [ParamMut { value: &mut x_mom, grad: &mut grad }]);
        }
        assert!(x_mom[0].abs() < x_plain[0].abs());
    }
}
