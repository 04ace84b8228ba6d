//! Optimizer trait over parameter/gradient views

/// Mutable view of one parameter tensor and its accumulated gradient.
///
/// Models hand these out in a stable order; optimizers index per-parameter
/// state (moments, velocities) by position in that order.
pub struct ParamMut<'a> {
    pub value: &'a mut [f32],
    pub grad: &'a mut [f32],
}

/// Trait for optimization algorithms
pub trait Optimizer {
    /// Apply one update using the accumulated gradients
    fn step(&mut self, params: &mut [ParamMut<'_>]);

    /// Clear accumulated gradients
    fn zero_grad(&mut self, params: &mut [ParamMut<'_>]) {
        for p in params.iter_mut() {
            p.grad.fill(0.0);
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
