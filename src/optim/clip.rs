//! Global gradient-norm clipping

use super::ParamMut;

/// Scale all gradients so their global L2 norm does not exceed `max_norm`.
///
/// Returns the pre-clip norm.
pub fn clip_grad_norm(params: &mut [ParamMut<'_>], max_norm: f32) -> f32 {
    let total: f32 = params
        .iter()
        .map(|p| p.grad.iter().map(|g| g * g).sum::<f32>())
        .sum();
    let norm = total.sqrt();

    if norm > max_norm && norm > 0.0 {
        let scale = max_norm / norm;
        for p in params.iter_mut() {
            for g in p.grad.iter_mut() {
                *g *= scale;
            }
        }
    }
    norm
}
