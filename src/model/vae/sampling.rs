//! Reparameterized sampling and the KL regularization term

use ndarray::Array2;
use rand::Rng;

use crate::model::init::normal_matrix;

/// Draw `z = mean + exp(0.5 * log_var) ⊙ ε` with fresh `ε ~ N(0, I)`.
///
/// Returns `(z, ε)`; the noise is needed again by the backward pass.
/// Stochastic by design: every call re-draws, which is what lets gradients
/// flow through the sampling step.
pub fn reparameterize<R: Rng>(
    mean: &Array2<f32>,
    log_var: &Array2<f32>,
    rng: &mut R,
) -> (Array2<f32>, Array2<f32>) {
    assert_eq!(mean.dim(), log_var.dim(), "mean/log_var shape mismatch");
    let (batch, dim) = mean.dim();
    let eps = normal_matrix(batch, dim, rng);
    let std = log_var.mapv(|v| (0.5 * v).exp());
    let z = mean + &(&std * &eps);
    (z, eps)
}

/// KL divergence between `N(mean, exp(log_var))` and the standard normal
/// prior, averaged over every batch × latent element:
///
/// `-0.5 * mean(log_var - mean² - exp(log_var) + 1)`
///
/// Zero exactly when the posterior matches the prior (mean 0, log_var 0).
pub fn kl_divergence(mean: &Array2<f32>, log_var: &Array2<f32>) -> f32 {
    assert_eq!(mean.dim(), log_var.dim(), "mean/log_var shape mismatch");
    let n = mean.len() as f32;
    let sum: f32 = log_var
        .iter()
        .zip(mean.iter())
        .map(|(&lv, &m)| lv - m * m - lv.exp() + 1.0)
        .sum();
    -0.5 * sum / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_kl_zero_for_standard_normal_posterior() {
        let mean = Array2::zeros((16, 2));
        let log_var = Array2::zeros((16, 2));
        assert_abs_diff_eq!(kl_divergence(&mean, &log_var), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn test_kl_positive_off_prior() {
        let mean = Array2::from_elem((8, 2), 1.5_f32);
        let log_var = Array2::zeros((8, 2));
        assert!(kl_divergence(&mean, &log_var) > 0.0);
    }

    #[test]
    fn test_two_draws_differ() {
        let mut rng = StdRng::seed_from_u64(5);
        let mean = Array2::zeros((4, 3));
        let log_var = Array2::zeros((4, 3));
        let (z1, _) = reparameterize(&mean, &log_var, &mut rng);
        let (z2, _) = reparameterize(&mean, &log_var, &mut rng);
        assert_ne!(z1, z2);
    }

    #[test]
    fn test_empirical_mean_converges() {
        let mut rng = StdRng::seed_from_u64(9);
        let mean = Array2::from_elem((1, 2), 3.0_f32);
        let log_var = Array2::from_elem((1, 2), -2.0_f32);

        let draws = 5000;
        let mut acc = Array2::<f32>::zeros((1, 2));
        for _ in 0..draws {
            let (z, _) = reparameterize(&mean, &log_var, &mut rng);
            acc += &z;
        }
        acc /= draws as f32;
        for &v in acc.iter() {
            assert_abs_diff_eq!(v, 3.0, epsilon = 0.05);
        }
    }

    #[test]
    fn test_zero_variance_is_deterministic_transform() {
        // log_var -> -inf is not representable; use a very small variance
        let mut rng = StdRng::seed_from_u64(2);
        let mean = Array2::from_elem((2, 2), 1.0_f32);
        let log_var = Array2::from_elem((2, 2), -40.0_f32);
        let (z, _) = reparameterize(&mean, &log_var, &mut rng);
        for &v in z.iter() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-4);
        }
    }
}
