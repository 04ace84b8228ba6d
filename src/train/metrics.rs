//! Regression metrics and per-run metric history

use ndarray::ArrayView1;

/// Trait for evaluation metrics over prediction/target pairs
pub trait Metric {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32;

    fn name(&self) -> &'static str;
}

/// Mean squared error
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl Metric for Mse {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32 {
        assert_eq!(predictions.len(), targets.len());
        if predictions.is_empty() {
            return 0.0;
        }
        predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &t)| (p - t).powi(2))
            .sum::<f32>()
            / predictions.len() as f32
    }

    fn name(&self) -> &'static str {
        "mse"
    }
}

/// Mean absolute error
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl Metric for Mae {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32 {
        assert_eq!(predictions.len(), targets.len());
        if predictions.is_empty() {
            return 0.0;
        }
        predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &t)| (p - t).abs())
            .sum::<f32>()
            / predictions.len() as f32
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

/// Root mean squared error
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl Metric for Rmse {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32 {
        Mse.compute(predictions, targets).sqrt()
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

/// R² coefficient of determination.
///
/// 1.0 is perfect prediction; 0.0 means predicting the target mean.
/// Constant targets with non-zero residual yield 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2Score;

impl Metric for R2Score {
    fn compute(&self, predictions: ArrayView1<'_, f32>, targets: ArrayView1<'_, f32>) -> f32 {
        assert_eq!(predictions.len(), targets.len());
        if predictions.is_empty() {
            return 0.0;
        }
        let mean = targets.sum() / targets.len() as f32;
        let ss_res: f32 =
            predictions.iter().zip(targets.iter()).map(|(&p, &t)| (t - p).powi(2)).sum();
        let ss_tot: f32 = targets.iter().map(|&t| (t - mean).powi(2)).sum();
        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}

/// One finished epoch's record
#[derive(Debug, Clone)]
pub struct EpochRecord {
    pub loss: f32,
    pub val_loss: Option<f32>,
    pub lr: f32,
}

/// Running counters and per-epoch history for one training run
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    /// Epochs completed
    pub epoch: usize,
    /// Training steps taken across all epochs
    pub global_step: u64,
    history: Vec<EpochRecord>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_step(&mut self) {
        self.global_step += 1;
    }

    pub fn record_epoch(&mut self, loss: f32, val_loss: Option<f32>, lr: f32) {
        self.epoch += 1;
        self.history.push(EpochRecord { loss, val_loss, lr });
    }

    pub fn history(&self) -> &[EpochRecord] {
        &self.history
    }

    /// Best (lowest) training loss recorded so far
    pub fn best_loss(&self) -> Option<f32> {
        self.history.iter().map(|r| r.loss).fold(None, |best, l| match best {
            Some(b) if b <= l => Some(b),
            _ => Some(l),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_mse_mae_rmse() {
        let pred = arr1(&[1.0, 2.0, 3.0]);
        let target = arr1(&[1.5, 2.5, 3.5]);
        assert_abs_diff_eq!(Mse.compute(pred.view(), target.view()), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(Mae.compute(pred.view(), target.view()), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(Rmse.compute(pred.view(), target.view()), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_r2_perfect_prediction() {
        let v = arr1(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(R2Score.compute(v.view(), v.view()), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_r2_mean_prediction_is_zero() {
        let pred = arr1(&[2.0, 2.0, 2.0]);
        let target = arr1(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(R2Score.compute(pred.view(), target.view()), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_r2_constant_targets() {
        let target = arr1(&[2.0, 2.0]);
        assert_abs_diff_eq!(R2Score.compute(target.view(), target.view()), 1.0, epsilon = 1e-6);
        let pred = arr1(&[1.0, 3.0]);
        assert_abs_diff_eq!(R2Score.compute(pred.view(), target.view()), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_tracker_counts_and_best() {
        let mut tracker = MetricsTracker::new();
        tracker.increment_step();
        tracker.increment_step();
        tracker.record_epoch(0.8, Some(0.9), 0.001);
        tracker.record_epoch(0.5, Some(0.6), 0.001);
        tracker.record_epoch(0.7, None, 0.001);
        assert_eq!(tracker.global_step, 2);
        assert_eq!(tracker.epoch, 3);
        assert_eq!(tracker.best_loss(), Some(0.5));
    }
}
