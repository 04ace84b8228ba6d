//! Cyclical KL annealing schedule
//!
//! Unscaled KL regularization early in training collapses the latent
//! space: the encoder learns to ignore its input and match the prior.
//! Ramping the KL weight from zero lets reconstruction dominate first;
//! restarting the ramp every cycle keeps reintroducing the regularizer.

/// Linear ramp from 0 to `ceiling`, repeated every `cycle_duration`
/// training steps and restarting at 0 at each cycle boundary.
///
/// The weight is a pure function of the global step count, so the schedule
/// carries no hidden state and is fully deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicalAnnealing {
    cycle_duration: u64,
    ceiling: f32,
}

impl CyclicalAnnealing {
    /// Create a schedule with the given cycle length (in steps) and weight ceiling
    pub fn new(cycle_duration: u64, ceiling: f32) -> Self {
        assert!(cycle_duration > 0, "cycle_duration must be positive");
        Self { cycle_duration, ceiling }
    }

    pub fn cycle_duration(&self) -> u64 {
        self.cycle_duration
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Annealing weight at `step`
    pub fn weight(&self, step: u64) -> f32 {
        let pos = step % self.cycle_duration;
        self.ceiling * pos as f32 / self.cycle_duration as f32
    }
}

impl Default for CyclicalAnnealing {
    /// The training recipe's default: a 1.87e6-step cycle ramping to 1.0.
    /// The cycle length is a tunable, not a derived constant.
    fn default() -> Self {
        Self::new(1_870_000, 1.0)
    }
}
