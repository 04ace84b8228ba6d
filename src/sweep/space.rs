//! Hyperparameter values, domains and the ordered search space

use serde::{Deserialize, Serialize};

/// One concrete hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
    Categorical(String),
}

impl ParameterValue {
    /// Get as float (converts int to float if needed)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            ParameterValue::Categorical(_) => None,
        }
    }

    /// Get as int. Floats qualify only when they are exactly integral;
    /// `2.5` is not silently truncated to `2`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            ParameterValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Categorical(s) => Some(s),
            _ => None,
        }
    }
}

/// The values one hyperparameter may take
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParameterDomain {
    /// Range expanded to `n_points` grid values, linear or log-spaced.
    /// `low` may exceed `high`; the grid then runs high to low.
    Continuous { low: f64, high: f64, log_scale: bool },
    /// Explicit integer levels, enumerated in order
    Discrete(Vec<i64>),
    /// Explicit float levels, enumerated in order
    Levels(Vec<f64>),
    /// Named choices, enumerated in order
    Categorical(Vec<String>),
}

impl ParameterDomain {
    /// Expand the domain into its grid values.
    ///
    /// Only `Continuous` domains use `n_points`; explicit level lists are
    /// enumerated as given.
    pub fn grid_values(&self, n_points: usize) -> Vec<ParameterValue> {
        match self {
            ParameterDomain::Continuous { low, high, log_scale } => {
                let n = n_points.max(2);
                let divisor = (n - 1) as f64;
                if *log_scale {
                    let log_low = low.max(f64::MIN_POSITIVE).ln();
                    let log_high = high.max(f64::MIN_POSITIVE).ln();
                    (0..n)
                        .map(|i| {
                            let t = i as f64 / divisor;
                            ParameterValue::Float((log_low + t * (log_high - log_low)).exp())
                        })
                        .collect()
                } else {
                    (0..n)
                        .map(|i| {
                            let t = i as f64 / divisor;
                            ParameterValue::Float(low + t * (high - low))
                        })
                        .collect()
                }
            }
            ParameterDomain::Discrete(levels) => {
                levels.iter().map(|&v| ParameterValue::Int(v)).collect()
            }
            ParameterDomain::Levels(levels) => {
                levels.iter().map(|&v| ParameterValue::Float(v)).collect()
            }
            ParameterDomain::Categorical(choices) => {
                choices.iter().map(|c| ParameterValue::Categorical(c.clone())).collect()
            }
        }
    }
}

/// Insertion-ordered hyperparameter search space.
///
/// Ordering is part of the contract: the same domains added in the same
/// order always enumerate configurations identically, which keeps run
/// directory names stable across sweep restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSpace {
    params: Vec<(String, ParameterDomain)>,
}

impl SweepSpace {
    /// Create an empty search space
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; later additions vary fastest during enumeration
    pub fn add(&mut self, name: &str, domain: ParameterDomain) {
        self.params.push((name.to_string(), domain));
    }

    /// Get a parameter domain by name
    pub fn get(&self, name: &str) -> Option<&ParameterDomain> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterDomain)> {
        self.params.iter().map(|(n, d)| (n, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_continuous_grid_endpoints() {
        let domain = ParameterDomain::Continuous { low: 0.0, high: 1.0, log_scale: false };
        let values = domain.grid_values(5);
        assert_eq!(values.len(), 5);
        assert_abs_diff_eq!(values[0].as_float().unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[4].as_float().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_continuous_grid_descending() {
        // mirrors a linspace from a large to a small learning rate
        let domain = ParameterDomain::Continuous { low: 0.005, high: 0.00001, log_scale: false };
        let values = domain.grid_values(10);
        assert_eq!(values.len(), 10);
        assert_abs_diff_eq!(values[0].as_float().unwrap(), 0.005, epsilon = 1e-12);
        assert_abs_diff_eq!(values[9].as_float().unwrap(), 0.00001, epsilon = 1e-12);
        assert!(values[0].as_float().unwrap() > values[1].as_float().unwrap());
    }

    #[test]
    fn test_log_scale_grid() {
        let domain = ParameterDomain::Continuous { low: 1e-4, high: 1e-1, log_scale: true };
        let values = domain.grid_values(4);
        let v: Vec<f64> = values.iter().map(|p| p.as_float().unwrap()).collect();
        assert_abs_diff_eq!(v[0], 1e-4, epsilon = 1e-10);
        assert_abs_diff_eq!(v[1], 1e-3, epsilon = 1e-8);
        assert_abs_diff_eq!(v[3], 1e-1, epsilon = 1e-6);
    }

    #[test]
    fn test_discrete_and_levels_ignore_n_points() {
        let discrete = ParameterDomain::Discrete(vec![32, 16]);
        assert_eq!(discrete.grid_values(100).len(), 2);
        assert_eq!(discrete.grid_values(100)[1].as_int(), Some(16));

        let levels = ParameterDomain::Levels(vec![0.0, 0.2, 0.4]);
        assert_eq!(levels.grid_values(100).len(), 3);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(ParameterValue::Int(7).as_float(), Some(7.0));
        assert_eq!(ParameterValue::Float(16.0).as_int(), Some(16));
        assert_eq!(ParameterValue::Categorical("gru".to_string()).as_str(), Some("gru"));
        assert_eq!(ParameterValue::Categorical("gru".to_string()).as_float(), None);
    }

    #[test]
    fn test_as_int_rejects_non_integral_floats() {
        assert_eq!(ParameterValue::Float(2.5).as_int(), None);
        assert_eq!(ParameterValue::Float(f64::NAN).as_int(), None);
        assert_eq!(ParameterValue::Float(f64::INFINITY).as_int(), None);
        assert_eq!(ParameterValue::Float(-3.0).as_int(), Some(-3));
    }

    #[test]
    fn test_space_preserves_insertion_order() {
        let mut space = SweepSpace::new();
        space.add("lr", ParameterDomain::Levels(vec![0.001]));
        space.add("b", ParameterDomain::Discrete(vec![32, 16]));
        space.add("rnn", ParameterDomain::Categorical(vec!["gru".to_string()]));

        let names: Vec<&str> = space.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["lr", "b", "rnn"]);
        assert!(space.get("b").is_some());
        assert!(space.get("missing").is_none());
        assert_eq!(space.len(), 3);
    }
}
