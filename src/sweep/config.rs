//! Generated configurations, run-directory naming and typed hyperparameters

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::model::rnn::CellKind;

use super::error::{Result, SweepError};
use super::space::ParameterValue;

/// One total assignment over a sweep space, in space order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    values: Vec<(String, ParameterValue)>,
}

impl Configuration {
    pub(crate) fn new(values: Vec<(String, ParameterValue)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter().map(|(n, v)| (n, v))
    }

    /// Run directory name for this configuration.
    ///
    /// `name=value` segments joined by `-`, floats rendered with fixed
    /// 5-decimal precision. A pure function of the values: the same
    /// configuration always maps to the same directory.
    pub fn dir_name(&self) -> String {
        let mut out = String::new();
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                out.push('-');
            }
            match value {
                ParameterValue::Float(v) => {
                    let _ = write!(out, "{name}={v:.5}");
                }
                ParameterValue::Int(v) => {
                    let _ = write!(out, "{name}={v}");
                }
                ParameterValue::Categorical(s) => {
                    let _ = write!(out, "{name}={s}");
                }
            }
        }
        out
    }

    fn require(&self, name: &str) -> Result<&ParameterValue> {
        self.get(name).ok_or_else(|| SweepError::MissingParameter(name.to_string()))
    }

    /// Fetch a parameter as a float
    pub fn require_float(&self, name: &str) -> Result<f64> {
        self.require(name)?.as_float().ok_or_else(|| SweepError::InvalidParameter {
            name: name.to_string(),
            reason: "expected a numeric value".to_string(),
        })
    }

    /// Fetch a parameter as a non-negative integer
    pub fn require_usize(&self, name: &str) -> Result<usize> {
        let v = self.require(name)?.as_int().ok_or_else(|| SweepError::InvalidParameter {
            name: name.to_string(),
            reason: "expected an integer value".to_string(),
        })?;
        usize::try_from(v).map_err(|_| SweepError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected a non-negative integer, got {v}"),
        })
    }

    /// Fetch a parameter as a categorical string
    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.require(name)?.as_str().ok_or_else(|| SweepError::InvalidParameter {
            name: name.to_string(),
            reason: "expected a categorical value".to_string(),
        })
    }
}

/// Hyperparameters of one autoencoder run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VaeHparams {
    pub learning_rate: f64,
    pub intermediate_dim: usize,
    pub latent_dim: usize,
    pub batch_size: usize,
}

impl VaeHparams {
    /// Parse from a configuration over the `lr`/`hd`/`lat_dim`/`b` axes
    pub fn from_configuration(config: &Configuration) -> Result<Self> {
        Ok(Self {
            learning_rate: config.require_float("lr")?,
            intermediate_dim: config.require_usize("hd")?,
            latent_dim: config.require_usize("lat_dim")?,
            batch_size: config.require_usize("b")?,
        })
    }
}

/// Hyperparameters of one recurrent regressor run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorHparams {
    pub cell: CellKind,
    pub hidden_layers: usize,
    pub hidden_units: usize,
    pub dropout: f64,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub window_size: usize,
}

impl RegressorHparams {
    /// Parse from a configuration over the regressor axes.
    ///
    /// Unknown cell names fail here, before any model is built.
    pub fn from_configuration(config: &Configuration) -> Result<Self> {
        let cell: CellKind = config.require_str("rnn")?.parse()?;
        Ok(Self {
            cell,
            hidden_layers: config.require_usize("hidden_layers")?,
            hidden_units: config.require_usize("hidden_units")?,
            dropout: config.require_float("dropout")?,
            learning_rate: config.require_float("lr")?,
            batch_size: config.require_usize("b")?,
            window_size: config.require_usize("window")?,
        })
    }
}
