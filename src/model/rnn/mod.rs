//! Recurrent regressor family: vanilla RNN, GRU and LSTM stacks
//!
//! The builder mirrors the sweep's architecture knobs: one or two
//! recurrent layers (a two-layer stack feeds the full output sequence of
//! the first layer into the second), a dropout layer, and a single linear
//! output unit predicting the angle delta. Depths outside 1..=2 are
//! rejected before any training starts.

mod cell;
mod gru;
mod lstm;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::optim::ParamMut;
use crate::train::{Mae, Metric, Mse, R2Score, Rmse, SeqBatch, StepOutput, Trainable};

use self::cell::{Cell, VanillaCell};
use self::gru::GruCell;
use self::lstm::LstmCell;
use super::error::Result;
use super::{Dense, ModelError};

/// Supported recurrent cell types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Vanilla,
    Gru,
    Lstm,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Vanilla => write!(f, "vanilla"),
            CellKind::Gru => write!(f, "gru"),
            CellKind::Lstm => write!(f, "lstm"),
        }
    }
}

impl FromStr for CellKind {
    type Err = ModelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vanilla" => Ok(CellKind::Vanilla),
            "gru" => Ok(CellKind::Gru),
            "lstm" => Ok(CellKind::Lstm),
            other => Err(ModelError::UnknownCell(other.to_string())),
        }
    }
}

/// Architecture of one regressor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegressorConfig {
    pub cell: CellKind,
    /// Recurrent layer count, 1 or 2
    pub hidden_layers: usize,
    pub hidden_units: usize,
    /// Dropout rate applied before the output unit
    pub dropout: f32,
    /// Sequence length consumed per example
    pub window_size: usize,
    /// Features per timestep
    pub feature_dim: usize,
}

/// One recurrent layer stepped over a `(batch, window, features)` sequence
#[derive(Debug)]
pub struct RecurrentLayer {
    cell: Box<dyn Cell>,
    return_sequences: bool,
    seq_dims: Option<(usize, usize)>,
}

impl RecurrentLayer {
    fn new<R: Rng>(
        kind: CellKind,
        features: usize,
        hidden: usize,
        return_sequences: bool,
        rng: &mut R,
    ) -> Self {
        let cell: Box<dyn Cell> = match kind {
            CellKind::Vanilla => Box::new(VanillaCell::new(features, hidden, rng)),
            CellKind::Gru => Box::new(GruCell::new(features, hidden, rng)),
            CellKind::Lstm => Box::new(LstmCell::new(features, hidden, rng)),
        };
        Self { cell, return_sequences, seq_dims: None }
    }

    /// Whether this layer feeds its full output sequence downstream
    pub fn returns_sequences(&self) -> bool {
        self.return_sequences
    }

    /// Declared output rank: 3 for a sequence output, 2 for the final state
    pub fn output_rank(&self) -> usize {
        if self.return_sequences {
            3
        } else {
            2
        }
    }

    pub fn hidden_units(&self) -> usize {
        self.cell.hidden_units()
    }

    /// Run the whole sequence, returning all hidden states and the last one
    fn forward(&mut self, x: &Array3<f32>) -> (Array3<f32>, Array2<f32>) {
        let (batch, window, _features) = x.dim();
        let hidden = self.cell.hidden_units();
        self.cell.reset(batch);
        self.seq_dims = Some((batch, window));

        let mut h = Array2::zeros((batch, hidden));
        let mut seq = Array3::zeros((batch, window, hidden));
        for t in 0..window {
            let x_t = x.index_axis(Axis(1), t).to_owned();
            h = self.cell.step(&x_t, &h);
            seq.index_axis_mut(Axis(1), t).assign(&h);
        }
        (seq, h)
    }

    /// Backpropagate through time.
    ///
    /// `d_seq` carries gradients on every timestep output (two-layer
    /// stacks), `d_last` only on the final state; either may be absent.
    fn backward(
        &mut self,
        d_seq: Option<&Array3<f32>>,
        d_last: Option<&Array2<f32>>,
    ) -> Array3<f32> {
        let (batch, window) = self.seq_dims.take().expect("backward called before forward");
        let hidden = self.cell.hidden_units();
        let features = self.cell.feature_dim();

        let mut dh = match d_last {
            Some(d) => d.clone(),
            None => Array2::zeros((batch, hidden)),
        };
        let mut dx = Array3::zeros((batch, window, features));
        for t in (0..window).rev() {
            if let Some(ds) = d_seq {
                dh += &ds.index_axis(Axis(1), t);
            }
            let (dx_t, dh_prev) = self.cell.backstep(&dh);
            dx.index_axis_mut(Axis(1), t).assign(&dx_t);
            dh = dh_prev;
        }
        dx
    }

    fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        self.cell.params_mut()
    }
}

/// Inverted dropout: active during training, identity at evaluation
#[derive(Debug)]
struct Dropout {
    rate: f32,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    fn new(rate: f32) -> Self {
        Self { rate, mask: None }
    }

    fn forward_train<R: Rng>(&mut self, x: &Array2<f32>, rng: &mut R) -> Array2<f32> {
        if self.rate <= 0.0 {
            self.mask = None;
            return x.clone();
        }
        let keep = 1.0 - self.rate;
        let mask = Array2::from_shape_fn(x.dim(), |_| {
            if rng.random::<f32>() < keep {
                1.0 / keep
            } else {
                0.0
            }
        });
        let y = x * &mask;
        self.mask = Some(mask);
        y
    }

    fn backward(&mut self, dy: &Array2<f32>) -> Array2<f32> {
        match self.mask.take() {
            Some(mask) => dy * &mask,
            None => dy.clone(),
        }
    }
}

/// Recurrent stack with a scalar regression head
#[derive(Debug)]
pub struct RnnRegressor {
    layers: Vec<RecurrentLayer>,
    dropout: Dropout,
    head: Dense,
    config: RegressorConfig,
}

impl RnnRegressor {
    /// Assemble the stack for `config`, failing fast on unsupported depth
    pub fn build<R: Rng>(config: RegressorConfig, rng: &mut R) -> Result<Self> {
        let layers = match config.hidden_layers {
            1 => vec![RecurrentLayer::new(
                config.cell,
                config.feature_dim,
                config.hidden_units,
                false,
                rng,
            )],
            2 => vec![
                RecurrentLayer::new(config.cell, config.feature_dim, config.hidden_units, true, rng),
                RecurrentLayer::new(
                    config.cell,
                    config.hidden_units,
                    config.hidden_units,
                    false,
                    rng,
                ),
            ],
            n => return Err(ModelError::UnsupportedHiddenLayers(n)),
        };

        Ok(Self {
            layers,
            dropout: Dropout::new(config.dropout),
            head: Dense::new(config.hidden_units, 1, rng),
            config,
        })
    }

    pub fn config(&self) -> &RegressorConfig {
        &self.config
    }

    pub fn layers(&self) -> &[RecurrentLayer] {
        &self.layers
    }

    /// Check a dataset's `(window, features)` against the model input shape
    pub fn validate_input_shape(&self, window: usize, features: usize) -> Result<()> {
        let expected = (self.config.window_size, self.config.feature_dim);
        if (window, features) != expected {
            return Err(ModelError::ShapeMismatch { expected, actual: (window, features) });
        }
        Ok(())
    }

    /// Gradient-free predictions for a `(batch, window, features)` input
    pub fn predict(&mut self, x: &Array3<f32>) -> Array1<f32> {
        let last = self.forward_recurrent(x);
        let out = self.head.infer(&last);
        out.column(0).to_owned()
    }

    fn forward_recurrent(&mut self, x: &Array3<f32>) -> Array2<f32> {
        match self.layers.len() {
            1 => self.layers[0].forward(x).1,
            _ => {
                let (seq, _) = self.layers[0].forward(x);
                self.layers[1].forward(&seq).1
            }
        }
    }
}

impl Trainable for RnnRegressor {
    type Batch = SeqBatch;

    fn train_step(&mut self, batch: &SeqBatch, _global_step: u64, rng: &mut StdRng) -> StepOutput {
        let (batch_size, window, features) = batch.inputs.dim();
        assert_eq!(
            (window, features),
            (self.config.window_size, self.config.feature_dim),
            "regressor input shape mismatch"
        );

        // forward
        let last = self.forward_recurrent(&batch.inputs);
        let dropped = self.dropout.forward_train(&last, rng);
        let out = self.head.forward(&dropped);
        let pred = out.column(0).to_owned();

        let diff = &pred - &batch.targets;
        let n = batch_size as f32;
        let mse = Mse.compute(pred.view(), batch.targets.view());
        let mae = Mae.compute(pred.view(), batch.targets.view());
        let rmse = Rmse.compute(pred.view(), batch.targets.view());

        // backward
        let d_out = diff.mapv(|v| 2.0 * v / n).insert_axis(Axis(1));
        let d_dropped = self.head.backward(&d_out);
        let d_last = self.dropout.backward(&d_dropped);

        match self.layers.len() {
            1 => {
                self.layers[0].backward(None, Some(&d_last));
            }
            _ => {
                let d_seq = self.layers[1].backward(None, Some(&d_last));
                self.layers[0].backward(Some(&d_seq), None);
            }
        }

        StepOutput { loss: mse, metrics: vec![("mse", mse), ("mae", mae), ("rmse", rmse)] }
    }

    fn eval_step(&mut self, batch: &SeqBatch) -> StepOutput {
        let pred = self.predict(&batch.inputs);
        let targets = batch.targets.view();
        let mse = Mse.compute(pred.view(), targets);
        StepOutput {
            loss: mse,
            metrics: vec![
                (Mse.name(), mse),
                (Mae.name(), Mae.compute(pred.view(), targets)),
                (Rmse.name(), Rmse.compute(pred.view(), targets)),
                (R2Score.name(), R2Score.compute(pred.view(), targets)),
            ],
        }
    }

    fn params_mut(&mut self) -> Vec<ParamMut<'_>> {
        let mut params = Vec::new();
        for layer in &mut self.layers {
            params.extend(layer.params_mut());
        }
        params.extend(self.head.params_mut());
        params
    }
}
