//! Training batches and batching helpers

use ndarray::{Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Batch of flat feature vectors with matrix targets.
///
/// For autoencoder training the targets are the inputs themselves.
#[derive(Clone, Debug)]
pub struct DenseBatch {
    pub inputs: Array2<f32>,
    pub targets: Array2<f32>,
}

impl DenseBatch {
    pub fn size(&self) -> usize {
        self.inputs.nrows()
    }
}

/// Batch of windowed sequences with scalar targets
#[derive(Clone, Debug)]
pub struct SeqBatch {
    /// `(batch, window, features)`
    pub inputs: Array3<f32>,
    pub targets: Array1<f32>,
}

impl SeqBatch {
    pub fn size(&self) -> usize {
        self.inputs.dim().0
    }
}

fn example_order(n: usize, rng: Option<&mut StdRng>) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    if let Some(rng) = rng {
        idx.shuffle(rng);
    }
    idx
}

/// Slice a feature matrix into batches, shuffled when an RNG is supplied
pub fn dense_batches(
    inputs: &Array2<f32>,
    targets: &Array2<f32>,
    batch_size: usize,
    rng: Option<&mut StdRng>,
) -> Vec<DenseBatch> {
    assert!(batch_size > 0, "batch_size must be positive");
    assert_eq!(inputs.nrows(), targets.nrows(), "inputs/targets row mismatch");

    let idx = example_order(inputs.nrows(), rng);
    idx.chunks(batch_size)
        .map(|chunk| DenseBatch {
            inputs: inputs.select(Axis(0), chunk),
            targets: targets.select(Axis(0), chunk),
        })
        .collect()
}

/// Slice windowed sequences into batches, shuffled when an RNG is supplied
pub fn seq_batches(
    inputs: &Array3<f32>,
    targets: &Array1<f32>,
    batch_size: usize,
    rng: Option<&mut StdRng>,
) -> Vec<SeqBatch> {
    assert!(batch_size > 0, "batch_size must be positive");
    assert_eq!(inputs.dim().0, targets.len(), "inputs/targets length mismatch");

    let idx = example_order(inputs.dim().0, rng);
    idx.chunks(batch_size)
        .map(|chunk| SeqBatch {
            inputs: inputs.select(Axis(0), chunk),
            targets: targets.select(Axis(0), chunk),
        })
        .collect()
}
