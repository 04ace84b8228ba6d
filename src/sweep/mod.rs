//! Hyperparameter sweeps: spaces, grid enumeration and the run loop
//!
//! A sweep is an exhaustive grid over a [`SweepSpace`], run strictly
//! sequentially. Each configuration maps to a deterministic run directory
//! under the sweep's log root; directories that already exist are skipped,
//! which makes an interrupted sweep resumable.
//!
//! # Example
//!
//! ```rust
//! use kinetrain::sweep::{GridSweep, ParameterDomain, SweepSpace};
//!
//! let mut space = SweepSpace::new();
//! space.add("b", ParameterDomain::Discrete(vec![32, 16]));
//! space.add("hd", ParameterDomain::Discrete(vec![75, 30, 90, 150]));
//!
//! let grid = GridSweep::new(&space, 10).unwrap();
//! assert_eq!(grid.len(), 8);
//! for config in grid.iter() {
//!     println!("{}", config.dir_name());
//! }
//! ```

mod config;
mod error;
mod grid;
mod runner;
mod space;

pub use config::{Configuration, RegressorHparams, VaeHparams};
pub use error::{Result, SweepError};
pub use grid::{GridIter, GridSweep};
pub use runner::{RunOutcome, RunStatus, SweepReport, SweepRunner};
pub use space::{ParameterDomain, ParameterValue, SweepSpace};

/// The default autoencoder grid: learning rate from 5e-3 down to 1e-5,
/// intermediate widths {75, 30, 90, 150}, latent dimension 2, batch sizes
/// {32, 16}. Axis order fixes the run directory layout
/// (`lr=...-hd=...-lat_dim=...-b=...`).
pub fn default_vae_space() -> SweepSpace {
    let mut space = SweepSpace::new();
    space.add("lr", ParameterDomain::Continuous { low: 0.005, high: 0.00001, log_scale: false });
    space.add("hd", ParameterDomain::Discrete(vec![75, 30, 90, 150]));
    space.add("lat_dim", ParameterDomain::Discrete(vec![2]));
    space.add("b", ParameterDomain::Discrete(vec![32, 16]));
    space
}

/// The default regressor grid over cell type, depth, width, dropout,
/// learning rate and batch size, for a fixed input window length
pub fn default_regressor_space(window_size: usize) -> SweepSpace {
    let mut space = SweepSpace::new();
    space.add(
        "rnn",
        ParameterDomain::Categorical(vec![
            "vanilla".to_string(),
            "gru".to_string(),
            "lstm".to_string(),
        ]),
    );
    space.add("hidden_layers", ParameterDomain::Discrete(vec![1, 2]));
    space.add("hidden_units", ParameterDomain::Discrete(vec![10, 50, 100, 300]));
    space.add("dropout", ParameterDomain::Levels(vec![0.0, 0.2, 0.4]));
    space.add("lr", ParameterDomain::Levels(vec![0.001, 0.01, 0.0001]));
    space.add("b", ParameterDomain::Discrete(vec![32, 64]));
    space.add("window", ParameterDomain::Discrete(vec![window_size as i64]));
    space
}
