//! Optimizers for training the model families

mod adam;
mod clip;
mod optimizer;
mod sgd;

pub use adam::Adam;
pub use clip::clip_grad_norm;
pub use optimizer::{Optimizer, ParamMut};
pub use sgd::Sgd;
