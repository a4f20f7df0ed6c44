#![warn(missing_docs)]
//! Optimization of bench configurations
//!
//! - [`MagicWaist`] searches values of one or two free parameters producing a target waist.
//! - [`LocalOptimum`] maximizes the overlap of the output beam with a target beam.
//! - [`sensitivity`] ranks the elements by the impact of a misplacement on the output beam.
mod local_optimum;
mod magic_waist;
mod parameter;
mod sensitivity;

pub use local_optimum::{LocalOptimum, LocalOptimumConfig, LocalOptimumSolution};
pub use magic_waist::{MagicWaist, MagicWaistConfig, MagicWaistSolution, MagicWaistTarget};
pub use parameter::{FreeParameter, ParameterKind};
pub use sensitivity::{sensitivity, ElementSensitivity};
