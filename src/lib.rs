//! This is the documentation for the **gaussian_beam** package, a propagation, cavity analysis and beam fitting
//! engine for Gaussian laser beams based on ray transfer (ABCD) matrices.
//!
//! An [`OpticsBench`] holds an input beam and an ordered set of optical elements. A
//! [`BeamPropagator`](propagation::BeamPropagator) computes the complex beam parameter at any position,
//! [`cavity`] analyses resonators, [`fit`] reconstructs a beam from measured radii and [`optimizer`] searches for
//! element configurations producing a desired beam.
#![allow(clippy::module_name_repetitions)]

pub mod abcd;
pub mod beam_parameter;
pub mod bench;
pub mod cancel;
pub mod cavity;
pub mod console;
pub mod elements;
pub mod error;
pub mod fit;
pub mod optimizer;
pub mod orientation;
pub mod overlap;
pub mod propagation;
pub mod utils;

pub use beam_parameter::ComplexBeamParameter;
pub use bench::OpticsBench;
