#![warn(missing_docs)]
//! Fitting of the input beam to measured beam widths
//!
//! Measurements are organized in named [`Fit`]s owned by the [`OpticsBench`](crate::bench::OpticsBench). The
//! [`Fitter`] determines the input beam which best reproduces the measured widths after propagation through the
//! bench.
mod fitter;
mod least_squares;
mod measurement;
mod statistics;

pub use fitter::{FitConfig, FitResult, Fitter};
pub use measurement::{Fit, FitDataType, Measurement, MeasurementPlane};
pub use statistics::LinearRegression;
