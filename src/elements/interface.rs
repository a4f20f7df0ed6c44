#![warn(missing_docs)]
//! Refracting surfaces between two media
//!
//! The refractive index ratio `n2 / n1` of an interface is carried forward to all following elements. Its
//! matrix uses the reduced convention, i.e. the determinant equals `n1 / n2`.
use super::Element;
use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    orientation::Orientation,
};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

fn check_index_ratio(index_ratio: f64) -> BeamResult<()> {
    if !index_ratio.is_finite() || index_ratio <= 0.0 {
        return Err(BeamError::ElementConfiguration(
            "refractive index ratio must be > 0.0 and finite".into(),
        ));
    }
    Ok(())
}
fn ratio_from_indices(n1: f64, n2: f64) -> BeamResult<f64> {
    if !n1.is_finite() || n1 <= 0.0 || !n2.is_finite() || n2 <= 0.0 {
        return Err(BeamError::ElementConfiguration(
            "refractive indices must be > 0.0 and finite".into(),
        ));
    }
    Ok(n2 / n1)
}

/// A flat interface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatInterface {
    index_ratio: f64,
}
impl FlatInterface {
    /// Creates a new [`FlatInterface`] from the index ratio `n2 / n1`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the ratio is not positive and finite.
    pub fn new(index_ratio: f64) -> BeamResult<Self> {
        check_index_ratio(index_ratio)?;
        Ok(Self { index_ratio })
    }
    /// Creates a new [`FlatInterface`] from the indices before (`n1`) and after (`n2`) the surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the indices is not positive and finite.
    pub fn from_indices(n1: f64, n2: f64) -> BeamResult<Self> {
        Self::new(ratio_from_indices(n1, n2)?)
    }
}
impl Element for FlatInterface {
    fn node_type(&self) -> &'static str {
        "flat interface"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::interface(f64::INFINITY, self.index_ratio)
    }
    fn validate(&self) -> BeamResult<()> {
        check_index_ratio(self.index_ratio)
    }
    fn index_ratio(&self) -> f64 {
        self.index_ratio
    }
}

/// A spherical interface.
///
/// A positive radius of curvature means that the center of curvature lies behind the surface (convex surface
/// for a beam coming from the left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvedInterface {
    index_ratio: f64,
    curvature: Length,
}
impl CurvedInterface {
    /// Creates a new [`CurvedInterface`] from the index ratio `n2 / n1` and the radius of curvature.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the ratio is not positive and finite.
    ///   - the radius of curvature is zero or NaN.
    pub fn new(index_ratio: f64, curvature: Length) -> BeamResult<Self> {
        let interface = Self {
            index_ratio,
            curvature,
        };
        interface.validate()?;
        Ok(interface)
    }
    /// Creates a new [`CurvedInterface`] from the indices before (`n1`) and after (`n2`) the surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the indices is invalid or the radius of curvature is zero or NaN.
    pub fn from_indices(n1: f64, n2: f64, curvature: Length) -> BeamResult<Self> {
        Self::new(ratio_from_indices(n1, n2)?, curvature)
    }
    /// Radius of curvature.
    #[must_use]
    pub const fn curvature(&self) -> Length {
        self.curvature
    }
}
impl Element for CurvedInterface {
    fn node_type(&self) -> &'static str {
        "curved interface"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::interface(self.curvature.value, self.index_ratio)
    }
    fn inactive_matrix(&self) -> AbcdMatrix {
        AbcdMatrix::interface(f64::INFINITY, self.index_ratio)
    }
    fn validate(&self) -> BeamResult<()> {
        check_index_ratio(self.index_ratio)?;
        if self.curvature.is_zero() || self.curvature.is_nan() {
            return Err(BeamError::ElementConfiguration(
                "curvature must not be 0.0 or NaN".into(),
            ));
        }
        Ok(())
    }
    fn supports_aspect(&self) -> bool {
        true
    }
    fn index_ratio(&self) -> f64 {
        self.index_ratio
    }
}
