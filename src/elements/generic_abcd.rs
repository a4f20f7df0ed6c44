#![warn(missing_docs)]
//! User defined ABCD block
use super::Element;
use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    orientation::Orientation,
};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// relative tolerance of the determinant check
const DETERMINANT_TOLERANCE: f64 = 1e-6;

/// An element given directly by its matrix coefficients (B in meters, C in 1/m).
///
/// The block may occupy a finite width on the axis and may change the refractive index. The
/// determinant `AD - BC` must be equal to `n1 / n2`, the inverse of the index ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenericAbcd {
    matrix: AbcdMatrix,
    width: Length,
    index_ratio: f64,
}
impl GenericAbcd {
    /// Creates a new [`GenericAbcd`] occupying `width` on the axis and changing the refractive index by
    /// `index_ratio` (`n2 / n1`).
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the width is negative or not finite.
    ///   - the index ratio is not positive and finite.
    ///   - a coefficient is not finite or the determinant does not match the index ratio.
    pub fn new(matrix: AbcdMatrix, width: Length, index_ratio: f64) -> BeamResult<Self> {
        let element = Self {
            matrix,
            width,
            index_ratio,
        };
        element.validate()?;
        Ok(element)
    }
    /// Replaces the matrix.
    ///
    /// # Errors
    ///
    /// This function will return an error if the determinant of the new matrix does not match the index ratio. In
    /// this case, the element is left unchanged.
    pub fn set_matrix(&mut self, matrix: AbcdMatrix) -> BeamResult<()> {
        let old = self.matrix;
        self.matrix = matrix;
        self.validate().inspect_err(|_| self.matrix = old)
    }
}
impl Element for GenericAbcd {
    fn node_type(&self) -> &'static str {
        "generic abcd"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        self.matrix
    }
    fn validate(&self) -> BeamResult<()> {
        if !self.width.is_finite() || self.width.value < 0.0 {
            return Err(BeamError::ElementConfiguration(
                "width must be >= 0.0 and finite".into(),
            ));
        }
        if !self.index_ratio.is_finite() || self.index_ratio <= 0.0 {
            return Err(BeamError::ElementConfiguration(
                "refractive index ratio must be > 0.0 and finite".into(),
            ));
        }
        let m = &self.matrix;
        if ![m.a(), m.b(), m.c(), m.d()].iter().all(|x| x.is_finite()) {
            return Err(BeamError::ElementConfiguration(
                "matrix coefficients must be finite".into(),
            ));
        }
        let expected = 1.0 / self.index_ratio;
        if (m.determinant() - expected).abs() > DETERMINANT_TOLERANCE * expected {
            return Err(BeamError::ElementConfiguration(format!(
                "determinant must be {expected} (n1/n2) but is {}",
                m.determinant()
            )));
        }
        Ok(())
    }
    fn width(&self) -> Length {
        self.width
    }
    fn index_ratio(&self) -> f64 {
        self.index_ratio
    }
}
