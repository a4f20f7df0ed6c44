#![warn(missing_docs)]
//! Infinitely thin lenses
use super::Element;
use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    orientation::Orientation,
};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

fn check_focal_length(focal_length: Length) -> BeamResult<()> {
    if focal_length.is_zero() || focal_length.is_nan() {
        return Err(BeamError::ElementConfiguration(
            "focal length must not be 0.0 or NaN".into(),
        ));
    }
    Ok(())
}

/// An ideal thin lens.
///
/// Positive focal lengths are focusing, negative ones defocusing. A focal length of +/- infinity
/// behaves like empty space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinLens {
    focal_length: Length,
}
impl ThinLens {
    /// Creates a new [`ThinLens`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the focal length is zero or NaN.
    pub fn new(focal_length: Length) -> BeamResult<Self> {
        check_focal_length(focal_length)?;
        Ok(Self { focal_length })
    }
}
impl Element for ThinLens {
    fn node_type(&self) -> &'static str {
        "thin lens"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::thin_lens(self.focal_length.value)
    }
    fn validate(&self) -> BeamResult<()> {
        check_focal_length(self.focal_length)
    }
    fn supports_aspect(&self) -> bool {
        true
    }
    fn focal_length(&self) -> Option<Length> {
        Some(self.focal_length)
    }
    fn has_adjustable_focal_length(&self) -> bool {
        true
    }
    fn set_focal_length(&mut self, focal_length: Length) -> BeamResult<()> {
        check_focal_length(focal_length)?;
        self.focal_length = focal_length;
        Ok(())
    }
}

/// A thermally induced lens (e.g. in a pumped laser crystal).
///
/// It acts exactly like a [`ThinLens`]. The focal length is the live parameter resulting from the
/// current thermal load and is usually the one adjusted during a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalLens {
    focal_length: Length,
}
impl ThermalLens {
    /// Creates a new [`ThermalLens`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the focal length is zero or NaN.
    pub fn new(focal_length: Length) -> BeamResult<Self> {
        check_focal_length(focal_length)?;
        Ok(Self { focal_length })
    }
}
impl Element for ThermalLens {
    fn node_type(&self) -> &'static str {
        "thermal lens"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::thin_lens(self.focal_length.value)
    }
    fn validate(&self) -> BeamResult<()> {
        check_focal_length(self.focal_length)
    }
    fn supports_aspect(&self) -> bool {
        true
    }
    fn focal_length(&self) -> Option<Length> {
        Some(self.focal_length)
    }
    fn has_adjustable_focal_length(&self) -> bool {
        true
    }
    fn set_focal_length(&mut self, focal_length: Length) -> BeamResult<()> {
        check_focal_length(focal_length)?;
        self.focal_length = focal_length;
        Ok(())
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::millimeter;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    #[test]
    fn new() {
        let lens = ThinLens::new(millimeter!(100.0)).unwrap();
        assert_eq!(lens.focal_length(), Some(millimeter!(100.0)));
        assert_eq!(lens.node_type(), "thin lens");
        assert_matches!(
            ThinLens::new(millimeter!(0.0)),
            Err(BeamError::ElementConfiguration(_))
        );
        assert!(ThinLens::new(millimeter!(f64::NAN)).is_err());
        assert!(ThinLens::new(millimeter!(f64::INFINITY)).is_ok());
    }
    #[test]
    fn matrix() {
        let lens = ThinLens::new(millimeter!(100.0)).unwrap();
        for o in [Orientation::Horizontal, Orientation::Vertical] {
            let m = lens.matrix(o);
            assert_abs_diff_eq!(m.c(), -10.0, epsilon = 1e-12);
            assert_abs_diff_eq!(m.determinant(), 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(lens.index_ratio(), 1.0);
        assert!(lens.width().is_zero());
    }
    #[test]
    fn infinite_focal_length_is_identity() {
        let lens = ThinLens::new(millimeter!(f64::INFINITY)).unwrap();
        assert!(lens
            .matrix(Orientation::Horizontal)
            .approx_eq(&AbcdMatrix::identity(), 0.0));
        let lens = ThinLens::new(millimeter!(1.0e12)).unwrap();
        assert!(lens
            .matrix(Orientation::Horizontal)
            .approx_eq(&AbcdMatrix::identity(), 1e-8));
    }
    #[test]
    fn set_focal_length() {
        let mut lens = ThermalLens::new(millimeter!(500.0)).unwrap();
        assert!(lens.set_focal_length(millimeter!(0.0)).is_err());
        assert_eq!(lens.focal_length(), Some(millimeter!(500.0)));
        lens.set_focal_length(millimeter!(-250.0)).unwrap();
        assert_abs_diff_eq!(lens.matrix(Orientation::Vertical).c(), 4.0, epsilon = 1e-12);
        assert_eq!(lens.node_type(), "thermal lens");
    }
}
