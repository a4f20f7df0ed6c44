#![warn(missing_docs)]
//! Flat and spherical mirrors
//!
//! Mirrors are handled in the unfolded representation: the reflected beam continues along the same axis.
//!
//! Curvature convention:
//! - positive radius of curvature is a concave (focusing) mirror
//! - negative radius of curvature is a convex (defocusing) mirror
//!
//! A curved mirror hit under an angle of incidence θ shows astigmatism. The horizontal plane is treated as the
//! tangential plane (f = R·cos θ / 2) and the vertical plane as the sagittal plane (f = R / (2·cos θ)).
use super::Element;
use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    orientation::Orientation,
};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use uom::si::f64::{Angle, Length};

/// A flat mirror. Its matrix is the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatMirror;

impl Element for FlatMirror {
    fn node_type(&self) -> &'static str {
        "flat mirror"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::identity()
    }
    fn validate(&self) -> BeamResult<()> {
        Ok(())
    }
}

/// A spherical mirror with an optional angle of incidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvedMirror {
    curvature: Length,
    angle: Angle,
}
impl CurvedMirror {
    /// Creates a new [`CurvedMirror`] at normal incidence.
    ///
    /// A radius of curvature of +/- infinity corresponds to a flat mirror.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given radius of curvature is zero or NaN.
    pub fn new(curvature: Length) -> BeamResult<Self> {
        let mirror = Self {
            curvature,
            angle: Angle::zero(),
        };
        mirror.validate()?;
        Ok(mirror)
    }
    /// Modifies the angle of incidence. This function can be used with the "builder pattern".
    ///
    /// # Errors
    ///
    /// This function will return an error if the angle is not finite or if its magnitude is not below 90°.
    pub fn with_angle(mut self, angle: Angle) -> BeamResult<Self> {
        self.set_angle(angle)?;
        Ok(self)
    }
    /// Radius of curvature.
    #[must_use]
    pub const fn curvature(&self) -> Length {
        self.curvature
    }
    /// Angle of incidence.
    #[must_use]
    pub const fn angle(&self) -> Angle {
        self.angle
    }
    /// Sets the angle of incidence.
    ///
    /// # Errors
    ///
    /// This function will return an error if the angle is not finite or if its magnitude is not below 90°.
    pub fn set_angle(&mut self, angle: Angle) -> BeamResult<()> {
        if !angle.is_finite() || angle.value.abs() >= FRAC_PI_2 {
            return Err(BeamError::ElementConfiguration(
                "angle of incidence must be finite and below 90°".into(),
            ));
        }
        self.angle = angle;
        Ok(())
    }
    /// Effective radius of curvature in the given plane.
    #[must_use]
    pub fn effective_curvature(&self, orientation: Orientation) -> Length {
        let cos = self.angle.value.cos();
        match orientation {
            Orientation::Horizontal => self.curvature * cos,
            Orientation::Vertical => self.curvature / cos,
        }
    }
}
impl Element for CurvedMirror {
    fn node_type(&self) -> &'static str {
        "curved mirror"
    }
    fn matrix(&self, orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::thin_lens(self.effective_curvature(orientation).value / 2.0)
    }
    fn validate(&self) -> BeamResult<()> {
        if self.curvature.is_zero() || self.curvature.is_nan() {
            return Err(BeamError::ElementConfiguration(
                "curvature must not be 0.0 or NaN".into(),
            ));
        }
        if !self.angle.is_finite() || self.angle.value.abs() >= FRAC_PI_2 {
            return Err(BeamError::ElementConfiguration(
                "angle of incidence must be finite and below 90°".into(),
            ));
        }
        Ok(())
    }
    fn supports_aspect(&self) -> bool {
        true
    }
    fn focal_length(&self) -> Option<Length> {
        Some(self.curvature / 2.0)
    }
    fn has_adjustable_focal_length(&self) -> bool {
        true
    }
    fn set_focal_length(&mut self, focal_length: Length) -> BeamResult<()> {
        if focal_length.is_zero() || focal_length.is_nan() {
            return Err(BeamError::ElementConfiguration(
                "focal length must not be 0.0 or NaN".into(),
            ));
        }
        self.curvature = focal_length * 2.0;
        Ok(())
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{degree, millimeter};
    use approx::assert_relative_eq;
    #[test]
    fn flat() {
        let m = FlatMirror;
        assert_eq!(m.matrix(Orientation::Horizontal), AbcdMatrix::identity());
        assert!(m.validate().is_ok());
        assert!(!m.supports_aspect());
    }
    #[test]
    fn new() {
        assert!(CurvedMirror::new(millimeter!(0.0)).is_err());
        assert!(CurvedMirror::new(millimeter!(f64::NAN)).is_err());
        let m = CurvedMirror::new(millimeter!(100.0)).unwrap();
        assert_eq!(m.curvature(), millimeter!(100.0));
        assert_eq!(m.focal_length(), Some(millimeter!(50.0)));
    }
    #[test]
    fn concave_focuses() {
        let m = CurvedMirror::new(millimeter!(100.0)).unwrap();
        // f = R / 2 = 50 mm
        assert_relative_eq!(m.matrix(Orientation::Horizontal).c(), -20.0, max_relative = 1e-12);
        let m = CurvedMirror::new(millimeter!(-100.0)).unwrap();
        assert_relative_eq!(m.matrix(Orientation::Vertical).c(), 20.0, max_relative = 1e-12);
    }
    #[test]
    fn infinite_radius_is_flat() {
        let m = CurvedMirror::new(millimeter!(f64::INFINITY)).unwrap();
        assert!(m
            .matrix(Orientation::Horizontal)
            .approx_eq(&AbcdMatrix::identity(), 0.0));
        let m = CurvedMirror::new(millimeter!(1.0e13)).unwrap();
        assert!(m
            .matrix(Orientation::Vertical)
            .approx_eq(&AbcdMatrix::identity(), 1e-9));
    }
    #[test]
    fn astigmatism() {
        let m = CurvedMirror::new(millimeter!(100.0))
            .unwrap()
            .with_angle(degree!(60.0))
            .unwrap();
        // tangential: f = R cos / 2 = 25 mm, sagittal: f = R / (2 cos) = 100 mm
        assert_relative_eq!(m.matrix(Orientation::Horizontal).c(), -40.0, max_relative = 1e-9);
        assert_relative_eq!(m.matrix(Orientation::Vertical).c(), -10.0, max_relative = 1e-9);
        assert!(CurvedMirror::new(millimeter!(100.0))
            .unwrap()
            .with_angle(degree!(90.0))
            .is_err());
    }
    #[test]
    fn set_focal_length() {
        let mut m = CurvedMirror::new(millimeter!(100.0)).unwrap();
        m.set_focal_length(millimeter!(200.0)).unwrap();
        assert_relative_eq!(m.curvature().value, 0.4);
        assert!(m.set_focal_length(millimeter!(0.0)).is_err());
    }
}
