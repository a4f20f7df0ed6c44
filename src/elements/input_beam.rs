#![warn(missing_docs)]
//! The input beam of an optics bench
//!
//! The input beam defines the Gaussian beam before any optical element. It is given by its waist radius (1/e²) and
//! the absolute waist position, independently for both transverse planes, and by its beam quality factor M².
//! Wavelength and refractive index of the medium are properties of the bench.
use super::Element;
use crate::{
    abcd::AbcdMatrix,
    beam_parameter::ComplexBeamParameter,
    error::{BeamError, BeamResult},
    orientation::Orientation,
};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

const fn plane(orientation: Orientation) -> usize {
    match orientation {
        Orientation::Horizontal => 0,
        Orientation::Vertical => 1,
    }
}

/// Waist and waist position of the beam entering the bench.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputBeam {
    waist: [Length; 2],
    waist_position: [Length; 2],
    m2: f64,
}
impl InputBeam {
    /// Creates a new (spherical) [`InputBeam`] with M² = 1.
    ///
    /// # Errors
    ///
    /// This function will return an error if the waist is not strictly positive and finite or the waist position is
    /// not finite.
    pub fn new(waist: Length, waist_position: Length) -> BeamResult<Self> {
        let beam = Self {
            waist: [waist; 2],
            waist_position: [waist_position; 2],
            m2: 1.0,
        };
        beam.validate()?;
        Ok(beam)
    }
    /// Modifies the beam quality factor M². This function can be used with the "builder pattern".
    ///
    /// # Errors
    ///
    /// This function will return an error if `m2` is below 1.0 or not finite.
    pub fn with_m2(mut self, m2: f64) -> BeamResult<Self> {
        self.set_m2(m2)?;
        Ok(self)
    }
    /// Waist radius in the given plane.
    #[must_use]
    pub const fn waist(&self, orientation: Orientation) -> Length {
        self.waist[plane(orientation)]
    }
    /// Absolute waist position in the given plane.
    #[must_use]
    pub const fn waist_position(&self, orientation: Orientation) -> Length {
        self.waist_position[plane(orientation)]
    }
    /// Beam quality factor M².
    #[must_use]
    pub const fn m2(&self) -> f64 {
        self.m2
    }
    /// Sets the waist radius in the given plane.
    ///
    /// # Errors
    ///
    /// This function will return an error if the waist is not strictly positive and finite.
    pub fn set_waist(&mut self, orientation: Orientation, waist: Length) -> BeamResult<()> {
        check_waist(waist)?;
        self.waist[plane(orientation)] = waist;
        Ok(())
    }
    /// Sets the waist position in the given plane.
    ///
    /// # Errors
    ///
    /// This function will return an error if the position is not finite.
    pub fn set_waist_position(
        &mut self,
        orientation: Orientation,
        waist_position: Length,
    ) -> BeamResult<()> {
        check_waist_position(waist_position)?;
        self.waist_position[plane(orientation)] = waist_position;
        Ok(())
    }
    /// Sets the beam quality factor M².
    ///
    /// # Errors
    ///
    /// This function will return an error if `m2` is below 1.0 or not finite.
    pub fn set_m2(&mut self, m2: f64) -> BeamResult<()> {
        if !m2.is_finite() || m2 < 1.0 {
            return Err(BeamError::ElementConfiguration(
                "beam quality factor M² must be >= 1.0 and finite".into(),
            ));
        }
        self.m2 = m2;
        Ok(())
    }
    /// Returns `true` if waist and waist position are identical in both planes.
    #[must_use]
    pub fn is_spherical(&self) -> bool {
        self.waist[0] == self.waist[1] && self.waist_position[0] == self.waist_position[1]
    }
    /// Complex beam parameter of this beam at `position`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the wavelength or the index are invalid.
    pub fn beam_parameter(
        &self,
        orientation: Orientation,
        position: Length,
        wavelength: Length,
        index: f64,
    ) -> BeamResult<ComplexBeamParameter> {
        ComplexBeamParameter::from_waist(
            self.waist(orientation),
            self.waist_position(orientation),
            wavelength,
            index,
            self.m2,
            position,
        )
    }
}
fn check_waist(waist: Length) -> BeamResult<()> {
    if !waist.is_finite() || waist.value <= 0.0 {
        return Err(BeamError::ElementConfiguration(
            "waist must be > 0.0 and finite".into(),
        ));
    }
    Ok(())
}
fn check_waist_position(waist_position: Length) -> BeamResult<()> {
    if !waist_position.is_finite() {
        return Err(BeamError::ElementConfiguration(
            "waist position must be finite".into(),
        ));
    }
    Ok(())
}
impl Element for InputBeam {
    fn node_type(&self) -> &'static str {
        "input beam"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::identity()
    }
    fn validate(&self) -> BeamResult<()> {
        for (waist, waist_position) in self.waist.iter().zip(self.waist_position.iter()) {
            check_waist(*waist)?;
            check_waist_position(*waist_position)?;
        }
        if !self.m2.is_finite() || self.m2 < 1.0 {
            return Err(BeamError::ElementConfiguration(
                "beam quality factor M² must be >= 1.0 and finite".into(),
            ));
        }
        Ok(())
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{micrometer, millimeter, nanometer};
    use approx::assert_relative_eq;
    #[test]
    fn new() {
        assert!(InputBeam::new(micrometer!(0.0), millimeter!(0.0)).is_err());
        assert!(InputBeam::new(micrometer!(-10.0), millimeter!(0.0)).is_err());
        assert!(InputBeam::new(micrometer!(10.0), millimeter!(f64::NAN)).is_err());
        let b = InputBeam::new(micrometer!(100.0), millimeter!(-20.0)).unwrap();
        assert!(b.is_spherical());
        assert_eq!(b.m2(), 1.0);
        assert_eq!(b.waist(Orientation::Vertical), micrometer!(100.0));
        assert_eq!(b.waist_position(Orientation::Horizontal), millimeter!(-20.0));
    }
    #[test]
    fn astigmatic() {
        let mut b = InputBeam::new(micrometer!(100.0), millimeter!(0.0)).unwrap();
        b.set_waist(Orientation::Vertical, micrometer!(50.0)).unwrap();
        assert!(!b.is_spherical());
        assert!(b.set_waist(Orientation::Vertical, micrometer!(0.0)).is_err());
        assert_eq!(b.waist(Orientation::Vertical), micrometer!(50.0));
        b.set_waist(Orientation::Vertical, micrometer!(100.0)).unwrap();
        b.set_waist_position(Orientation::Horizontal, millimeter!(5.0))
            .unwrap();
        assert!(!b.is_spherical());
        assert!(b
            .set_waist_position(Orientation::Horizontal, millimeter!(f64::INFINITY))
            .is_err());
    }
    #[test]
    fn m2() {
        assert!(InputBeam::new(micrometer!(100.0), millimeter!(0.0))
            .unwrap()
            .with_m2(0.9)
            .is_err());
        let b = InputBeam::new(micrometer!(100.0), millimeter!(0.0))
            .unwrap()
            .with_m2(1.3)
            .unwrap();
        assert_eq!(b.m2(), 1.3);
    }
    #[test]
    fn beam_parameter() {
        let b = InputBeam::new(micrometer!(100.0), millimeter!(-50.0)).unwrap();
        let q = b
            .beam_parameter(Orientation::Horizontal, millimeter!(0.0), nanometer!(1064.0), 1.0)
            .unwrap();
        assert_relative_eq!(q.waist().value, 1.0e-4, max_relative = 1e-12);
        assert_relative_eq!(q.distance_to_waist().value, 0.05, max_relative = 1e-12);
        assert!(b
            .beam_parameter(Orientation::Horizontal, millimeter!(0.0), nanometer!(0.0), 1.0)
            .is_err());
    }
}
