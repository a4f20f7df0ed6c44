#![warn(missing_docs)]
//! The complex beam parameter of a Gaussian beam
//!
//! A [`ComplexBeamParameter`] describes a Gaussian beam at one axial position by the complex number
//! `q = (z - z_w) + i z_0` where `z_w` is the waist position and `z_0` the Rayleigh range. Together with the
//! (vacuum) wavelength, the refractive index of the medium and the beam quality factor M² all other beam
//! properties (beam radius, waist, radius of curvature, Gouy phase, divergence) can be derived.
//!
//! Values are immutable: propagation produces new values.
use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    utils::sqr,
};
use num::complex::Complex64;
use std::f64::consts::PI;
use uom::si::f64::{Angle, Length};
use uom::si::{angle::radian, length::meter};

/// Complex beam parameter at a given position on the optical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexBeamParameter {
    q: Complex64,
    position: f64,
    wavelength: f64,
    index: f64,
    m2: f64,
}
impl ComplexBeamParameter {
    /// Create a beam parameter from a raw complex `q` (in meters) at the given position.
    ///
    /// # Errors
    ///
    /// This function returns an error if
    ///   - the imaginary part of `q` (Rayleigh range) is not strictly positive or not finite.
    ///   - the wavelength is not strictly positive and finite
    ///   - the refractive index is not strictly positive and finite
    ///   - M² is < 1.0 or not finite
    pub fn new(
        q: Complex64,
        position: Length,
        wavelength: Length,
        index: f64,
        m2: f64,
    ) -> BeamResult<Self> {
        if !wavelength.is_finite() || wavelength.value <= 0.0 {
            return Err(BeamError::ElementConfiguration(
                "wavelength must be > 0.0 and finite".into(),
            ));
        }
        if !index.is_finite() || index <= 0.0 {
            return Err(BeamError::ElementConfiguration(
                "refractive index must be > 0.0 and finite".into(),
            ));
        }
        if !m2.is_finite() || m2 < 1.0 {
            return Err(BeamError::ElementConfiguration(
                "beam quality factor M² must be >= 1.0 and finite".into(),
            ));
        }
        Self::checked(q, position.value, wavelength.value, index, m2)
    }
    fn checked(q: Complex64, position: f64, wavelength: f64, index: f64, m2: f64) -> BeamResult<Self> {
        if !(q.im > 0.0) || !q.im.is_finite() || !q.re.is_finite() {
            return Err(BeamError::DegenerateBeam(format!(
                "Rayleigh range must be > 0.0 and finite, got q = {q}"
            )));
        }
        Ok(Self {
            q,
            position,
            wavelength,
            index,
            m2,
        })
    }
    /// Create the beam parameter at `position` of a beam with the given waist radius (1/e²) located at `waist_position`.
    ///
    /// # Errors
    ///
    /// This function returns an error if the waist is not strictly positive and finite or if one of the
    /// conditions of [`ComplexBeamParameter::new`] is violated.
    pub fn from_waist(
        waist: Length,
        waist_position: Length,
        wavelength: Length,
        index: f64,
        m2: f64,
        position: Length,
    ) -> BeamResult<Self> {
        if !waist.is_finite() || waist.value <= 0.0 {
            return Err(BeamError::ElementConfiguration(
                "waist must be > 0.0 and finite".into(),
            ));
        }
        if !waist_position.is_finite() {
            return Err(BeamError::ElementConfiguration(
                "waist position must be finite".into(),
            ));
        }
        let rayleigh = index * PI * sqr(waist.value) / (wavelength.value * m2);
        let q = Complex64::new(position.value - waist_position.value, rayleigh);
        Self::new(q, position, wavelength, index, m2)
    }
    /// Propagate the beam through an optical element given by its `matrix` and refractive index jump
    /// `index_ratio` (output index / input index). The new parameter is tagged with `new_position`.
    ///
    /// The matrix has to follow the reduced convention (`det = 1 / index_ratio`).
    ///
    /// # Errors
    ///
    /// This function returns [`BeamError::DegenerateBeam`] if the resulting beam has a non-positive Rayleigh range.
    pub fn propagate(
        &self,
        matrix: &AbcdMatrix,
        index_ratio: f64,
        new_position: Length,
    ) -> BeamResult<Self> {
        let q = matrix.transform(self.q);
        Self::checked(
            q,
            new_position.value,
            self.wavelength,
            self.index * index_ratio,
            self.m2,
        )
    }
    /// Free space propagation to a new position (in the current medium).
    ///
    /// # Errors
    ///
    /// This function returns an error if the resulting beam is degenerate (which cannot happen for finite distances).
    pub fn translate_to(&self, position: Length) -> BeamResult<Self> {
        let distance = position.value - self.position;
        self.propagate(&AbcdMatrix::free_space(distance), 1.0, position)
    }
    /// Raw complex beam parameter (in meters).
    #[must_use]
    pub const fn q(&self) -> Complex64 {
        self.q
    }
    /// Axial position this parameter refers to.
    #[must_use]
    pub fn position(&self) -> Length {
        Length::new::<meter>(self.position)
    }
    /// Vacuum wavelength.
    #[must_use]
    pub fn wavelength(&self) -> Length {
        Length::new::<meter>(self.wavelength)
    }
    /// Refractive index of the medium at this position.
    #[must_use]
    pub const fn index(&self) -> f64 {
        self.index
    }
    /// Beam quality factor M².
    #[must_use]
    pub const fn m2(&self) -> f64 {
        self.m2
    }
    /// Rayleigh range (imaginary part of q).
    #[must_use]
    pub fn rayleigh_range(&self) -> Length {
        Length::new::<meter>(self.q.im)
    }
    /// Signed distance from the waist to the current position (real part of q). Positive values mean that the
    /// waist lies before the current position.
    #[must_use]
    pub fn distance_to_waist(&self) -> Length {
        Length::new::<meter>(self.q.re)
    }
    /// Absolute position of the waist.
    #[must_use]
    pub fn waist_position(&self) -> Length {
        Length::new::<meter>(self.position - self.q.re)
    }
    /// Waist radius (1/e²).
    #[must_use]
    pub fn waist(&self) -> Length {
        Length::new::<meter>(self.waist_value())
    }
    fn waist_value(&self) -> f64 {
        (self.q.im * self.wavelength * self.m2 / (self.index * PI)).sqrt()
    }
    fn reduced_position(&self) -> f64 {
        self.q.re / self.q.im
    }
    /// Beam radius (1/e²) at the current position.
    #[must_use]
    pub fn radius(&self) -> Length {
        Length::new::<meter>(self.waist_value() * (1.0 + sqr(self.reduced_position())).sqrt())
    }
    /// First derivative of the beam radius with respect to the axial position.
    #[must_use]
    pub fn radius_derivative(&self) -> f64 {
        let zred = self.reduced_position();
        self.waist_value() / self.q.im * zred / (1.0 + sqr(zred)).sqrt()
    }
    /// Second derivative of the beam radius with respect to the axial position (in 1/m).
    #[must_use]
    pub fn radius_second_derivative(&self) -> f64 {
        self.waist_value() / sqr(self.q.im) / (1.0 + sqr(self.reduced_position())).powf(1.5)
    }
    /// Radius of curvature of the wavefront. A flat wavefront (at the waist) yields an infinite radius.
    #[must_use]
    pub fn curvature(&self) -> Length {
        if self.q.re == 0.0 {
            return Length::new::<meter>(f64::INFINITY);
        }
        Length::new::<meter>(self.q.re * (1.0 + sqr(self.q.im / self.q.re)))
    }
    /// Gouy phase relative to the waist.
    #[must_use]
    pub fn gouy_phase(&self) -> Angle {
        Angle::new::<radian>(self.reduced_position().atan())
    }
    /// Half angle far field divergence.
    #[must_use]
    pub fn divergence(&self) -> Angle {
        let waist = self.waist_value();
        if waist == 0.0 {
            return Angle::new::<radian>(0.0);
        }
        Angle::new::<radian>((self.wavelength * self.m2 / (self.index * PI * waist)).atan())
    }
    /// Returns `true` if both parameters describe the same beam at the same plane within a relative tolerance.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, relative: f64) -> bool {
        let scale = self.q.norm().max(other.q.norm());
        (self.q - other.q).norm() <= relative * scale
            && (self.position - other.position).abs() <= relative * scale.max(self.position.abs())
    }
}
