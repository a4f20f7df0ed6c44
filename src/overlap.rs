#![warn(missing_docs)]
//! Mode overlap of Gaussian beams
//!
//! The overlap is the normalized power coupling efficiency between two fundamental Gaussian modes
//!
//! η = 4 / (w₁² w₂²) / [ (1/w₁² + 1/w₂²)² + (k₁ / (2 R₁) - k₂ / (2 R₂))² ]
//!
//! where `w` denotes the beam radius, `R` the wavefront radius of curvature and `k = 2π n / (λ M²)` the (effective)
//! wave number in the medium. Both beams have to be known at the same plane. It equals 1 for identical beams and
//! tends to 0 for strongly mismatched modes.
use crate::{beam_parameter::ComplexBeamParameter, error::BeamResult, utils::sqr};
use log::warn;
use std::f64::consts::PI;

fn wave_number(beam: &ComplexBeamParameter) -> f64 {
    2.0 * PI * beam.index() / (beam.wavelength().value * beam.m2())
}
fn inverse_curvature(beam: &ComplexBeamParameter) -> f64 {
    let q = beam.q();
    q.re / q.norm_sqr()
}

/// Overlap of two beams given at the same plane.
///
/// If the beams are tagged with different positions, `beam2` is propagated through free space to the plane of
/// `beam1` first (and a warning is emitted).
///
/// # Errors
///
/// This function will return an error if the translation of `beam2` fails.
pub fn overlap(beam1: &ComplexBeamParameter, beam2: &ComplexBeamParameter) -> BeamResult<f64> {
    let beam2 = if beam1.position() == beam2.position() {
        *beam2
    } else {
        warn!("beams compared at different positions; propagating second beam to the plane of the first");
        beam2.translate_to(beam1.position())?
    };
    let w1 = sqr(beam1.radius().value);
    let w2 = sqr(beam2.radius().value);
    let phase = wave_number(beam1) * inverse_curvature(beam1) / 2.0
        - wave_number(&beam2) * inverse_curvature(&beam2) / 2.0;
    let eta = 4.0 / (w1 * w2) / (sqr(1.0 / w1 + 1.0 / w2) + sqr(phase));
    Ok(eta.clamp(0.0, 1.0))
}
/// Overlap of two astigmatic beams given by their horizontal and vertical beam parameters.
///
/// The result is the geometric mean `sqrt(η_h η_v)` of the overlaps in both planes.
///
/// # Errors
///
/// This function will return an error if one of the single plane overlaps fails.
pub fn astigmatic_overlap(
    horizontal1: &ComplexBeamParameter,
    vertical1: &ComplexBeamParameter,
    horizontal2: &ComplexBeamParameter,
    vertical2: &ComplexBeamParameter,
) -> BeamResult<f64> {
    let eta_h = overlap(horizontal1, horizontal2)?;
    let eta_v = overlap(vertical1, vertical2)?;
    Ok((eta_h * eta_v).sqrt())
}
