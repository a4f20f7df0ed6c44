#![warn(missing_docs)]
//! Propagation of the input beam through an optics bench
//!
//! The [`BeamPropagator`] starts with the complex beam parameter of the input beam and walks through all elements
//! located before the requested position in propagation order. Between two elements the beam is translated
//! through free space. Thick elements are entered at their position and left at their end position.
//!
//! Nothing is cached: every call recomputes the result from the current state of the bench.
use crate::{
    abcd::AbcdMatrix,
    beam_parameter::ComplexBeamParameter,
    bench::OpticsBench,
    elements::InputBeam,
    error::BeamResult,
    orientation::Orientation,
};
use uom::si::f64::Length;

/// Computes beam parameters and cumulative matrices for an [`OpticsBench`].
#[derive(Debug, Clone, Copy)]
pub struct BeamPropagator<'a> {
    bench: &'a OpticsBench,
    input_beam: Option<InputBeam>,
}
impl<'a> BeamPropagator<'a> {
    /// Creates a new [`BeamPropagator`] for the given bench.
    #[must_use]
    pub const fn new(bench: &'a OpticsBench) -> Self {
        Self {
            bench,
            input_beam: None,
        }
    }
    /// Use the given input beam instead of the one stored on the bench. The bench itself is not modified.
    #[must_use]
    pub fn with_input_beam(mut self, input_beam: InputBeam) -> Self {
        self.input_beam = Some(input_beam);
        self
    }
    /// The bench this propagator works on.
    #[must_use]
    pub const fn bench(&self) -> &'a OpticsBench {
        self.bench
    }
    fn input_beam(&self) -> BeamResult<InputBeam> {
        match self.input_beam {
            Some(beam) => Ok(beam),
            None => self.bench.input_beam().copied(),
        }
    }
    /// Beam parameter of the input beam at the position of the input beam element.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench is corrupted or the bench parameters are invalid.
    pub fn input_parameter(&self, orientation: Orientation) -> BeamResult<ComplexBeamParameter> {
        self.input_beam()?.beam_parameter(
            orientation,
            self.bench.input_element()?.position(),
            self.bench.wavelength(),
            self.bench.ambient_index(),
        )
    }
    /// Beam parameter in the given plane at `position`.
    ///
    /// All elements located strictly before `position` are taken into account. If `position` lies inside a thick
    /// element, the beam inside the element is returned. For a generic ABCD block whose inside is unknown, the beam
    /// is propagated through free space from the entrance of the block.
    ///
    /// # Errors
    ///
    /// This function will return [`BeamError::DegenerateBeam`](crate::error::BeamError::DegenerateBeam) if the beam
    /// degenerates on its way.
    pub fn propagate(
        &self,
        position: Length,
        orientation: Orientation,
    ) -> BeamResult<ComplexBeamParameter> {
        self.propagate_to(position, orientation, false)
    }
    fn propagate_to(
        &self,
        position: Length,
        orientation: Orientation,
        include_elements_at_position: bool,
    ) -> BeamResult<ComplexBeamParameter> {
        let mut q = self.input_parameter(orientation)?;
        for element in self.bench.optics() {
            let reached = if include_elements_at_position {
                element.position() > position
            } else {
                element.position() >= position
            };
            if reached {
                break;
            }
            q = q.translate_to(element.position())?;
            if element.end_position() <= position {
                q = q.propagate(
                    &element.matrix(orientation),
                    element.index_ratio(),
                    element.end_position(),
                )?;
            } else {
                let depth = position - element.position();
                return match element.interior_matrix(orientation, depth) {
                    Some((matrix, index_ratio)) => q.propagate(&matrix, index_ratio, position),
                    None => q.translate_to(position),
                };
            }
        }
        q.translate_to(position)
    }
    /// Beam parameters at several positions.
    ///
    /// # Errors
    ///
    /// This function will return an error if the propagation to one of the positions fails.
    pub fn propagate_all(
        &self,
        positions: &[Length],
        orientation: Orientation,
    ) -> BeamResult<Vec<ComplexBeamParameter>> {
        positions
            .iter()
            .map(|p| self.propagate(*p, orientation))
            .collect()
    }
    /// Beam parameter directly behind the last element of the bench (at its end position).
    ///
    /// # Errors
    ///
    /// This function will return an error if the beam degenerates on its way.
    pub fn output_beam(&self, orientation: Orientation) -> BeamResult<ComplexBeamParameter> {
        self.propagate_to(self.bench.end_position(), orientation, true)
    }
    /// Cumulative ray transfer matrix from the input beam element to `position` and the accumulated refractive
    /// index ratio.
    ///
    /// The matrix is `M = T(position - z_n) · M_n · … · T(z_2 - z_1) · M_1 · T(z_1 - z_0)`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench is corrupted.
    pub fn matrix(
        &self,
        position: Length,
        orientation: Orientation,
    ) -> BeamResult<(AbcdMatrix, f64)> {
        let mut z = self.bench.input_element()?.position().value;
        let mut total = AbcdMatrix::identity();
        let mut index_ratio = 1.0;
        for element in self.bench.optics() {
            if element.position() >= position {
                break;
            }
            total = AbcdMatrix::free_space(element.position().value - z) * total;
            if element.end_position() <= position {
                total = element.matrix(orientation) * total;
                index_ratio *= element.index_ratio();
                z = element.end_position().value;
            } else {
                let depth = position - element.position();
                if let Some((matrix, ratio)) = element.interior_matrix(orientation, depth) {
                    return Ok((matrix * total, index_ratio * ratio));
                }
                z = element.position().value;
                break;
            }
        }
        Ok((
            AbcdMatrix::free_space(position.value - z) * total,
            index_ratio,
        ))
    }
    /// Refractive index of the medium at `position`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench is corrupted.
    pub fn index_at(&self, position: Length, orientation: Orientation) -> BeamResult<f64> {
        Ok(self.bench.ambient_index() * self.matrix(position, orientation)?.1)
    }
}
