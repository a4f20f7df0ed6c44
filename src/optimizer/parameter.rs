//! Continuous bench parameters varied by the optimizers
use crate::{
    bench::OpticsBench,
    elements::{ElementId, OpticalElement, Parameter},
    error::{BeamError, BeamResult},
    meter,
};
use serde::{Deserialize, Serialize};
use strum::Display;
use uom::si::f64::Length;

/// Kind of a free parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ParameterKind {
    /// position of an element (moves its whole lock group)
    Position,
    /// focal length of a lens or curved mirror
    FocalLength,
}

/// A parameter of one element which an optimizer may vary within `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeParameter {
    element: ElementId,
    kind: ParameterKind,
    min: Length,
    max: Length,
}
impl FreeParameter {
    fn new(element: ElementId, kind: ParameterKind, min: Length, max: Length) -> BeamResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(BeamError::Other(
                "parameter bounds must be finite with min < max".into(),
            ));
        }
        Ok(Self {
            element,
            kind,
            min,
            max,
        })
    }
    /// Vary the position of an element between `min` and `max`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bounds are not finite or `min >= max`.
    pub fn position(element: ElementId, min: Length, max: Length) -> BeamResult<Self> {
        Self::new(element, ParameterKind::Position, min, max)
    }
    /// Vary the focal length of an element between `min` and `max`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bounds are not finite or `min >= max`.
    pub fn focal_length(element: ElementId, min: Length, max: Length) -> BeamResult<Self> {
        Self::new(element, ParameterKind::FocalLength, min, max)
    }
    /// Element this parameter belongs to.
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }
    /// Kind of this parameter.
    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        self.kind
    }
    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> Length {
        self.min
    }
    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> Length {
        self.max
    }
    pub(crate) fn contains(&self, value: f64) -> bool {
        value >= self.min.value && value <= self.max.value
    }
    fn target<'a>(&self, bench: &'a OpticsBench) -> BeamResult<&'a OpticalElement> {
        bench
            .element(self.element)
            .ok_or_else(|| BeamError::Bench(format!("no element with id {}", self.element)))
    }
    /// Check that the parameter can be varied on the given bench.
    pub(crate) fn validate(&self, bench: &OpticsBench) -> BeamResult<()> {
        let element = self.target(bench)?;
        if element.is_input_beam() {
            return Err(BeamError::Bench(
                "the input beam cannot be used as free parameter".into(),
            ));
        }
        match self.kind {
            ParameterKind::Position => {
                if element.is_locked(Parameter::Position) || !bench.is_movable(self.element)? {
                    return Err(BeamError::Bench(format!(
                        "position of element '{}' is locked",
                        element.name()
                    )));
                }
            }
            ParameterKind::FocalLength => {
                if element.focal_length().is_none() || !element.has_adjustable_focal_length() {
                    return Err(BeamError::Bench(format!(
                        "element '{}' has no adjustable focal length",
                        element.name()
                    )));
                }
                if element.is_locked(Parameter::FocalLength) {
                    return Err(BeamError::Bench(format!(
                        "focal length of element '{}' is locked",
                        element.name()
                    )));
                }
            }
        }
        Ok(())
    }
    /// Current value (in meters) on the given bench.
    pub(crate) fn current(&self, bench: &OpticsBench) -> BeamResult<f64> {
        let element = self.target(bench)?;
        match self.kind {
            ParameterKind::Position => Ok(element.position().value),
            ParameterKind::FocalLength => element.focal_length().map(|f| f.value).ok_or_else(|| {
                BeamError::Bench(format!("element '{}' has no focal length", element.name()))
            }),
        }
    }
    /// Set the parameter to `value` (in meters).
    pub(crate) fn apply(&self, bench: &mut OpticsBench, value: f64) -> BeamResult<()> {
        match self.kind {
            ParameterKind::Position => bench.move_element(self.element, meter!(value)),
            ParameterKind::FocalLength => bench.modify_element(self.element, |e| {
                e.set_focal_length(meter!(value))
            }),
        }
    }
}

/// Copy of `bench` with the given values (in meters) assigned to the parameters.
pub(crate) fn configure(
    bench: &OpticsBench,
    parameters: &[FreeParameter],
    values: &[f64],
) -> BeamResult<OpticsBench> {
    let mut configured = bench.clone();
    for (parameter, value) in parameters.iter().zip(values) {
        parameter.apply(&mut configured, *value)?;
    }
    Ok(configured)
}
/// Validate a new parameter against the bench and the already selected ones.
pub(crate) fn check_new_parameter(
    bench: &OpticsBench,
    selected: &[FreeParameter],
    parameter: &FreeParameter,
) -> BeamResult<()> {
    parameter.validate(bench)?;
    if selected
        .iter()
        .any(|p| p.element == parameter.element && p.kind == parameter.kind)
    {
        return Err(BeamError::Bench("parameter selected twice".into()));
    }
    Ok(())
}
