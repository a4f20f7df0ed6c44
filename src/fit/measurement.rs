#![warn(missing_docs)]
//! Named sets of beam width measurements
use crate::{
    error::{BeamError, BeamResult},
    orientation::Orientation,
};
use log::warn;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use uom::si::f64::Length;

/// Statistical estimator in which the measured widths are given.
///
/// All values are converted to the 1/e² intensity radius used by the propagation model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, Display)]
pub enum FitDataType {
    /// 1/e² intensity radius
    #[default]
    Radius1e2,
    /// 1/e² intensity diameter
    Diameter1e2,
    /// standard deviation of the intensity profile (second moment radius / 2)
    StandardDeviation,
    /// full width at half maximum
    #[strum(serialize = "FWHM")]
    Fwhm,
    /// half width at half maximum
    #[strum(serialize = "HWHM")]
    Hwhm,
}
impl FitDataType {
    /// Factor converting a value of this type to a 1/e² radius.
    #[must_use]
    pub fn radius_factor(self) -> f64 {
        match self {
            Self::Radius1e2 => 1.0,
            Self::Diameter1e2 => 0.5,
            Self::StandardDeviation => 2.0,
            Self::Fwhm => 1.0 / (2.0 * std::f64::consts::LN_2).sqrt(),
            Self::Hwhm => (2.0 / std::f64::consts::LN_2).sqrt(),
        }
    }
    /// Convert a measured value to a 1/e² radius.
    #[must_use]
    pub fn to_radius(self, value: Length) -> Length {
        value * self.radius_factor()
    }
    /// Convert a 1/e² radius to a value of this type.
    #[must_use]
    pub fn from_radius(self, radius: Length) -> Length {
        radius / self.radius_factor()
    }
}

/// Transverse plane(s) a measurement refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, Display)]
pub enum MeasurementPlane {
    /// horizontal plane only
    Horizontal,
    /// vertical plane only
    Vertical,
    /// both planes (round beam)
    #[default]
    Both,
}
impl MeasurementPlane {
    /// Returns `true` if the measurement is valid for the given plane.
    #[must_use]
    pub const fn includes(self, orientation: Orientation) -> bool {
        match self {
            Self::Both => true,
            Self::Horizontal => matches!(orientation, Orientation::Horizontal),
            Self::Vertical => matches!(orientation, Orientation::Vertical),
        }
    }
}
impl From<Orientation> for MeasurementPlane {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self::Horizontal,
            Orientation::Vertical => Self::Vertical,
        }
    }
}

/// A single measured width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// position on the optical axis
    pub position: Length,
    /// measured width (in the unit of the fit's [`FitDataType`])
    pub value: Length,
    /// plane(s) of the measurement
    pub plane: MeasurementPlane,
}
impl Measurement {
    fn validate(&self) -> BeamResult<()> {
        if !self.position.is_finite() {
            return Err(BeamError::Other("measurement position must be finite".into()));
        }
        if !self.value.is_finite() || self.value.value < 0.0 {
            return Err(BeamError::Other(
                "measured value must be >= 0.0 and finite".into(),
            ));
        }
        Ok(())
    }
}

/// A named set of measurements owned by an optics bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    name: String,
    data_type: FitDataType,
    measurements: Vec<Measurement>,
}
impl Fit {
    /// Creates a new, empty [`Fit`] for 1/e² radii.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            data_type: FitDataType::default(),
            measurements: Vec::new(),
        }
    }
    /// Name of the fit.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    pub(crate) fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }
    /// Estimator of the measured values.
    #[must_use]
    pub const fn data_type(&self) -> FitDataType {
        self.data_type
    }
    /// Sets the estimator of the measured values.
    pub fn set_data_type(&mut self, data_type: FitDataType) {
        self.data_type = data_type;
    }
    /// All measurement rows in insertion order.
    #[must_use]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }
    /// Appends a measurement row.
    ///
    /// # Errors
    ///
    /// This function will return an error if the position is not finite or the value is negative or not finite.
    pub fn add_measurement(
        &mut self,
        position: Length,
        value: Length,
        plane: MeasurementPlane,
    ) -> BeamResult<()> {
        let measurement = Measurement {
            position,
            value,
            plane,
        };
        measurement.validate()?;
        self.measurements.push(measurement);
        Ok(())
    }
    /// Replaces the measurement row at `index`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is out of range or the new row is invalid.
    pub fn set_measurement(&mut self, index: usize, measurement: Measurement) -> BeamResult<()> {
        measurement.validate()?;
        let row = self
            .measurements
            .get_mut(index)
            .ok_or_else(|| BeamError::Other(format!("no measurement with index {index}")))?;
        *row = measurement;
        Ok(())
    }
    /// Removes the measurement row at `index`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is out of range.
    pub fn remove_measurement(&mut self, index: usize) -> BeamResult<Measurement> {
        if index >= self.measurements.len() {
            return Err(BeamError::Other(format!("no measurement with index {index}")));
        }
        Ok(self.measurements.remove(index))
    }
    /// Removes all measurement rows.
    pub fn clear(&mut self) {
        self.measurements.clear();
    }
    /// Returns `true` if the fit contains data for the given plane.
    #[must_use]
    pub fn has_data(&self, orientation: Orientation) -> bool {
        self.measurements
            .iter()
            .any(|m| m.plane.includes(orientation) && m.value.value > 0.0)
    }
    /// Measured data of one plane as (position, 1/e² radius) pairs in meters, sorted by position.
    ///
    /// Rows with a zero value are skipped with a warning.
    #[must_use]
    pub fn radii(&self, orientation: Orientation) -> Vec<(f64, f64)> {
        let mut data: Vec<(f64, f64)> = Vec::new();
        for (index, m) in self.measurements.iter().enumerate() {
            if !m.plane.includes(orientation) {
                continue;
            }
            if m.value.value == 0.0 {
                warn!("fit '{}': ignoring measurement #{index} with zero value", self.name);
                continue;
            }
            data.push((m.position.value, self.data_type.to_radius(m.value).value));
        }
        data.sort_by(|a, b| a.0.total_cmp(&b.0));
        data
    }
}
