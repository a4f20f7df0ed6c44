#![warn(missing_docs)]
//! Fitting the input beam of a bench to measured beam widths
//!
//! Both planes are fitted independently. The free parameters of a plane are the waist and the waist position of
//! the input beam (unless locked on the input beam element). The model width at a measurement position is obtained
//! by propagating the candidate input beam through all elements before that position, so measurements taken behind
//! lenses or mirrors directly yield the beam entering the bench.
//!
//! The minimization is started from the current input beam and from straight line (far field) estimates through
//! all points, the first two and the last two points. The best converged run wins. The bench itself is never
//! modified; use [`FitResult::apply`] to accept a result.
use super::{
    least_squares::levenberg_marquardt, statistics::LinearRegression, Fit, FitDataType,
};
use crate::{
    abcd::AbcdMatrix,
    beam_parameter::ComplexBeamParameter,
    bench::OpticsBench,
    cancel::CancelFlag,
    elements::{InputBeam, OpticalElement, Parameter},
    error::{BeamError, BeamResult},
    meter,
    orientation::Orientation,
    propagation::BeamPropagator,
    utils::{rms, usize_to_f64},
};
use itertools::Itertools;
use log::{debug, info};
use nalgebra::DVector;
use num::complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use strum::IntoEnumIterator;
use uom::si::f64::Length;

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
/// Configuration of the non-linear least squares solver used for beam fits.
pub struct FitConfig {
    max_iterations: usize,
    tolerance: f64,
    initial_damping: f64,
}
impl Default for FitConfig {
    /// Create a default config with the following parameters:
    ///   - maximum number of iterations: `200`
    ///   - relative tolerance on cost decrease and step size: `1e-12`
    ///   - initial damping factor: `1e-3`
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-12,
            initial_damping: 1e-3,
        }
    }
}
impl FitConfig {
    /// Returns the maximum number of iterations of one minimization run.
    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }
    /// Sets the maximum number of iterations of one minimization run.
    ///
    /// # Errors
    ///
    /// This function will return an error if `max_iterations` is zero.
    pub fn set_max_iterations(&mut self, max_iterations: usize) -> BeamResult<()> {
        if max_iterations == 0 {
            return Err(BeamError::Other(
                "maximum number of iterations must be > 0".into(),
            ));
        }
        self.max_iterations = max_iterations;
        Ok(())
    }
    /// Returns the relative convergence tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }
    /// Sets the relative convergence tolerance.
    ///
    /// # Errors
    ///
    /// This function will return an error if the tolerance is not strictly positive and finite.
    pub fn set_tolerance(&mut self, tolerance: f64) -> BeamResult<()> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(BeamError::Other(
                "tolerance must be > 0.0 and finite".into(),
            ));
        }
        self.tolerance = tolerance;
        Ok(())
    }
    /// Returns the initial damping factor.
    #[must_use]
    pub const fn initial_damping(&self) -> f64 {
        self.initial_damping
    }
    /// Sets the initial damping factor.
    ///
    /// # Errors
    ///
    /// This function will return an error if the damping factor is not strictly positive and finite.
    pub fn set_initial_damping(&mut self, initial_damping: f64) -> BeamResult<()> {
        if !initial_damping.is_finite() || initial_damping <= 0.0 {
            return Err(BeamError::Other(
                "initial damping must be > 0.0 and finite".into(),
            ));
        }
        self.initial_damping = initial_damping;
        Ok(())
    }
}

/// Result of a beam fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    input_beam: InputBeam,
    data_type: FitDataType,
    horizontal_residue: Option<Length>,
    vertical_residue: Option<Length>,
}
impl FitResult {
    /// The fitted input beam. Planes without data keep the values of the bench.
    #[must_use]
    pub const fn input_beam(&self) -> &InputBeam {
        &self.input_beam
    }
    /// Estimator in which the residues are given.
    #[must_use]
    pub const fn data_type(&self) -> FitDataType {
        self.data_type
    }
    /// Root mean square deviation between model and measurement in the given plane. `None` if the plane was not
    /// fitted.
    #[must_use]
    pub const fn residue(&self, orientation: Orientation) -> Option<Length> {
        match orientation {
            Orientation::Horizontal => self.horizontal_residue,
            Orientation::Vertical => self.vertical_residue,
        }
    }
    /// Residue of the whole fit. If both planes were fitted, this is the geometric mean of both residues.
    #[must_use]
    pub fn combined_residue(&self) -> Length {
        match (self.horizontal_residue, self.vertical_residue) {
            (Some(h), Some(v)) => meter!((h.value * v.value).sqrt()),
            (Some(r), None) | (None, Some(r)) => r,
            (None, None) => meter!(0.0),
        }
    }
    /// Replace the input beam of the bench with the fitted one.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench has no valid input beam element.
    pub fn apply(&self, bench: &mut OpticsBench) -> BeamResult<()> {
        bench.set_input_beam(self.input_beam)
    }
}

/// Fits the input beam of an [`OpticsBench`] to measurements.
#[derive(Debug, Clone)]
pub struct Fitter<'a> {
    bench: &'a OpticsBench,
    config: FitConfig,
    cancel: CancelFlag,
}
impl<'a> Fitter<'a> {
    /// Creates a new [`Fitter`] with a default [`FitConfig`].
    #[must_use]
    pub fn new(bench: &'a OpticsBench) -> Self {
        Self {
            bench,
            config: FitConfig::default(),
            cancel: CancelFlag::new(),
        }
    }
    /// Use the given solver configuration. This function can be used with the "builder pattern".
    #[must_use]
    pub fn with_config(mut self, config: FitConfig) -> Self {
        self.config = config;
        self
    }
    /// Use the given flag for cancelling the fit from another thread.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
    /// Fit the input beam to the named fit of the bench.
    ///
    /// # Errors
    ///
    /// This function will return an error if no fit with the given name exists or if [`Fitter::fit_data`] fails.
    pub fn fit(&self, name: &str) -> BeamResult<FitResult> {
        let fit = self
            .bench
            .fit(name)
            .ok_or_else(|| BeamError::Bench(format!("no fit named '{name}'")))?;
        self.fit_data(fit)
    }
    /// Fit the input beam to the given measurements.
    ///
    /// # Errors
    ///
    /// This function will return
    ///   - [`BeamError::FitUnderdetermined`] if a plane has fewer than two distinct measurement positions or no free
    ///     parameter, or if there is no data at all.
    ///   - [`BeamError::FitDidNotConverge`] if no minimization run converged within its iteration budget.
    ///   - [`BeamError::SearchCancelled`] if the fit was cancelled.
    pub fn fit_data(&self, fit: &Fit) -> BeamResult<FitResult> {
        info!("Fitting input beam to measurements of '{}'", fit.name());
        let input = self.bench.input_element()?;
        let mut beam = *self.bench.input_beam()?;
        let mut result = FitResult {
            input_beam: beam,
            data_type: fit.data_type(),
            horizontal_residue: None,
            vertical_residue: None,
        };
        for orientation in Orientation::iter() {
            if !fit.has_data(orientation) {
                continue;
            }
            let (waist, waist_position, residue) =
                self.fit_plane(fit, orientation, &beam, input)?;
            beam.set_waist(orientation, waist)?;
            beam.set_waist_position(orientation, waist_position)?;
            match orientation {
                Orientation::Horizontal => result.horizontal_residue = Some(residue),
                Orientation::Vertical => result.vertical_residue = Some(residue),
            }
        }
        if result.horizontal_residue.is_none() && result.vertical_residue.is_none() {
            return Err(BeamError::FitUnderdetermined(format!(
                "fit '{}' contains no data",
                fit.name()
            )));
        }
        result.input_beam = beam;
        info!(
            "Fit '{}' finished with residue {:.3e} m",
            fit.name(),
            result.combined_residue().value
        );
        Ok(result)
    }
    fn fit_plane(
        &self,
        fit: &Fit,
        orientation: Orientation,
        current: &InputBeam,
        input: &OpticalElement,
    ) -> BeamResult<(Length, Length, Length)> {
        let radii = fit.radii(orientation);
        let free_waist = !input.is_locked(Parameter::Waist(orientation));
        let free_position = !input.is_locked(Parameter::WaistPosition(orientation));
        if !free_waist && !free_position {
            return Err(BeamError::FitUnderdetermined(format!(
                "fit '{}': no free parameter in the {orientation} plane",
                fit.name()
            )));
        }
        let distinct = radii.iter().map(|p| p.0).dedup().count();
        if distinct < 2 {
            return Err(BeamError::FitUnderdetermined(format!(
                "fit '{}': at least two distinct measurement positions needed in the {orientation} plane, found {distinct}",
                fit.name()
            )));
        }
        let propagator = BeamPropagator::new(self.bench);
        let points = radii
            .iter()
            .map(|(position, radius)| {
                let (matrix, index_ratio) = propagator.matrix(meter!(*position), orientation)?;
                Ok(DataPoint {
                    position: *position,
                    matrix,
                    index_ratio,
                    radius: *radius,
                })
            })
            .collect::<BeamResult<Vec<DataPoint>>>()?;
        let first = radii[0].0;
        let last = radii[radii.len() - 1].0;
        let model = PlaneModel {
            wavelength: self.bench.wavelength().value,
            index: self.bench.ambient_index(),
            m2: current.m2(),
            input_position: input.position().value,
            scale: last - first,
            mean: radii.iter().map(|p| p.1).sum::<f64>() / usize_to_f64(radii.len()),
            free_waist,
            free_position,
            fixed_waist: current.waist(orientation).value,
            fixed_position: current.waist_position(orientation).value,
            points,
        };
        let mut seeds = vec![(model.fixed_waist, model.fixed_position)];
        let n = radii.len();
        for subset in [&radii[..], &radii[..2], &radii[n - 2..]] {
            if let Some(seed) = LinearRegression::new(subset).and_then(|l| model.far_field_seed(&l))
            {
                seeds.push(seed);
            }
        }
        let mut best: Option<(DVector<f64>, f64)> = None;
        for (waist, waist_position) in seeds {
            let start = model.encode(waist, waist_position);
            match levenberg_marquardt(|x| model.residuals(x), start, &self.config, &self.cancel)
            {
                Ok(outcome) if outcome.converged => {
                    debug!(
                        "{orientation} plane: run from w0 = {waist:.3e} m, z0 = {waist_position:.3e} m converged after {} iterations (cost {:.3e})",
                        outcome.iterations, outcome.cost
                    );
                    if best.as_ref().map_or(true, |b| outcome.cost < b.1) {
                        best = Some((outcome.parameters, outcome.cost));
                    }
                }
                Ok(_) => debug!(
                    "{orientation} plane: run from w0 = {waist:.3e} m, z0 = {waist_position:.3e} m did not converge"
                ),
                Err(BeamError::SearchCancelled) => return Err(BeamError::SearchCancelled),
                Err(e) => debug!("{orientation} plane: seed rejected: {e}"),
            }
        }
        let (parameters, _) = best.ok_or_else(|| {
            BeamError::FitDidNotConverge(format!(
                "fit '{}': no convergence in the {orientation} plane within {} iterations",
                fit.name(),
                self.config.max_iterations()
            ))
        })?;
        let (waist, waist_position) = model.decode(&parameters);
        let deviations = model
            .points
            .iter()
            .map(|p| {
                let deviation = model.radius_at(waist, waist_position, p)? - p.radius;
                Ok(fit.data_type().from_radius(meter!(deviation)).value)
            })
            .collect::<BeamResult<Vec<f64>>>()?;
        Ok((
            meter!(waist),
            meter!(waist_position),
            meter!(rms(&deviations)),
        ))
    }
}

struct DataPoint {
    position: f64,
    matrix: AbcdMatrix,
    index_ratio: f64,
    radius: f64,
}

/// Beam width model of one plane. All values in meters.
///
/// Parameters are `ln(w0)` and the waist position relative to the input element in units of the measurement span.
struct PlaneModel {
    wavelength: f64,
    index: f64,
    m2: f64,
    input_position: f64,
    scale: f64,
    mean: f64,
    free_waist: bool,
    free_position: bool,
    fixed_waist: f64,
    fixed_position: f64,
    points: Vec<DataPoint>,
}
impl PlaneModel {
    fn encode(&self, waist: f64, waist_position: f64) -> DVector<f64> {
        let mut x = Vec::with_capacity(2);
        if self.free_waist {
            x.push(waist.ln());
        }
        if self.free_position {
            x.push((waist_position - self.input_position) / self.scale);
        }
        DVector::from_vec(x)
    }
    fn decode(&self, x: &DVector<f64>) -> (f64, f64) {
        let mut values = x.iter();
        let waist = if self.free_waist {
            values.next().map_or(self.fixed_waist, |v| v.exp())
        } else {
            self.fixed_waist
        };
        let waist_position = if self.free_position {
            values
                .next()
                .map_or(self.fixed_position, |v| v.mul_add(self.scale, self.input_position))
        } else {
            self.fixed_position
        };
        (waist, waist_position)
    }
    fn radius_at(&self, waist: f64, waist_position: f64, point: &DataPoint) -> BeamResult<f64> {
        let q = ComplexBeamParameter::from_waist(
            meter!(waist),
            meter!(waist_position),
            meter!(self.wavelength),
            self.index,
            self.m2,
            meter!(self.input_position),
        )?;
        Ok(q.propagate(&point.matrix, point.index_ratio, meter!(point.position))?
            .radius()
            .value)
    }
    fn residuals(&self, x: &DVector<f64>) -> BeamResult<DVector<f64>> {
        let (waist, waist_position) = self.decode(x);
        let values = self
            .points
            .iter()
            .map(|p| Ok((self.radius_at(waist, waist_position, p)? - p.radius) / self.mean))
            .collect::<BeamResult<Vec<f64>>>()?;
        Ok(DVector::from_vec(values))
    }
    /// Input beam whose far field follows the given line at the first measurement position.
    fn far_field_seed(&self, line: &LinearRegression) -> Option<(f64, f64)> {
        let divergence = line.slope.abs();
        let waist_position = line.root()?;
        let point = self.points.first()?;
        let index = self.index * point.index_ratio;
        let waist = self.wavelength * self.m2 / (index * PI * divergence);
        let rayleigh = index * PI * waist * waist / (self.wavelength * self.m2);
        let q = ComplexBeamParameter::new(
            Complex64::new(point.position - waist_position, rayleigh),
            meter!(point.position),
            meter!(self.wavelength),
            index,
            self.m2,
        )
        .ok()?;
        let back = q
            .propagate(
                &point.matrix.inverse()?,
                1.0 / point.index_ratio,
                meter!(self.input_position),
            )
            .ok()?;
        let seed = (back.waist().value, back.waist_position().value);
        (seed.0.is_finite() && seed.0 > 0.0 && seed.1.is_finite()).then_some(seed)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        elements::ThinLens,
        fit::MeasurementPlane,
        micrometer, millimeter, nanometer,
    };
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use assert_matches::assert_matches;

    fn measure(
        bench: &OpticsBench,
        truth: InputBeam,
        positions_mm: &[f64],
        data_type: FitDataType,
        plane: MeasurementPlane,
    ) -> Fit {
        let propagator = BeamPropagator::new(bench).with_input_beam(truth);
        let orientation = match plane {
            MeasurementPlane::Vertical => Orientation::Vertical,
            _ => Orientation::Horizontal,
        };
        let mut fit = Fit::new("Fit1");
        fit.set_data_type(data_type);
        for z in positions_mm {
            let radius = propagator
                .propagate(millimeter!(*z), orientation)
                .unwrap()
                .radius();
            fit.add_measurement(millimeter!(*z), data_type.from_radius(radius), plane)
                .unwrap();
        }
        fit
    }
    fn positions(start: f64, end: f64, step: f64) -> Vec<f64> {
        let mut positions = Vec::new();
        let mut z = start;
        while z <= end + 1e-9 {
            positions.push(z);
            z += step;
        }
        positions
    }
    #[test]
    fn config() {
        let mut config = FitConfig::default();
        assert_eq!(config.max_iterations(), 200);
        assert_eq!(config.tolerance(), 1e-12);
        assert_eq!(config.initial_damping(), 1e-3);
        assert!(config.set_max_iterations(0).is_err());
        assert!(config.set_tolerance(0.0).is_err());
        assert!(config.set_tolerance(f64::NAN).is_err());
        assert!(config.set_initial_damping(-1.0).is_err());
        assert!(config.set_initial_damping(f64::INFINITY).is_err());
        config.set_max_iterations(50).unwrap();
        config.set_tolerance(1e-8).unwrap();
        config.set_initial_damping(1e-2).unwrap();
        assert_eq!(config.max_iterations(), 50);
        assert_eq!(config.tolerance(), 1e-8);
        assert_eq!(config.initial_damping(), 1e-2);
    }
    #[test]
    fn free_space() {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        let truth = InputBeam::new(micrometer!(150.0), millimeter!(20.0)).unwrap();
        let fit = measure(
            &bench,
            truth,
            &positions(0.0, 1000.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Both,
        );
        bench.add_fit(fit).unwrap();
        let result = Fitter::new(&bench).fit("Fit1").unwrap();
        for o in Orientation::iter() {
            assert_relative_eq!(
                result.input_beam().waist(o).value,
                150.0e-6,
                max_relative = 1e-6
            );
            assert_abs_diff_eq!(
                result.input_beam().waist_position(o).value,
                0.02,
                epsilon = 1e-6
            );
            assert!(result.residue(o).unwrap().value < 1e-10);
        }
        // the bench is untouched until the result is applied
        assert_eq!(
            bench.input_beam().unwrap().waist(Orientation::Horizontal),
            micrometer!(100.0)
        );
        result.apply(&mut bench).unwrap();
        assert_eq!(bench.input_beam().unwrap(), result.input_beam());
    }
    #[test]
    fn behind_lens() {
        let mut bench = OpticsBench::new(
            nanometer!(633.0),
            InputBeam::new(micrometer!(80.0), millimeter!(-30.0)).unwrap(),
        )
        .unwrap();
        bench
            .add_element(
                OpticalElement::new(
                    "L1",
                    millimeter!(200.0),
                    ThinLens::new(millimeter!(100.0)).unwrap().into(),
                )
                .unwrap(),
            )
            .unwrap();
        let truth = InputBeam::new(micrometer!(50.0), millimeter!(0.0)).unwrap();
        let fit = measure(
            &bench,
            truth,
            &positions(250.0, 450.0, 25.0),
            FitDataType::Diameter1e2,
            MeasurementPlane::Both,
        );
        let result = Fitter::new(&bench).fit_data(&fit).unwrap();
        assert_eq!(result.data_type(), FitDataType::Diameter1e2);
        assert_relative_eq!(
            result.input_beam().waist(Orientation::Vertical).value,
            50.0e-6,
            max_relative = 1e-6
        );
        assert_abs_diff_eq!(
            result.input_beam().waist_position(Orientation::Vertical).value,
            0.0,
            epsilon = 1e-6
        );
    }
    #[test]
    fn astigmatic() {
        let bench = OpticsBench::with_default_beam().unwrap();
        let mut truth = InputBeam::new(micrometer!(120.0), millimeter!(50.0)).unwrap();
        truth
            .set_waist(Orientation::Vertical, micrometer!(200.0))
            .unwrap();
        truth
            .set_waist_position(Orientation::Vertical, millimeter!(-100.0))
            .unwrap();
        let mut fit = measure(
            &bench,
            truth,
            &positions(0.0, 800.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Horizontal,
        );
        let vertical = measure(
            &bench,
            truth,
            &positions(0.0, 800.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Vertical,
        );
        for m in vertical.measurements() {
            fit.add_measurement(m.position, m.value, m.plane).unwrap();
        }
        let result = Fitter::new(&bench).fit_data(&fit).unwrap();
        assert_relative_eq!(
            result.input_beam().waist(Orientation::Horizontal).value,
            120.0e-6,
            max_relative = 1e-6
        );
        assert_relative_eq!(
            result.input_beam().waist(Orientation::Vertical).value,
            200.0e-6,
            max_relative = 1e-6
        );
        assert_abs_diff_eq!(
            result
                .input_beam()
                .waist_position(Orientation::Vertical)
                .value,
            -0.1,
            epsilon = 1e-6
        );
        assert!(!result.input_beam().is_spherical());
    }
    #[test]
    fn single_plane() {
        let bench = OpticsBench::with_default_beam().unwrap();
        let truth = InputBeam::new(micrometer!(150.0), millimeter!(20.0)).unwrap();
        let fit = measure(
            &bench,
            truth,
            &positions(0.0, 1000.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Horizontal,
        );
        let result = Fitter::new(&bench).fit_data(&fit).unwrap();
        assert!(result.residue(Orientation::Vertical).is_none());
        assert_eq!(
            result.input_beam().waist(Orientation::Vertical),
            micrometer!(100.0)
        );
        assert_eq!(
            result.combined_residue(),
            result.residue(Orientation::Horizontal).unwrap()
        );
    }
    #[test]
    fn locked_waist_position() {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        let input = bench.input_beam_id();
        bench
            .modify_element(input, |e| {
                e.lock(Parameter::WaistPosition(Orientation::Horizontal));
                e.lock(Parameter::WaistPosition(Orientation::Vertical));
                Ok(())
            })
            .unwrap();
        let truth = InputBeam::new(micrometer!(150.0), millimeter!(0.0)).unwrap();
        let fit = measure(
            &bench,
            truth,
            &positions(0.0, 1000.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Both,
        );
        let result = Fitter::new(&bench).fit_data(&fit).unwrap();
        assert_relative_eq!(
            result.input_beam().waist(Orientation::Horizontal).value,
            150.0e-6,
            max_relative = 1e-6
        );
        assert_eq!(
            result.input_beam().waist_position(Orientation::Horizontal),
            millimeter!(0.0)
        );
    }
    #[test]
    fn residue_of_noisy_data() {
        let bench = OpticsBench::with_default_beam().unwrap();
        let truth = InputBeam::new(micrometer!(150.0), millimeter!(20.0)).unwrap();
        let mut fit = measure(
            &bench,
            truth,
            &positions(0.0, 1000.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Both,
        );
        let mut row = fit.measurements()[5];
        row.value *= 1.1;
        fit.set_measurement(5, row).unwrap();
        let result = Fitter::new(&bench).fit_data(&fit).unwrap();
        assert!(result.combined_residue().value > 1e-7);
        assert!(result.combined_residue().value < 1e-4);
    }
    #[test]
    fn underdetermined() {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        let mut fit = Fit::new("Fit1");
        assert_matches!(
            Fitter::new(&bench).fit_data(&fit),
            Err(BeamError::FitUnderdetermined(_))
        );
        fit.add_measurement(millimeter!(10.0), micrometer!(100.0), MeasurementPlane::Both)
            .unwrap();
        fit.add_measurement(millimeter!(10.0), micrometer!(110.0), MeasurementPlane::Both)
            .unwrap();
        assert_matches!(
            Fitter::new(&bench).fit_data(&fit),
            Err(BeamError::FitUnderdetermined(_))
        );
        fit.add_measurement(millimeter!(20.0), micrometer!(120.0), MeasurementPlane::Both)
            .unwrap();
        let input = bench.input_beam_id();
        bench
            .modify_element(input, |e| {
                e.lock(Parameter::Waist(Orientation::Horizontal));
                e.lock(Parameter::WaistPosition(Orientation::Horizontal));
                Ok(())
            })
            .unwrap();
        assert_matches!(
            Fitter::new(&bench).fit_data(&fit),
            Err(BeamError::FitUnderdetermined(_))
        );
        assert_matches!(Fitter::new(&bench).fit("Fit7"), Err(BeamError::Bench(_)));
    }
    #[test]
    fn not_converged() {
        let bench = OpticsBench::with_default_beam().unwrap();
        let truth = InputBeam::new(micrometer!(150.0), millimeter!(20.0)).unwrap();
        let fit = measure(
            &bench,
            truth,
            &positions(0.0, 1000.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Both,
        );
        let mut config = FitConfig::default();
        config.set_max_iterations(1).unwrap();
        assert_matches!(
            Fitter::new(&bench).with_config(config).fit_data(&fit),
            Err(BeamError::FitDidNotConverge(_))
        );
    }
    #[test]
    fn cancelled() {
        let bench = OpticsBench::with_default_beam().unwrap();
        let truth = InputBeam::new(micrometer!(150.0), millimeter!(20.0)).unwrap();
        let fit = measure(
            &bench,
            truth,
            &positions(0.0, 1000.0, 100.0),
            FitDataType::Radius1e2,
            MeasurementPlane::Both,
        );
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert_matches!(
            Fitter::new(&bench).with_cancel_flag(cancel).fit_data(&fit),
            Err(BeamError::SearchCancelled)
        );
    }
}
