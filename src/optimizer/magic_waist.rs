#![warn(missing_docs)]
//! Magic waist search
//!
//! Find values of one or two free bench parameters for which the beam leaving the bench has a given waist at a
//! given position. With one free parameter, the parameter range is sampled and every sign change of the waist or
//! the waist position deviation is refined by Brent's method. With two free parameters, the box spanned by both
//! ranges is sampled randomly and a damped Newton iteration is started from the most promising samples.
//!
//! A configuration is accepted if the waist deviates by less than the relative waist tolerance from the target
//! and the waist position deviates by less than the position tolerance (in units of the target's Rayleigh range).
use super::parameter::{check_new_parameter, configure, FreeParameter};
use crate::{
    beam_parameter::ComplexBeamParameter,
    bench::OpticsBench,
    cancel::CancelFlag,
    error::{BeamError, BeamResult},
    meter,
    orientation::Orientation,
    propagation::BeamPropagator,
    utils::{sqr, usize_to_f64},
};
use log::{debug, info, warn};
use nalgebra::{Matrix2, Vector2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use roots::{find_root_brent, SimpleConvergency};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use uom::si::f64::Length;

/// Number of random samples used as starting points for the Newton iteration.
const NEWTON_STARTS: usize = 5;
const NEWTON_STEP: f64 = 1e-6;
const ROOT_EPSILON: f64 = 1e-12;

/// Waist and waist position the output beam of a bench should have.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagicWaistTarget {
    waist: Length,
    waist_position: Length,
    waist_tolerance: f64,
    position_tolerance: f64,
    orientation: Orientation,
}
impl MagicWaistTarget {
    /// Creates a new [`MagicWaistTarget`] for the horizontal plane with tolerances of 1 %.
    ///
    /// # Errors
    ///
    /// This function will return an error if the waist is not strictly positive and finite or if the waist position
    /// is not finite.
    pub fn new(waist: Length, waist_position: Length) -> BeamResult<Self> {
        if !waist.is_finite() || waist.value <= 0.0 {
            return Err(BeamError::Other(
                "target waist must be > 0.0 and finite".into(),
            ));
        }
        if !waist_position.is_finite() {
            return Err(BeamError::Other(
                "target waist position must be finite".into(),
            ));
        }
        Ok(Self {
            waist,
            waist_position,
            waist_tolerance: 0.01,
            position_tolerance: 0.01,
            orientation: Orientation::Horizontal,
        })
    }
    /// Sets the relative waist tolerance (a fraction, e.g. `0.01` for 1 %).
    ///
    /// # Errors
    ///
    /// This function will return an error if the tolerance is not in the range `(0.0, 1.0]`.
    pub fn with_waist_tolerance(mut self, tolerance: f64) -> BeamResult<Self> {
        if !(tolerance > 0.0 && tolerance <= 1.0) {
            return Err(BeamError::Other(
                "waist tolerance must be in the range (0.0, 1.0]".into(),
            ));
        }
        self.waist_tolerance = tolerance;
        Ok(self)
    }
    /// Sets the waist position tolerance as a fraction of the Rayleigh range of the target beam.
    ///
    /// # Errors
    ///
    /// This function will return an error if the tolerance is not strictly positive and finite.
    pub fn with_position_tolerance(mut self, tolerance: f64) -> BeamResult<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(BeamError::Other(
                "position tolerance must be > 0.0 and finite".into(),
            ));
        }
        self.position_tolerance = tolerance;
        Ok(self)
    }
    /// Sets the plane in which the output beam is evaluated.
    #[must_use]
    pub const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
    /// Target waist radius.
    #[must_use]
    pub const fn waist(&self) -> Length {
        self.waist
    }
    /// Target waist position.
    #[must_use]
    pub const fn waist_position(&self) -> Length {
        self.waist_position
    }
    /// Relative waist tolerance.
    #[must_use]
    pub const fn waist_tolerance(&self) -> f64 {
        self.waist_tolerance
    }
    /// Waist position tolerance in units of the target's Rayleigh range.
    #[must_use]
    pub const fn position_tolerance(&self) -> f64 {
        self.position_tolerance
    }
    /// Plane in which the output beam is evaluated.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }
    /// Relative deviations of the waist and of the waist position (in Rayleigh ranges of the target) of `beam`.
    #[must_use]
    pub fn deviation(&self, beam: &ComplexBeamParameter) -> (f64, f64) {
        let rayleigh =
            beam.index() * PI * sqr(self.waist.value) / (beam.wavelength().value * beam.m2());
        (
            (beam.waist().value - self.waist.value) / self.waist.value,
            (beam.waist_position().value - self.waist_position.value) / rayleigh,
        )
    }
    /// Returns `true` if `beam` matches the target within the tolerances.
    #[must_use]
    pub fn is_reached_by(&self, beam: &ComplexBeamParameter) -> bool {
        let (waist, position) = self.deviation(beam);
        waist.abs() <= self.waist_tolerance && position.abs() <= self.position_tolerance
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
/// Configuration of the magic waist search.
pub struct MagicWaistConfig {
    samples: usize,
    max_iterations: usize,
    seed: u64,
}
impl Default for MagicWaistConfig {
    /// Create a default config with the following parameters:
    ///   - number of samples: `400`
    ///   - maximum number of refinement iterations: `100`
    ///   - seed of the random sampler: `0`
    fn default() -> Self {
        Self {
            samples: 400,
            max_iterations: 100,
            seed: 0,
        }
    }
}
impl MagicWaistConfig {
    /// Returns the number of samples (per parameter range in the one dimensional search, in total otherwise).
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }
    /// Sets the number of samples.
    ///
    /// # Errors
    ///
    /// This function will return an error if fewer than two samples are requested.
    pub fn set_samples(&mut self, samples: usize) -> BeamResult<()> {
        if samples < 2 {
            return Err(BeamError::Other("number of samples must be >= 2".into()));
        }
        self.samples = samples;
        Ok(())
    }
    /// Returns the maximum number of refinement iterations.
    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }
    /// Sets the maximum number of refinement iterations.
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
    /// Returns the seed of the random sampler.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
    /// Sets the seed of the random sampler.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

/// Parameter values found by a magic waist search.
#[derive(Debug, Clone, PartialEq)]
pub struct MagicWaistSolution {
    parameters: Vec<FreeParameter>,
    values: Vec<Length>,
    beam: ComplexBeamParameter,
}
impl MagicWaistSolution {
    /// The varied parameters.
    #[must_use]
    pub fn parameters(&self) -> &[FreeParameter] {
        &self.parameters
    }
    /// Values of the varied parameters (in the same order).
    #[must_use]
    pub fn values(&self) -> &[Length] {
        &self.values
    }
    /// Output beam of the bench for the found values.
    #[must_use]
    pub const fn beam(&self) -> &ComplexBeamParameter {
        &self.beam
    }
    /// Assign the found values to the bench. The bench is left unchanged if this fails.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bench was changed in a way that the values can no longer be set.
    pub fn apply(&self, bench: &mut OpticsBench) -> BeamResult<()> {
        let values: Vec<f64> = self.values.iter().map(|v| v.value).collect();
        *bench = configure(bench, &self.parameters, &values)?;
        Ok(())
    }
}

/// Search for bench configurations producing a [`MagicWaistTarget`].
#[derive(Debug, Clone)]
pub struct MagicWaist<'a> {
    bench: &'a OpticsBench,
    target: MagicWaistTarget,
    parameters: Vec<FreeParameter>,
    config: MagicWaistConfig,
    cancel: CancelFlag,
}
impl<'a> MagicWaist<'a> {
    /// Creates a new [`MagicWaist`] search without free parameters.
    #[must_use]
    pub fn new(bench: &'a OpticsBench, target: MagicWaistTarget) -> Self {
        Self {
            bench,
            target,
            parameters: Vec::new(),
            config: MagicWaistConfig::default(),
            cancel: CancelFlag::new(),
        }
    }
    /// Add a free parameter. This function can be used with the "builder pattern".
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the parameter is locked, does not exist on the bench or was already added.
    ///   - two parameters were already added.
    pub fn with_parameter(mut self, parameter: FreeParameter) -> BeamResult<Self> {
        if self.parameters.len() >= 2 {
            return Err(BeamError::Other(
                "magic waist search supports at most two free parameters".into(),
            ));
        }
        check_new_parameter(self.bench, &self.parameters, &parameter)?;
        self.parameters.push(parameter);
        Ok(self)
    }
    /// Use the given search configuration.
    #[must_use]
    pub fn with_config(mut self, config: MagicWaistConfig) -> Self {
        self.config = config;
        self
    }
    /// Use the given flag for cancelling the search from another thread.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
    /// Run the search. The bench is not modified.
    ///
    /// # Errors
    ///
    /// This function will return
    ///   - [`BeamError::SearchNotFound`] if no configuration within the parameter bounds reaches the target.
    ///   - [`BeamError::SearchCancelled`] if the search was cancelled.
    ///   - [`BeamError::Other`] if no free parameter was given.
    pub fn search(&self) -> BeamResult<MagicWaistSolution> {
        info!(
            "Searching magic waist {:.3e} m at {:.3e} m using {} free parameter(s)",
            self.target.waist.value,
            self.target.waist_position.value,
            self.parameters.len()
        );
        let found = match self.parameters.len() {
            0 => {
                return Err(BeamError::Other(
                    "magic waist search needs at least one free parameter".into(),
                ))
            }
            1 => self.search_line()?,
            _ => self.search_plane()?,
        };
        let values = found.ok_or_else(|| {
            BeamError::SearchNotFound(
                "no configuration within the parameter bounds reaches the target waist".into(),
            )
        })?;
        let beam = self.output_beam(&values)?;
        info!("Magic waist found: {values:?}");
        Ok(MagicWaistSolution {
            parameters: self.parameters.clone(),
            values: values.iter().map(|v| meter!(*v)).collect(),
            beam,
        })
    }
    fn output_beam(&self, values: &[f64]) -> BeamResult<ComplexBeamParameter> {
        let bench = configure(self.bench, &self.parameters, values)?;
        BeamPropagator::new(&bench).output_beam(self.target.orientation)
    }
    fn deviation(&self, values: &[f64]) -> Option<(f64, f64)> {
        self.output_beam(values)
            .ok()
            .map(|beam| self.target.deviation(&beam))
    }
    fn accept(&self, values: &[f64]) -> bool {
        if !self
            .parameters
            .iter()
            .zip(values)
            .all(|(p, v)| p.contains(*v))
        {
            warn!("magic waist candidate {values:?} outside the parameter bounds rejected");
            return false;
        }
        self.output_beam(values)
            .is_ok_and(|beam| self.target.is_reached_by(&beam))
    }
    fn search_line(&self) -> BeamResult<Option<Vec<f64>>> {
        let parameter = &self.parameters[0];
        let (min, max) = (parameter.min().value, parameter.max().value);
        let last = usize_to_f64(self.config.samples - 1);
        let mut previous: Option<(f64, (f64, f64))> = None;
        for i in 0..self.config.samples {
            self.cancel.check()?;
            let x = (max - min).mul_add(usize_to_f64(i) / last, min);
            let deviation = self.deviation(&[x]);
            if let (Some((x0, d0)), Some(d1)) = (previous, deviation) {
                for (component, changed) in [(0, d0.0 * d1.0 <= 0.0), (1, d0.1 * d1.1 <= 0.0)] {
                    if !changed {
                        continue;
                    }
                    if let Some(root) = self.refine(x0, x, component) {
                        debug!("candidate {root:.6e} m in [{x0:.6e}, {x:.6e}]");
                        if self.accept(&[root]) {
                            return Ok(Some(vec![root]));
                        }
                    }
                }
            }
            previous = deviation.map(|d| (x, d));
        }
        Ok(None)
    }
    /// Root of one deviation component in `[a, b]`.
    fn refine(&self, a: f64, b: f64, component: usize) -> Option<f64> {
        let f = |x: f64| {
            self.deviation(&[x]).map_or(f64::NAN, |d| {
                if component == 0 {
                    d.0
                } else {
                    d.1
                }
            })
        };
        let mut convergency = SimpleConvergency {
            eps: ROOT_EPSILON,
            max_iter: self.config.max_iterations,
        };
        find_root_brent(a, b, &f, &mut convergency).ok()
    }
    fn search_plane(&self) -> BeamResult<Option<Vec<f64>>> {
        let (p0, p1) = (&self.parameters[0], &self.parameters[1]);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut samples: Vec<(Vector2<f64>, f64)> = Vec::with_capacity(self.config.samples);
        for _ in 0..self.config.samples {
            self.cancel.check()?;
            let x = Vector2::new(
                rng.random_range(p0.min().value..p0.max().value),
                rng.random_range(p1.min().value..p1.max().value),
            );
            if let Some(d) = self.deviation(x.as_slice()) {
                samples.push((x, sqr(d.0) + sqr(d.1)));
            }
        }
        samples.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (start, _) in samples.iter().take(NEWTON_STARTS) {
            if let Some(x) = self.newton(*start)? {
                return Ok(Some(vec![x[0], x[1]]));
            }
        }
        Ok(None)
    }
    fn residual(&self, x: &Vector2<f64>) -> Option<Vector2<f64>> {
        self.deviation(x.as_slice())
            .map(|d| Vector2::new(d.0, d.1))
    }
    /// Damped Newton iteration on both deviations.
    fn newton(&self, start: Vector2<f64>) -> BeamResult<Option<Vector2<f64>>> {
        let step = Vector2::new(
            NEWTON_STEP * (self.parameters[0].max() - self.parameters[0].min()).value,
            NEWTON_STEP * (self.parameters[1].max() - self.parameters[1].min()).value,
        );
        let mut x = start;
        for _ in 0..self.config.max_iterations {
            self.cancel.check()?;
            if self.accept(x.as_slice()) {
                return Ok(Some(x));
            }
            let Some(r) = self.residual(&x) else {
                return Ok(None);
            };
            let mut jacobian = Matrix2::zeros();
            for j in 0..2 {
                let mut shifted = x;
                shifted[j] += step[j];
                let Some(rs) = self.residual(&shifted) else {
                    return Ok(None);
                };
                jacobian.set_column(j, &((rs - r) / step[j]));
            }
            let Some(inverse) = jacobian.try_inverse() else {
                return Ok(None);
            };
            let direction = -(inverse * r);
            let mut damping = 1.0;
            let mut next = None;
            for _ in 0..20 {
                let candidate = x + direction * damping;
                let inside = self
                    .parameters
                    .iter()
                    .zip(candidate.iter())
                    .all(|(p, v)| p.contains(*v));
                if inside {
                    if let Some(rc) = self.residual(&candidate) {
                        if rc.norm() < r.norm() {
                            next = Some(candidate);
                            break;
                        }
                    }
                }
                damping *= 0.5;
            }
            match next {
                Some(candidate) => x = candidate,
                None => {
                    debug!("Newton iteration from {start:?} stalled at {x:?}");
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        elements::{ElementId, OpticalElement, ThinLens},
        micrometer, millimeter,
    };
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn bench(lens_position_mm: f64, focal_length_mm: f64) -> (OpticsBench, ElementId) {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        let lens = bench
            .add_element(
                OpticalElement::new(
                    "L1",
                    millimeter!(lens_position_mm),
                    ThinLens::new(millimeter!(focal_length_mm)).unwrap().into(),
                )
                .unwrap(),
            )
            .unwrap();
        (bench, lens)
    }
    fn reachable_target() -> MagicWaistTarget {
        let (bench, _) = bench(300.0, 100.0);
        let beam = BeamPropagator::new(&bench)
            .output_beam(Orientation::Horizontal)
            .unwrap();
        MagicWaistTarget::new(beam.waist(), beam.waist_position()).unwrap()
    }
    #[test]
    fn target() {
        assert!(MagicWaistTarget::new(micrometer!(0.0), millimeter!(0.0)).is_err());
        assert!(MagicWaistTarget::new(micrometer!(10.0), millimeter!(f64::NAN)).is_err());
        let target = MagicWaistTarget::new(micrometer!(10.0), millimeter!(100.0)).unwrap();
        assert_eq!(target.waist_tolerance(), 0.01);
        assert_eq!(target.position_tolerance(), 0.01);
        assert_eq!(target.orientation(), Orientation::Horizontal);
        assert!(target.with_waist_tolerance(0.0).is_err());
        assert!(target.with_waist_tolerance(1.5).is_err());
        assert!(target.with_position_tolerance(-0.1).is_err());
        let target = target
            .with_waist_tolerance(0.05)
            .unwrap()
            .with_position_tolerance(0.1)
            .unwrap()
            .with_orientation(Orientation::Vertical);
        assert_eq!(target.waist_tolerance(), 0.05);
        assert_eq!(target.position_tolerance(), 0.1);
        assert_eq!(target.orientation(), Orientation::Vertical);
        assert_eq!(target.waist(), micrometer!(10.0));
        assert_eq!(target.waist_position(), millimeter!(100.0));
    }
    #[test]
    fn target_deviation() {
        let target = MagicWaistTarget::new(micrometer!(100.0), millimeter!(0.0)).unwrap();
        let beam = ComplexBeamParameter::from_waist(
            micrometer!(102.0),
            millimeter!(0.0),
            crate::nanometer!(1064.0),
            1.0,
            1.0,
            millimeter!(10.0),
        )
        .unwrap();
        let (waist, position) = target.deviation(&beam);
        assert_abs_diff_eq!(waist, 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(position, 0.0, epsilon = 1e-12);
        assert!(!target.is_reached_by(&beam));
        assert!(target
            .with_waist_tolerance(0.03)
            .unwrap()
            .is_reached_by(&beam));
    }
    #[test]
    fn config() {
        let mut config = MagicWaistConfig::default();
        assert_eq!(config.samples(), 400);
        assert_eq!(config.max_iterations(), 100);
        assert_eq!(config.seed(), 0);
        assert!(config.set_samples(1).is_err());
        assert!(config.set_max_iterations(0).is_err());
        config.set_samples(50).unwrap();
        config.set_max_iterations(10).unwrap();
        config.set_seed(42);
        assert_eq!(config, {
            let mut c = MagicWaistConfig::default();
            c.samples = 50;
            c.max_iterations = 10;
            c.seed = 42;
            c
        });
    }
    #[test]
    fn parameters() {
        let (bench, lens) = bench(200.0, 100.0);
        let target = reachable_target();
        assert_matches!(
            MagicWaist::new(&bench, target).search(),
            Err(BeamError::Other(_))
        );
        let position = FreeParameter::position(lens, millimeter!(150.0), millimeter!(450.0)).unwrap();
        let focal = FreeParameter::focal_length(lens, millimeter!(50.0), millimeter!(200.0)).unwrap();
        let search = MagicWaist::new(&bench, target)
            .with_parameter(position)
            .unwrap();
        assert!(search.clone().with_parameter(position).is_err());
        let search = search.with_parameter(focal).unwrap();
        assert!(search.with_parameter(position).is_err());
    }
    #[test]
    fn single_lens_position() {
        let (mut bench, lens) = bench(200.0, 100.0);
        let target = reachable_target();
        let solution = MagicWaist::new(&bench, target)
            .with_parameter(
                FreeParameter::position(lens, millimeter!(150.0), millimeter!(450.0)).unwrap(),
            )
            .unwrap()
            .search()
            .unwrap();
        assert_abs_diff_eq!(solution.values()[0].value, 0.3, epsilon = 1e-6);
        assert!(target.is_reached_by(solution.beam()));
        // the search works on a copy
        assert_eq!(bench.element(lens).unwrap().position(), millimeter!(200.0));
        solution.apply(&mut bench).unwrap();
        assert_abs_diff_eq!(
            bench.element(lens).unwrap().position().value,
            0.3,
            epsilon = 1e-6
        );
    }
    #[test]
    fn unreachable() {
        let (bench, lens) = bench(200.0, 100.0);
        let target = MagicWaistTarget::new(micrometer!(5.0), millimeter!(500.0)).unwrap();
        assert_matches!(
            MagicWaist::new(&bench, target)
                .with_parameter(
                    FreeParameter::position(lens, millimeter!(150.0), millimeter!(450.0)).unwrap()
                )
                .unwrap()
                .search(),
            Err(BeamError::SearchNotFound(_))
        );
    }
    #[test]
    fn position_and_focal_length() {
        let (bench, lens) = bench(250.0, 150.0);
        let target = reachable_target();
        let solution = MagicWaist::new(&bench, target)
            .with_parameter(
                FreeParameter::position(lens, millimeter!(200.0), millimeter!(400.0)).unwrap(),
            )
            .unwrap()
            .with_parameter(
                FreeParameter::focal_length(lens, millimeter!(50.0), millimeter!(200.0)).unwrap(),
            )
            .unwrap()
            .search()
            .unwrap();
        assert!(target.is_reached_by(solution.beam()));
        assert_eq!(solution.parameters().len(), 2);
        for (parameter, value) in solution.parameters().iter().zip(solution.values()) {
            assert!(parameter.contains(value.value));
        }
    }
    #[test]
    fn cancelled() {
        let (bench, lens) = bench(200.0, 100.0);
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert_matches!(
            MagicWaist::new(&bench, reachable_target())
                .with_parameter(
                    FreeParameter::position(lens, millimeter!(150.0), millimeter!(450.0)).unwrap()
                )
                .unwrap()
                .with_cancel_flag(cancel)
                .search(),
            Err(BeamError::SearchCancelled)
        );
    }
}
