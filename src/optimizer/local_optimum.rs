#![warn(missing_docs)]
//! Local overlap optimization
//!
//! Maximizes the overlap of the beam leaving the bench with a fixed target beam by varying any number of free
//! parameters within their bounds. The parameters are scaled to the unit interval and a Polak-Ribière conjugate
//! gradient ascent with a golden section line search is performed. The gradient is computed by central
//! differences.
use super::parameter::{check_new_parameter, configure, FreeParameter};
use crate::{
    beam_parameter::ComplexBeamParameter,
    bench::OpticsBench,
    cancel::CancelFlag,
    error::{BeamError, BeamResult},
    meter,
    orientation::Orientation,
    overlap::astigmatic_overlap,
    propagation::BeamPropagator,
};
use log::{debug, info};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// Overlap at which the search stops regardless of the remaining improvement.
const PERFECT_OVERLAP: f64 = 0.99999;
const GOLDEN_RATIO: f64 = 0.618_033_988_749_895;
const LINE_SEARCH_TOLERANCE: f64 = 1e-10;

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
/// Configuration of the local overlap optimization.
pub struct LocalOptimumConfig {
    max_iterations: usize,
    convergence_threshold: f64,
    gradient_step: f64,
}
impl Default for LocalOptimumConfig {
    /// Create a default config with the following parameters:
    ///   - maximum number of iterations: `250`
    ///   - minimum overlap improvement per iteration: `1e-10`
    ///   - gradient step (relative to the parameter range): `1e-6`
    fn default() -> Self {
        Self {
            max_iterations: 250,
            convergence_threshold: 1e-10,
            gradient_step: 1e-6,
        }
    }
}
impl LocalOptimumConfig {
    /// Returns the maximum number of iterations.
    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }
    /// Sets the maximum number of iterations.
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
    /// Returns the improvement threshold below which the optimum counts as found.
    #[must_use]
    pub const fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }
    /// Sets the improvement threshold.
    ///
    /// # Errors
    ///
    /// This function will return an error if the threshold is not strictly positive and finite.
    pub fn set_convergence_threshold(&mut self, threshold: f64) -> BeamResult<()> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(BeamError::Other(
                "threshold must be > 0.0 and finite".into(),
            ));
        }
        self.convergence_threshold = threshold;
        Ok(())
    }
    /// Returns the gradient step relative to the parameter ranges.
    #[must_use]
    pub const fn gradient_step(&self) -> f64 {
        self.gradient_step
    }
    /// Sets the gradient step relative to the parameter ranges.
    ///
    /// # Errors
    ///
    /// This function will return an error if the step is not in the range `(0.0, 0.1]`.
    pub fn set_gradient_step(&mut self, step: f64) -> BeamResult<()> {
        if !(step > 0.0 && step <= 0.1) {
            return Err(BeamError::Other(
                "gradient step must be in the range (0.0, 0.1]".into(),
            ));
        }
        self.gradient_step = step;
        Ok(())
    }
}

/// Result of a successful local optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalOptimumSolution {
    parameters: Vec<FreeParameter>,
    values: Vec<Length>,
    overlap: f64,
    iterations: usize,
}
impl LocalOptimumSolution {
    /// The varied parameters.
    #[must_use]
    pub fn parameters(&self) -> &[FreeParameter] {
        &self.parameters
    }
    /// Optimized values of the parameters (in the same order).
    #[must_use]
    pub fn values(&self) -> &[Length] {
        &self.values
    }
    /// Overlap of the output beam with the target for the optimized values.
    #[must_use]
    pub const fn overlap(&self) -> f64 {
        self.overlap
    }
    /// Number of iterations used.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }
    /// Assign the optimized values to the bench. The bench is left unchanged if this fails.
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

/// Maximize the overlap of the output beam of a bench with a target beam.
#[derive(Debug, Clone)]
pub struct LocalOptimum<'a> {
    bench: &'a OpticsBench,
    horizontal_target: ComplexBeamParameter,
    vertical_target: ComplexBeamParameter,
    parameters: Vec<FreeParameter>,
    config: LocalOptimumConfig,
    cancel: CancelFlag,
}
impl<'a> LocalOptimum<'a> {
    /// Creates a new [`LocalOptimum`] search for a spherical `target` beam.
    #[must_use]
    pub fn new(bench: &'a OpticsBench, target: ComplexBeamParameter) -> Self {
        Self {
            bench,
            horizontal_target: target,
            vertical_target: target,
            parameters: Vec::new(),
            config: LocalOptimumConfig::default(),
            cancel: CancelFlag::new(),
        }
    }
    /// Use a different target beam in the vertical plane.
    #[must_use]
    pub fn with_vertical_target(mut self, target: ComplexBeamParameter) -> Self {
        self.vertical_target = target;
        self
    }
    /// Add a free parameter. This function can be used with the "builder pattern".
    ///
    /// # Errors
    ///
    /// This function will return an error if the parameter is locked, does not exist on the bench or was already
    /// added.
    pub fn with_parameter(mut self, parameter: FreeParameter) -> BeamResult<Self> {
        check_new_parameter(self.bench, &self.parameters, &parameter)?;
        self.parameters.push(parameter);
        Ok(self)
    }
    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: LocalOptimumConfig) -> Self {
        self.config = config;
        self
    }
    /// Use the given flag for cancelling the search from another thread.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
    /// Overlap of the output beam with the target for the current bench.
    ///
    /// # Errors
    ///
    /// This function will return an error if the output beam cannot be computed.
    pub fn current_overlap(&self) -> BeamResult<f64> {
        self.overlap_of(self.bench)
    }
    /// Run the optimization starting at the current parameter values. The bench is not modified.
    ///
    /// # Errors
    ///
    /// This function will return
    ///   - [`BeamError::SearchNotFound`] if the iteration budget is exhausted or the bench cannot be evaluated.
    ///   - [`BeamError::SearchCancelled`] if the search was cancelled.
    ///   - [`BeamError::Other`] if no free parameter was given.
    pub fn search(&self) -> BeamResult<LocalOptimumSolution> {
        if self.parameters.is_empty() {
            return Err(BeamError::Other(
                "local optimization needs at least one free parameter".into(),
            ));
        }
        let start = self
            .parameters
            .iter()
            .map(|p| {
                let (min, max) = (p.min().value, p.max().value);
                Ok(((p.current(self.bench)? - min) / (max - min)).clamp(0.0, 1.0))
            })
            .collect::<BeamResult<Vec<f64>>>()?;
        let mut u = DVector::from_vec(start);
        let mut value = self.objective(&u).ok_or_else(|| {
            BeamError::SearchNotFound("overlap cannot be evaluated for the start values".into())
        })?;
        info!(
            "Maximizing overlap with {} free parameter(s), start overlap {value:.6}",
            self.parameters.len()
        );
        let mut gradient_old: Option<DVector<f64>> = None;
        let mut direction = DVector::zeros(u.len());
        for iteration in 0..self.config.max_iterations {
            self.cancel.check()?;
            if value >= PERFECT_OVERLAP {
                return self.solution(&u, value, iteration);
            }
            let gradient = self.gradient(&u).ok_or_else(|| {
                BeamError::SearchNotFound("overlap gradient cannot be evaluated".into())
            })?;
            let beta = gradient_old.as_ref().map_or(0.0, |old| {
                let norm = old.norm_squared();
                if norm > 0.0 {
                    (gradient.dot(&(&gradient - old)) / norm).max(0.0)
                } else {
                    0.0
                }
            });
            direction = &gradient + direction * beta;
            if direction.dot(&gradient) <= 0.0 {
                direction.clone_from(&gradient);
            }
            project(&u, &mut direction);
            if direction.norm() == 0.0 {
                return self.solution(&u, value, iteration);
            }
            let (next, next_value) = self.line_search(&u, &direction, value);
            let improvement = next_value - value;
            debug!("iteration {iteration}: overlap {next_value:.12}");
            if improvement < self.config.convergence_threshold {
                let (u, value) = if improvement > 0.0 {
                    (next, next_value)
                } else {
                    (u, value)
                };
                return self.solution(&u, value, iteration + 1);
            }
            u = next;
            value = next_value;
            gradient_old = Some(gradient);
        }
        Err(BeamError::SearchNotFound(format!(
            "no local optimum found within {} iterations",
            self.config.max_iterations
        )))
    }
    fn solution(
        &self,
        u: &DVector<f64>,
        overlap: f64,
        iterations: usize,
    ) -> BeamResult<LocalOptimumSolution> {
        let values = self.values(u);
        info!("Local optimum found after {iterations} iteration(s): overlap {overlap:.6}");
        Ok(LocalOptimumSolution {
            parameters: self.parameters.clone(),
            values: values.iter().map(|v| meter!(*v)).collect(),
            overlap,
            iterations,
        })
    }
    fn values(&self, u: &DVector<f64>) -> Vec<f64> {
        self.parameters
            .iter()
            .zip(u.iter())
            .map(|(p, x)| (p.max().value - p.min().value).mul_add(*x, p.min().value))
            .collect()
    }
    fn overlap_of(&self, bench: &OpticsBench) -> BeamResult<f64> {
        let propagator = BeamPropagator::new(bench);
        let horizontal = propagator.output_beam(Orientation::Horizontal)?;
        let vertical = propagator.output_beam(Orientation::Vertical)?;
        let horizontal_target = self.horizontal_target.translate_to(horizontal.position())?;
        let vertical_target = self.vertical_target.translate_to(vertical.position())?;
        astigmatic_overlap(&horizontal, &vertical, &horizontal_target, &vertical_target)
    }
    /// Overlap for the scaled parameters `u`. `None` outside the bounds or if the bench cannot be evaluated.
    fn objective(&self, u: &DVector<f64>) -> Option<f64> {
        if u.iter().any(|x| !(0.0..=1.0).contains(x)) {
            return None;
        }
        let bench = configure(self.bench, &self.parameters, &self.values(u)).ok()?;
        self.overlap_of(&bench).ok()
    }
    fn gradient(&self, u: &DVector<f64>) -> Option<DVector<f64>> {
        let h = self.config.gradient_step;
        let mut gradient = DVector::zeros(u.len());
        for i in 0..u.len() {
            let mut forward = u.clone();
            let mut backward = u.clone();
            forward[i] = (u[i] + h).min(1.0);
            backward[i] = (u[i] - h).max(0.0);
            let span = forward[i] - backward[i];
            gradient[i] = (self.objective(&forward)? - self.objective(&backward)?) / span;
        }
        Some(gradient)
    }
    /// Golden section maximization along `direction` within the unit box.
    fn line_search(
        &self,
        u: &DVector<f64>,
        direction: &DVector<f64>,
        value: f64,
    ) -> (DVector<f64>, f64) {
        let t_max = u
            .iter()
            .zip(direction.iter())
            .filter(|(_, d)| **d != 0.0)
            .map(|(x, d)| if *d > 0.0 { (1.0 - x) / d } else { -x / d })
            .fold(f64::INFINITY, f64::min);
        let f = |t: f64| {
            let point = (u + direction * t).map(|x| x.clamp(0.0, 1.0));
            self.objective(&point).unwrap_or(f64::NEG_INFINITY)
        };
        let (mut a, mut b) = (0.0, t_max);
        let mut c = b - GOLDEN_RATIO * (b - a);
        let mut d = a + GOLDEN_RATIO * (b - a);
        let (mut fc, mut fd) = (f(c), f(d));
        while (b - a) > LINE_SEARCH_TOLERANCE * (1.0 + t_max) {
            if fc > fd {
                b = d;
                d = c;
                fd = fc;
                c = b - GOLDEN_RATIO * (b - a);
                fc = f(c);
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + GOLDEN_RATIO * (b - a);
                fd = f(d);
            }
        }
        let mut best = (0.0, value);
        for t in [0.5 * (a + b), t_max] {
            let ft = f(t);
            if ft > best.1 {
                best = (t, ft);
            }
        }
        (
            (u + direction * best.0).map(|x| x.clamp(0.0, 1.0)),
            best.1,
        )
    }
}
/// Remove the components of `direction` pointing out of the unit box at `u`.
fn project(u: &DVector<f64>, direction: &mut DVector<f64>) {
    for (x, d) in u.iter().zip(direction.iter_mut()) {
        if (*x <= 0.0 && *d < 0.0) || (*x >= 1.0 && *d > 0.0) {
            *d = 0.0;
        }
    }
}
