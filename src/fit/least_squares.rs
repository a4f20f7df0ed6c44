//! Damped Gauss-Newton (Levenberg-Marquardt) minimization of a sum of squared residuals
//!
//! The Jacobian is computed by forward differences. A trial step is accepted if it lowers the cost; the damping
//! factor is then decreased by ten, otherwise it is increased by ten. The minimization stops (converged) if the
//! relative decrease of the cost or the relative step size falls below the configured tolerance, if the cost
//! vanishes, or if no further descent direction is found even with maximum damping.
use super::FitConfig;
use crate::{cancel::CancelFlag, error::BeamResult, utils::math_utils::relative_step};
use log::debug;
use nalgebra::{DMatrix, DVector};

const MAX_DAMPING: f64 = 1e10;
const MIN_DAMPING: f64 = 1e-15;
const JACOBIAN_STEP: f64 = 1e-7;
const COST_FLOOR: f64 = 1e-26;

/// Final state of a minimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresOutcome {
    /// parameters at the end of the run
    pub parameters: DVector<f64>,
    /// sum of squared residuals at `parameters`
    pub cost: f64,
    /// number of iterations performed
    pub iterations: usize,
    /// `true` if a convergence criterion was met within the iteration budget
    pub converged: bool,
}

/// Minimize the sum of squares of `residuals` starting at `start`.
///
/// Trial points at which `residuals` fails are treated like steps that increase the cost.
///
/// # Errors
///
/// This function will return an error if
///   - the residuals cannot be evaluated at the start point or for the Jacobian.
///   - the run was cancelled through `cancel`.
pub fn levenberg_marquardt<F>(
    residuals: F,
    start: DVector<f64>,
    config: &FitConfig,
    cancel: &CancelFlag,
) -> BeamResult<LeastSquaresOutcome>
where
    F: Fn(&DVector<f64>) -> BeamResult<DVector<f64>>,
{
    let mut parameters = start;
    let mut current = residuals(&parameters)?;
    let mut cost = current.norm_squared();
    let mut damping = config.initial_damping();
    for iteration in 0..config.max_iterations() {
        cancel.check()?;
        if cost <= COST_FLOOR {
            return Ok(LeastSquaresOutcome {
                parameters,
                cost,
                iterations: iteration,
                converged: true,
            });
        }
        let jacobian = jacobian(&residuals, &parameters, &current)?;
        let gradient = jacobian.transpose() * &current;
        let normal = jacobian.transpose() * &jacobian;
        loop {
            if let Some((trial, trial_residuals)) =
                trial_step(&residuals, &parameters, &normal, &gradient, damping)
            {
                let trial_cost = trial_residuals.norm_squared();
                if trial_cost < cost {
                    let decrease = (cost - trial_cost) / cost;
                    let step = (&trial - &parameters).norm();
                    parameters = trial;
                    current = trial_residuals;
                    cost = trial_cost;
                    damping = (damping * 0.1).max(MIN_DAMPING);
                    debug!("iteration {iteration}: cost {cost:.6e}, damping {damping:.1e}");
                    let tolerance = config.tolerance();
                    if decrease <= tolerance || step <= tolerance * (parameters.norm() + tolerance) {
                        return Ok(LeastSquaresOutcome {
                            parameters,
                            cost,
                            iterations: iteration + 1,
                            converged: true,
                        });
                    }
                    break;
                }
            }
            damping *= 10.0;
            if damping > MAX_DAMPING {
                return Ok(LeastSquaresOutcome {
                    parameters,
                    cost,
                    iterations: iteration + 1,
                    converged: true,
                });
            }
        }
    }
    Ok(LeastSquaresOutcome {
        parameters,
        cost,
        iterations: config.max_iterations(),
        converged: false,
    })
}
fn jacobian<F>(
    residuals: &F,
    parameters: &DVector<f64>,
    current: &DVector<f64>,
) -> BeamResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> BeamResult<DVector<f64>>,
{
    let mut jacobian = DMatrix::zeros(current.len(), parameters.len());
    for column in 0..parameters.len() {
        let mut h = relative_step(parameters[column], JACOBIAN_STEP);
        let mut shifted = parameters.clone();
        shifted[column] += h;
        let values = if let Ok(values) = residuals(&shifted) {
            values
        } else {
            h = -h;
            shifted[column] = parameters[column] + h;
            residuals(&shifted)?
        };
        jacobian.set_column(column, &((values - current) / h));
    }
    Ok(jacobian)
}
fn trial_step<F>(
    residuals: &F,
    parameters: &DVector<f64>,
    normal: &DMatrix<f64>,
    gradient: &DVector<f64>,
    damping: f64,
) -> Option<(DVector<f64>, DVector<f64>)>
where
    F: Fn(&DVector<f64>) -> BeamResult<DVector<f64>>,
{
    let mut damped = normal.clone();
    for i in 0..damped.nrows() {
        damped[(i, i)] += damping * normal[(i, i)].max(f64::EPSILON);
    }
    let step = damped.cholesky()?.solve(&(-gradient.clone()));
    let trial = parameters + step;
    let values = residuals(&trial).ok()?;
    values
        .iter()
        .all(|v| v.is_finite())
        .then_some((trial, values))
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::error::BeamError;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn exponential(x: &DVector<f64>) -> BeamResult<DVector<f64>> {
        // y = 2 exp(-0.5 t)
        let values = (0..8)
            .map(|i| {
                let t = f64::from(i);
                x[0] * (x[1] * t).exp() - 2.0 * (-0.5 * t).exp()
            })
            .collect();
        Ok(DVector::from_vec(values))
    }
    #[test]
    fn linear_problem() {
        let residuals = |x: &DVector<f64>| -> BeamResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![x[0] - 3.0, 2.0 * (x[1] + 1.0)]))
        };
        let outcome = levenberg_marquardt(
            residuals,
            DVector::from_vec(vec![0.0, 0.0]),
            &FitConfig::default(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert!(outcome.converged);
        assert_abs_diff_eq!(outcome.parameters[0], 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(outcome.parameters[1], -1.0, epsilon = 1e-8);
    }
    #[test]
    fn non_linear_problem() {
        let outcome = levenberg_marquardt(
            exponential,
            DVector::from_vec(vec![1.0, -0.1]),
            &FitConfig::default(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert!(outcome.converged);
        assert_abs_diff_eq!(outcome.parameters[0], 2.0, epsilon = 1e-7);
        assert_abs_diff_eq!(outcome.parameters[1], -0.5, epsilon = 1e-7);
        assert!(outcome.cost < 1e-12);
    }
    #[test]
    fn iteration_budget() {
        let mut config = FitConfig::default();
        config.set_max_iterations(1).unwrap();
        let outcome = levenberg_marquardt(
            exponential,
            DVector::from_vec(vec![1.0, -0.1]),
            &config,
            &CancelFlag::new(),
        )
        .unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
    }
    #[test]
    fn invalid_start() {
        let residuals = |_: &DVector<f64>| -> BeamResult<DVector<f64>> {
            Err(BeamError::DegenerateBeam("test".into()))
        };
        assert_matches!(
            levenberg_marquardt(
                residuals,
                DVector::from_vec(vec![0.0]),
                &FitConfig::default(),
                &CancelFlag::new()
            ),
            Err(BeamError::DegenerateBeam(_))
        );
    }
    #[test]
    fn cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert_matches!(
            levenberg_marquardt(
                exponential,
                DVector::from_vec(vec![1.0, -0.1]),
                &FitConfig::default(),
                &cancel
            ),
            Err(BeamError::SearchCancelled)
        );
    }
}
