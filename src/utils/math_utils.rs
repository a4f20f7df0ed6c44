//! Small numeric helpers shared by the fit and optimizer modules
use kahan::KahanSummator;

#[must_use]
pub const fn usize_to_f64(value: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let newval = value as f64;
    newval
}
/// Square of a value.
#[must_use]
pub fn sqr(value: f64) -> f64 {
    value * value
}
/// Root mean square of the given values (compensated summation).
///
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let squares: Vec<f64> = values.iter().map(|v| sqr(*v)).collect();
    let sum: f64 = squares.iter().kahan_sum().sum();
    (sum / usize_to_f64(values.len())).sqrt()
}
/// Finite difference step for a parameter of magnitude `value`.
#[must_use]
pub fn relative_step(value: f64, relative: f64) -> f64 {
    if value.abs() > f64::EPSILON {
        value.abs() * relative
    } else {
        relative
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    #[test]
    fn usize_conversion() {
        assert_eq!(usize_to_f64(12), 12.0);
    }
    #[test]
    fn rms_values() {
        assert_eq!(rms(&[]), 0.0);
        assert_abs_diff_eq!(rms(&[3.0, -3.0]), 3.0);
        assert_abs_diff_eq!(rms(&[1.0, 7.0]), 5.0);
    }
    #[test]
    fn step() {
        assert_abs_diff_eq!(relative_step(2.0, 1e-6), 2e-6);
        assert_abs_diff_eq!(relative_step(0.0, 1e-6), 1e-6);
    }
}
