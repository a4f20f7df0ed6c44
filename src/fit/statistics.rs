//! Linear regression used for seeding beam fits
use crate::utils::usize_to_f64;
use kahan::KahanSummator;

/// Straight line `y = slope * x + intercept` fitted to a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    /// slope of the line
    pub slope: f64,
    /// value at `x = 0`
    pub intercept: f64,
}
impl LinearRegression {
    /// Least squares line through the given `(x, y)` points.
    ///
    /// Returns `None` if there are fewer than two points or all points share the same `x`.
    #[must_use]
    pub fn new(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = usize_to_f64(points.len());
        let mean_x = sum(points.iter().map(|p| p.0)) / n;
        let mean_y = sum(points.iter().map(|p| p.1)) / n;
        let sxx = sum(points.iter().map(|p| (p.0 - mean_x) * (p.0 - mean_x)));
        if sxx <= f64::MIN_POSITIVE {
            return None;
        }
        let sxy = sum(points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)));
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: slope.mul_add(-mean_x, mean_y),
        })
    }
    /// Value of the line at `x`.
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
    /// Position where the line crosses zero. `None` for a horizontal line.
    #[must_use]
    pub fn root(&self) -> Option<f64> {
        if self.slope == 0.0 {
            None
        } else {
            Some(-self.intercept / self.slope)
        }
    }
}
fn sum<I: Iterator<Item = f64>>(values: I) -> f64 {
    let values: Vec<f64> = values.collect();
    values.iter().kahan_sum().sum()
}
#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    #[test]
    fn exact_line() {
        let points = [(1.0, 3.0), (2.0, 5.0), (4.0, 9.0)];
        let line = LinearRegression::new(&points).unwrap();
        assert_abs_diff_eq!(line.slope, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(line.intercept, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(line.value_at(10.0), 21.0, epsilon = 1e-12);
        assert_abs_diff_eq!(line.root().unwrap(), -0.5, epsilon = 1e-12);
    }
    #[test]
    fn scattered() {
        let points = [(0.0, 0.0), (1.0, 2.0), (2.0, 0.0), (3.0, 2.0)];
        let line = LinearRegression::new(&points).unwrap();
        assert_abs_diff_eq!(line.slope, 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(line.intercept, 0.4, epsilon = 1e-12);
    }
    #[test]
    fn degenerate() {
        assert!(LinearRegression::new(&[]).is_none());
        assert!(LinearRegression::new(&[(1.0, 1.0)]).is_none());
        assert!(LinearRegression::new(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
        let flat = LinearRegression::new(&[(0.0, 1.0), (1.0, 1.0)]).unwrap();
        assert!(flat.root().is_none());
    }
}
