#![warn(missing_docs)]
//! 2x2 ray transfer (ABCD) matrices
//!
//! Matrices act on a complex beam parameter by the Möbius transformation `q' = (A q + B) / (C q + D)`. Lengths are
//! given in meters. Elements that change the refractive index use the reduced convention in which the
//! determinant `AD - BC` equals `n1 / n2` (input index over output index).
use nalgebra::Matrix2;
use num::complex::Complex64;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::Mul};

/// A ray transfer matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbcdMatrix(Matrix2<f64>);

impl Default for AbcdMatrix {
    fn default() -> Self {
        Self::identity()
    }
}
impl AbcdMatrix {
    /// Create a matrix from its coefficients.
    #[must_use]
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self(Matrix2::new(a, b, c, d))
    }
    /// Identity matrix.
    #[must_use]
    pub fn identity() -> Self {
        Self(Matrix2::identity())
    }
    /// Free space propagation over a distance (in meters).
    #[must_use]
    pub fn free_space(distance: f64) -> Self {
        Self::new(1.0, distance, 0.0, 1.0)
    }
    /// Thin lens of the given focal length (in meters). An infinite focal length yields the identity.
    #[must_use]
    pub fn thin_lens(focal_length: f64) -> Self {
        Self::new(1.0, 0.0, -1.0 / focal_length, 1.0)
    }
    /// Refraction at a spherical interface with radius of curvature `radius` (meters) and index ratio
    /// `n2 / n1`. An infinite radius yields a flat interface.
    #[must_use]
    pub fn interface(radius: f64, index_ratio: f64) -> Self {
        Self::new(
            1.0,
            0.0,
            (1.0 / index_ratio - 1.0) / radius,
            1.0 / index_ratio,
        )
    }
    /// Coefficient A
    #[must_use]
    pub fn a(&self) -> f64 {
        self.0[(0, 0)]
    }
    /// Coefficient B
    #[must_use]
    pub fn b(&self) -> f64 {
        self.0[(0, 1)]
    }
    /// Coefficient C
    #[must_use]
    pub fn c(&self) -> f64 {
        self.0[(1, 0)]
    }
    /// Coefficient D
    #[must_use]
    pub fn d(&self) -> f64 {
        self.0[(1, 1)]
    }
    /// Determinant `AD - BC`.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }
    /// Half trace `(A + D) / 2`, the cavity stability parameter.
    #[must_use]
    pub fn half_trace(&self) -> f64 {
        0.5 * (self.a() + self.d())
    }
    /// Inverse matrix, if it exists.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }
    /// Apply the Möbius transformation to a complex beam parameter.
    #[must_use]
    pub fn transform(&self, q: Complex64) -> Complex64 {
        (q * self.a() + self.b()) / (q * self.c() + self.d())
    }
    /// Returns `true` if all coefficients agree within `epsilon`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(x, y)| (x - y).abs() <= epsilon)
    }
    /// The underlying [`nalgebra`] matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix2<f64> {
        &self.0
    }
}
/// `self * rhs` applies `rhs` first, then `self`.
impl Mul for AbcdMatrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}
impl Display for AbcdMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A = {} B = {} C = {} D = {}",
            self.a(),
            self.b(),
            self.c(),
            self.d()
        )
    }
}
