#![warn(missing_docs)]
//! Elements with a finite thickness: dielectric slabs and thick lenses
//!
//! Both are composed of an entrance interface, the propagation through the medium and an exit interface back into
//! the surrounding medium. Their net index ratio is therefore 1.
use super::Element;
use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    meter,
    orientation::Orientation,
};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// relative power below which a thick lens is considered afocal
const AFOCAL_TOLERANCE: f64 = 1e-12;

fn check_thickness_and_index(thickness: Length, index_ratio: f64) -> BeamResult<()> {
    if !thickness.is_finite() || thickness.value <= 0.0 {
        return Err(BeamError::ElementConfiguration(
            "thickness must be > 0.0 and finite".into(),
        ));
    }
    if !index_ratio.is_finite() || index_ratio <= 0.0 {
        return Err(BeamError::ElementConfiguration(
            "refractive index must be > 0.0 and finite".into(),
        ));
    }
    Ok(())
}

/// A plane-parallel dielectric plate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DielectricSlab {
    thickness: Length,
    index_ratio: f64,
}
impl DielectricSlab {
    /// Creates a new [`DielectricSlab`] of the given thickness and refractive index (relative to the
    /// surrounding medium).
    ///
    /// # Errors
    ///
    /// This function will return an error if the thickness or the index is not strictly positive and finite.
    pub fn new(thickness: Length, index_ratio: f64) -> BeamResult<Self> {
        check_thickness_and_index(thickness, index_ratio)?;
        Ok(Self {
            thickness,
            index_ratio,
        })
    }
    /// Thickness of the slab.
    #[must_use]
    pub const fn thickness(&self) -> Length {
        self.thickness
    }
    /// Refractive index relative to the surrounding medium.
    #[must_use]
    pub const fn relative_index(&self) -> f64 {
        self.index_ratio
    }
}
impl Element for DielectricSlab {
    fn node_type(&self) -> &'static str {
        "dielectric slab"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::interface(f64::INFINITY, 1.0 / self.index_ratio)
            * AbcdMatrix::free_space(self.thickness.value)
            * AbcdMatrix::interface(f64::INFINITY, self.index_ratio)
    }
    fn validate(&self) -> BeamResult<()> {
        check_thickness_and_index(self.thickness, self.index_ratio)
    }
    fn width(&self) -> Length {
        self.thickness
    }
    fn interior_matrix(&self, _orientation: Orientation, depth: Length) -> Option<(AbcdMatrix, f64)> {
        Some((
            AbcdMatrix::free_space(depth.value)
                * AbcdMatrix::interface(f64::INFINITY, self.index_ratio),
            self.index_ratio,
        ))
    }
}

/// A spherical lens of finite thickness.
///
/// The radii of curvature follow the [`CurvedInterface`](super::CurvedInterface) convention: a biconvex lens has
/// a positive entrance and a negative exit curvature. Infinite radii denote flat surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThickLens {
    thickness: Length,
    index_ratio: f64,
    front_curvature: Length,
    rear_curvature: Length,
}
impl ThickLens {
    /// Creates a new [`ThickLens`].
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the thickness or the index is not strictly positive and finite.
    ///   - one of the curvatures is zero or NaN.
    pub fn new(
        thickness: Length,
        index_ratio: f64,
        front_curvature: Length,
        rear_curvature: Length,
    ) -> BeamResult<Self> {
        let lens = Self {
            thickness,
            index_ratio,
            front_curvature,
            rear_curvature,
        };
        lens.validate()?;
        Ok(lens)
    }
    fn entrance(&self) -> AbcdMatrix {
        AbcdMatrix::interface(self.front_curvature.value, self.index_ratio)
    }
}
impl Element for ThickLens {
    fn node_type(&self) -> &'static str {
        "thick lens"
    }
    fn matrix(&self, _orientation: Orientation) -> AbcdMatrix {
        AbcdMatrix::interface(self.rear_curvature.value, 1.0 / self.index_ratio)
            * AbcdMatrix::free_space(self.thickness.value)
            * self.entrance()
    }
    fn validate(&self) -> BeamResult<()> {
        check_thickness_and_index(self.thickness, self.index_ratio)?;
        for curvature in [self.front_curvature, self.rear_curvature] {
            if curvature.is_zero() || curvature.is_nan() {
                return Err(BeamError::ElementConfiguration(
                    "curvature must not be 0.0 or NaN".into(),
                ));
            }
        }
        Ok(())
    }
    fn width(&self) -> Length {
        self.thickness
    }
    fn interior_matrix(&self, _orientation: Orientation, depth: Length) -> Option<(AbcdMatrix, f64)> {
        Some((
            AbcdMatrix::free_space(depth.value) * self.entrance(),
            self.index_ratio,
        ))
    }
    /// Effective focal length, `None` for an afocal lens.
    fn focal_length(&self) -> Option<Length> {
        let c = self.matrix(Orientation::Horizontal).c();
        let surface_power = (self.index_ratio - 1.0).abs()
            * (1.0 / self.front_curvature.value.abs() + 1.0 / self.rear_curvature.value.abs());
        if c.abs() <= AFOCAL_TOLERANCE * surface_power {
            return None;
        }
        Some(meter!(-1.0 / c))
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::millimeter;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    #[test]
    fn slab_new() {
        assert!(DielectricSlab::new(millimeter!(0.0), 1.5).is_err());
        assert!(DielectricSlab::new(millimeter!(-1.0), 1.5).is_err());
        assert!(DielectricSlab::new(millimeter!(1.0), 0.0).is_err());
        let s = DielectricSlab::new(millimeter!(10.0), 1.5).unwrap();
        assert_eq!(s.width(), millimeter!(10.0));
        assert_abs_diff_eq!(s.index_ratio(), 1.0);
        assert_abs_diff_eq!(s.relative_index(), 1.5);
    }
    #[test]
    fn slab_matrix() {
        let s = DielectricSlab::new(millimeter!(15.0), 1.5).unwrap();
        let m = s.matrix(Orientation::Horizontal);
        assert_abs_diff_eq!(m.a(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.b(), 0.010, max_relative = 1e-12);
        assert_abs_diff_eq!(m.c(), 0.0);
        assert_abs_diff_eq!(m.d(), 1.0, epsilon = 1e-12);
        let (inside, ratio) = s
            .interior_matrix(Orientation::Horizontal, millimeter!(5.0))
            .unwrap();
        assert_relative_eq!(ratio, 1.5);
        assert_relative_eq!(inside.determinant(), 1.0 / 1.5, max_relative = 1e-12);
    }
    #[test]
    fn thick_lens_flat_is_slab() {
        let lens = ThickLens::new(
            millimeter!(15.0),
            1.5,
            millimeter!(f64::INFINITY),
            millimeter!(f64::INFINITY),
        )
        .unwrap();
        let slab = DielectricSlab::new(millimeter!(15.0), 1.5).unwrap();
        assert!(lens
            .matrix(Orientation::Vertical)
            .approx_eq(&slab.matrix(Orientation::Vertical), 1e-12));
    }
    #[test]
    fn thick_lens_focal_length() {
        // lensmaker's equation: 1/f = (n-1) (1/R1 - 1/R2 + (n-1) d / (n R1 R2))
        let (n, r1, r2, d) = (1.5, 0.1, -0.1, 0.005);
        let lens =
            ThickLens::new(millimeter!(5.0), n, millimeter!(100.0), millimeter!(-100.0)).unwrap();
        let expected = 1.0 / ((n - 1.0) * (1.0 / r1 - 1.0 / r2 + (n - 1.0) * d / (n * r1 * r2)));
        assert_relative_eq!(
            lens.focal_length().unwrap().value,
            expected,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            lens.matrix(Orientation::Horizontal).determinant(),
            1.0,
            max_relative = 1e-12
        );
        assert!(ThickLens::new(millimeter!(5.0), n, millimeter!(0.0), millimeter!(-100.0)).is_err());
    }
    #[test]
    fn afocal_thick_lens() {
        let flat = ThickLens::new(
            millimeter!(15.0),
            1.5,
            millimeter!(f64::INFINITY),
            millimeter!(f64::INFINITY),
        )
        .unwrap();
        assert!(flat.focal_length().is_none());
        // meniscus whose surface powers cancel: 1/R2 = (1/R1) / (1 - (n-1) d / (n R1))
        let meniscus =
            ThickLens::new(millimeter!(15.0), 1.5, millimeter!(100.0), millimeter!(95.0)).unwrap();
        assert_abs_diff_eq!(meniscus.matrix(Orientation::Horizontal).c(), 0.0, epsilon = 1e-12);
        assert!(meniscus.focal_length().is_none());
        let weak =
            ThickLens::new(millimeter!(15.0), 1.5, millimeter!(100.0), millimeter!(96.0)).unwrap();
        assert!(weak.focal_length().unwrap().value.is_finite());
    }
}
