#![warn(missing_docs)]
//! Stability and eigenmode analysis of optical resonators
//!
//! The elements of the bench (or a selection of them) are treated as one period of a resonator in unfolded
//! representation. The round trip starts directly in front of the first cavity element, passes all cavity elements
//! and the free space between them and is closed by a configurable free space distance back to the first element.
//!
//! A resonator is stable if `|A + D| / 2 < 1`. In this case its eigenmode `q` solves `C q² + (D - A) q - B = 0`
//! and the root with a positive imaginary part is selected. An unstable resonator is not an error: the result is
//! flagged as unstable and has no eigenmode.
use crate::{
    abcd::AbcdMatrix,
    beam_parameter::ComplexBeamParameter,
    bench::OpticsBench,
    elements::{ElementId, OpticalElement},
    error::{BeamError, BeamResult},
    orientation::{Aspect, Orientation},
    propagation::BeamPropagator,
    meter,
    utils::sqr,
};
use num::complex::Complex64;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// Relative tolerance for comparing the eigenmodes of both planes.
const ASPECT_TOLERANCE: f64 = 1e-9;

/// Result of a round trip analysis in one plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CavityRoundTrip {
    /// plane of the analysis
    pub orientation: Orientation,
    /// `true` if the resonator is stable in this plane
    pub stable: bool,
    /// round trip matrix
    pub round_trip: AbcdMatrix,
    /// eigenmode at the position of the first cavity element (only for stable resonators)
    pub eigen_mode: Option<ComplexBeamParameter>,
}

/// Result of a round trip analysis in both planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CavityAnalysis {
    /// horizontal plane
    pub horizontal: CavityRoundTrip,
    /// vertical plane
    pub vertical: CavityRoundTrip,
    /// [`Aspect::Spherical`] if both planes behave identically, [`Aspect::Ellipsoidal`] otherwise
    pub aspect: Aspect,
}
impl CavityAnalysis {
    /// Returns `true` if the resonator is stable in both planes.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        self.horizontal.stable && self.vertical.stable
    }
}

/// Analyzer treating the bench as a resonator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CavityAnalyzer {
    elements: Option<Vec<ElementId>>,
    closing_distance: Length,
}
impl CavityAnalyzer {
    /// Creates a new [`CavityAnalyzer`] using all elements of the bench and no closing distance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Restrict the resonator to the given elements. This function can be used with the "builder pattern".
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<ElementId>) -> Self {
        self.elements = Some(elements);
        self
    }
    /// Sets the free space distance from the last cavity element back to the first one.
    ///
    /// # Errors
    ///
    /// This function will return an error if the distance is negative or not finite.
    pub fn with_closing_distance(mut self, distance: Length) -> BeamResult<Self> {
        if !distance.is_finite() || distance.value < 0.0 {
            return Err(BeamError::ElementConfiguration(
                "closing distance must be >= 0.0 and finite".into(),
            ));
        }
        self.closing_distance = distance;
        Ok(self)
    }
    /// Free space distance closing the round trip.
    #[must_use]
    pub const fn closing_distance(&self) -> Length {
        self.closing_distance
    }
    fn cavity_elements<'a>(&self, bench: &'a OpticsBench) -> BeamResult<Vec<&'a OpticalElement>> {
        if let Some(ids) = &self.elements {
            for id in ids {
                let element = bench
                    .element(*id)
                    .ok_or_else(|| BeamError::Bench(format!("no element with id {id}")))?;
                if element.is_input_beam() {
                    return Err(BeamError::Bench(
                        "the input beam cannot be part of a cavity".into(),
                    ));
                }
            }
            Ok(bench.optics().filter(|e| ids.contains(&e.id())).collect())
        } else {
            Ok(bench.optics().collect())
        }
    }
    /// Round trip matrix in the given plane. Returns `None` if the resonator contains no element.
    ///
    /// # Errors
    ///
    /// This function will return an error if an element of the selection does not exist or is the input beam.
    pub fn round_trip_matrix(
        &self,
        bench: &OpticsBench,
        orientation: Orientation,
    ) -> BeamResult<Option<AbcdMatrix>> {
        let elements = self.cavity_elements(bench)?;
        if elements.is_empty() {
            return Ok(None);
        }
        let mut matrix = AbcdMatrix::identity();
        let mut previous_end: Option<Length> = None;
        for element in elements {
            if let Some(end) = previous_end {
                matrix = AbcdMatrix::free_space((element.position() - end).value) * matrix;
            }
            matrix = element.matrix(orientation) * matrix;
            previous_end = Some(element.end_position());
        }
        Ok(Some(
            AbcdMatrix::free_space(self.closing_distance.value) * matrix,
        ))
    }
    /// Analyze the resonator in one plane.
    ///
    /// # Errors
    ///
    /// This function will return an error if the element selection is invalid.
    pub fn analyze(
        &self,
        bench: &OpticsBench,
        orientation: Orientation,
    ) -> BeamResult<CavityRoundTrip> {
        let Some(round_trip) = self.round_trip_matrix(bench, orientation)? else {
            return Ok(CavityRoundTrip {
                orientation,
                stable: false,
                round_trip: AbcdMatrix::identity(),
                eigen_mode: None,
            });
        };
        let eigen_mode = match eigen_value(&round_trip) {
            Some(q) => {
                let start = self
                    .cavity_elements(bench)?
                    .first()
                    .map_or_else(|| meter!(0.0), |e| e.position());
                let index = BeamPropagator::new(bench).index_at(start, orientation)?;
                Some(ComplexBeamParameter::new(
                    q,
                    start,
                    bench.wavelength(),
                    index,
                    1.0,
                )?)
            }
            None => None,
        };
        Ok(CavityRoundTrip {
            orientation,
            stable: eigen_mode.is_some(),
            round_trip,
            eigen_mode,
        })
    }
    /// Analyze the resonator in both planes and classify its aspect.
    ///
    /// # Errors
    ///
    /// This function will return an error if the element selection is invalid.
    pub fn analyze_both(&self, bench: &OpticsBench) -> BeamResult<CavityAnalysis> {
        let horizontal = self.analyze(bench, Orientation::Horizontal)?;
        let vertical = self.analyze(bench, Orientation::Vertical)?;
        let spherical = match (horizontal.eigen_mode, vertical.eigen_mode) {
            (Some(h), Some(v)) => h.approx_eq(&v, ASPECT_TOLERANCE),
            (None, None) => horizontal
                .round_trip
                .approx_eq(&vertical.round_trip, ASPECT_TOLERANCE),
            _ => false,
        };
        Ok(CavityAnalysis {
            horizontal,
            vertical,
            aspect: if spherical {
                Aspect::Spherical
            } else {
                Aspect::Ellipsoidal
            },
        })
    }
}
/// Eigenvalue `q` of a round trip matrix with positive imaginary part, if the matrix describes a stable resonator.
fn eigen_value(m: &AbcdMatrix) -> Option<Complex64> {
    let discriminant = sqr(m.d() - m.a()) + 4.0 * m.b() * m.c();
    if m.half_trace().abs() >= 1.0 || m.c() == 0.0 || discriminant >= 0.0 {
        return None;
    }
    Some(Complex64::new(
        (m.a() - m.d()) / (2.0 * m.c()),
        (-discriminant).sqrt() / (2.0 * m.c().abs()),
    ))
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        degree,
        elements::{CurvedMirror, FlatMirror, ThinLens},
        millimeter,
    };
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    fn two_mirror_cavity(radius_mm: f64, length_mm: f64) -> (OpticsBench, CavityAnalyzer) {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        for (name, position) in [("M1", 10.0), ("M2", 10.0 + length_mm)] {
            bench
                .add_element(
                    OpticalElement::new(
                        name,
                        millimeter!(position),
                        CurvedMirror::new(millimeter!(radius_mm)).unwrap().into(),
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        let analyzer = CavityAnalyzer::new()
            .with_closing_distance(millimeter!(length_mm))
            .unwrap();
        (bench, analyzer)
    }
    #[test]
    fn closing_distance() {
        assert!(CavityAnalyzer::new()
            .with_closing_distance(millimeter!(-1.0))
            .is_err());
        assert!(CavityAnalyzer::new()
            .with_closing_distance(millimeter!(f64::NAN))
            .is_err());
        assert_eq!(CavityAnalyzer::new().closing_distance().value, 0.0);
    }
    #[test]
    fn symmetric_stability() {
        let radius = 100.0;
        for (length, stable) in [
            (20.0, true),
            (50.0, true),
            (150.0, true),
            (190.0, true),
            (210.0, false),
            (400.0, false),
        ] {
            let (bench, analyzer) = two_mirror_cavity(radius, length);
            let result = analyzer.analyze(&bench, Orientation::Horizontal).unwrap();
            let g = 1.0 - length / radius;
            assert_eq!(result.stable, stable, "L = {length}");
            assert_eq!(result.stable, g * g < 1.0);
            assert_eq!(result.eigen_mode.is_some(), stable);
            assert_relative_eq!(result.round_trip.determinant(), 1.0, max_relative = 1e-12);
        }
    }
    #[test]
    fn symmetric_eigenmode() {
        let (radius, length) = (0.1, 0.15);
        let (bench, analyzer) = two_mirror_cavity(radius * 1e3, length * 1e3);
        let q = analyzer
            .analyze(&bench, Orientation::Vertical)
            .unwrap()
            .eigen_mode
            .unwrap();
        // waist in the center of the resonator, z0 = sqrt(L (2R - L)) / 2
        assert_relative_eq!(q.distance_to_waist().value, length / 2.0, max_relative = 1e-9);
        assert_relative_eq!(
            q.rayleigh_range().value,
            (length * (2.0 * radius - length)).sqrt() / 2.0,
            max_relative = 1e-9
        );
        assert_relative_eq!(q.position().value, 0.01, max_relative = 1e-12);
        // the eigenmode reproduces itself after one round trip
        let m = analyzer.round_trip_matrix(&bench, Orientation::Vertical).unwrap().unwrap();
        let after = q.propagate(&m, 1.0, q.position()).unwrap();
        assert!(after.approx_eq(&q, 1e-9));
    }
    #[test]
    fn empty_cavity() {
        let bench = OpticsBench::with_default_beam().unwrap();
        let result = CavityAnalyzer::new()
            .analyze(&bench, Orientation::Horizontal)
            .unwrap();
        assert!(!result.stable);
        assert!(result.eigen_mode.is_none());
    }
    #[test]
    fn flat_mirrors_unstable() {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        for position in [10.0, 60.0] {
            bench
                .add_element(OpticalElement::new("M", millimeter!(position), FlatMirror.into()).unwrap())
                .unwrap();
        }
        let result = CavityAnalyzer::new()
            .with_closing_distance(millimeter!(50.0))
            .unwrap()
            .analyze_both(&bench)
            .unwrap();
        // |A + D| / 2 == 1 is marginal and reported as unstable
        assert!(!result.is_stable());
        assert_eq!(result.aspect, Aspect::Spherical);
    }
    #[test]
    fn element_selection() {
        let (mut bench, analyzer) = two_mirror_cavity(100.0, 150.0);
        let lens = bench
            .add_element(
                OpticalElement::new(
                    "L",
                    millimeter!(5.0),
                    ThinLens::new(millimeter!(20.0)).unwrap().into(),
                )
                .unwrap(),
            )
            .unwrap();
        let all = analyzer.analyze(&bench, Orientation::Horizontal).unwrap();
        let mirrors: Vec<ElementId> = bench
            .optics()
            .filter(|e| e.name().starts_with('M'))
            .map(OpticalElement::id)
            .collect();
        let selected = analyzer
            .clone()
            .with_elements(mirrors)
            .analyze(&bench, Orientation::Horizontal)
            .unwrap();
        assert!(selected.stable);
        assert_ne!(all.round_trip, selected.round_trip);
        assert_matches!(
            analyzer
                .clone()
                .with_elements(vec![bench.input_beam_id()])
                .analyze(&bench, Orientation::Horizontal),
            Err(BeamError::Bench(_))
        );
        bench.remove_element(lens).unwrap();
        assert_matches!(
            analyzer
                .with_elements(vec![lens])
                .analyze(&bench, Orientation::Horizontal),
            Err(BeamError::Bench(_))
        );
    }
    #[test]
    fn astigmatic_resonator() {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        bench
            .add_element(
                OpticalElement::new(
                    "M1",
                    millimeter!(10.0),
                    CurvedMirror::new(millimeter!(100.0))
                        .unwrap()
                        .with_angle(degree!(10.0))
                        .unwrap()
                        .into(),
                )
                .unwrap(),
            )
            .unwrap();
        bench
            .add_element(
                OpticalElement::new(
                    "M2",
                    millimeter!(90.0),
                    CurvedMirror::new(millimeter!(100.0)).unwrap().into(),
                )
                .unwrap(),
            )
            .unwrap();
        let analyzer = CavityAnalyzer::new()
            .with_closing_distance(millimeter!(80.0))
            .unwrap();
        let result = analyzer.analyze_both(&bench).unwrap();
        assert!(result.is_stable());
        assert_eq!(result.aspect, Aspect::Ellipsoidal);
        let (bench, analyzer) = two_mirror_cavity(100.0, 100.0 - 1.0);
        assert_eq!(analyzer.analyze_both(&bench).unwrap().aspect, Aspect::Spherical);
    }
}
