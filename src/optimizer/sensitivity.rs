//! Alignment sensitivity of the elements of a bench
//!
//! The sensitivity of an element is the curvature of the overlap between the perturbed and the unperturbed
//! output beam with respect to a displacement of the element, `-½ ∂²η/∂x²` (in 1/m²). A large value means that a
//! small misplacement of the element strongly degrades the output beam.
use crate::{
    bench::OpticsBench,
    elements::ElementId,
    error::BeamResult,
    meter,
    orientation::Orientation,
    overlap::overlap,
    propagation::BeamPropagator,
    utils::sqr,
};
use log::warn;
use serde::{Deserialize, Serialize};

/// Displacement used for the finite differences.
const DISPLACEMENT: f64 = 1e-5;
/// Distance behind the end of the bench at which perturbed and unperturbed beams are compared.
const PROBE_DISTANCE: f64 = 1e-3;

/// Sensitivity of a single element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSensitivity {
    /// identifier of the element
    pub element: ElementId,
    /// name of the element
    pub name: String,
    /// `-½ ∂²η/∂x²` in 1/m²
    pub sensitivity: f64,
}

/// Compute the position sensitivity of every element of the bench (except the input beam) in bench order.
///
/// Locks are ignored: each element is displaced on its own.
///
/// # Errors
///
/// This function will return an error if the output beam of the unperturbed bench cannot be computed.
pub fn sensitivity(
    bench: &OpticsBench,
    orientation: Orientation,
) -> BeamResult<Vec<ElementSensitivity>> {
    let probe = bench.end_position() + meter!(PROBE_DISTANCE);
    let reference = BeamPropagator::new(bench).propagate(probe, orientation)?;
    let overlap_for = |id: ElementId, delta: f64| -> BeamResult<f64> {
        let mut perturbed = bench.clone();
        perturbed.displace(&[id], meter!(delta))?;
        let beam = BeamPropagator::new(&perturbed).propagate(probe, orientation)?;
        overlap(&reference, &beam)
    };
    let mut result = Vec::new();
    for element in bench.optics() {
        let id = element.id();
        let curvature = central_curvature(&overlap_for, id)
            .or_else(|_| forward_curvature(&overlap_for, id));
        let sensitivity = match curvature {
            Ok(curvature) => -curvature / 2.0,
            Err(e) => {
                warn!(
                    "sensitivity of element '{}' cannot be computed: {e}",
                    element.name()
                );
                f64::NAN
            }
        };
        result.push(ElementSensitivity {
            element: id,
            name: element.name().to_owned(),
            sensitivity,
        });
    }
    Ok(result)
}
fn central_curvature<F>(overlap_for: &F, id: ElementId) -> BeamResult<f64>
where
    F: Fn(ElementId, f64) -> BeamResult<f64>,
{
    let plus = overlap_for(id, DISPLACEMENT)?;
    let minus = overlap_for(id, -DISPLACEMENT)?;
    Ok((plus - 2.0 + minus) / sqr(DISPLACEMENT))
}
/// One sided second difference for elements which cannot be moved backwards (e.g. sitting on the input beam).
fn forward_curvature<F>(overlap_for: &F, id: ElementId) -> BeamResult<f64>
where
    F: Fn(ElementId, f64) -> BeamResult<f64>,
{
    let one = overlap_for(id, DISPLACEMENT)?;
    let two = overlap_for(id, 2.0 * DISPLACEMENT)?;
    Ok((two - 2.0 * one + 1.0) / sqr(DISPLACEMENT))
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        elements::{FlatMirror, OpticalElement, ThinLens},
        millimeter,
        utils::usize_to_f64,
    };

    fn lens_bench(focal_lengths_mm: &[f64]) -> OpticsBench {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        for (i, f) in focal_lengths_mm.iter().enumerate() {
            bench
                .add_element(
                    OpticalElement::new(
                        &format!("L{i}"),
                        millimeter!(100.0 * (usize_to_f64(i) + 1.0)),
                        ThinLens::new(millimeter!(*f)).unwrap().into(),
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        bench
    }
    #[test]
    fn empty_bench() {
        let bench = OpticsBench::with_default_beam().unwrap();
        assert!(sensitivity(&bench, Orientation::Horizontal)
            .unwrap()
            .is_empty());
    }
    #[test]
    fn flat_mirror_is_insensitive() {
        let mut bench = lens_bench(&[100.0]);
        bench
            .add_element(OpticalElement::new("M1", millimeter!(500.0), FlatMirror.into()).unwrap())
            .unwrap();
        let result = sensitivity(&bench, Orientation::Horizontal).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "L0");
        assert_eq!(result[1].name, "M1");
        assert!(result[0].sensitivity > 1.0);
        assert!(result[1].sensitivity.abs() < 1e-3);
    }
    #[test]
    fn stronger_lens_is_more_sensitive() {
        let weak = sensitivity(&lens_bench(&[500.0]), Orientation::Horizontal).unwrap();
        let strong = sensitivity(&lens_bench(&[50.0]), Orientation::Horizontal).unwrap();
        assert!(strong[0].sensitivity > weak[0].sensitivity);
        assert!(weak[0].sensitivity > 0.0);
    }
    #[test]
    fn element_on_input_plane() {
        let mut bench = OpticsBench::with_default_beam().unwrap();
        bench
            .add_element(
                OpticalElement::new(
                    "L0",
                    millimeter!(0.0),
                    ThinLens::new(millimeter!(100.0)).unwrap().into(),
                )
                .unwrap(),
            )
            .unwrap();
        let result = sensitivity(&bench, Orientation::Horizontal).unwrap();
        assert!(result[0].sensitivity.is_finite());
        assert!(result[0].sensitivity > 0.0);
    }
}
