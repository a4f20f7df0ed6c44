#![warn(missing_docs)]
//! This module contains the optical elements which can be placed on an optics bench (lenses, mirrors, etc...)
//!
//! Every element type implements the [`Element`] trait which provides its ray transfer matrix per transverse plane.
//! An [`OpticalElement`] wraps one of these types (as [`ElementKind`]) together with the data common to all
//! elements: identifier, name, position on the axis, aspect and lock flags.
mod generic_abcd;
mod input_beam;
mod interface;
mod lens;
mod mirror;
mod slab;

pub use generic_abcd::GenericAbcd;
pub use input_beam::InputBeam;
pub use interface::{CurvedInterface, FlatInterface};
pub use lens::{ThermalLens, ThinLens};
pub use mirror::{CurvedMirror, FlatMirror};
pub use slab::{DielectricSlab, ThickLens};

use crate::{
    abcd::AbcdMatrix,
    error::{BeamError, BeamResult},
    orientation::{Aspect, Orientation},
};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uom::si::f64::Length;
use uuid::Uuid;

/// Common behaviour of all optical element types.
pub trait Element {
    /// Short human readable type name (e.g. "thin lens")
    fn node_type(&self) -> &'static str;
    /// Ray transfer matrix of the element in the given plane.
    ///
    /// Matrices use the reduced convention: the determinant equals the inverse of [`Element::index_ratio`].
    fn matrix(&self, orientation: Orientation) -> AbcdMatrix;
    /// Matrix in a plane in which a cylindrical element does not act.
    fn inactive_matrix(&self) -> AbcdMatrix {
        AbcdMatrix::identity()
    }
    /// Matrix and index ratio from the entrance of a thick element up to `depth` inside the element.
    ///
    /// Returns `None` if the inside of the element cannot be described (thin elements or generic blocks).
    fn interior_matrix(&self, _orientation: Orientation, _depth: Length) -> Option<(AbcdMatrix, f64)> {
        None
    }
    /// Check the physical consistency of the element parameters.
    ///
    /// # Errors
    ///
    /// This function returns a [`BeamError::ElementConfiguration`] describing the first invalid parameter.
    fn validate(&self) -> BeamResult<()>;
    /// Extension of the element along the optical axis.
    fn width(&self) -> Length {
        Length::zero()
    }
    /// Ratio `n2 / n1` of the refractive index after and before the element.
    fn index_ratio(&self) -> f64 {
        1.0
    }
    /// Returns `true` if the element can be restricted to one transverse plane (cylindrical optics).
    fn supports_aspect(&self) -> bool {
        false
    }
    /// Focal length, if the element has one.
    fn focal_length(&self) -> Option<Length> {
        None
    }
    /// Returns `true` if [`Element::set_focal_length`] can change the focal length of the element.
    fn has_adjustable_focal_length(&self) -> bool {
        false
    }
    /// Set the focal length of the element.
    ///
    /// # Errors
    ///
    /// This function returns an error if the element has no adjustable focal length or if the value is invalid.
    fn set_focal_length(&mut self, _focal_length: Length) -> BeamResult<()> {
        Err(BeamError::ElementConfiguration(format!(
            "a {} has no adjustable focal length",
            self.node_type()
        )))
    }
}

/// The concrete type of an optical element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    /// the input beam of the bench
    InputBeam(InputBeam),
    /// a thin lens
    ThinLens(ThinLens),
    /// a thermal lens
    ThermalLens(ThermalLens),
    /// a flat mirror
    FlatMirror(FlatMirror),
    /// a spherical mirror
    CurvedMirror(CurvedMirror),
    /// a flat refracting surface
    FlatInterface(FlatInterface),
    /// a spherical refracting surface
    CurvedInterface(CurvedInterface),
    /// a plane-parallel plate
    DielectricSlab(DielectricSlab),
    /// a lens of finite thickness
    ThickLens(ThickLens),
    /// a user defined ABCD block
    GenericAbcd(GenericAbcd),
}
impl ElementKind {
    /// Access the element behind this kind.
    #[must_use]
    pub fn element(&self) -> &dyn Element {
        match self {
            Self::InputBeam(e) => e,
            Self::ThinLens(e) => e,
            Self::ThermalLens(e) => e,
            Self::FlatMirror(e) => e,
            Self::CurvedMirror(e) => e,
            Self::FlatInterface(e) => e,
            Self::CurvedInterface(e) => e,
            Self::DielectricSlab(e) => e,
            Self::ThickLens(e) => e,
            Self::GenericAbcd(e) => e,
        }
    }
    /// Mutably access the element behind this kind.
    pub fn element_mut(&mut self) -> &mut dyn Element {
        match self {
            Self::InputBeam(e) => e,
            Self::ThinLens(e) => e,
            Self::ThermalLens(e) => e,
            Self::FlatMirror(e) => e,
            Self::CurvedMirror(e) => e,
            Self::FlatInterface(e) => e,
            Self::CurvedInterface(e) => e,
            Self::DielectricSlab(e) => e,
            Self::ThickLens(e) => e,
            Self::GenericAbcd(e) => e,
        }
    }
}
macro_rules! impl_from_element {
    ($($variant:ident),+) => {
        $(impl From<$variant> for ElementKind {
            fn from(element: $variant) -> Self {
                Self::$variant(element)
            }
        })+
    };
}
impl_from_element!(
    InputBeam,
    ThinLens,
    ThermalLens,
    FlatMirror,
    CurvedMirror,
    FlatInterface,
    CurvedInterface,
    DielectricSlab,
    ThickLens,
    GenericAbcd
);

/// Stable identifier of an element on a bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);
impl ElementId {
    /// Create a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}
impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}
impl Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the position of an element is tied to the bench.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionLock {
    /// the element can be moved freely
    #[default]
    Free,
    /// the element cannot be moved (neither directly nor by moving a relatively locked element)
    Absolute,
    /// the element keeps its distance to the given parent element
    Relative(ElementId),
}

/// Parameters of an element which can be locked against modification by fits and searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// position on the optical axis
    Position,
    /// focal length (lenses and curved mirrors)
    FocalLength,
    /// waist radius of the input beam in the given plane
    Waist(Orientation),
    /// waist position of the input beam in the given plane
    WaistPosition(Orientation),
}

/// An element placed on an optics bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalElement {
    id: ElementId,
    name: String,
    position: Length,
    kind: ElementKind,
    #[serde(default)]
    aspect: Aspect,
    #[serde(default)]
    position_lock: PositionLock,
    #[serde(default)]
    locked: Vec<Parameter>,
}
impl OpticalElement {
    /// Creates a new [`OpticalElement`] with a new unique identifier.
    ///
    /// # Errors
    ///
    /// This function will return an error if the position is not finite or the element parameters are invalid.
    pub fn new(name: &str, position: Length, kind: ElementKind) -> BeamResult<Self> {
        let element = Self {
            id: ElementId::new(),
            name: name.to_owned(),
            position,
            kind,
            aspect: Aspect::default(),
            position_lock: PositionLock::default(),
            locked: Vec::new(),
        };
        element.validate()?;
        Ok(element)
    }
    /// Restricts the element to one plane. This function can be used with the "builder pattern".
    ///
    /// # Errors
    ///
    /// This function will return an error if the element type does not support a non-spherical aspect.
    pub fn with_aspect(mut self, aspect: Aspect) -> BeamResult<Self> {
        self.set_aspect(aspect)?;
        Ok(self)
    }
    /// Sets the aspect of the element.
    ///
    /// # Errors
    ///
    /// This function will return an error if the element type does not support a non-spherical aspect.
    pub fn set_aspect(&mut self, aspect: Aspect) -> BeamResult<()> {
        if aspect != Aspect::Spherical && !self.kind.element().supports_aspect() {
            return Err(BeamError::ElementConfiguration(format!(
                "a {} cannot have a {aspect} aspect",
                self.kind.element().node_type()
            )));
        }
        self.aspect = aspect;
        Ok(())
    }
    /// Check position and element parameters.
    ///
    /// # Errors
    ///
    /// This function will return an error if the position is not finite or the element parameters are invalid.
    pub fn validate(&self) -> BeamResult<()> {
        if !self.position.is_finite() {
            return Err(BeamError::ElementConfiguration(
                "position must be finite".into(),
            ));
        }
        self.kind.element().validate()
    }
    /// Unique identifier.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }
    /// Name of the element.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Sets the name of the element.
    pub fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }
    /// Position of the element on the optical axis.
    #[must_use]
    pub const fn position(&self) -> Length {
        self.position
    }
    pub(crate) fn set_position(&mut self, position: Length) {
        self.position = position;
    }
    /// Position of the end of the element (`position + width`).
    #[must_use]
    pub fn end_position(&self) -> Length {
        self.position + self.width()
    }
    /// The concrete element type.
    #[must_use]
    pub const fn kind(&self) -> &ElementKind {
        &self.kind
    }
    /// Mutable access to the concrete element type.
    pub fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }
    /// The input beam data if this element is the input beam.
    #[must_use]
    pub fn input_beam(&self) -> Option<&InputBeam> {
        if let ElementKind::InputBeam(beam) = &self.kind {
            Some(beam)
        } else {
            None
        }
    }
    /// Mutable input beam data if this element is the input beam.
    pub fn input_beam_mut(&mut self) -> Option<&mut InputBeam> {
        if let ElementKind::InputBeam(beam) = &mut self.kind {
            Some(beam)
        } else {
            None
        }
    }
    /// Returns `true` if this element is the input beam.
    #[must_use]
    pub const fn is_input_beam(&self) -> bool {
        matches!(self.kind, ElementKind::InputBeam(_))
    }
    /// Aspect of the element.
    ///
    /// An element configured as spherical but behaving differently in both planes (an astigmatic input beam or a
    /// tilted curved mirror) is reported as [`Aspect::Ellipsoidal`].
    #[must_use]
    pub fn aspect(&self) -> Aspect {
        if self.aspect != Aspect::Spherical {
            return self.aspect;
        }
        let astigmatic = match &self.kind {
            ElementKind::InputBeam(beam) => !beam.is_spherical(),
            ElementKind::CurvedMirror(mirror) => {
                !mirror.angle().is_zero() && mirror.curvature().is_finite()
            }
            _ => false,
        };
        if astigmatic {
            Aspect::Ellipsoidal
        } else {
            Aspect::Spherical
        }
    }
    /// Ray transfer matrix in the given plane, taking the aspect into account.
    #[must_use]
    pub fn matrix(&self, orientation: Orientation) -> AbcdMatrix {
        if self.aspect.acts_on(orientation) {
            self.kind.element().matrix(orientation)
        } else {
            self.kind.element().inactive_matrix()
        }
    }
    /// Matrix and index ratio from the entrance of the element to `depth` inside the element.
    #[must_use]
    pub fn interior_matrix(
        &self,
        orientation: Orientation,
        depth: Length,
    ) -> Option<(AbcdMatrix, f64)> {
        self.kind.element().interior_matrix(orientation, depth)
    }
    /// Extension along the optical axis.
    #[must_use]
    pub fn width(&self) -> Length {
        self.kind.element().width()
    }
    /// Refractive index ratio `n2 / n1`.
    #[must_use]
    pub fn index_ratio(&self) -> f64 {
        self.kind.element().index_ratio()
    }
    /// Focal length, if the element has one.
    #[must_use]
    pub fn focal_length(&self) -> Option<Length> {
        self.kind.element().focal_length()
    }
    /// Returns `true` if the focal length can be set (thin and thermal lenses, curved mirrors).
    #[must_use]
    pub fn has_adjustable_focal_length(&self) -> bool {
        self.kind.element().has_adjustable_focal_length()
    }
    /// Set the focal length.
    ///
    /// # Errors
    ///
    /// This function will return an error if the element has no adjustable focal length or if the value is invalid.
    pub fn set_focal_length(&mut self, focal_length: Length) -> BeamResult<()> {
        self.kind.element_mut().set_focal_length(focal_length)
    }
    /// How the position of this element is locked.
    #[must_use]
    pub const fn position_lock(&self) -> PositionLock {
        self.position_lock
    }
    pub(crate) fn set_position_lock(&mut self, lock: PositionLock) {
        self.position_lock = lock;
    }
    /// Lock a parameter against modification by fits and searches.
    pub fn lock(&mut self, parameter: Parameter) {
        if !self.locked.contains(&parameter) {
            self.locked.push(parameter);
        }
    }
    /// Unlock a parameter.
    pub fn unlock(&mut self, parameter: Parameter) {
        self.locked.retain(|p| *p != parameter);
    }
    /// Returns `true` if the given parameter is locked.
    ///
    /// The position also counts as locked if the element is locked absolutely or relative to another element.
    #[must_use]
    pub fn is_locked(&self, parameter: Parameter) -> bool {
        if parameter == Parameter::Position && self.position_lock != PositionLock::Free {
            return true;
        }
        self.locked.contains(&parameter)
    }
}
