#![warn(missing_docs)]
//! Transverse planes and aspects
//!
//! A Gaussian beam on the bench is tracked independently in the horizontal and the vertical plane. Optical
//! elements (and fits) carry an [`Aspect`] which tells in which of these planes they act.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// One of the two transverse planes in which a beam is propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
pub enum Orientation {
    /// horizontal plane (also the tangential plane of tilted mirrors)
    Horizontal,
    /// vertical plane (also the sagittal plane of tilted mirrors)
    Vertical,
}
impl Orientation {
    /// Return the other transverse plane.
    #[must_use]
    pub const fn quadrature(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Planes in which an element or a measurement acts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display,
)]
pub enum Aspect {
    /// identical behaviour in both planes
    #[default]
    Spherical,
    /// acts in the horizontal plane only (e.g. a cylindrical lens)
    Horizontal,
    /// acts in the vertical plane only
    Vertical,
    /// different but non-trivial behaviour in both planes
    Ellipsoidal,
}
impl Aspect {
    /// Returns `true` if something of this aspect acts in the given plane.
    #[must_use]
    pub const fn acts_on(self, orientation: Orientation) -> bool {
        match self {
            Self::Spherical | Self::Ellipsoidal => true,
            Self::Horizontal => matches!(orientation, Orientation::Horizontal),
            Self::Vertical => matches!(orientation, Orientation::Vertical),
        }
    }
}
impl From<Orientation> for Aspect {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self::Horizontal,
            Orientation::Vertical => Self::Vertical,
        }
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;
    #[test]
    fn quadrature() {
        assert_eq!(Orientation::Horizontal.quadrature(), Orientation::Vertical);
        assert_eq!(Orientation::Vertical.quadrature(), Orientation::Horizontal);
    }
    #[test]
    fn acts_on() {
        for o in Orientation::iter() {
            assert!(Aspect::Spherical.acts_on(o));
            assert!(Aspect::Ellipsoidal.acts_on(o));
        }
        assert!(Aspect::Horizontal.acts_on(Orientation::Horizontal));
        assert!(!Aspect::Horizontal.acts_on(Orientation::Vertical));
        assert!(!Aspect::Vertical.acts_on(Orientation::Horizontal));
    }
    #[test]
    fn display() {
        assert_eq!(format!("{}", Orientation::Horizontal), "Horizontal");
        assert_eq!(format!("{}", Aspect::Ellipsoidal), "Ellipsoidal");
    }
    #[test]
    fn default() {
        assert_eq!(Aspect::default(), Aspect::Spherical);
        assert_eq!(Aspect::from(Orientation::Vertical), Aspect::Vertical);
    }
}
