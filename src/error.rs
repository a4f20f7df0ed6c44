#![warn(missing_docs)]
//! Error structures of the beam propagation engine
use std::{error::Error, fmt::Display};

/// Application specific Result type
pub type BeamResult<T> = std::result::Result<T, BeamError>;

/// Errors that can be returned by the propagation, fit and optimization functions.
///
/// Note that an unstable cavity is not an error. Stability is reported as a flag on
/// [`CavityRoundTrip`](crate::cavity::CavityRoundTrip).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeamError {
    /// an optical element (or bench wide parameter) was given an invalid physical value, e.g. a zero
    /// focal length, a non-positive thickness or index, or a generic ABCD matrix with a wrong determinant.
    ElementConfiguration(String),
    /// a beam with a non-positive Rayleigh range was encountered during propagation
    DegenerateBeam(String),
    /// structural errors while editing the bench (unknown element, removing the input beam, lock cycles, ...)
    Bench(String),
    /// not enough measurements for the requested free parameters
    FitUnderdetermined(String),
    /// the non-linear fit did not converge within its iteration budget
    FitDidNotConverge(String),
    /// a magic waist or local optimum search did not find an acceptable solution
    SearchNotFound(String),
    /// a fit or search was cancelled by the caller
    SearchCancelled,
    /// errors of the command line front end
    Console(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for BeamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElementConfiguration(m) => {
                write!(f, "ElementConfiguration:{m}")
            }
            Self::DegenerateBeam(m) => {
                write!(f, "DegenerateBeam:{m}")
            }
            Self::Bench(m) => {
                write!(f, "Bench:{m}")
            }
            Self::FitUnderdetermined(m) => {
                write!(f, "FitUnderdetermined:{m}")
            }
            Self::FitDidNotConverge(m) => {
                write!(f, "FitDidNotConverge:{m}")
            }
            Self::SearchNotFound(m) => {
                write!(f, "SearchNotFound:{m}")
            }
            Self::SearchCancelled => write!(f, "SearchCancelled"),
            Self::Console(m) => {
                write!(f, "Console:{m}")
            }
            Self::Other(m) => write!(f, "Beam Error:Other:{m}"),
        }
    }
}
impl Error for BeamError {}

impl std::convert::From<String> for BeamError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn from() {
        let error = BeamError::from("test".to_string());
        assert_eq!(error, BeamError::Other("test".to_string()));
    }
    #[test]
    fn display() {
        assert_eq!(
            format!("{}", BeamError::ElementConfiguration("test".to_string())),
            "ElementConfiguration:test"
        );
        assert_eq!(
            format!("{}", BeamError::DegenerateBeam("test".to_string())),
            "DegenerateBeam:test"
        );
        assert_eq!(
            format!("{}", BeamError::Bench("test".to_string())),
            "Bench:test"
        );
        assert_eq!(
            format!("{}", BeamError::FitUnderdetermined("test".to_string())),
            "FitUnderdetermined:test"
        );
        assert_eq!(
            format!("{}", BeamError::FitDidNotConverge("test".to_string())),
            "FitDidNotConverge:test"
        );
        assert_eq!(
            format!("{}", BeamError::SearchNotFound("test".to_string())),
            "SearchNotFound:test"
        );
        assert_eq!(format!("{}", BeamError::SearchCancelled), "SearchCancelled");
        assert_eq!(
            format!("{}", BeamError::Console("test".to_string())),
            "Console:test"
        );
        assert_eq!(
            format!("{}", BeamError::Other("test".to_string())),
            "Beam Error:Other:test"
        );
    }
    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", BeamError::Bench("test".to_string())),
            "Bench(\"test\")"
        );
    }
}
