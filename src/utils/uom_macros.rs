#![warn(missing_docs)]
//! Shorthand macros for creating lengths and angles.
//!
//! A single argument yields a scalar quantity, several arguments yield a `Vec` of quantities:
//! ```
//! use gaussian_beam::millimeter;
//! let z = millimeter!(200.0);
//! let positions = millimeter!(0.0, 100.0, 200.0);
//! assert_eq!(positions.len(), 3);
//! assert_eq!(positions[2], z);
//! ```
/// helper macro used by the unit macros below
#[macro_export]
macro_rules! uom_quantity {
    ($unit:ident, $quantity:ident, $val:expr) => {
        $quantity::new::<$unit>($val)
    };
    ($unit:ident, $quantity:ident, $( $x:expr ),+) => {
        vec![$( $quantity::new::<$unit>($x) ),+]
    };
}
///macro to create a Length in meter
#[macro_export]
macro_rules! meter {
    ($( $x:expr ),+) => {{
        use uom::si::{f64::Length, length::meter};
        $crate::uom_quantity![meter, Length, $( $x ),+]
    }};
}
///macro to create a Length in millimeter
#[macro_export]
macro_rules! millimeter {
    ($( $x:expr ),+) => {{
        use uom::si::{f64::Length, length::millimeter};
        $crate::uom_quantity![millimeter, Length, $( $x ),+]
    }};
}
///macro to create a Length in micrometer
#[macro_export]
macro_rules! micrometer {
    ($( $x:expr ),+) => {{
        use uom::si::{f64::Length, length::micrometer};
        $crate::uom_quantity![micrometer, Length, $( $x ),+]
    }};
}
///macro to create a Length in nanometer
#[macro_export]
macro_rules! nanometer {
    ($( $x:expr ),+) => {{
        use uom::si::{f64::Length, length::nanometer};
        $crate::uom_quantity![nanometer, Length, $( $x ),+]
    }};
}
///macro to create an Angle in radian
#[macro_export]
macro_rules! radian {
    ($( $x:expr ),+) => {{
        use uom::si::{angle::radian, f64::Angle};
        $crate::uom_quantity![radian, Angle, $( $x ),+]
    }};
}
///macro to create an Angle in degree
#[macro_export]
macro_rules! degree {
    ($( $x:expr ),+) => {{
        use uom::si::{angle::degree, f64::Angle};
        $crate::uom_quantity![degree, Angle, $( $x ),+]
    }};
}
