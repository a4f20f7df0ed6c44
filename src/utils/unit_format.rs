//! Human readable formatting of lengths and angles with SI prefixes (used by the console output)
use num::Zero;
use uom::si::{
    angle::degree,
    f64::{Angle, Length},
};

/// Return an SI unit prefix for a given exponent (in steps of 3).
#[must_use]
pub fn prefix_for_exponent(exponent: i32) -> &'static str {
    match exponent {
        -15 => "f",
        -12 => "p",
        -9 => "n",
        -6 => "\u{03BC}",
        -3 => "m",
        0 => "",
        3 => "k",
        _ => "?",
    }
}
/// Get the SI prefix exponent of a given value.
///
/// # Example
/// ```
/// use gaussian_beam::utils::unit_format::exponent_in_e3_steps;
///
/// assert_eq!(exponent_in_e3_steps(0.0), 0);
/// assert_eq!(exponent_in_e3_steps(0.1), -3);
/// assert_eq!(exponent_in_e3_steps(1010.0), 3);
/// ```
#[must_use]
pub fn exponent_in_e3_steps(base_unit_value: f64) -> i32 {
    if base_unit_value.is_zero() || !base_unit_value.is_finite() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let mut exponent = (f64::log10(base_unit_value.abs()).floor()) as i32;
    if exponent.is_negative() {
        exponent -= 2;
    }
    (exponent / 3 * 3).clamp(-15, 3)
}
/// Format a [`Length`] using a matching SI prefix, e.g. `"123.457 µm"`.
#[must_use]
pub fn format_length(length: Length) -> String {
    if length.value.is_infinite() {
        return if length.value.is_sign_positive() {
            "inf m".into()
        } else {
            "-inf m".into()
        };
    }
    let exponent = exponent_in_e3_steps(length.value);
    let scaled = length.value / 10.0_f64.powi(exponent);
    format!("{scaled:.3} {}m", prefix_for_exponent(exponent))
}
/// Format an [`Angle`] in degrees.
#[must_use]
pub fn format_angle(angle: Angle) -> String {
    format!("{:.3} deg", angle.get::<degree>())
}
