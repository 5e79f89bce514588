//! Exact rational arithmetic for clock rates and divider ratios.
//!
//! Every quantity a clock tree is planned in (rates in Hz, divider and
//! multiplier values, ratios between clocks) is a [`Rational`]. Rates such as
//! `122.88 MHz * 24 / 5` stay exact end to end, so a solved configuration can
//! be re-derived from its dividers without floating-point drift.

use num_traits::{ToPrimitive, Zero};

/// An exact rational number with 128-bit numerator and denominator.
pub type Rational = num_rational::Ratio<i128>;

/// Creates an integral rational, typically a rate in Hz.
pub fn hz(value: i128) -> Rational {
    Rational::from_integer(value)
}

/// Creates the rational `numer / denom`.
///
/// # Panics
///
/// Panics if `denom` is zero. Intended for compile-time constants.
pub fn ratio(numer: i128, denom: i128) -> Rational {
    Rational::new(numer, denom)
}

/// Converts a float to an exact rational.
///
/// Integral values convert exactly; fractional values use the closest
/// continued-fraction approximation representable in 128 bits. Returns `None`
/// for NaN, infinities and values outside the representable range.
pub fn rational_from_f64(value: f64) -> Option<Rational> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e36 {
        return Some(Rational::from_integer(value as i128));
    }
    Rational::approximate_float(value)
}

/// Converts a rational to the nearest `f64`.
pub fn rational_to_f64(value: &Rational) -> f64 {
    if value.denom().is_zero() {
        return f64::NAN;
    }
    if value.is_integer() {
        return value.numer().to_f64().unwrap_or(f64::NAN);
    }
    let numer = value.numer().to_f64().unwrap_or(f64::NAN);
    let denom = value.denom().to_f64().unwrap_or(f64::NAN);
    numer / denom
}

/// Renders a rational as a JSON number.
///
/// Integers that fit in an `i64` become JSON integers so divider values stay
/// integral in emitted configurations; everything else becomes a float.
pub fn rational_to_json(value: &Rational) -> serde_json::Value {
    if value.is_integer() {
        if let Some(int) = value.numer().to_i64() {
            return serde_json::Value::from(int);
        }
    }
    serde_json::Number::from_f64(rational_to_f64(value))
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hz_is_integral() {
        let r = hz(122_880_000);
        assert!(r.is_integer());
        assert_eq!(*r.numer(), 122_880_000);
    }

    #[test]
    fn ratio_reduces() {
        let r = ratio(2_900_000_000, 144);
        assert_eq!(*r.denom(), 36);
    }

    #[test]
    fn from_f64_integral_is_exact() {
        assert_eq!(rational_from_f64(122.88e6), Some(hz(122_880_000)));
        assert_eq!(rational_from_f64(312.5e6 / 16.0), Some(hz(19_531_250)));
    }

    #[test]
    fn from_f64_fraction() {
        assert_eq!(rational_from_f64(0.5), Some(ratio(1, 2)));
    }

    #[test]
    fn from_f64_rejects_non_finite() {
        assert_eq!(rational_from_f64(f64::NAN), None);
        assert_eq!(rational_from_f64(f64::INFINITY), None);
    }

    #[test]
    fn to_f64_roundtrip() {
        assert_eq!(rational_to_f64(&hz(3_840_000)), 3.84e6);
        assert_eq!(rational_to_f64(&ratio(1, 4)), 0.25);
    }

    #[test]
    fn json_integers_stay_integral() {
        assert_eq!(rational_to_json(&hz(8)), serde_json::json!(8));
        assert!(rational_to_json(&hz(8)).is_i64());
    }

    #[test]
    fn json_fraction_is_float() {
        assert_eq!(rational_to_json(&ratio(1, 2)), serde_json::json!(0.5));
    }
}
