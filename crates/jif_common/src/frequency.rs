//! Frequency values with unit parsing and display.

use crate::rational::{rational_from_f64, rational_to_f64, Rational};
use num_traits::CheckedMul;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A frequency value stored exactly in Hertz.
///
/// Supports parsing from strings like "122.88MHz", "100KHz", "1.5GHz",
/// "48000Hz", and bare numeric values (interpreted as Hz). Decimal digits are
/// converted exactly, so "122.88MHz" is precisely 122 880 000 Hz. Displays
/// using the most appropriate unit for readability.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency(Rational);

impl Frequency {
    /// Creates a frequency from an exact value in Hertz.
    pub fn new(hz: Rational) -> Self {
        Self(hz)
    }

    /// Creates a frequency from a float in Hertz.
    ///
    /// Returns `None` for NaN, infinities and negative values.
    pub fn from_hz(hz: f64) -> Option<Self> {
        if hz < 0.0 {
            return None;
        }
        rational_from_f64(hz).map(Self)
    }

    /// Returns the exact frequency in Hertz.
    pub fn rational(&self) -> Rational {
        self.0
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        rational_to_f64(&self.0)
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.hz() / 1_000_000.0
    }

    /// Returns the frequency in gigahertz.
    pub fn ghz(&self) -> f64 {
        self.hz() / 1_000_000_000.0
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.hz();
        if hz >= 1_000_000_000.0 {
            write!(f, "{}GHz", hz / 1_000_000_000.0)
        } else if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}KHz", hz / 1_000.0)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

/// Error type for parsing frequency strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseFrequencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid frequency: '{}'", self.input)
    }
}

impl std::error::Error for ParseFrequencyError {}

/// Parses an unsigned decimal literal (`"122.88"`, `"1e9"`, `"2.5E-3"`) exactly.
fn parse_decimal(text: &str) -> Option<Rational> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(pos) => (&text[..pos], text[pos + 1..].parse::<i32>().ok()?),
        None => (text, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: i128 = format!("{int_part}{frac_part}").parse().ok()?;
    let scale = exponent.checked_sub(i32::try_from(frac_part.len()).ok()?)?;
    Rational::from_integer(digits).checked_mul(&pow10(scale)?)
}

/// Returns `10^exp` as a rational, or `None` if it would overflow.
fn pow10(exp: i32) -> Option<Rational> {
    let magnitude = 10i128.checked_pow(exp.unsigned_abs())?;
    Some(if exp >= 0 {
        Rational::from_integer(magnitude)
    } else {
        Rational::new(1, magnitude)
    })
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (num, scale) = if let Some(num) = lower.strip_suffix("ghz") {
            (num, 1_000_000_000)
        } else if let Some(num) = lower.strip_suffix("mhz") {
            (num, 1_000_000)
        } else if let Some(num) = lower.strip_suffix("khz") {
            (num, 1_000)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1)
        } else {
            // Bare number, interpreted as Hz
            (lower.as_str(), 1)
        };

        let value = parse_decimal(num.trim()).ok_or_else(err)?;
        value
            .checked_mul(&Rational::from_integer(scale))
            .map(Frequency)
            .ok_or_else(err)
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    /// Accepts either a unit string (`"122.88MHz"`) or a bare number of Hz.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FrequencyVisitor;

        impl Visitor<'_> for FrequencyVisitor {
            type Value = Frequency;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a frequency string such as \"122.88MHz\" or a number of Hz")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                if v < 0 {
                    return Err(E::custom(format!("negative frequency: {v}")));
                }
                Ok(Frequency(Rational::from_integer(i128::from(v))))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Frequency(Rational::from_integer(i128::from(v))))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Frequency::from_hz(v).ok_or_else(|| E::custom(format!("invalid frequency: {v}")))
            }
        }

        deserializer.deserialize_any(FrequencyVisitor)
    }
}
