//! Decimal real numbers
//!
//! PDF has no exponent syntax and no infinities, so reals are kept as a
//! canonical positional decimal string. Equality compares that string.

use crate::error::{PdfError, Result};
use std::fmt;

/// Significant digits kept when a binary float becomes a [`Real`].
pub const DEFAULT_REAL_PRECISION: usize = 15;

/// Largest precision that still distinguishes every `f64`.
pub const MAX_REAL_PRECISION: usize = 17;

/// Largest decimal exponent accepted by [`Real::from_decimal`].
const MAX_DECIMAL_EXPONENT: i64 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Real {
    repr: String,
}

impl Real {
    /// Round `value` to `precision` significant digits.
    pub fn from_f64(value: f64, precision: usize) -> Result<Self> {
        if !value.is_finite() {
            return Err(PdfError::InvalidReal(format!(
                "{value} has no PDF representation"
            )));
        }
        check_precision(precision)?;

        let scientific = format!("{:.*e}", precision - 1, value);
        let (mantissa, exponent) = scientific
            .split_once('e')
            .ok_or_else(|| PdfError::InvalidReal(scientific.clone()))?;
        let exponent: i64 = exponent
            .parse()
            .map_err(|_| PdfError::InvalidReal(scientific.clone()))?;
        let negative = mantissa.starts_with('-');
        let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();

        Self::parse(&positional(negative, &digits, exponent + 1))
    }

    /// Parse decimal text, with or without an exponent (`1E+5`, `-2.5e-3`),
    /// and round it half up to `precision` significant digits.
    pub fn from_decimal(text: &str, precision: usize) -> Result<Self> {
        check_precision(precision)?;
        let invalid = || PdfError::InvalidReal(format!("{text:?} is not a decimal number"));

        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => {
                let exponent: i64 = exponent.parse().map_err(|_| invalid())?;
                (mantissa, exponent)
            }
            None => (unsigned, 0),
        };
        if exponent.abs() > MAX_DECIMAL_EXPONENT {
            return Err(PdfError::InvalidReal(format!(
                "{text:?} is outside the representable range"
            )));
        }
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if (int_part.is_empty() && frac_part.is_empty())
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        // digits[..point] is the integer part
        let mut point = int_part.len() as i64 + exponent;
        let all_digits = format!("{int_part}{frac_part}");
        let significant = all_digits.trim_start_matches('0');
        point -= (all_digits.len() - significant.len()) as i64;
        if significant.is_empty() {
            return Self::parse("0");
        }

        let mut digits = significant.as_bytes().to_vec();
        if digits.len() > precision {
            let round_up = digits[precision] >= b'5';
            digits.truncate(precision);
            if round_up && !increment(&mut digits) {
                digits.insert(0, b'1');
                digits.pop();
                point += 1;
            }
        }
        let digits = String::from_utf8(digits).map_err(|_| invalid())?;

        Self::parse(&positional(negative, &digits, point))
    }

    /// Parse a decimal string such as `-12.50`, `.5` or `3`.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || PdfError::InvalidReal(format!("{text:?} is not a decimal number"));

        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let int_part = int_part.trim_start_matches('0');
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let frac_part = frac_part.trim_end_matches('0');
        let frac_part = if frac_part.is_empty() { "0" } else { frac_part };
        let is_zero = int_part == "0" && frac_part == "0";

        let mut repr = String::with_capacity(int_part.len() + frac_part.len() + 2);
        if negative && !is_zero {
            repr.push('-');
        }
        repr.push_str(int_part);
        repr.push('.');
        repr.push_str(frac_part);
        Ok(Self { repr })
    }

    /// Canonical decimal form, always with a fractional part.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    pub fn to_f64(&self) -> f64 {
        // canonical form is always a valid float literal
        self.repr.parse().unwrap_or(0.0)
    }

    /// Number of digits after the decimal point.
    pub fn decimal_places(&self) -> usize {
        match self.repr.split_once('.') {
            Some((_, "0")) | None => 0,
            Some((_, frac)) => frac.len(),
        }
    }

    /// The value as an integer, when it has no fractional part and fits.
    pub fn to_integer(&self) -> Option<i64> {
        let (int_part, frac) = self.repr.split_once('.')?;
        if frac != "0" {
            return None;
        }
        int_part.parse().ok()
    }
}

fn check_precision(precision: usize) -> Result<()> {
    if precision == 0 || precision > MAX_REAL_PRECISION {
        return Err(PdfError::InvalidReal(format!(
            "precision {precision} outside 1..={MAX_REAL_PRECISION}"
        )));
    }
    Ok(())
}

/// Lay out `digits` with the decimal point after `point` of them.
fn positional(negative: bool, digits: &str, point: i64) -> String {
    let mut out = String::with_capacity(digits.len() + point.unsigned_abs() as usize + 4);
    if negative {
        out.push('-');
    }
    if point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', point.unsigned_abs() as usize));
        out.push_str(digits);
    } else if point as usize >= digits.len() {
        out.push_str(digits);
        out.extend(std::iter::repeat_n('0', point as usize - digits.len()));
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Add one to a run of ASCII digits. Returns false when the carry runs off
/// the front, leaving every digit `0`.
fn increment(digits: &mut [u8]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl TryFrom<f64> for Real {
    type Error = PdfError;

    fn try_from(value: f64) -> Result<Self> {
        Real::from_f64(value, DEFAULT_REAL_PRECISION)
    }
}

impl From<i64> for Real {
    fn from(value: i64) -> Self {
        Self {
            repr: format!("{value}.0"),
        }
    }
}
