//! Kubernetes resource quantity parsing.
//!
//! The legacy metric annotations carry values as quantity strings
//! (`"500m"`, `"1.5k"`, `"2Gi"`, `"1e3"`). Only the milli-unit view is
//! needed, so the parser goes straight to an `i64` count of milli-units.
//!
//! # Rounding
//! Results that are not a whole number of milli-units are rounded away from
//! zero, and values outside the `i64` range saturate at the bounds.

use thiserror::Error;

/// Errors produced while parsing a quantity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),

    #[error("unknown suffix {suffix:?} in quantity {input:?}")]
    UnknownSuffix { input: String, suffix: String },
}

/// Parse a quantity string and return its value in milli-units.
pub fn milli_value(input: &str) -> Result<i64, QuantityError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }

    let (negative, unsigned) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let number_end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_end);

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
        return Err(QuantityError::InvalidNumber(input.to_string()));
    }

    let (binary_power, decimal_exponent) =
        parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
            input: input.to_string(),
            suffix: suffix.to_string(),
        })?;

    // Milli-units: shift by three extra decimal places.
    let scale = decimal_exponent
        .saturating_sub(frac_part.len() as i64)
        .saturating_add(3);
    let magnitude = scaled_magnitude(int_part, frac_part, binary_power, scale);

    let value = i64::try_from(magnitude).unwrap_or(i64::MAX);
    Ok(if negative { -value } else { value })
}

/// Returns `(binary power of 1024, decimal exponent)` for a suffix.
fn parse_suffix(suffix: &str) -> Option<(u32, i64)> {
    let parsed = match suffix {
        "" => (0, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        "Ki" => (1, 0),
        "Mi" => (2, 0),
        "Gi" => (3, 0),
        "Ti" => (4, 0),
        "Pi" => (5, 0),
        "Ei" => (6, 0),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (0, exponent.parse::<i64>().ok()?)
        }
    };
    Some(parsed)
}

/// Compute `digits * 1024^binary_power * 10^scale`, rounding up and
/// saturating at `u128::MAX`.
///
/// Works on the decimal digit string, so arbitrarily long mantissas (padded
/// fractions, many significant digits below milli precision) never overflow.
fn scaled_magnitude(int_part: &str, frac_part: &str, binary_power: u32, scale: i64) -> u128 {
    let significant = int_part
        .bytes()
        .chain(frac_part.bytes())
        .map(|b| b - b'0')
        .skip_while(|d| *d == 0)
        .collect::<Vec<u8>>();
    let Some(last_nonzero) = significant.iter().rposition(|d| *d != 0) else {
        return 0;
    };

    // Trailing zeros only move the decimal point.
    let trailing = (significant.len() - 1 - last_nonzero) as i64;
    let scale = scale.saturating_add(trailing);
    let digits = multiply_digits(&significant[..=last_nonzero], 1u128 << (10 * binary_power));

    if scale >= 0 {
        let factor = u32::try_from(scale)
            .ok()
            .and_then(|s| 10u128.checked_pow(s));
        return factor
            .zip(digits_to_u128(&digits))
            .and_then(|(f, v)| v.checked_mul(f))
            .unwrap_or(u128::MAX);
    }

    let dropped = usize::try_from(scale.unsigned_abs()).unwrap_or(usize::MAX);
    if dropped >= digits.len() {
        // Non-zero but below one milli-unit.
        return 1;
    }
    let (kept, rest) = digits.split_at(digits.len() - dropped);
    let whole = digits_to_u128(kept).unwrap_or(u128::MAX);
    if rest.iter().any(|d| *d != 0) {
        whole.saturating_add(1)
    } else {
        whole
    }
}

/// Multiply a big-endian decimal digit string by `factor`.
fn multiply_digits(digits: &[u8], factor: u128) -> Vec<u8> {
    if factor == 1 {
        return digits.to_vec();
    }
    let mut product = Vec::with_capacity(digits.len() + 20);
    let mut carry: u128 = 0;
    for digit in digits.iter().rev() {
        carry += u128::from(*digit) * factor;
        product.push((carry % 10) as u8);
        carry /= 10;
    }
    while carry > 0 {
        product.push((carry % 10) as u8);
        carry /= 10;
    }
    product.reverse();
    product
}

fn digits_to_u128(digits: &[u8]) -> Option<u128> {
    digits.iter().try_fold(0u128, |acc, d| {
        acc.checked_mul(10)?.checked_add(u128::from(*d))
    })
}
