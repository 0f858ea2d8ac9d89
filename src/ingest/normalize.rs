// Field normalization
// Turns raw multipart values into typed product attributes

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use crate::store::NewProduct;

/// Fields that must be non-empty for a product to be stored
pub const REQUIRED_FIELDS: [&str; 4] = ["productName", "from", "quantity", "description"];

/// User-fixable problems with submitted product data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Price must not be negative")]
    NegativePrice,
    #[error("Price must not exceed 99999999.99")]
    PriceOutOfRange,
}

/// Largest price a `NUMERIC(10, 2)` column holds
const MAX_PRICE: &str = "99999999.99";

/// Decimal exponent of the largest storable price (`9.9e7`)
const MAX_PRICE_MAGNITUDE: i64 = 7;

/// Values below `10^-3` round to zero at two fractional digits
const MIN_ROUNDED_MAGNITUDE: i64 = -3;

/// Longest numeric prefix considered; a real price is far shorter
const MAX_PRICE_LEN: usize = 64;

/// Product attributes extracted from a submitted form
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub product_name: String,
    pub origin: String,
    pub specifications: String,
    pub quantity: String,
    pub price: BigDecimal,
    pub energy_savings: String,
    pub description: String,
    pub eco: bool,
}

impl ProductFields {
    /// Take the first value of each expected field, defaulting to `""`.
    ///
    /// Fails only when the price cannot be stored.
    pub fn from_fields(fields: &HashMap<String, Vec<String>>) -> Result<Self, ValidationError> {
        let first = |name: &str| {
            fields
                .get(name)
                .and_then(|values| values.first())
                .cloned()
                .unwrap_or_default()
        };

        Ok(Self {
            product_name: first("productName"),
            origin: first("from"),
            specifications: first("specifications"),
            quantity: first("quantity"),
            price: parse_price(&first("price"))?,
            energy_savings: first("energySavings"),
            description: first("description"),
            eco: first("eco") == "true",
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for name in REQUIRED_FIELDS {
            if self.field(name).trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        if self.price < BigDecimal::zero() {
            return Err(ValidationError::NegativePrice);
        }
        Ok(())
    }

    fn field(&self, name: &str) -> &str {
        match name {
            "productName" => &self.product_name,
            "from" => &self.origin,
            "quantity" => &self.quantity,
            "description" => &self.description,
            _ => "",
        }
    }

    /// Without an image URL the store falls back to the placeholder image
    pub fn into_new_product(self, image_url: Option<String>) -> NewProduct {
        NewProduct {
            product_name: self.product_name,
            image_url,
            origin: self.origin,
            specifications: Some(self.specifications).filter(|s| !s.is_empty()),
            quantity: self.quantity,
            price: self.price,
            energy_savings: self.energy_savings,
            description: self.description,
            eco: self.eco,
        }
    }
}

/// Parse a price the way a browser's `parseFloat` would: the longest leading
/// decimal number wins, trailing text is ignored, and anything unparseable
/// becomes 0. The result is rounded half-up to two fractional digits.
///
/// The order of magnitude is checked on the text before any decimal is built,
/// so `1e999999999` is rejected without expanding its digits.
pub fn parse_price(raw: &str) -> Result<BigDecimal, ValidationError> {
    let prefix = decimal_prefix(raw.trim_start());
    if prefix.is_empty() {
        return Ok(BigDecimal::zero());
    }
    if prefix.len() > MAX_PRICE_LEN {
        return Err(ValidationError::PriceOutOfRange);
    }

    let (negative, unsigned) = match prefix.as_bytes().first() {
        Some(b'-') => (true, &prefix[1..]),
        Some(b'+') => (false, &prefix[1..]),
        _ => (false, prefix),
    };
    match magnitude(unsigned) {
        None => return Ok(BigDecimal::zero()),
        Some(m) if m > MAX_PRICE_MAGNITUDE => return Err(ValidationError::PriceOutOfRange),
        Some(m) if m < MIN_ROUNDED_MAGNITUDE => return Ok(BigDecimal::zero()),
        Some(_) => {}
    }

    let number = match unsigned.strip_prefix('.') {
        Some(fraction) => format!("0.{fraction}"),
        None => unsigned.to_string(),
    };
    let value = BigDecimal::from_str(&number).unwrap_or_else(|_| BigDecimal::zero());
    let value = if negative { -value } else { value };
    let rounded = value.with_scale_round(2, RoundingMode::HalfUp);

    // 99999999.995 rounds up past the column limit
    let max = BigDecimal::from_str(MAX_PRICE).unwrap_or_else(|_| BigDecimal::zero());
    if rounded.abs() > max {
        return Err(ValidationError::PriceOutOfRange);
    }
    Ok(rounded)
}

/// Exponent of the most significant non-zero digit of an unsigned decimal
/// prefix, e.g. 2 for `123.4` and -2 for `0.05e0`. `None` when every digit is 0.
fn magnitude(unsigned: &str) -> Option<i64> {
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (&unsigned[..i], &unsigned[i + 1..]),
        None => (unsigned, ""),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let int_significant = int_part.trim_start_matches('0');
    let position = if int_significant.is_empty() {
        let leading_zeros = frac_part.bytes().position(|b| b != b'0')?;
        -i64::try_from(leading_zeros + 1).ok()?
    } else {
        i64::try_from(int_significant.len()).ok()? - 1
    };

    Some(position.saturating_add(parse_exponent(exponent)))
}

/// Exponent digits with saturation; more than 18 digits cannot fit an i64
fn parse_exponent(exponent: &str) -> i64 {
    let (negative, digits) = match exponent.as_bytes().first() {
        Some(b'-') => (true, &exponent[1..]),
        Some(b'+') => (false, &exponent[1..]),
        _ => (false, exponent),
    };
    let digits = digits.trim_start_matches('0');
    let value = if digits.len() > 18 {
        i64::MAX
    } else {
        digits.parse::<i64>().unwrap_or(0)
    };
    if negative {
        -value
    } else {
        value
    }
}

/// Longest prefix of `s` shaped like `[+-]digits[.digits][e[+-]digits]`
fn decimal_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            mantissa_digits += frac_end - (end + 1);
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    &s[..end]
}
