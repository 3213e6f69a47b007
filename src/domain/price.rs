//! Exact decimal price value object
//!
//! Storefront prices arrive as free text (`"R$ 1.234,56"`). They are scanned for
//! the first numeric token and normalized with the storefront's numeral
//! convention: `.` groups thousands, `,` separates decimals. The result is kept as
//! an integer mantissa plus a decimal scale so no floating point is involved.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::product::FieldOutcome;

lazy_static! {
    static ref PRICE_TOKEN: Regex = Regex::new(r"\d[\d.,]*").unwrap();
}

/// Non-negative decimal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PriceRepr", into = "String")]
pub struct Price {
    mantissa: u64,
    scale: u32,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("invalid decimal amount '{raw}': {reason}")]
pub struct PriceParseError {
    pub raw: String,
    pub reason: &'static str,
}

impl Price {
    pub fn from_parts(mantissa: u64, scale: u32) -> Self {
        Self { mantissa, scale }.normalized()
    }

    /// Scan listing text for a price.
    ///
    /// Text without any digit is `Absent`; a numeric token that does not
    /// normalize to a single decimal number is `Unparsable`.
    pub fn from_listing_text(text: &str) -> FieldOutcome<Price> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let Some(token) = PRICE_TOKEN.find(&compact) else {
            return FieldOutcome::Absent;
        };

        let normalized = token.as_str().replace('.', "").replace(',', ".");
        let normalized = normalized.trim_end_matches('.');

        match normalized.parse::<Price>() {
            Ok(price) => FieldOutcome::Present(price),
            Err(e) => FieldOutcome::Unparsable {
                raw: text.trim().to_string(),
                reason: e.reason.to_string(),
            },
        }
    }

    pub fn is_positive(&self) -> bool {
        self.mantissa > 0
    }

    /// Lossy conversion for display and charting.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(0.0)
    }

    fn normalized(mut self) -> Self {
        while self.scale > 0 && self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.scale -= 1;
        }
        if self.mantissa == 0 {
            self.scale = 0;
        }
        self
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Parse the canonical form (`1234.56`, `50`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| PriceParseError {
            raw: s.to_string(),
            reason,
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (s, ""),
        };
        if frac_part.contains('.') {
            return Err(err("more than one decimal separator"));
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err("no digits"));
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err("unexpected character"));
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| err("too many decimals"))?;
        let mut mantissa: u64 = 0;
        for digit in int_part.chars().chain(frac_part.chars()) {
            let value = u64::from(digit.to_digit(10).unwrap_or(0));
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(value))
                .ok_or_else(|| err("amount out of range"))?;
        }

        Ok(Price::from_parts(mantissa, scale))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = format!("{:0>width$}", self.mantissa, width = self.scale as usize + 1);
        let split = digits.len() - self.scale as usize;
        write!(f, "{}.{}", &digits[..split], &digits[split..])
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

/// Accepted persisted forms: canonical strings, storefront strings written by
/// older exports, and plain JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Text(String),
    Number(serde_json::Number),
}

impl TryFrom<PriceRepr> for Price {
    type Error = PriceParseError;

    fn try_from(repr: PriceRepr) -> Result<Self, Self::Error> {
        match repr {
            PriceRepr::Number(n) => n.to_string().parse(),
            // Anything that is not a canonical decimal is read with the storefront
            // rule, so "1.234.56" loads as 123456 and never as 1234.56.
            PriceRepr::Text(text) => text.parse().or_else(|e: PriceParseError| {
                match Price::from_listing_text(&text) {
                    FieldOutcome::Present(price) => Ok(price),
                    _ => Err(e),
                }
            }),
        }
    }
}
