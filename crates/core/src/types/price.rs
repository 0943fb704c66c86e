//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored in table storage as `Edm.Double` numbers so rows stay
//! readable by other table clients; in memory they are exact decimals.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be empty")]
    Empty,
    #[error("'{0}' is not a valid price")]
    Invalid(String),
}

/// A monetary amount in the store's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a price typed into a form.
    ///
    /// Accepts a leading currency symbol, surrounding whitespace, thousands
    /// separators of the form `1 234.50` or `1,234.50`, and a comma as
    /// decimal separator when it is the only comma and is followed by one or
    /// two digits (`9,99`). `1,234` is one thousand two hundred thirty-four.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not a number.
    pub fn parse_lenient(input: &str) -> Result<Self, PriceError> {
        let trimmed = input
            .trim()
            .trim_start_matches(['$', 'R'])
            .trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || PriceError::Invalid(input.trim().to_owned());

        let normalized = match compact.split_once('.') {
            Some((integer, fraction)) => {
                format!("{}.{fraction}", strip_thousands(integer).ok_or_else(invalid)?)
            }
            None => match compact.split_once(',') {
                // A single comma followed by one or two digits is a decimal comma.
                Some((integer, fraction))
                    if (1..=2).contains(&fraction.len())
                        && fraction.bytes().all(|b| b.is_ascii_digit()) =>
                {
                    format!("{integer}.{fraction}")
                }
                _ => strip_thousands(&compact).ok_or_else(invalid)?,
            },
        };

        Decimal::from_str(&normalized)
            .map(Self)
            .map_err(|_| PriceError::Invalid(input.trim().to_owned()))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Total for `quantity` units at this price.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

/// Remove `,` thousands separators from the integer part of an amount.
///
/// Every group after the first must be exactly three digits; anything else
/// is ambiguous and yields `None`.
fn strip_thousands(integer: &str) -> Option<String> {
    let mut groups = integer.split(',');
    let first = groups.next().unwrap_or_default();
    let mut out = first.to_owned();
    let mut grouped = false;
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        out.push_str(group);
        grouped = true;
    }
    let leading_digits = first.trim_start_matches(['-', '+']).len();
    if grouped && !(1..=3).contains(&leading_digits) {
        return None;
    }
    Some(out)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Parsing the decimal text yields the closest double to the exact amount.
        let value: f64 = self
            .0
            .normalize()
            .to_string()
            .parse()
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(value) => value.to_string(),
            Raw::Text(text) => text,
        };
        Decimal::from_str(&text)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
