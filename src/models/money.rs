//! Money type for representing currency amounts
//!
//! Internally stores amounts in minor units (pence/cents, i64) to avoid
//! floating-point precision issues in payment amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default symbol used by `Display`
pub const DEFAULT_CURRENCY_SYMBOL: &str = "£";

/// A monetary amount stored as minor units (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from minor units
    ///
    /// # Examples
    /// ```
    /// use bankflow::models::Money;
    /// let amount = Money::from_minor(1050); // £10.50
    /// assert_eq!(amount.to_string(), "£10.50");
    /// ```
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Get the amount in minor units
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Whole major units (truncated toward zero)
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Minor part (0-99)
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a money amount from a string
    ///
    /// Accepts formats: "10.50", "-10.50", "£10.50", "$10.50", "10".
    /// More than two decimal places is rejected rather than truncated.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MoneyParseError::Empty);
        }

        let (negative, s) = match s.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };

        let s = s
            .strip_prefix('£')
            .or_else(|| s.strip_prefix('$'))
            .unwrap_or(s);

        let invalid = || MoneyParseError::InvalidFormat(s.to_string());

        let minor = match s.split_once('.') {
            Some((major_str, minor_str)) => {
                let major: i64 = major_str.parse().map_err(|_| invalid())?;
                if major_str.starts_with(['+', '-']) || !minor_str.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                let minor: i64 = match minor_str.len() {
                    0 => 0,
                    1 => minor_str.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => minor_str.parse().map_err(|_| invalid())?,
                    _ => return Err(MoneyParseError::TooPrecise(s.to_string())),
                };
                major
                    .checked_mul(100)
                    .and_then(|m| m.checked_add(minor))
                    .ok_or_else(invalid)?
            }
            None => {
                if s.starts_with(['+', '-']) {
                    return Err(invalid());
                }
                s.parse::<i64>()
                    .map_err(|_| invalid())?
                    .checked_mul(100)
                    .ok_or_else(invalid)?
            }
        };

        Ok(Self(if negative { -minor } else { minor }))
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{}{}.{:02}", symbol, self.major().abs(), self.minor_part())
        } else {
            format!("{}{}.{:02}", symbol, self.major(), self.minor_part())
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol(DEFAULT_CURRENCY_SYMBOL))
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    Empty,
    InvalidFormat(String),
    TooPrecise(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::Empty => write!(f, "Amount is empty"),
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::TooPrecise(s) => {
                write!(f, "Amount has more than two decimal places: {}", s)
            }
        }
    }
}

impl std::error::Error for MoneyParseError {}
