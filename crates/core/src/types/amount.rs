//! Donation amounts using decimal arithmetic.
//!
//! All amounts handled by the portal are in Brazilian reais. The DSO backend
//! reports them inconsistently: JSON numbers, plain decimal strings, or
//! display strings such as `"R$ 1.234,56"`. [`Amount::parse_loose`] accepts all
//! of them.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// No digits in the input.
    #[error("amount cannot be empty")]
    Empty,
    /// The input could not be read as a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
    /// Negative amounts are not valid donations.
    #[error("amount cannot be negative")]
    Negative,
}

/// A non-negative amount in BRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Negative` for values below zero.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        Ok(Self(value))
    }

    /// Create an amount from centavos.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Parse a display or plain decimal string.
    ///
    /// Accepts `"50"`, `"50.5"`, `"R$ 50,00"`, `"1.234,56"` and `"1,234.56"`.
    /// When both separators are present, the last one is the decimal
    /// separator. A lone comma is always decimal. A lone dot followed by
    /// exactly three digits groups thousands (`"R$ 1.234"`, `"1.234"`) unless
    /// the integer part is zero or longer than three digits and no `R$`
    /// marker is present; any other lone dot is decimal.
    ///
    /// # Errors
    ///
    /// Returns an error if no number can be read or if it is negative.
    pub fn parse_loose(s: &str) -> Result<Self, AmountError> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
            .collect();

        if !cleaned.chars().any(|c| c.is_ascii_digit()) {
            return Err(AmountError::Empty);
        }

        let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
            (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => cleaned.replace(',', ""),
            (Some(_), None) => cleaned.replace(',', "."),
            (None, _) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
            (None, Some(dot)) if lone_dot_groups_thousands(s, &cleaned, dot) => {
                cleaned.replace('.', "")
            }
            (None, _) => cleaned,
        };

        let value =
            Decimal::from_str(&normalized).map_err(|_| AmountError::Invalid(s.to_string()))?;
        Self::new(value)
    }

    /// Read an amount from an arbitrary JSON value.
    ///
    /// Returns `None` for nulls, booleans, containers and unparseable strings.
    /// JSON numbers are read exactly, never as display text.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
                    .and_then(|d| Self::new(d).ok())
            }
            serde_json::Value::String(s) => Self::parse_loose(s).ok(),
            _ => None,
        }
    }

    /// Format for display, e.g. `R$ 1234.56`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("R$ {:.2}", self.0)
    }
}

/// Whether the single dot in `cleaned` (at byte `dot`) groups thousands.
fn lone_dot_groups_thousands(raw: &str, cleaned: &str, dot: usize) -> bool {
    let (integer, rest) = cleaned.split_at(dot);
    let fraction = rest.trim_start_matches('.');
    if fraction.len() != 3 {
        return false;
    }
    if raw.contains("R$") {
        return true;
    }
    let integer = integer.trim_start_matches('-');
    !integer.is_empty() && integer.len() <= 3 && !integer.starts_with('0')
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("decimal literal")
    }

    #[test]
    fn test_parse_plain_values() {
        assert_eq!(Amount::parse_loose("50").map(|a| a.value()), Ok(dec("50")));
        assert_eq!(
            Amount::parse_loose("50.5").map(|a| a.value()),
            Ok(dec("50.5"))
        );
    }

    #[test]
    fn test_parse_brazilian_display_format() {
        assert_eq!(
            Amount::parse_loose("R$ 1.234,56").map(|a| a.value()),
            Ok(dec("1234.56"))
        );
        assert_eq!(
            Amount::parse_loose("R$ 30,00").map(|a| a.value()),
            Ok(dec("30.00"))
        );
        assert_eq!(
            Amount::parse_loose("1.000.000").map(|a| a.value()),
            Ok(dec("1000000"))
        );
    }

    #[test]
    fn test_parse_lone_dot_as_thousands() {
        assert_eq!(
            Amount::parse_loose("R$ 1.234").map(|a| a.value()),
            Ok(dec("1234"))
        );
        assert_eq!(
            Amount::parse_loose("1.234").map(|a| a.value()),
            Ok(dec("1234"))
        );
        assert_eq!(
            Amount::parse_loose("R$ 50.00").map(|a| a.value()),
            Ok(dec("50.00"))
        );
        // Two fraction digits, or a zero integer part, stay decimal
        assert_eq!(
            Amount::parse_loose("45.90").map(|a| a.value()),
            Ok(dec("45.90"))
        );
        assert_eq!(
            Amount::parse_loose("0.125").map(|a| a.value()),
            Ok(dec("0.125"))
        );
        assert_eq!(
            Amount::from_json(&serde_json::json!(1.234)).map(|a| a.value()),
            Some(dec("1.234"))
        );
    }

    #[test]
    fn test_parse_english_grouping() {
        assert_eq!(
            Amount::parse_loose("1,234.56").map(|a| a.value()),
            Ok(dec("1234.56"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Amount::parse_loose("R$"), Err(AmountError::Empty));
        assert_eq!(Amount::parse_loose("-10"), Err(AmountError::Negative));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            Amount::from_json(&serde_json::json!(45.9)).map(|a| a.value()),
            Some(dec("45.9"))
        );
        assert_eq!(
            Amount::from_json(&serde_json::json!("R$ 45,90")).map(|a| a.value()),
            Some(dec("45.90"))
        );
        assert_eq!(Amount::from_json(&serde_json::json!(null)), None);
        assert_eq!(Amount::from_json(&serde_json::json!({"value": 1})), None);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let ok: Amount = serde_json::from_str("\"45.90\"").expect("amount");
        assert_eq!(ok.value(), dec("45.90"));
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_cents(4590).display(), "R$ 45.90");
        assert_eq!(Amount::from_cents(100).to_string(), "1.00");
    }
}
