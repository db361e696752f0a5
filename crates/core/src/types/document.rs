//! Donor document (Brazilian CPF) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Document`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The input string is empty.
    #[error("document cannot be empty")]
    Empty,
    /// The input contains characters other than digits and punctuation.
    #[error("document may only contain digits, dots and dashes")]
    InvalidCharacter,
    /// The input does not have exactly 11 digits.
    #[error("document must have {expected} digits (got {got})")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
        /// Number of digits found.
        got: usize,
    },
    /// All digits are the same (e.g. `111.111.111-11`).
    #[error("document cannot be a repeated digit sequence")]
    RepeatedDigits,
    /// One of the two check digits does not match.
    #[error("document check digits do not match")]
    InvalidCheckDigits,
}

/// A CPF (Cadastro de Pessoas Físicas) number identifying a donor.
///
/// Stored as its 11 bare digits. The DSO authentication endpoint accepts the
/// bare form; [`Document::formatted`] renders the familiar punctuated form.
///
/// ## Constraints
///
/// - Only digits, `.`, `-` and whitespace are accepted as input
/// - Exactly 11 digits once punctuation is stripped
/// - Not a single repeated digit
/// - Both check digits valid
///
/// ## Examples
///
/// ```
/// use donor_portal_core::Document;
///
/// let doc = Document::parse("529.982.247-25").unwrap();
/// assert_eq!(doc.as_str(), "52998224725");
/// assert_eq!(doc.formatted(), "529.982.247-25");
///
/// assert!(Document::parse("").is_err());
/// assert!(Document::parse("111.111.111-11").is_err());
/// assert!(Document::parse("529.982.247-26").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Document(String);

impl Document {
    /// Number of digits in a CPF.
    pub const LENGTH: usize = 11;

    /// Parse a `Document` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains unexpected characters,
    /// does not have 11 digits, is a repeated digit, or fails the check digits.
    pub fn parse(s: &str) -> Result<Self, DocumentError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DocumentError::Empty);
        }

        let mut digits = Vec::with_capacity(Self::LENGTH);
        for c in trimmed.chars() {
            if let Some(d) = c.to_digit(10) {
                digits.push(d);
            } else if !matches!(c, '.' | '-' | ' ') {
                return Err(DocumentError::InvalidCharacter);
            }
        }

        if digits.len() != Self::LENGTH {
            return Err(DocumentError::WrongLength {
                expected: Self::LENGTH,
                got: digits.len(),
            });
        }

        if digits.windows(2).all(|w| w.first() == w.last()) {
            return Err(DocumentError::RepeatedDigits);
        }

        let first = check_digit(&digits, 9);
        let second = check_digit(&digits, 10);
        if digits.get(9) != Some(&first) || digits.get(10) != Some(&second) {
            return Err(DocumentError::InvalidCheckDigits);
        }

        Ok(Self(
            digits
                .iter()
                .filter_map(|d| char::from_digit(*d, 10))
                .collect(),
        ))
    }

    /// Returns the bare digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Document` and returns its bare digits.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Render as `000.000.000-00`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let (head, tail) = self.0.split_at(9);
        let (a, rest) = head.split_at(3);
        let (b, c) = rest.split_at(3);
        format!("{a}.{b}.{c}-{tail}")
    }
}

/// Modulo-11 check digit over the first `len` digits.
fn check_digit(digits: &[u32], len: usize) -> u32 {
    let weight_start = u32::try_from(len).unwrap_or(0) + 1;
    let sum: u32 = digits
        .iter()
        .take(len)
        .zip((2..=weight_start).rev())
        .map(|(d, w)| d * w)
        .sum();
    let rem = (sum * 10) % 11;
    if rem == 10 { 0 } else { rem }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Document {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::str::FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_punctuated_and_bare() {
        let punctuated = Document::parse("529.982.247-25").expect("valid cpf");
        let bare = Document::parse("52998224725").expect("valid cpf");
        assert_eq!(punctuated, bare);
        assert_eq!(bare.formatted(), "529.982.247-25");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(Document::parse("  529.982.247-25 ").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Document::parse("   "), Err(DocumentError::Empty));
        assert_eq!(
            Document::parse("529.982.247-2x"),
            Err(DocumentError::InvalidCharacter)
        );
        assert_eq!(
            Document::parse("5299822472"),
            Err(DocumentError::WrongLength {
                expected: 11,
                got: 10
            })
        );
        assert_eq!(
            Document::parse("000.000.000-00"),
            Err(DocumentError::RepeatedDigits)
        );
        assert_eq!(
            Document::parse("529.982.247-52"),
            Err(DocumentError::InvalidCheckDigits)
        );
    }

    #[test]
    fn test_another_known_valid_document() {
        assert!(Document::parse("111.444.777-35").is_ok());
    }

    #[test]
    fn test_serde_transparent() {
        let doc = Document::parse("52998224725").expect("valid cpf");
        let json = serde_json::to_string(&doc).expect("serialize");
        assert_eq!(json, "\"52998224725\"");
    }
}
