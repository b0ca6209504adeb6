//! Bulgarian mobile phone numbers.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Mobile numbers: `+359` or `0` trunk prefix, then `87`/`88`/`89` and seven digits.
static BG_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+359|00359|0)(8[7-9][0-9]{7})$").expect("phone pattern is a valid regex")
});

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is not a Bulgarian mobile number.
    #[error("phone number must be a Bulgarian mobile number (e.g. 0888123456 or +359888123456)")]
    Invalid,
}

/// A Bulgarian mobile phone number, stored in international form (`+3598XXXXXXXX`).
///
/// Spaces, dashes, dots and parentheses are ignored while parsing, so
/// `"0888 123 456"` and `"+359 (88) 812-3456"` are accepted.
///
/// ```
/// use pazar_core::Phone;
///
/// let phone = Phone::parse("0888 123 456").unwrap();
/// assert_eq!(phone.as_str(), "+359888123456");
/// assert_eq!(phone.national(), "0888123456");
///
/// assert!(Phone::parse("0288123456").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and [`PhoneError::Invalid`]
    /// when the digits do not form a Bulgarian mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let compact: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')' | '\t'))
            .collect();

        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let captures = BG_MOBILE.captures(&compact).ok_or(PhoneError::Invalid)?;
        let subscriber = captures.get(1).ok_or(PhoneError::Invalid)?.as_str();

        Ok(Self(format!("+359{subscriber}")))
    }

    /// International form, e.g. `+359888123456`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// National form with the `0` trunk prefix, e.g. `0888123456`.
    #[must_use]
    pub fn national(&self) -> String {
        format!("0{}", self.0.trim_start_matches("+359"))
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}
