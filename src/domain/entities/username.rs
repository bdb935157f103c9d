//! Instagram username value object.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ResolveError;

/// Validated Instagram username.
///
/// Only ASCII letters, digits, `.` and `_` are accepted. The value is never
/// mutated once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Parses and validates a raw username.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidInput`] if the value is empty or contains
    /// characters outside `[A-Za-z0-9._]`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ResolveError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(ResolveError::invalid_input("username required"));
        }

        if let Some(bad) = raw.chars().find(|c| !Self::is_allowed(*c)) {
            return Err(ResolveError::invalid_input(format!(
                "username contains invalid character {bad:?}"
            )));
        }

        Ok(Self(raw))
    }

    const fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '.' || c == '_'
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the username and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("alice" ; "plain")]
    #[test_case("ghost_user" ; "underscore")]
    #[test_case("first.last" ; "dot")]
    #[test_case("User123" ; "mixed_case_digits")]
    #[test_case("._." ; "only_separators")]
    fn test_accepts_valid(raw: &str) {
        let username = Username::parse(raw).unwrap();
        assert_eq!(username.as_str(), raw);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("bad-name" ; "hyphen")]
    #[test_case("with space" ; "inner_space")]
    #[test_case("../etc/passwd" ; "path_traversal")]
    #[test_case("émile" ; "non_ascii")]
    #[test_case("a?b=c" ; "query_chars")]
    #[test_case(" alice" ; "leading_space")]
    #[test_case("alice\n" ; "trailing_newline")]
    #[test_case("\talice" ; "leading_tab")]
    fn test_rejects_invalid(raw: &str) {
        let err = Username::parse(raw).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput { .. }));
    }

    #[test]
    fn test_surrounding_whitespace_is_not_stripped() {
        let err = Username::parse("  alice \n").unwrap_err();
        assert_eq!(
            err,
            ResolveError::invalid_input("username contains invalid character ' '")
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<Username, _> = serde_json::from_str(r#""alice""#);
        assert!(ok.is_ok());

        let bad: Result<Username, _> = serde_json::from_str(r#""al ice""#);
        assert!(bad.is_err());
    }
}
