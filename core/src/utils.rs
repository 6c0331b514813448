//! Utility functions and types.

use std::fmt::Debug;

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
///
/// Bearer tokens, secret keys and signatures all go through this before
/// reaching a log line.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(""),
            Some(v) => Redact(v),
        }
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.chars().count();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 {
            f.write_str("***")
        } else {
            let head: String = self.0.chars().take(3).collect();
            let tail: String = self.0.chars().skip(length - 3).collect();
            f.write_str(&head)?;
            f.write_str("***")?;
            f.write_str(&tail)
        }
    }
}

/// Strip a leading `Bearer` scheme (case-insensitive) and the whitespace after it.
///
/// Values without the scheme are returned trimmed.
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    let Some(prefix) = value.get(..6) else {
        return value;
    };
    if !prefix.eq_ignore_ascii_case("bearer") {
        return value;
    }
    let rest = &value[6..];
    // `Bearertoken` is a token, not a scheme.
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        rest.trim_start()
    } else {
        value
    }
}
