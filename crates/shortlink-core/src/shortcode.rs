use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub const MIN_LENGTH: usize = 3;
pub const MAX_LENGTH: usize = 32;

/// The public identifier of a short link.
///
/// Codes are 3 to 32 characters drawn from the base64url alphabet
/// (`[A-Za-z0-9_-]`), so they are safe to use as a single URL path segment
/// and as part of a cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        check(&code)?;
        Ok(Self(code))
    }

    /// Wraps `code` as is. Only for values that already went through
    /// [`ShortCode::new`] or come out of a generator.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// `base_url` joined with the code by exactly one slash.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

fn check(code: &str) -> Result<(), CoreError> {
    let len = code.len();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&len) {
        return Err(CoreError::InvalidShortCode(format!(
            "expected {MIN_LENGTH} to {MAX_LENGTH} characters, got {len}"
        )));
    }
    if let Some(bad) = code.chars().find(|&c| !is_code_char(c)) {
        return Err(CoreError::InvalidShortCode(format!(
            "unexpected character {bad:?} in '{code}'"
        )));
    }
    Ok(())
}

impl FromStr for ShortCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
