//! Hashed surrogate key shared by every vault table.
//!
//! # Invariants
//! - A `HashKey` is exactly 32 ASCII alphanumeric characters.
//! - Keys are compared and ordered as plain strings.
//! - How a key is derived from a business id is the caller's concern.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Validation failure for vault model values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    InvalidHashKeyLength { len: usize },
    InvalidHashKeyCharacter { position: usize, found: char },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHashKeyLength { len } => write!(
                f,
                "hash key must be {} characters, got {len}",
                HashKey::LEN
            ),
            Self::InvalidHashKeyCharacter { position, found } => write!(
                f,
                "hash key contains invalid character {found:?} at position {position}"
            ),
        }
    }
}

impl Error for ModelValidationError {}

/// Surrogate key stored in `*_id_hash` columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashKey(String);

impl HashKey {
    /// Declared width of every `*_id_hash` column.
    pub const LEN: usize = 32;

    /// Validates and wraps a key.
    ///
    /// # Errors
    /// - `InvalidHashKeyLength` unless the value has exactly 32 characters.
    /// - `InvalidHashKeyCharacter` for anything outside `[0-9A-Za-z]`.
    pub fn parse(value: impl Into<String>) -> Result<Self, ModelValidationError> {
        let value = value.into();
        let len = value.chars().count();
        if len != Self::LEN {
            return Err(ModelValidationError::InvalidHashKeyLength { len });
        }
        if let Some((position, found)) = value
            .chars()
            .enumerate()
            .find(|(_, ch)| !ch.is_ascii_alphanumeric())
        {
            return Err(ModelValidationError::InvalidHashKeyCharacter { position, found });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HashKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HashKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for HashKey {
    type Err = ModelValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for HashKey {
    type Error = ModelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<HashKey> for String {
    fn from(value: HashKey) -> Self {
        value.0
    }
}
