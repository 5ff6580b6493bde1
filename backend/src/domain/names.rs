//! Validated identifiers used throughout the execution pipeline.
//!
//! Project names double as directory names for file-backed sources, so they
//! are restricted to a filesystem-safe alphabet. Procedure and database names
//! reach backend engines and are only required to be non-blank and free of
//! control characters; adapters quote them before use.

use std::fmt;

use serde::{Deserialize, Serialize};

const MAX_NAME_LEN: usize = 128;

/// Validation failures raised by the name constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameValidationError {
    /// The supplied value was empty once trimmed.
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },
    /// The supplied value exceeded the maximum length.
    #[error("{kind} must be at most 128 characters")]
    TooLong { kind: &'static str },
    /// The supplied value contained a disallowed character.
    #[error("{kind} contains an invalid character: {character:?}")]
    InvalidCharacter { kind: &'static str, character: char },
}

fn validate(
    kind: &'static str,
    raw: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<String, NameValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NameValidationError::Empty { kind });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(NameValidationError::TooLong { kind });
    }
    if let Some(character) = trimmed.chars().find(|c| !allowed(*c)) {
        return Err(NameValidationError::InvalidCharacter { kind, character });
    }
    Ok(trimmed.to_owned())
}

macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $allowed:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap the supplied value.
            pub fn new(value: impl AsRef<str>) -> Result<Self, NameValidationError> {
                validate($kind, value.as_ref(), $allowed).map(Self)
            }

            /// Borrow the validated value.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_name!(
    /// Tenant-facing project identifier, e.g. `ecom`.
    ProjectName,
    "project name",
    |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'
);

define_name!(
    /// Name of a stored procedure or remote function.
    ProcedureName,
    "procedure name",
    |c: char| !c.is_control() && c != '"'
);

define_name!(
    /// Physical database name on the relational server.
    DatabaseName,
    "database name",
    |c: char| !c.is_control()
);
