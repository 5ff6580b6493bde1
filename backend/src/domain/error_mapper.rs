//! Maps native engine failures onto the canonical error taxonomy.
//!
//! Mapping is pure: the same native error always yields the same
//! [`CanonicalError`]. Raw backend text never reaches `user_message`; it is
//! kept in `debug`, and only in development mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::canonical::{CanonicalError, Engine, ErrorCategory};
use super::ports::{RelationalEngineError, RemoteEngineError};
use ErrorCategory::{Auth, Data, Security, System};

/// Deployment mode controlling diagnostic exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Production,
    Development,
}

impl RuntimeMode {
    /// Whether raw backend detail may be returned to callers.
    pub const fn exposes_debug(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Production => "production",
            Self::Development => "development",
        })
    }
}

/// Unknown runtime mode label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown runtime mode: {0}")]
pub struct ParseRuntimeModeError(String);

impl FromStr for RuntimeMode {
    type Err = ParseRuntimeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(ParseRuntimeModeError(other.to_owned())),
        }
    }
}

/// A native failure together with the engine that raised it.
#[derive(Debug, Clone, Copy)]
pub enum NativeError<'a> {
    Relational(&'a RelationalEngineError),
    Remote(&'a RemoteEngineError),
}

impl NativeError<'_> {
    pub fn engine(&self) -> Engine {
        match self {
            Self::Relational(_) => Engine::Sql,
            Self::Remote(_) => Engine::Remote,
        }
    }
}

struct Mapping {
    code: &'static str,
    retryable: bool,
    category: ErrorCategory,
    user_message: &'static str,
}

const fn mapping(
    code: &'static str,
    retryable: bool,
    category: ErrorCategory,
    user_message: &'static str,
) -> Mapping {
    Mapping {
        code,
        retryable,
        category,
        user_message,
    }
}

static DUPLICATE_KEY: Mapping = mapping("SQL_DUPLICATE_KEY", false, Data, "Record already exists.");
static FOREIGN_KEY: Mapping = mapping(
    "SQL_FOREIGN_KEY_CONSTRAINT",
    false,
    Data,
    "Related record not found.",
);
static NOT_NULL: Mapping = mapping(
    "SQL_NOT_NULL_VIOLATION",
    false,
    Data,
    "A required value is missing.",
);
static CHECK_VIOLATION: Mapping = mapping(
    "SQL_CHECK_VIOLATION",
    false,
    Data,
    "A value is outside the allowed range.",
);
static DIVIDE_BY_ZERO: Mapping = mapping(
    "SQL_DIVIDE_BY_ZERO",
    false,
    System,
    "Unexpected calculation error occurred.",
);
static PROCEDURE_NOT_FOUND: Mapping = mapping(
    "SQL_PROCEDURE_NOT_FOUND",
    false,
    System,
    "Requested operation unavailable.",
);
static TIMEOUT: Mapping = mapping("SQL_TIMEOUT", true, System, "Request timed out. Try again.");
static DEADLOCK: Mapping = mapping(
    "SQL_DEADLOCK",
    true,
    System,
    "The request conflicted with another operation. Try again.",
);
static SERIALIZATION: Mapping = mapping(
    "SQL_SERIALIZATION_FAILURE",
    true,
    System,
    "The request conflicted with another operation. Try again.",
);
static CONNECTION_FAILED: Mapping = mapping(
    "SQL_CONNECTION_FAILED",
    true,
    System,
    "Database temporarily unavailable. Try again.",
);
static TOO_MANY_CONNECTIONS: Mapping = mapping(
    "SQL_TOO_MANY_CONNECTIONS",
    true,
    System,
    "Database is busy. Try again.",
);
static LOGIN_FAILED: Mapping = mapping(
    "SQL_LOGIN_FAILED",
    false,
    Security,
    "Database access is not configured correctly.",
);
static PERMISSION_DENIED: Mapping = mapping(
    "SQL_PERMISSION_DENIED",
    false,
    Security,
    "Operation not permitted.",
);
static BUSINESS_RULE: Mapping = mapping(
    "SQL_BUSINESS_RULE_VIOLATION",
    false,
    Data,
    "The request could not be completed.",
);
static SQL_FALLBACK: Mapping = mapping(
    "SQL_EXECUTION_ERROR",
    false,
    System,
    "Something went wrong while processing your request.",
);

/// SQLSTATE lookup table.
fn sqlstate_mapping(sqlstate: &str) -> Option<&'static Mapping> {
    let mapped = match sqlstate {
        "23505" => &DUPLICATE_KEY,
        "23503" => &FOREIGN_KEY,
        "23502" => &NOT_NULL,
        "23514" => &CHECK_VIOLATION,
        "22012" => &DIVIDE_BY_ZERO,
        "42883" => &PROCEDURE_NOT_FOUND,
        "57014" => &TIMEOUT,
        "40P01" => &DEADLOCK,
        "40001" => &SERIALIZATION,
        "08000" | "08001" | "08003" | "08004" | "08006" | "57P01" => &CONNECTION_FAILED,
        "53300" => &TOO_MANY_CONNECTIONS,
        "28P01" | "28000" => &LOGIN_FAILED,
        "42501" => &PERMISSION_DENIED,
        "P0001" => &BUSINESS_RULE,
        _ => return None,
    };
    Some(mapped)
}

static REMOTE_EXECUTION: Mapping = mapping(
    "SUPABASE_EXECUTION_ERROR",
    false,
    System,
    "Something went wrong while processing your request.",
);
static REMOTE_TIMEOUT: Mapping = mapping(
    "SUPABASE_TIMEOUT",
    true,
    System,
    "Request timed out. Try again.",
);
static REMOTE_UNAVAILABLE: Mapping = mapping(
    "SUPABASE_UNAVAILABLE",
    true,
    System,
    "Remote service temporarily unavailable. Try again.",
);
static REMOTE_NOT_CONFIGURED: Mapping = mapping(
    "SUPABASE_NOT_CONFIGURED",
    false,
    System,
    "Remote service is not configured.",
);
static REMOTE_AUTH: Mapping = mapping(
    "SUPABASE_AUTH_FAILED",
    false,
    Auth,
    "Remote service rejected the credentials.",
);
static REMOTE_NOT_FOUND: Mapping = mapping(
    "SUPABASE_FUNCTION_NOT_FOUND",
    false,
    System,
    "Requested operation unavailable.",
);

/// PostgREST code for "function not found in schema cache".
const POSTGREST_FUNCTION_NOT_FOUND: &str = "PGRST202";

fn remote_mapping(error: &RemoteEngineError) -> &'static Mapping {
    match error {
        RemoteEngineError::Timeout { .. } => &REMOTE_TIMEOUT,
        RemoteEngineError::Transport { .. } => &REMOTE_UNAVAILABLE,
        RemoteEngineError::NotConfigured => &REMOTE_NOT_CONFIGURED,
        RemoteEngineError::Decode { .. } => &REMOTE_EXECUTION,
        RemoteEngineError::Status { status, code, .. } => {
            if code.as_deref() == Some(POSTGREST_FUNCTION_NOT_FOUND) || *status == 404 {
                &REMOTE_NOT_FOUND
            } else {
                match *status {
                    401 | 403 => &REMOTE_AUTH,
                    408 => &REMOTE_TIMEOUT,
                    429 | 502..=504 => &REMOTE_UNAVAILABLE,
                    _ => &REMOTE_EXECUTION,
                }
            }
        }
    }
}

fn relational_mapping(error: &RelationalEngineError) -> &'static Mapping {
    match error {
        RelationalEngineError::Connect { .. } => &CONNECTION_FAILED,
        RelationalEngineError::Timeout { .. } => &TIMEOUT,
        RelationalEngineError::Database { code, .. } => code
            .as_deref()
            .and_then(sqlstate_mapping)
            .unwrap_or(&SQL_FALLBACK),
        RelationalEngineError::Protocol { .. } => &SQL_FALLBACK,
    }
}

/// Stateless mapper configured with the runtime mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper {
    mode: RuntimeMode,
}

impl ErrorMapper {
    pub fn new(mode: RuntimeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Map a native failure to its canonical form.
    pub fn map(&self, native: NativeError<'_>) -> CanonicalError {
        let (mapped, detail) = match native {
            NativeError::Relational(error) => (relational_mapping(error), error.to_string()),
            NativeError::Remote(error) => (remote_mapping(error), error.to_string()),
        };
        CanonicalError {
            code: mapped.code.to_owned(),
            engine: native.engine(),
            retryable: mapped.retryable,
            category: mapped.category,
            user_message: mapped.user_message.to_owned(),
            debug: self.mode.exposes_debug().then_some(detail),
        }
    }

    pub fn map_sql(&self, error: &RelationalEngineError) -> CanonicalError {
        self.map(NativeError::Relational(error))
    }

    pub fn map_remote(&self, error: &RemoteEngineError) -> CanonicalError {
        self.map(NativeError::Remote(error))
    }
}
