//! Engine-level error taxonomy.
//!
//! These errors are transport agnostic. Each variant carries only the fields
//! relevant to it; the inbound adapter turns them into the canonical response
//! envelope and an HTTP status.

use super::canonical::{CanonicalError, Engine, ErrorCategory};
use super::names::{ProcedureName, ProjectName};

const CONFIGURATION_MESSAGE: &str = "Service configuration is unavailable.";

/// Every failure a procedure call can end with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The request is malformed or incomplete.
    #[error("{message}")]
    InvalidRequest { message: String },
    /// The caller's identity could not be established.
    #[error("{message}")]
    Unauthorized { message: String },
    /// The access guard rejected the procedure name.
    #[error("Procedure '{procedure}' not registered in project '{project}'")]
    ProcedureNotAllowed { project: String, procedure: String },
    /// The registry has no entry for the procedure.
    #[error("Procedure '{procedure}' not registered in project '{project}'")]
    ProcedureNotRegistered { project: String, procedure: String },
    /// No configuration exists for the project.
    #[error("Project '{project}' is not configured")]
    ProjectNotFound { project: String },
    /// The project's configuration could not be read or parsed.
    #[error("configuration for project '{project}' is unavailable: {message}")]
    ConfigUnavailable { project: String, message: String },
    /// The project's procedure registry could not be read or parsed.
    #[error("procedure registry for project '{project}' is unavailable: {message}")]
    RegistryUnavailable { project: String, message: String },
    /// A tenant-scoped call had no tenant database to run against.
    #[error("Database name not resolved for procedure '{procedure}' in project '{project}'")]
    DatabaseNotResolved { project: String, procedure: String },
    /// The backend could not be reached and no fallback was possible.
    #[error("{} backend unavailable ({})", error.engine, error.code)]
    BackendUnavailable { error: CanonicalError },
    /// The relational engine ran the procedure and it failed.
    #[error("relational execution failed ({})", error.code)]
    SqlExecution { error: CanonicalError },
    /// The remote engine ran the function and it failed.
    #[error("remote execution failed ({})", error.code)]
    SupabaseExecution { error: CanonicalError },
    /// Both engines failed; `primary` is the relational engine's error.
    #[error("both backends failed ({} / {})", primary.code, fallback.code)]
    BothBackendsFailed {
        primary: CanonicalError,
        fallback: CanonicalError,
    },
}

impl EngineError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn procedure_not_allowed(project: &ProjectName, procedure: &ProcedureName) -> Self {
        Self::ProcedureNotAllowed {
            project: project.to_string(),
            procedure: procedure.to_string(),
        }
    }

    pub fn procedure_not_registered(project: &ProjectName, procedure: &ProcedureName) -> Self {
        Self::ProcedureNotRegistered {
            project: project.to_string(),
            procedure: procedure.to_string(),
        }
    }

    pub fn project_not_found(project: &ProjectName) -> Self {
        Self::ProjectNotFound {
            project: project.to_string(),
        }
    }

    pub fn config_unavailable(project: &ProjectName, message: impl Into<String>) -> Self {
        Self::ConfigUnavailable {
            project: project.to_string(),
            message: message.into(),
        }
    }

    pub fn registry_unavailable(project: &ProjectName, message: impl Into<String>) -> Self {
        Self::RegistryUnavailable {
            project: project.to_string(),
            message: message.into(),
        }
    }

    pub fn database_not_resolved(project: &ProjectName, procedure: &ProcedureName) -> Self {
        Self::DatabaseNotResolved {
            project: project.to_string(),
            procedure: procedure.to_string(),
        }
    }

    /// Wrap a mapped backend error as a terminal execution failure.
    pub fn execution(error: CanonicalError) -> Self {
        match error.engine {
            Engine::Sql => Self::SqlExecution { error },
            Engine::Remote => Self::SupabaseExecution { error },
        }
    }

    /// Stable machine-readable code surfaced as `error.code`.
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::Unauthorized { .. } => "AUTH_UNAUTHORIZED",
            Self::ProcedureNotAllowed { .. } => "PROCEDURE_NOT_ALLOWED",
            Self::ProcedureNotRegistered { .. } => "PROCEDURE_NOT_REGISTERED",
            Self::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            Self::ConfigUnavailable { .. } => "CONFIG_UNAVAILABLE",
            Self::RegistryUnavailable { .. } => "REGISTRY_UNAVAILABLE",
            Self::DatabaseNotResolved { .. } => "DB_NOT_RESOLVED",
            Self::BackendUnavailable { error }
            | Self::SqlExecution { error }
            | Self::SupabaseExecution { error } => error.code.as_str(),
            Self::BothBackendsFailed { primary, .. } => primary.code.as_str(),
        }
    }

    /// Status placed in `status.code` and on the HTTP response.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::ProcedureNotAllowed { .. } | Self::ProcedureNotRegistered { .. } => 403,
            Self::ProjectNotFound { .. } => 404,
            Self::ConfigUnavailable { .. }
            | Self::RegistryUnavailable { .. }
            | Self::DatabaseNotResolved { .. }
            | Self::SqlExecution { .. }
            | Self::SupabaseExecution { .. } => 500,
            Self::BothBackendsFailed { .. } => 502,
            Self::BackendUnavailable { .. } => 503,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. } | Self::DatabaseNotResolved { .. } => {
                ErrorCategory::System
            }
            Self::Unauthorized { .. } => ErrorCategory::Auth,
            Self::ProcedureNotAllowed { .. } | Self::ProcedureNotRegistered { .. } => {
                ErrorCategory::Security
            }
            Self::ProjectNotFound { .. }
            | Self::ConfigUnavailable { .. }
            | Self::RegistryUnavailable { .. } => ErrorCategory::System,
            Self::BackendUnavailable { error }
            | Self::SqlExecution { error }
            | Self::SupabaseExecution { error } => error.category,
            Self::BothBackendsFailed { primary, .. } => primary.category,
        }
    }

    /// Whether the caller may retry the identical request.
    pub fn retryable(&self) -> bool {
        match self {
            Self::BackendUnavailable { .. } => true,
            Self::SqlExecution { error } | Self::SupabaseExecution { error } => error.retryable,
            Self::BothBackendsFailed { primary, .. } => primary.retryable,
            _ => false,
        }
    }

    /// Engine the failure originated from, if any.
    pub fn engine(&self) -> Option<Engine> {
        match self {
            Self::BackendUnavailable { error }
            | Self::SqlExecution { error }
            | Self::SupabaseExecution { error } => Some(error.engine),
            Self::BothBackendsFailed { primary, .. } => Some(primary.engine),
            _ => None,
        }
    }

    /// Sanitised message safe to return to any caller.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigUnavailable { .. } | Self::RegistryUnavailable { .. } => {
                CONFIGURATION_MESSAGE.to_owned()
            }
            Self::BackendUnavailable { error }
            | Self::SqlExecution { error }
            | Self::SupabaseExecution { error } => error.user_message.clone(),
            Self::BothBackendsFailed { primary, .. } => primary.user_message.clone(),
            other => other.to_string(),
        }
    }

    /// Raw backend detail, present only when the mapper ran in development mode.
    pub fn debug_detail(&self) -> Option<String> {
        match self {
            Self::BackendUnavailable { error }
            | Self::SqlExecution { error }
            | Self::SupabaseExecution { error } => error.debug.clone(),
            Self::BothBackendsFailed { primary, fallback } => {
                match (&primary.debug, &fallback.debug) {
                    (None, None) => None,
                    (primary_debug, fallback_debug) => Some(format!(
                        "{}: {}; {}: {}",
                        primary.engine,
                        primary_debug.as_deref().unwrap_or("-"),
                        fallback.engine,
                        fallback_debug.as_deref().unwrap_or("-"),
                    )),
                }
            }
            Self::ConfigUnavailable { .. } | Self::RegistryUnavailable { .. } => {
                Some(self.to_string())
            }
            _ => None,
        }
    }
}
