//! Engine configuration loaded via OrthoConfig.
//!
//! Values are layered from CLI arguments, `HYBRID_ENGINE_*` environment
//! variables and an optional configuration file. Everything is optional;
//! accessors supply the defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::ports::DEFAULT_PUBLIC_PROCEDURES;
use crate::domain::{NameValidationError, ParseRuntimeModeError, ProjectName, RuntimeMode};
use crate::outbound::persistence::PgPoolConfig;

const DEFAULT_PLATFORM_DIR: &str = "platform";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SQL_HOST: &str = "localhost";
const DEFAULT_SQL_PORT: u16 = 5432;
const DEFAULT_SQL_USER: &str = "postgres";
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid default project: {0}")]
    DefaultProject(#[from] NameValidationError),
    #[error(transparent)]
    RuntimeMode(#[from] ParseRuntimeModeError),
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid remote URL '{value}': {source}")]
    RemoteUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("remote URL is set but HYBRID_ENGINE_REMOTE_KEY is missing")]
    MissingRemoteKey,
}

/// Remote engine connection details; present only when a URL is configured.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub url: Url,
    pub key: String,
    pub timeout: Duration,
}

/// Process-wide engine settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HYBRID_ENGINE")]
pub struct EngineSettings {
    /// Project used when a request names none.
    pub default_project: Option<String>,
    /// Directory holding `<project>/procedures.json` and `<project>/config.json`.
    pub platform_dir: Option<PathBuf>,
    /// `production` (default) or `development`.
    pub runtime_mode: Option<String>,
    /// Reject requests that carry no bearer token.
    #[ortho_config(default = false)]
    pub require_token: bool,
    /// Comma-separated procedures callable without a token; defaults to
    /// `auth.login`. Set it empty to make every procedure require one.
    pub public_procedures: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,

    pub sql_host: Option<String>,
    pub sql_port: Option<u16>,
    pub sql_user: Option<String>,
    pub sql_password: Option<String>,
    /// Schema for procedure names without an explicit one.
    pub sql_schema: Option<String>,
    pub sql_max_connections: Option<u32>,
    pub sql_min_connections: Option<u32>,
    pub sql_acquire_timeout_ms: Option<u64>,
    pub sql_idle_timeout_ms: Option<u64>,
    pub sql_statement_timeout_ms: Option<u64>,

    /// Supabase project URL; leaving it unset disables the remote engine.
    pub remote_url: Option<String>,
    /// Service key sent as `apikey` and bearer token.
    pub remote_key: Option<String>,
    pub remote_timeout_ms: Option<u64>,
}

impl EngineSettings {
    /// Validated default project, if configured.
    pub fn default_project(&self) -> Result<Option<ProjectName>, SettingsError> {
        self.default_project
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(ProjectName::new)
            .transpose()
            .map_err(SettingsError::from)
    }

    /// Procedures exempt from the token requirement.
    pub fn public_procedures(&self) -> Vec<String> {
        match self.public_procedures.as_deref() {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_PUBLIC_PROCEDURES
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }

    pub fn platform_dir(&self) -> PathBuf {
        self.platform_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLATFORM_DIR))
    }

    pub fn runtime_mode(&self) -> Result<RuntimeMode, SettingsError> {
        self.runtime_mode
            .as_deref()
            .map_or(Ok(RuntimeMode::Production), str::parse)
            .map_err(SettingsError::from)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Relational pool configuration with defaults applied.
    pub fn pool_config(&self) -> PgPoolConfig {
        let mut config = PgPoolConfig::new(
            self.sql_host.as_deref().unwrap_or(DEFAULT_SQL_HOST),
            self.sql_port.unwrap_or(DEFAULT_SQL_PORT),
            self.sql_user.as_deref().unwrap_or(DEFAULT_SQL_USER),
            self.sql_password.clone().unwrap_or_default(),
        );
        if let Some(schema) = self.sql_schema.as_deref().filter(|s| !s.trim().is_empty()) {
            config = config.with_schema(schema);
        }
        if let Some(max) = self.sql_max_connections {
            config = config.with_max_connections(max);
        }
        if let Some(min) = self.sql_min_connections {
            config = config.with_min_connections(min);
        }
        if let Some(ms) = self.sql_acquire_timeout_ms {
            config = config.with_acquire_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.sql_idle_timeout_ms {
            config = config.with_idle_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.sql_statement_timeout_ms {
            config = config.with_statement_timeout(Duration::from_millis(ms));
        }
        config
    }

    /// Remote engine settings, or `None` when no URL is configured.
    pub fn remote(&self) -> Result<Option<RemoteSettings>, SettingsError> {
        let Some(raw) = self.remote_url.as_deref().filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        let url = Url::parse(raw.trim()).map_err(|source| SettingsError::RemoteUrl {
            value: raw.to_owned(),
            source,
        })?;
        let key = self
            .remote_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SettingsError::MissingRemoteKey)?;
        Ok(Some(RemoteSettings {
            url,
            key,
            timeout: Duration::from_millis(
                self.remote_timeout_ms.unwrap_or(DEFAULT_REMOTE_TIMEOUT_MS),
            ),
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for engine configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "HYBRID_ENGINE_DEFAULT_PROJECT",
        "HYBRID_ENGINE_PUBLIC_PROCEDURES",
        "HYBRID_ENGINE_PLATFORM_DIR",
        "HYBRID_ENGINE_RUNTIME_MODE",
        "HYBRID_ENGINE_REQUIRE_TOKEN",
        "HYBRID_ENGINE_BIND_ADDR",
        "HYBRID_ENGINE_SQL_PORT",
        "HYBRID_ENGINE_REMOTE_URL",
        "HYBRID_ENGINE_REMOTE_KEY",
    ];

    fn load_from_empty_args() -> EngineSettings {
        EngineSettings::load_from_iter([OsString::from("hybrid-engine")])
            .expect("config should load")
    }

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|var| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == var)
                    .map(|(_, value)| (*value).to_owned());
                (*var, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert!(!settings.require_token);
        assert_eq!(settings.default_project().expect("project"), None);
        assert_eq!(settings.platform_dir(), PathBuf::from(DEFAULT_PLATFORM_DIR));
        assert_eq!(settings.runtime_mode().expect("mode"), RuntimeMode::Production);
        assert_eq!(settings.bind_addr().expect("addr").port(), 8080);
        assert!(settings.remote().expect("remote").is_none());
        assert_eq!(settings.pool_config().schema(), "dbo");
        assert_eq!(settings.public_procedures(), ["auth.login"]);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("HYBRID_ENGINE_DEFAULT_PROJECT", "ecom"),
            ("HYBRID_ENGINE_RUNTIME_MODE", "development"),
            ("HYBRID_ENGINE_REQUIRE_TOKEN", "true"),
            ("HYBRID_ENGINE_BIND_ADDR", "127.0.0.1:9090"),
            ("HYBRID_ENGINE_REMOTE_URL", "https://abc.supabase.co"),
            ("HYBRID_ENGINE_REMOTE_KEY", "service-key"),
        ]));

        let settings = load_from_empty_args();
        assert!(settings.require_token);
        assert_eq!(
            settings
                .default_project()
                .expect("project")
                .as_ref()
                .map(ProjectName::as_str),
            Some("ecom")
        );
        assert_eq!(settings.runtime_mode().expect("mode"), RuntimeMode::Development);
        assert_eq!(settings.bind_addr().expect("addr").port(), 9090);
        let remote = settings.remote().expect("remote").expect("configured");
        assert_eq!(remote.url.host_str(), Some("abc.supabase.co"));
        assert_eq!(remote.timeout, Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS));
    }

    #[rstest]
    fn remote_url_without_key_is_rejected() {
        let _guard = lock_env(env_with(&[(
            "HYBRID_ENGINE_REMOTE_URL",
            "https://abc.supabase.co",
        )]));

        let error = load_from_empty_args().remote().expect_err("missing key");
        assert!(matches!(error, SettingsError::MissingRemoteKey));
    }

    #[rstest]
    fn unknown_runtime_modes_are_rejected() {
        let _guard = lock_env(env_with(&[("HYBRID_ENGINE_RUNTIME_MODE", "staging")]));

        assert!(load_from_empty_args().runtime_mode().is_err());
    }

    #[rstest]
    #[case("auth.login, auth.forgotPassword", &["auth.login", "auth.forgotPassword"])]
    #[case("", &[])]
    #[case(" , ", &[])]
    fn public_procedures_are_comma_separated(#[case] raw: &str, #[case] expected: &[&str]) {
        let _guard = lock_env(env_with(&[("HYBRID_ENGINE_PUBLIC_PROCEDURES", raw)]));

        assert_eq!(load_from_empty_args().public_procedures(), expected);
    }
}
