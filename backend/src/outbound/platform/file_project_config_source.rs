//! `config.json` project configuration source.

use async_trait::async_trait;
use serde::Deserialize;

use super::PlatformDir;
use crate::domain::ports::{ProjectConfigSource, ProjectConfigSourceError};
use crate::domain::{DatabaseName, Engine, ProjectConfig, ProjectName};

const CONFIG_FILE: &str = "config.json";

/// Accepts both the short (`masterDb`, `clientDb`) and long key spellings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProjectConfigDto {
    #[serde(alias = "masterDatabase")]
    master_db: Option<String>,
    #[serde(alias = "tenantDatabaseDefault")]
    client_db: Option<String>,
    primary_engine: Option<Engine>,
}

fn database(raw: Option<String>) -> Result<Option<DatabaseName>, ProjectConfigSourceError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(DatabaseName::new)
        .transpose()
        .map_err(|error| ProjectConfigSourceError::malformed(error.to_string()))
}

fn parse_config(
    project: &ProjectName,
    contents: &str,
) -> Result<ProjectConfig, ProjectConfigSourceError> {
    let dto: ProjectConfigDto = serde_json::from_str(contents)
        .map_err(|error| ProjectConfigSourceError::malformed(error.to_string()))?;

    let master = database(dto.master_db)?.ok_or_else(|| {
        ProjectConfigSourceError::malformed(format!("project '{project}' declares no masterDb"))
    })?;
    let mut config = ProjectConfig::new(project.clone(), master)
        .with_primary_engine(dto.primary_engine.unwrap_or(Engine::Sql));
    if let Some(tenant) = database(dto.client_db)? {
        config = config.with_tenant_default(tenant);
    }
    Ok(config)
}

/// [`ProjectConfigSource`] reading `<platform_dir>/<project>/config.json`.
#[derive(Debug, Clone)]
pub struct FileProjectConfigSource {
    platform: PlatformDir,
}

impl FileProjectConfigSource {
    pub fn new(platform: PlatformDir) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl ProjectConfigSource for FileProjectConfigSource {
    async fn load(&self, project: &ProjectName) -> Result<ProjectConfig, ProjectConfigSourceError> {
        let contents = self
            .platform
            .read(project, CONFIG_FILE)
            .await
            .map_err(|error| ProjectConfigSourceError::unreadable(error.to_string()))?
            .ok_or_else(|| ProjectConfigSourceError::missing(project.as_str()))?;
        parse_config(project, &contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ecom() -> ProjectName {
        ProjectName::new("ecom").expect("project")
    }

    #[rstest]
    fn short_keys_are_read() {
        let config = parse_config(
            &ecom(),
            r#"{"project":"ecom","masterDb":"EcomSetup","clientDb":"ClientA_DB"}"#,
        )
        .expect("valid config");

        assert_eq!(config.master_database.as_str(), "EcomSetup");
        assert_eq!(
            config.tenant_database_default.as_ref().map(DatabaseName::as_str),
            Some("ClientA_DB")
        );
        assert_eq!(config.primary_engine, Engine::Sql);
    }

    #[rstest]
    fn long_keys_and_primary_engine_are_read() {
        let config = parse_config(
            &ecom(),
            r#"{"masterDatabase":"EcomSetup","tenantDatabaseDefault":"","primaryEngine":"remote"}"#,
        )
        .expect("valid config");

        assert!(config.tenant_database_default.is_none());
        assert_eq!(config.primary_engine, Engine::Remote);
    }

    #[rstest]
    #[case::no_master(r#"{"clientDb":"ClientA_DB"}"#)]
    #[case::bad_engine(r#"{"masterDb":"EcomSetup","primaryEngine":"oracle"}"#)]
    #[case::not_json("{")]
    fn invalid_documents_are_malformed(#[case] contents: &str) {
        let error = parse_config(&ecom(), contents).expect_err("invalid config");
        assert!(matches!(error, ProjectConfigSourceError::Malformed { .. }), "{error}");
    }
}
