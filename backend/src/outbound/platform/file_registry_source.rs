//! `procedures.json` registry source.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::PlatformDir;
use crate::domain::ports::{RegistrySource, RegistrySourceError};
use crate::domain::{DatabaseScope, ProcedureName, ProcedureTable, ProjectName};

const REGISTRY_FILE: &str = "procedures.json";

#[derive(Debug, Deserialize)]
struct RegistryFileDto {
    procedures: BTreeMap<String, ProcedureDto>,
}

#[derive(Debug, Deserialize)]
struct ProcedureDto {
    db: String,
}

fn scope(procedure: &str, raw: &str) -> Result<DatabaseScope, RegistrySourceError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "MASTER" => Ok(DatabaseScope::Master),
        "TENANT" => Ok(DatabaseScope::Tenant),
        other => Err(RegistrySourceError::malformed(format!(
            "procedure '{procedure}' has unknown db scope '{other}'"
        ))),
    }
}

/// Parse a registry document into a [`ProcedureTable`].
fn parse_registry(contents: &str) -> Result<ProcedureTable, RegistrySourceError> {
    let file: RegistryFileDto = serde_json::from_str(contents)
        .map_err(|error| RegistrySourceError::malformed(error.to_string()))?;

    file.procedures
        .into_iter()
        .try_fold(ProcedureTable::default(), |table, (name, entry)| {
            let scope = scope(&name, &entry.db)?;
            let procedure = ProcedureName::new(&name)
                .map_err(|error| RegistrySourceError::malformed(error.to_string()))?;
            Ok(table.with(procedure, scope))
        })
}

/// [`RegistrySource`] reading `<platform_dir>/<project>/procedures.json`.
#[derive(Debug, Clone)]
pub struct FileRegistrySource {
    platform: PlatformDir,
}

impl FileRegistrySource {
    pub fn new(platform: PlatformDir) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl RegistrySource for FileRegistrySource {
    async fn load(&self, project: &ProjectName) -> Result<ProcedureTable, RegistrySourceError> {
        let contents = self
            .platform
            .read(project, REGISTRY_FILE)
            .await
            .map_err(|error| RegistrySourceError::unreadable(error.to_string()))?
            .ok_or_else(|| RegistrySourceError::missing(project.as_str()))?;
        let table = parse_registry(&contents)?;
        debug!(project = %project, procedures = table.len(), "registry file parsed");
        Ok(table)
    }
}
