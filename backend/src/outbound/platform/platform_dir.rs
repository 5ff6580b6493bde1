//! Capability-scoped access to the platform directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use thiserror::Error;

use crate::domain::ProjectName;

/// Errors raised while opening the platform directory.
#[derive(Debug, Error)]
#[error("failed to open platform directory {path}: {source}")]
pub struct PlatformDirError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

/// Root directory holding one sub-directory per project.
///
/// Reads are confined to this directory; project names are validated
/// identifiers, so they cannot climb out of it.
#[derive(Debug, Clone)]
pub struct PlatformDir {
    dir: Arc<Dir>,
}

impl PlatformDir {
    /// Open `path` with ambient authority.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformDirError`] when the directory cannot be opened.
    pub fn open(path: &Path) -> Result<Self, PlatformDirError> {
        Dir::open_ambient_dir(path, ambient_authority())
            .map(|dir| Self { dir: Arc::new(dir) })
            .map_err(|source| PlatformDirError {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Read `<project>/<file>`; `Ok(None)` when the file does not exist.
    pub(super) async fn read(
        &self,
        project: &ProjectName,
        file: &'static str,
    ) -> io::Result<Option<String>> {
        let dir = Arc::clone(&self.dir);
        let path = Path::new(project.as_str()).join(file);
        tokio::task::spawn_blocking(move || match dir.read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        })
        .await
        .map_err(io::Error::other)?
    }
}
