//! File-backed registry and project configuration sources.
//!
//! Each project owns a directory under the platform root:
//!
//! ```text
//! <platform_dir>/<project>/procedures.json
//! <platform_dir>/<project>/config.json
//! ```

mod file_project_config_source;
mod file_registry_source;
mod platform_dir;

pub use file_project_config_source::FileProjectConfigSource;
pub use file_registry_source::FileRegistrySource;
pub use platform_dir::{PlatformDir, PlatformDirError};
