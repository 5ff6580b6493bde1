//! `architecture-lint` binary.
//!
//! Usage: `architecture-lint [BACKEND_DIR]`. Without an argument the backend
//! crate is found by walking up to the workspace manifest.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use architecture_lint::ArchitectureLintError;

const BACKEND_CRATE_DIR: &str = "backend";

fn main() -> ExitCode {
    let backend_dir = match env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => match locate_backend() {
            Some(dir) => dir,
            None => {
                report(&"no workspace Cargo.toml found above the current directory");
                return ExitCode::FAILURE;
            }
        },
    };

    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            if let ArchitectureLintError::Violations(violations) = &err {
                report(&format!("{} boundary violation(s)", violations.len()));
                ExitCode::FAILURE
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn report(message: &dyn std::fmt::Display) {
    let _ = writeln!(io::stderr().lock(), "{message}");
}

fn locate_backend() -> Option<PathBuf> {
    let candidates = [
        env::var_os("CARGO_WORKSPACE_DIR").map(PathBuf::from),
        env::current_dir().ok(),
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|start| workspace_root(&start))
        .map(|root| root.join(BACKEND_CRATE_DIR))
}

fn workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            fs::read_to_string(dir.join("Cargo.toml"))
                .is_ok_and(|manifest| manifest.contains("[workspace]"))
        })
        .map(Path::to_path_buf)
}
