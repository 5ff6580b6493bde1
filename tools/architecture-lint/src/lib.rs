//! Layer boundary lint for the hybrid engine backend.
//!
//! The backend splits into `domain` (engine logic and ports), `inbound`
//! (HTTP) and `outbound` (PostgreSQL, Supabase RPC, platform files). This
//! crate parses each source file under those directories and reports:
//!
//! - `domain` code reaching for an adapter module or an infrastructure crate
//! - `inbound` adapters importing `outbound` modules or database/RPC crates
//! - `outbound` adapters importing `inbound` modules or the HTTP framework
//!
//! Run it with `cargo run -p architecture-lint` from the workspace root.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Name the backend crate is imported under from its own tests and bins.
const BACKEND_CRATE: &str = "hybrid_engine";

const HTTP_CRATES: [&str; 4] = ["actix", "actix_service", "actix_web", "awc"];
const ADAPTER_CRATES: [&str; 3] = ["sqlx", "reqwest", "cap_std"];

/// One import that crosses a layer boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Walking or reading the source tree failed.
    Io(io::Error),
    /// A file could not be parsed or sits outside every layer.
    Parse { file: PathBuf, message: String },
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "architecture lint could not read sources: {err}"),
            Self::Parse { file, message } => {
                write!(f, "architecture lint could not parse {}: {message}", file.display())
            }
            Self::Violations(violations) => {
                writeln!(f, "Layer boundary violations:")?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "- {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`; its first component picks the layer.
    pub file: PathBuf,
    pub contents: String,
}

/// Lint the `src/` tree of the backend crate at `backend_dir`.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    for layer in Layer::ALL {
        let dir = src_dir.join(layer.dir());
        if dir.is_dir() {
            read_tree(&src_dir, &dir, &mut sources)?;
        }
    }
    lint_sources(&sources)
}

/// Lint in-memory sources.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let parse_error = |message: String| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message,
        };
        let layer = Layer::of(&source.file)
            .ok_or_else(|| parse_error("file is not under domain/, inbound/ or outbound/".to_owned()))?;
        let parsed = syn::parse_file(&source.contents).map_err(|err| parse_error(err.to_string()))?;
        violations.extend(
            layer
                .check(&parsed)
                .into_iter()
                .map(|message| Violation {
                    file: source.file.clone(),
                    message,
                }),
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    const ALL: [Self; 3] = [Self::Domain, Self::Inbound, Self::Outbound];

    const fn dir(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn of(relative_path: &Path) -> Option<Self> {
        let first = relative_path.components().next()?.as_os_str().to_str()?;
        Self::ALL.into_iter().find(|layer| layer.dir() == first)
    }

    fn forbidden_modules(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["inbound", "outbound"],
            Self::Inbound => &["outbound"],
            Self::Outbound => &["inbound"],
        }
    }

    fn forbidden_crates(self) -> BTreeSet<&'static str> {
        match self {
            Self::Domain => HTTP_CRATES
                .into_iter()
                .chain(ADAPTER_CRATES)
                .chain(["ortho_config", "utoipa_swagger_ui"])
                .collect(),
            Self::Inbound => ADAPTER_CRATES.into_iter().collect(),
            Self::Outbound => HTTP_CRATES.into_iter().collect(),
        }
    }

    /// Sorted, de-duplicated violation messages for one parsed file.
    fn check(self, parsed: &syn::File) -> BTreeSet<String> {
        let mut paths = PathCollector::default();
        paths.visit_file(parsed);

        let crates = self.forbidden_crates();
        let layer = self.dir();
        let mut messages = BTreeSet::new();
        for path in &paths.0 {
            match Root::of(path) {
                Some(Root::Module(module)) if self.forbidden_modules().contains(&module) => {
                    messages.insert(format!("{layer} module must not depend on crate::{module}"));
                }
                Some(Root::Crate(name)) if crates.contains(name) => {
                    messages.insert(format!(
                        "{layer} module must not depend on external crate `{name}`"
                    ));
                }
                _ => {}
            }
        }
        messages
    }
}

/// What the first meaningful segment of a path refers to.
enum Root<'a> {
    Module(&'a str),
    Crate(&'a str),
}

impl<'a> Root<'a> {
    fn of(segments: &'a [String]) -> Option<Self> {
        let first = segments.first()?.as_str();
        if Layer::ALL.iter().any(|layer| layer.dir() == first) {
            return Some(Self::Module(first));
        }
        if first == BACKEND_CRATE {
            return segments.get(1).map(|next| Self::Module(next.as_str()));
        }
        if is_relative(first) {
            return segments
                .iter()
                .map(String::as_str)
                .find(|segment| !is_relative(segment))
                .map(Self::Module);
        }
        Some(Self::Crate(first))
    }
}

fn is_relative(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

/// Every path and `use` tree in a file, as segment lists.
#[derive(Default)]
struct PathCollector(BTreeSet<Vec<String>>);

impl PathCollector {
    fn flatten_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        let leaf = match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.flatten_use(&path.tree, prefix);
                prefix.pop();
                return;
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.flatten_use(item, prefix);
                }
                return;
            }
            syn::UseTree::Name(name) => name.ident.to_string(),
            syn::UseTree::Rename(rename) => rename.ident.to_string(),
            syn::UseTree::Glob(_) => "*".to_owned(),
        };
        let mut segments = prefix.clone();
        segments.push(leaf);
        self.0.insert(segments);
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !segments.is_empty() {
            self.0.insert(segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.flatten_use(&node.tree, &mut Vec::new());
    }
}

fn read_tree(
    src_root: &Path,
    dir: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            read_tree(src_root, &path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let file = path
                .strip_prefix(src_root)
                .map_err(|err| ArchitectureLintError::Parse {
                    file: path.clone(),
                    message: err.to_string(),
                })?
                .to_path_buf();
            let contents = fs::read_to_string(&path)?;
            sources.push(LintSource { file, contents });
        }
    }
    Ok(())
}
