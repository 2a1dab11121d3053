//! Value types shared by the discovery pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Suffix of archive entries that define one compiled type.
pub const TYPE_ENTRY_SUFFIX: &str = ".type";
/// Qualifier separator used in type descriptor names.
pub const QUALIFIER_SEPARATOR: &str = "::";

/// A bundle file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleFile {
    path: PathBuf,
}

impl ModuleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for diagnostics.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for ModuleFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Fully-qualified name of one compiled type inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Translate an archive entry name (`pkg/Alpha.type`) into a descriptor
    /// (`pkg::Alpha`). Returns `None` for entries that do not define a type.
    pub fn from_entry_name(entry: &str) -> Option<Self> {
        let stem = entry.strip_suffix(TYPE_ENTRY_SUFFIX)?;
        let stem = stem.trim_start_matches('/');
        if stem.is_empty() || stem.ends_with('/') {
            return None;
        }
        Some(Self(stem.replace('/', QUALIFIER_SEPARATOR)))
    }

    /// Archive entry name for this descriptor.
    pub fn entry_name(&self) -> String {
        format!(
            "{}{}",
            self.0.replace(QUALIFIER_SEPARATOR, "/"),
            TYPE_ENTRY_SUFFIX
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Where a type resolved inside the loading namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum TypeOrigin {
    /// Native library of a discovered bundle.
    Module(PathBuf),
    /// The host's own type universe.
    Host,
}

impl fmt::Display for TypeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(path) => write!(f, "module {}", path.display()),
            Self::Host => write!(f, "host"),
        }
    }
}

/// Lifecycle state of one registered extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionState {
    #[default]
    Constructed,
    Activated,
    Deactivated,
}

impl fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructed => write!(f, "Constructed"),
            Self::Activated => write!(f, "Activated"),
            Self::Deactivated => write!(f, "Deactivated"),
        }
    }
}
