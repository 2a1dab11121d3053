//! Per-pass discovery report.
//!
//! Every recoverable failure inside a pass is recorded here as well as logged,
//! so callers can assert on reasons instead of log text.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::types::{TypeDescriptor, TypeOrigin};

/// Outcome of scanning the extension directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ScanStatus {
    /// Directory existed and was listed.
    Listed,
    /// Directory was missing and has been created (first run).
    Created,
    /// Directory could not be created or listed.
    Unavailable { reason: String },
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listed => write!(f, "listed"),
            Self::Created => write!(f, "created"),
            Self::Unavailable { reason } => write!(f, "unavailable: {}", reason),
        }
    }
}

/// Why a descriptor did not produce a registered instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// Name did not resolve in the loading namespace.
    NotFound,
    /// Resolved type lacks the extension capability.
    NotAnExtension,
    /// Resolved extension type has no zero-argument constructor.
    MissingConstructor,
    /// Constructor ran and failed.
    ConstructionFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "type not found"),
            Self::NotAnExtension => write!(f, "not an extension"),
            Self::MissingConstructor => write!(f, "no zero-argument constructor"),
            Self::ConstructionFailed(reason) => write!(f, "construction failed: {}", reason),
        }
    }
}

/// Outcome of one descriptor attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Registered { origin: TypeOrigin },
    Skipped(SkipReason),
}

/// One descriptor tried for a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorAttempt {
    pub descriptor: TypeDescriptor,
    pub outcome: AttemptOutcome,
}

/// Everything that happened to one candidate module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub module: PathBuf,
    /// Set when the archive could not be read completely.
    pub index_error: Option<String>,
    /// Set when the bundle carried a native library that could not be opened.
    pub native_error: Option<String>,
    /// Attempts in descriptor order; stops after the first registration.
    pub attempts: Vec<DescriptorAttempt>,
    /// Name of the type registered for this module, if any.
    pub registered: Option<TypeDescriptor>,
}

impl ModuleReport {
    pub fn new(module: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            index_error: None,
            native_error: None,
            attempts: Vec::new(),
            registered: None,
        }
    }

    /// Reasons for every skipped descriptor, in attempt order.
    pub fn skip_reasons(&self) -> Vec<(&TypeDescriptor, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|attempt| match &attempt.outcome {
                AttemptOutcome::Skipped(reason) => Some((&attempt.descriptor, reason)),
                AttemptOutcome::Registered { .. } => None,
            })
            .collect()
    }
}

/// Report of one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub directory: PathBuf,
    pub scan: ScanStatus,
    /// Module reports in discovery order.
    pub modules: Vec<ModuleReport>,
    pub elapsed_ms: u64,
}

impl DiscoveryReport {
    pub fn new(directory: impl Into<PathBuf>, scan: ScanStatus) -> Self {
        Self {
            directory: directory.into(),
            scan,
            modules: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn registered_count(&self) -> usize {
        self.modules
            .iter()
            .filter(|m| m.registered.is_some())
            .count()
    }

    /// Report for a module path.
    pub fn module(&self, path: &Path) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.module == path)
    }

    /// Every skipped descriptor across all modules.
    pub fn skipped(&self) -> Vec<(&Path, &TypeDescriptor, &SkipReason)> {
        self.modules
            .iter()
            .flat_map(|m| {
                m.skip_reasons()
                    .into_iter()
                    .map(move |(descriptor, reason)| (m.module.as_path(), descriptor, reason))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiscoveryReport {
        let mut report = DiscoveryReport::new("/ext", ScanStatus::Listed);

        let mut alpha = ModuleReport::new("/ext/alpha.bundle");
        alpha.attempts.push(DescriptorAttempt {
            descriptor: TypeDescriptor::new("pkg::Helper"),
            outcome: AttemptOutcome::Skipped(SkipReason::NotAnExtension),
        });
        alpha.attempts.push(DescriptorAttempt {
            descriptor: TypeDescriptor::new("pkg::Alpha"),
            outcome: AttemptOutcome::Registered {
                origin: TypeOrigin::Host,
            },
        });
        alpha.registered = Some(TypeDescriptor::new("pkg::Alpha"));
        report.modules.push(alpha);

        let mut broken = ModuleReport::new("/ext/broken.bundle");
        broken.index_error = Some("invalid Zip archive".to_string());
        report.modules.push(broken);

        report
    }

    #[test]
    fn test_counts_and_lookup() {
        let report = sample();
        assert_eq!(report.registered_count(), 1);
        assert!(report
            .module(Path::new("/ext/broken.bundle"))
            .and_then(|m| m.index_error.as_ref())
            .is_some());
        assert!(report.module(Path::new("/ext/missing.bundle")).is_none());
    }

    #[test]
    fn test_skipped_lists_reasons() {
        let report = sample();
        let skipped = report.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].1.as_str(), "pkg::Helper");
        assert_eq!(skipped[0].2, &SkipReason::NotAnExtension);
    }

    #[test]
    fn test_display() {
        assert_eq!(SkipReason::NotFound.to_string(), "type not found");
        assert_eq!(
            SkipReason::ConstructionFailed("boom".to_string()).to_string(),
            "construction failed: boom"
        );
        assert_eq!(ScanStatus::Created.to_string(), "created");
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["scan"]["status"], "listed");
        assert_eq!(json["modules"][0]["registered"], "pkg::Alpha");
        assert_eq!(
            json["modules"][0]["attempts"][0]["outcome"]["skipped"]["reason"],
            "not_an_extension"
        );
    }
}
