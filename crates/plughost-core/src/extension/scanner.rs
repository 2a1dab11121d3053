//! Module scanner: enumerates bundle files in the extension directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::report::ScanStatus;
use super::types::ModuleFile;

/// Result of one scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Bundles in directory-listing order.
    pub modules: Vec<ModuleFile>,
    pub status: ScanStatus,
}

impl ScanResult {
    fn empty(status: ScanStatus) -> Self {
        Self {
            modules: Vec::new(),
            status,
        }
    }
}

/// Enumerates module files in a directory.
///
/// The listing order of the underlying directory read is kept as is; it is
/// the canonical discovery order for the rest of the pass. No sorting is
/// applied, so platforms with unstable listing order produce correspondingly
/// unstable registry order.
#[derive(Debug, Clone, Default)]
pub struct ModuleScanner {
    /// Module files owned by the host itself
    excluded: Vec<PathBuf>,
    verbose: bool,
}

impl ModuleScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Skip a module file the host already loaded on its own.
    pub fn exclude(mut self, path: impl AsRef<Path>) -> Self {
        self.excluded.push(normalize(path.as_ref()));
        self
    }

    /// Scan `directory` for bundles.
    ///
    /// A missing directory is created and yields an empty result. Creation or
    /// listing failures are logged and also yield an empty result.
    pub fn scan(&self, directory: &Path) -> ScanResult {
        if !directory.exists() {
            return match std::fs::create_dir_all(directory) {
                Ok(()) => {
                    info!(dir = %directory.display(), "Created extension directory");
                    ScanResult::empty(ScanStatus::Created)
                }
                Err(e) => {
                    warn!(dir = %directory.display(), error = %e, "Failed to create extension directory");
                    ScanResult::empty(ScanStatus::Unavailable {
                        reason: e.to_string(),
                    })
                }
            };
        }

        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %directory.display(), error = %e, "Failed to list extension directory");
                return ScanResult::empty(ScanStatus::Unavailable {
                    reason: e.to_string(),
                });
            }
        };

        let mut modules = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(dir = %directory.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            if !super::is_bundle_file(&path) {
                continue;
            }
            if self.is_excluded(&path) {
                debug!(module = %path.display(), "Skipping host-owned module");
                continue;
            }

            if self.verbose {
                info!(module = %path.display(), "Found module file");
            } else {
                debug!(module = %path.display(), "Found module file");
            }
            modules.push(ModuleFile::new(path));
        }

        ScanResult {
            modules,
            status: ScanStatus::Listed,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let path = normalize(path);
        self.excluded.iter().any(|excluded| *excluded == path)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
