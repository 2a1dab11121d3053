//! Extension discovery pipeline.
//!
//! Extensions are bundles (`.bundle` zip archives) dropped into one
//! directory. A discovery pass turns them into activated extension
//! instances:
//!
//! ```text
//! ModuleScanner ──▶ BundleIndexer ──▶ DynamicLoader ──▶ PluginRegistry
//!  (directory)       (.type entries)   (LoadingNamespace)  (activate_all /
//!                                                            deactivate_all)
//! ```
//!
//! Every failure before activation is local to one module or descriptor. It
//! is logged and recorded in the [`DiscoveryReport`], and the pass goes on.
//!
//! # Usage
//!
//! ```rust,ignore
//! use plughost_core::extension::{DynamicLoader, HostTypes, ModuleScanner};
//!
//! let scan = ModuleScanner::new().scan(Path::new("extensions"));
//! let mut result = DynamicLoader::new(HostTypes::new()).load(&scan.modules);
//! result.registry.activate_all()?;
//! // ... host runs ...
//! result.registry.deactivate_all();
//! ```

pub mod bundle;
pub mod host_types;
pub mod indexer;
pub mod lifecycle;
pub mod loader;
pub mod namespace;
pub mod native;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod types;

use std::path::Path;

pub use bundle::BundleWriter;
pub use host_types::{HostConstructor, HostTypes};
pub use indexer::{BundleIndex, BundleIndexer};
pub use loader::{DynamicLoader, LoadResult};
pub use namespace::{Instance, LoadingNamespace, ResolvedType};
pub use native::{LoadedLibrary, NativeModule, NativeType};
pub use registry::{ExtensionInfo, PluginRegistry, RegisteredExtension};
pub use report::{
    AttemptOutcome, DescriptorAttempt, DiscoveryReport, ModuleReport, ScanStatus, SkipReason,
};
pub use scanner::{ModuleScanner, ScanResult};
pub use types::{ExtensionState, ModuleFile, TypeDescriptor, TypeOrigin};

/// Check if a path is a bundle file.
pub fn is_bundle_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(crate::config::BUNDLE_EXTENSION))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_bundle_file() {
        let temp = TempDir::new().unwrap();
        let lower = temp.path().join("a.bundle");
        let upper = temp.path().join("b.Bundle");
        let other = temp.path().join("c.zip");
        for path in [&lower, &upper, &other] {
            std::fs::write(path, b"").unwrap();
        }

        assert!(is_bundle_file(&lower));
        assert!(is_bundle_file(&upper));
        assert!(!is_bundle_file(&other));
        assert!(!is_bundle_file(&temp.path().join("missing.bundle")));
    }
}
