//! Plugin registry holding the extensions built by a discovery pass.
//!
//! The registry is append-only and keeps insertion order, which is the
//! module discovery order. After the pass only the per-entry lifecycle
//! state changes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use plughost_extension_sdk::Extension;
use serde::Serialize;

use super::namespace::Instance;
use super::native::LoadedLibrary;
use super::types::{ExtensionState, TypeDescriptor, TypeOrigin};

/// Information about a registered extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionInfo {
    /// Descriptor the instance was constructed from
    pub type_name: TypeDescriptor,
    /// Module file that named the type
    pub module: PathBuf,
    /// Where the type resolved
    pub origin: TypeOrigin,
    /// Current lifecycle state
    pub state: ExtensionState,
    /// When the extension was constructed
    pub loaded_at: DateTime<Utc>,
}

/// One registry entry.
///
/// `instance` is declared before `library` so the extension is dropped while
/// its code is still mapped.
pub struct RegisteredExtension {
    type_name: TypeDescriptor,
    module: PathBuf,
    origin: TypeOrigin,
    pub(crate) state: ExtensionState,
    loaded_at: DateTime<Utc>,
    pub(crate) instance: Box<dyn Extension>,
    _library: Option<Arc<LoadedLibrary>>,
}

impl RegisteredExtension {
    pub fn type_name(&self) -> &TypeDescriptor {
        &self.type_name
    }

    pub fn module(&self) -> &Path {
        &self.module
    }

    pub fn origin(&self) -> &TypeOrigin {
        &self.origin
    }

    pub fn state(&self) -> ExtensionState {
        self.state
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            type_name: self.type_name.clone(),
            module: self.module.clone(),
            origin: self.origin.clone(),
            state: self.state,
            loaded_at: self.loaded_at,
        }
    }
}

impl fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("type_name", &self.type_name)
            .field("module", &self.module)
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of constructed extensions.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: Vec<RegisteredExtension>,
    /// Entry whose activation failed; set once, never cleared.
    pub(crate) activation_failed: Option<usize>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constructed instance. Only the loader adds entries.
    pub(crate) fn register(&mut self, type_name: TypeDescriptor, module: &Path, instance: Instance) {
        let Instance {
            extension,
            library,
            origin,
        } = instance;

        self.entries.push(RegisteredExtension {
            type_name,
            module: module.to_path_buf(),
            origin,
            state: ExtensionState::Constructed,
            loaded_at: Utc::now(),
            instance: extension,
            _library: library,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredExtension> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RegisteredExtension> {
        self.entries.get(index)
    }

    /// Entry registered from a module file.
    pub fn by_module(&self, module: &Path) -> Option<&RegisteredExtension> {
        self.entries.iter().find(|e| e.module == module)
    }

    /// Type names in registry order.
    pub fn type_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.type_name.as_str()).collect()
    }

    /// Snapshot of every entry.
    pub fn list(&self) -> Vec<ExtensionInfo> {
        self.entries.iter().map(RegisteredExtension::info).collect()
    }

    pub(crate) fn entries_mut(&mut self) -> std::slice::IterMut<'_, RegisteredExtension> {
        self.entries.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plughost_extension_sdk::ExtensionResult;

    struct Noop;

    impl Extension for Noop {
        fn activate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }

        fn deactivate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }
    }

    fn instance() -> Instance {
        Instance {
            extension: Box::new(Noop),
            library: None,
            origin: TypeOrigin::Host,
        }
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = PluginRegistry::new();
        registry.register("pkg::B".into(), Path::new("/ext/b.bundle"), instance());
        registry.register("pkg::A".into(), Path::new("/ext/a.bundle"), instance());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.type_names(), vec!["pkg::B", "pkg::A"]);
        assert_eq!(
            registry.by_module(Path::new("/ext/a.bundle")).unwrap().type_name().as_str(),
            "pkg::A"
        );
        assert!(registry
            .iter()
            .all(|e| e.state() == ExtensionState::Constructed));
    }

    #[test]
    fn test_info_snapshot() {
        let mut registry = PluginRegistry::new();
        registry.register("pkg::A".into(), Path::new("/ext/a.bundle"), instance());

        let info = registry.list().remove(0);
        assert_eq!(info.type_name.as_str(), "pkg::A");
        assert_eq!(info.origin, TypeOrigin::Host);
        assert_eq!(info.state, ExtensionState::Constructed);
        assert!(info.loaded_at <= Utc::now());
    }
}
