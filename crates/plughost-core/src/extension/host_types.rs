//! The host's own type universe.
//!
//! Names that no discovered module defines are looked up here, so a bundle
//! can name a type compiled into the host (or into an SDK table the host
//! links statically) and still have it constructed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use plughost_extension_sdk::{capabilities, Extension, ExtensionError, TypeEntry};
use tracing::warn;

use super::namespace::TypeConstructor;

/// Fallible zero-argument constructor supplied by the host.
pub type HostConstructor =
    Arc<dyn Fn() -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct HostType {
    pub(crate) capabilities: u64,
    pub(crate) constructor: Option<TypeConstructor>,
}

/// Catalog of host-provided types, keyed by descriptor name.
#[derive(Clone, Default)]
pub struct HostTypes {
    types: HashMap<String, HostType>,
}

impl HostTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension type built through `Default`.
    pub fn register_extension<T>(&mut self, name: impl Into<String>) -> &mut Self
    where
        T: Extension + Default + 'static,
    {
        self.register_constructor(name, || Ok(Box::new(T::default()) as Box<dyn Extension>))
    }

    /// Register an extension type with a fallible constructor.
    pub fn register_constructor<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Extension>, ExtensionError> + Send + Sync + 'static,
    {
        self.insert(
            name.into(),
            HostType {
                capabilities: capabilities::EXTENSION,
                constructor: Some(TypeConstructor::Host(Arc::new(constructor))),
            },
        )
    }

    /// Register an extension type that has no zero-argument constructor.
    pub fn register_without_constructor(&mut self, name: impl Into<String>) -> &mut Self {
        self.insert(
            name.into(),
            HostType {
                capabilities: capabilities::EXTENSION,
                constructor: None,
            },
        )
    }

    /// Register a type that is not an extension.
    pub fn register_opaque(&mut self, name: impl Into<String>) -> &mut Self {
        self.insert(
            name.into(),
            HostType {
                capabilities: 0,
                constructor: None,
            },
        )
    }

    /// Import SDK type entries compiled into the host.
    ///
    /// Entries without a readable name are skipped with a warning.
    pub fn register_table(&mut self, entries: &'static [TypeEntry]) -> &mut Self {
        for (i, entry) in entries.iter().enumerate() {
            // SAFETY: 'static entries point at 'static names
            let Some(name) = (unsafe { entry.name() }) else {
                warn!(index = i, "Skipping host type entry without a valid name");
                continue;
            };
            self.insert(
                name.to_string(),
                HostType {
                    capabilities: entry.capabilities,
                    constructor: entry.construct.map(TypeConstructor::Native),
                },
            );
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&HostType> {
        self.types.get(name)
    }

    fn insert(&mut self, name: String, host_type: HostType) -> &mut Self {
        if self.types.insert(name.clone(), host_type).is_some() {
            warn!(type_name = %name, "Host type registered twice, keeping the latest");
        }
        self
    }
}

impl fmt::Debug for HostTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        f.debug_struct("HostTypes").field("types", &names).finish()
    }
}
