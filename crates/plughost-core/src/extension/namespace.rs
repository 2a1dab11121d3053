//! The loading namespace: one resolution arena per discovery pass.
//!
//! The arena owns every native library opened for the pass and a search
//! order over them (discovery order), falling back to [`HostTypes`]. Because
//! all libraries of a pass live in the same arena, a type in one module may
//! refer to symbols exported by a sibling module.

use std::collections::HashSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use plughost_extension_sdk::{capabilities, take_instance, ConstructFn, Extension};
use tracing::{debug, info, warn};

use super::host_types::{HostConstructor, HostTypes};
use super::native::{LoadedLibrary, NativeModule};
use super::types::{ModuleFile, TypeDescriptor, TypeOrigin};
use crate::error::{ConstructError, NativeLoadError};

/// How a resolved type is built.
#[derive(Clone)]
pub(crate) enum TypeConstructor {
    /// Constructor exported through a type table.
    Native(ConstructFn),
    /// Closure registered by the host.
    Host(HostConstructor),
}

impl TypeConstructor {
    fn construct(&self) -> Result<Box<dyn Extension>, ConstructError> {
        match self {
            Self::Native(construct) => {
                // SAFETY: the owning library is kept open by the caller
                let raw = unsafe { construct() };
                // SAFETY: raw was produced by a ConstructFn and is taken once
                unsafe { take_instance(raw) }.ok_or(ConstructError::NullInstance)
            }
            Self::Host(constructor) => {
                match std::panic::catch_unwind(AssertUnwindSafe(|| constructor())) {
                    Ok(result) => result.map_err(ConstructError::from),
                    Err(payload) => Err(ConstructError::Panicked(panic_message(payload.as_ref()))),
                }
            }
        }
    }
}

impl fmt::Debug for TypeConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("Native"),
            Self::Host(_) => f.write_str("Host"),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A type found in the namespace.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    descriptor: TypeDescriptor,
    origin: TypeOrigin,
    capabilities: u64,
    constructor: Option<TypeConstructor>,
    library: Option<Arc<LoadedLibrary>>,
}

impl ResolvedType {
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn origin(&self) -> &TypeOrigin {
        &self.origin
    }

    /// Capability relation: is-a [`Extension`].
    pub fn is_extension(&self) -> bool {
        self.capabilities & capabilities::EXTENSION != 0
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }
}

/// A freshly constructed extension.
///
/// Fields drop in declaration order, so the instance goes before the library
/// holding its code.
pub struct Instance {
    pub(crate) extension: Box<dyn Extension>,
    pub(crate) library: Option<Arc<LoadedLibrary>>,
    pub(crate) origin: TypeOrigin,
}

impl Instance {
    pub fn origin(&self) -> &TypeOrigin {
        &self.origin
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("origin", &self.origin)
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}

struct ModuleSource {
    path: PathBuf,
    native: Result<Option<NativeModule>, NativeLoadError>,
}

/// Shared resolution arena for one discovery pass.
///
/// Released exactly once, when dropped. Release closes every library that
/// produced no instance; libraries backing an instance stay open until the
/// instance is gone.
pub struct LoadingNamespace {
    modules: Vec<ModuleSource>,
    host: HostTypes,
}

impl LoadingNamespace {
    /// Open the namespace over the distinct candidate locations.
    ///
    /// Failures to open a module's native payload are recorded, never fatal:
    /// that module's names simply fall through to the host types. An
    /// unreadable archive is left to the indexer to report.
    pub fn open(candidates: &[ModuleFile], host: HostTypes, verbose: bool) -> Self {
        let mut seen = HashSet::new();
        let mut modules = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let path = candidate.path();
            if !seen.insert(path.to_path_buf()) {
                continue;
            }

            let native = match NativeModule::from_bundle(path) {
                Err(NativeLoadError::Bundle(e)) => {
                    debug!(module = %candidate.file_name(), error = %e, "Bundle archive unreadable, no native library");
                    Ok(None)
                }
                other => other,
            };
            match &native {
                Ok(Some(module)) => {
                    if verbose {
                        info!(module = %candidate.file_name(), types = module.types().len(), "Opened native library");
                    } else {
                        debug!(module = %candidate.file_name(), types = module.types().len(), "Opened native library");
                    }
                }
                Ok(None) => {
                    debug!(module = %candidate.file_name(), "Bundle carries no native library");
                }
                Err(e) => {
                    warn!(module = %path.display(), error = %e, "Failed to open native library");
                }
            }

            modules.push(ModuleSource {
                path: path.to_path_buf(),
                native,
            });
        }

        Self { modules, host }
    }

    /// Number of distinct module locations in the search path.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Load failure recorded for a module location.
    pub fn native_error(&self, path: &Path) -> Option<&NativeLoadError> {
        self.modules
            .iter()
            .find(|m| m.path == path)
            .and_then(|m| m.native.as_ref().err())
    }

    /// Resolve a descriptor: modules in discovery order, then host types.
    pub fn resolve(&self, descriptor: &TypeDescriptor) -> Option<ResolvedType> {
        for module in &self.modules {
            let Ok(Some(native)) = &module.native else {
                continue;
            };
            if let Some(found) = native.find(descriptor.as_str()) {
                return Some(ResolvedType {
                    descriptor: descriptor.clone(),
                    origin: TypeOrigin::Module(module.path.clone()),
                    capabilities: found.capabilities,
                    constructor: found.construct.map(TypeConstructor::Native),
                    library: Some(Arc::clone(native.library())),
                });
            }
        }

        self.host.get(descriptor.as_str()).map(|host| ResolvedType {
            descriptor: descriptor.clone(),
            origin: TypeOrigin::Host,
            capabilities: host.capabilities,
            constructor: host.constructor.clone(),
            library: None,
        })
    }

    /// Run the zero-argument constructor of a resolved type.
    pub fn instantiate(&self, resolved: &ResolvedType) -> Result<Instance, ConstructError> {
        let constructor = resolved
            .constructor
            .as_ref()
            .ok_or(ConstructError::MissingConstructor)?;
        let extension = constructor.construct()?;

        Ok(Instance {
            extension,
            library: resolved.library.clone(),
            origin: resolved.origin.clone(),
        })
    }

    /// Release the namespace now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LoadingNamespace {
    // Only reports; the libraries close when `modules` drops after this.
    fn drop(&mut self) {
        let mut closed = 0usize;
        let mut retained = 0usize;
        for module in &self.modules {
            if let Ok(Some(native)) = &module.native {
                if Arc::strong_count(native.library()) > 1 {
                    retained += 1;
                } else {
                    closed += 1;
                }
            }
        }
        debug!(
            modules = self.modules.len(),
            closed, retained, "Released loading namespace"
        );
    }
}

impl fmt::Debug for LoadingNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<&Path> = self.modules.iter().map(|m| m.path.as_path()).collect();
        f.debug_struct("LoadingNamespace")
            .field("modules", &paths)
            .field("host", &self.host)
            .finish()
    }
}
