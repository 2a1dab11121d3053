//! Native module loading for .so/.dylib/.dll payloads.
//!
//! A bundle's native payload is staged into a temporary file and opened with
//! `libloading`. On Unix it is opened `RTLD_LAZY | RTLD_GLOBAL` so that a
//! module can bind symbols exported by sibling modules of the same pass.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};
use plughost_extension_sdk::{ConstructFn, TypeTable, TypeTableFn, ABI_VERSION, TYPE_TABLE_SYMBOL};
use tempfile::TempPath;
use zip::ZipArchive;

use super::bundle::is_native_entry;
use crate::error::{BundleError, NativeLoadError};

/// An opened shared library.
///
/// The staged copy is removed after the library is closed.
pub struct LoadedLibrary {
    library: Library,
    _staged: Option<TempPath>,
    source: PathBuf,
}

impl LoadedLibrary {
    /// Path of the bundle (or library) this was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl fmt::Debug for LoadedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// One entry of a module's type table.
#[derive(Debug, Clone)]
pub struct NativeType {
    pub name: String,
    pub capabilities: u64,
    pub construct: Option<ConstructFn>,
}

impl NativeType {
    pub fn is_extension(&self) -> bool {
        self.capabilities & plughost_extension_sdk::capabilities::EXTENSION != 0
    }
}

/// A loaded library together with its decoded type table.
#[derive(Debug)]
pub struct NativeModule {
    library: Arc<LoadedLibrary>,
    types: Vec<NativeType>,
}

impl NativeModule {
    /// Stage and open the native payload of a bundle.
    ///
    /// Returns `Ok(None)` when the bundle carries no payload for this platform.
    pub fn from_bundle(bundle: &Path) -> Result<Option<Self>, NativeLoadError> {
        let file = File::open(bundle).map_err(BundleError::from)?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(BundleError::from)?;

        let index = (0..archive.len()).find(|&i| {
            archive
                .by_index_raw(i)
                .map(|entry| !entry.is_dir() && is_native_entry(entry.name()))
                .unwrap_or(false)
        });
        let Some(index) = index else {
            return Ok(None);
        };

        // Archive-level failures above are also seen by the indexer; payload
        // failures from here on are this module's own.
        let mut entry = archive
            .by_index(index)
            .map_err(|e| NativeLoadError::Stage(e.into()))?;
        let staged = tempfile::Builder::new()
            .prefix("plughost-")
            .suffix(&format!(".{}", std::env::consts::DLL_EXTENSION))
            .tempfile()
            .map_err(NativeLoadError::Stage)?;
        let (mut out, staged_path) = staged.into_parts();
        std::io::copy(&mut entry, &mut out).map_err(NativeLoadError::Stage)?;
        drop(out);

        let library = open_shared(&staged_path).map_err(NativeLoadError::Open)?;
        Self::from_library(LoadedLibrary {
            library,
            _staged: Some(staged_path),
            source: bundle.to_path_buf(),
        })
        .map(Some)
    }

    /// Open a shared library in place.
    pub fn open(path: &Path) -> Result<Self, NativeLoadError> {
        let library = open_shared(path).map_err(NativeLoadError::Open)?;
        Self::from_library(LoadedLibrary {
            library,
            _staged: None,
            source: path.to_path_buf(),
        })
    }

    fn from_library(loaded: LoadedLibrary) -> Result<Self, NativeLoadError> {
        let table = {
            // SAFETY: the symbol is declared by the SDK with this signature
            let table_fn: Symbol<TypeTableFn> = unsafe { loaded.library.get(TYPE_TABLE_SYMBOL) }
                .map_err(NativeLoadError::SymbolNotFound)?;
            // SAFETY: the exporting function takes no arguments and returns by value
            unsafe { table_fn() }
        };
        // SAFETY: the table points into the library, which `loaded` keeps open
        let types = unsafe { decode_table(&table) }?;

        Ok(Self {
            library: Arc::new(loaded),
            types,
        })
    }

    /// Look up a type by name.
    pub fn find(&self, name: &str) -> Option<&NativeType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Types in table order.
    pub fn types(&self) -> &[NativeType] {
        &self.types
    }

    pub fn library(&self) -> &Arc<LoadedLibrary> {
        &self.library
    }
}

/// Decode a type table into owned entries.
///
/// # Safety
/// `table` must describe a live entry array whose names stay readable for the
/// duration of the call.
pub unsafe fn decode_table(table: &TypeTable) -> Result<Vec<NativeType>, NativeLoadError> {
    if table.abi_version != ABI_VERSION {
        return Err(NativeLoadError::IncompatibleVersion {
            expected: ABI_VERSION,
            got: table.abi_version,
        });
    }

    // SAFETY: forwarded from the caller
    let entries = unsafe { table.entries() };
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            // SAFETY: forwarded from the caller
            let name = unsafe { entry.name() }
                .filter(|n| !n.is_empty())
                .ok_or_else(|| NativeLoadError::InvalidTable(format!("entry {i} has no valid name")))?;
            Ok(NativeType {
                name: name.to_string(),
                capabilities: entry.capabilities,
                construct: entry.construct,
            })
        })
        .collect()
}

#[cfg(unix)]
fn open_shared(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_LAZY};

    // SAFETY: running library initializers is inherent to loading extensions
    unsafe { UnixLibrary::open(Some(path), RTLD_LAZY | RTLD_GLOBAL) }.map(Library::from)
}

#[cfg(not(unix))]
fn open_shared(path: &Path) -> Result<Library, libloading::Error> {
    // SAFETY: running library initializers is inherent to loading extensions
    unsafe { Library::new(path) }
}
