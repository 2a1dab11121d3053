//! Bundle archive layout and writer.
//!
//! ```text
//! alpha.bundle (zip)
//! ├── native/libalpha.so     optional shared library exporting `plughost_type_table`
//! └── pkg/Alpha.type         one entry per exported type, descriptor `pkg::Alpha`
//! ```

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::types::TypeDescriptor;
use crate::error::BundleError;

/// Archive directory holding the native payload.
pub const NATIVE_DIR: &str = "native/";

/// Whether an archive entry is the native payload for this platform.
pub fn is_native_entry(name: &str) -> bool {
    let Some(file) = name.strip_prefix(NATIVE_DIR) else {
        return false;
    };
    !file.is_empty()
        && !file.ends_with('/')
        && Path::new(file)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
            .unwrap_or(false)
}

#[derive(Debug, Clone)]
enum PendingEntry {
    Directory(String),
    File { name: String, data: Vec<u8> },
    Library(PathBuf),
}

/// Builds bundle archives.
#[derive(Debug, Clone, Default)]
pub struct BundleWriter {
    entries: Vec<PendingEntry>,
}

impl BundleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type definition entry for a descriptor name.
    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.entries.push(PendingEntry::File {
            name: TypeDescriptor::new(name).entry_name(),
            data: Vec::new(),
        });
        self
    }

    /// Add a shared library as the native payload.
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.entries.push(PendingEntry::Library(path.into()));
        self
    }

    /// Add an arbitrary file entry.
    pub fn with_entry(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.entries.push(PendingEntry::File {
            name: name.into(),
            data,
        });
        self
    }

    /// Add a directory entry.
    pub fn with_directory(mut self, name: impl Into<String>) -> Self {
        self.entries.push(PendingEntry::Directory(name.into()));
        self
    }

    /// Write the archive. A partially written file is removed on failure.
    pub fn write_to(&self, path: &Path) -> Result<(), BundleError> {
        let file = File::create(path)?;
        let cleanup = scopeguard::guard(path.to_path_buf(), |partial| {
            let _ = std::fs::remove_file(partial);
        });

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(file);

        for entry in &self.entries {
            match entry {
                PendingEntry::Directory(name) => {
                    zip.add_directory(name.as_str(), options)?;
                }
                PendingEntry::File { name, data } => {
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(data)?;
                }
                PendingEntry::Library(library) => {
                    let file_name = library
                        .file_name()
                        .and_then(|n| n.to_str())
                        .ok_or_else(|| {
                            BundleError::InvalidEntryName(library.display().to_string())
                        })?;
                    let bytes = std::fs::read(library)?;
                    zip.start_file(format!("{NATIVE_DIR}{file_name}"), options)?;
                    zip.write_all(&bytes)?;
                }
            }
        }

        zip.finish()?;
        scopeguard::ScopeGuard::into_inner(cleanup);
        Ok(())
    }
}
