//! Bundle indexer: lists the type descriptors inside a bundle archive.
//!
//! Only the archive's central directory is read. No entry is decompressed and
//! no type is loaded, so cost tracks the number of entries rather than the
//! size of their contents.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info, warn};
use zip::ZipArchive;

use super::types::{ModuleFile, TypeDescriptor};
use crate::error::BundleError;

/// Descriptors collected from one bundle.
#[derive(Debug)]
pub struct BundleIndex {
    /// Descriptors in archive order.
    pub descriptors: Vec<TypeDescriptor>,
    /// Failure that cut indexing short; `descriptors` holds what was read first.
    pub error: Option<BundleError>,
}

impl BundleIndex {
    pub fn into_descriptors(self) -> Vec<TypeDescriptor> {
        self.descriptors
    }
}

/// Enumerates type descriptors without loading anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleIndexer {
    verbose: bool,
}

impl BundleIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Index one module file.
    ///
    /// Read failures are logged and returned alongside the descriptors read
    /// before the failure; they never abort the pass.
    pub fn index(&self, module: &ModuleFile) -> BundleIndex {
        let mut descriptors = Vec::new();
        let error = read_descriptors(module.path(), &mut descriptors).err();

        if let Some(e) = &error {
            warn!(
                module = %module.path().display(),
                error = %e,
                collected = descriptors.len(),
                "Failed to read bundle archive"
            );
        }
        for descriptor in &descriptors {
            if self.verbose {
                info!(module = %module.file_name(), descriptor = %descriptor, "Indexed type");
            } else {
                debug!(module = %module.file_name(), descriptor = %descriptor, "Indexed type");
            }
        }

        BundleIndex { descriptors, error }
    }
}

fn read_descriptors(path: &Path, out: &mut Vec<TypeDescriptor>) -> Result<(), BundleError> {
    let file = File::open(path)?;
    let archive = ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let Some(raw) = archive.name_for_index(i) else {
            continue;
        };
        let name = raw.replace('\\', "/");
        if name.ends_with('/') {
            continue;
        }
        if let Some(descriptor) = TypeDescriptor::from_entry_name(&name) {
            out.push(descriptor);
        }
    }

    Ok(())
}
