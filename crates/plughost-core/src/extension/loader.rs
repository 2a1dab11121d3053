//! Dynamic loader: turns candidate modules into registered extensions.

use tracing::{debug, info, warn};

use super::host_types::HostTypes;
use super::indexer::BundleIndexer;
use super::namespace::{Instance, LoadingNamespace};
use super::registry::PluginRegistry;
use super::report::{AttemptOutcome, DescriptorAttempt, ModuleReport, SkipReason};
use super::types::{ModuleFile, TypeDescriptor};
use crate::error::ConstructError;

/// Registry and per-module outcomes of one load.
#[derive(Debug)]
pub struct LoadResult {
    pub registry: PluginRegistry,
    /// Module reports in discovery order.
    pub modules: Vec<ModuleReport>,
}

/// Loads at most one extension per candidate module.
#[derive(Debug, Clone, Default)]
pub struct DynamicLoader {
    host: HostTypes,
    indexer: BundleIndexer,
    verbose: bool,
}

impl DynamicLoader {
    pub fn new(host: HostTypes) -> Self {
        Self {
            host,
            indexer: BundleIndexer::new(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self.indexer = self.indexer.with_verbose(verbose);
        self
    }

    /// Load every candidate in discovery order.
    ///
    /// Nothing in here fails the pass. Unreadable archives, unresolvable
    /// names, non-extension types and failing constructors are logged and
    /// recorded in the module reports.
    pub fn load(&self, candidates: &[ModuleFile]) -> LoadResult {
        let namespace = LoadingNamespace::open(candidates, self.host.clone(), self.verbose);
        let mut registry = PluginRegistry::new();
        let mut modules = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            modules.push(self.load_module(&namespace, candidate, &mut registry));
        }

        namespace.release();
        info!(
            "Loaded {} extension(s) from {} module(s)",
            registry.len(),
            candidates.len()
        );

        LoadResult { registry, modules }
    }

    fn load_module(
        &self,
        namespace: &LoadingNamespace,
        candidate: &ModuleFile,
        registry: &mut PluginRegistry,
    ) -> ModuleReport {
        let mut report = ModuleReport::new(candidate.path());
        report.native_error = namespace
            .native_error(candidate.path())
            .map(|e| e.to_string());

        let index = self.indexer.index(candidate);
        report.index_error = index.error.as_ref().map(|e| e.to_string());

        // First descriptor that yields an instance wins; the rest are never tried.
        for descriptor in index.into_descriptors() {
            match self.try_descriptor(namespace, candidate, &descriptor) {
                Ok(instance) => {
                    info!(
                        module = %candidate.file_name(),
                        extension = %descriptor,
                        origin = %instance.origin(),
                        "Registered extension"
                    );
                    report.attempts.push(DescriptorAttempt {
                        descriptor: descriptor.clone(),
                        outcome: AttemptOutcome::Registered {
                            origin: instance.origin().clone(),
                        },
                    });
                    registry.register(descriptor.clone(), candidate.path(), instance);
                    report.registered = Some(descriptor);
                    break;
                }
                Err(reason) => {
                    report.attempts.push(DescriptorAttempt {
                        descriptor,
                        outcome: AttemptOutcome::Skipped(reason),
                    });
                }
            }
        }

        if report.registered.is_none() {
            self.detail(candidate, "Module contributed no extension");
        }
        report
    }

    fn try_descriptor(
        &self,
        namespace: &LoadingNamespace,
        candidate: &ModuleFile,
        descriptor: &TypeDescriptor,
    ) -> Result<Instance, SkipReason> {
        let Some(resolved) = namespace.resolve(descriptor) else {
            self.detail_type(candidate, descriptor, "Type not found in loading namespace");
            return Err(SkipReason::NotFound);
        };

        if !resolved.is_extension() {
            self.detail_type(candidate, descriptor, "Type is not an extension");
            return Err(SkipReason::NotAnExtension);
        }

        match namespace.instantiate(&resolved) {
            Ok(instance) => Ok(instance),
            Err(ConstructError::MissingConstructor) => {
                warn!(
                    module = %candidate.file_name(),
                    extension = %descriptor,
                    "Extension type has no zero-argument constructor"
                );
                Err(SkipReason::MissingConstructor)
            }
            Err(e) => {
                warn!(
                    module = %candidate.file_name(),
                    extension = %descriptor,
                    error = %e,
                    "Failed to construct extension"
                );
                Err(SkipReason::ConstructionFailed(e.to_string()))
            }
        }
    }

    fn detail(&self, candidate: &ModuleFile, message: &str) {
        if self.verbose {
            info!(module = %candidate.file_name(), "{}", message);
        } else {
            debug!(module = %candidate.file_name(), "{}", message);
        }
    }

    fn detail_type(&self, candidate: &ModuleFile, descriptor: &TypeDescriptor, message: &str) {
        if self.verbose {
            info!(module = %candidate.file_name(), descriptor = %descriptor, "{}", message);
        } else {
            debug!(module = %candidate.file_name(), descriptor = %descriptor, "{}", message);
        }
    }
}
