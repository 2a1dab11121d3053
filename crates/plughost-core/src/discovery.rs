//! Host integration points: `begin_discovery` at startup, `end_discovery`
//! at shutdown.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::config::DiscoveryConfig;
use crate::error::HostError;
use crate::extension::{
    DiscoveryReport, DynamicLoader, HostTypes, LoadResult, ModuleScanner, PluginRegistry,
};

struct DiscoveryPass {
    registry: PluginRegistry,
    report: DiscoveryReport,
}

/// Runs at most one discovery pass per instance and tears it down once.
///
/// The host serializes calls; nothing here is shared across threads.
pub struct RuntimeDiscovery {
    directory: PathBuf,
    config: DiscoveryConfig,
    host: HostTypes,
    excluded: Vec<PathBuf>,
    pass: Option<DiscoveryPass>,
    ended: bool,
}

impl RuntimeDiscovery {
    pub fn new(directory: impl Into<PathBuf>, config: DiscoveryConfig) -> Self {
        Self {
            directory: directory.into(),
            config,
            host: HostTypes::new(),
            excluded: Vec::new(),
            pass: None,
            ended: false,
        }
    }

    /// Types the host provides itself.
    pub fn with_host_types(mut self, host: HostTypes) -> Self {
        self.host = host;
        self
    }

    /// Leave out a module file the host already loaded on its own.
    pub fn exclude_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Scan, load and activate.
    ///
    /// Discovery itself never fails; only an activation failure is returned.
    /// Extensions activated before the failure are still torn down by
    /// [`end_discovery`](Self::end_discovery).
    pub fn begin_discovery(&mut self) -> Result<&DiscoveryReport, HostError> {
        if self.pass.is_some() {
            return Err(HostError::AlreadyStarted);
        }

        let verbose = self.config.verbose_logging;
        let started = Instant::now();
        info!(dir = %self.directory.display(), verbose, "Starting extension discovery");

        let scanner = self
            .excluded
            .iter()
            .fold(ModuleScanner::new().with_verbose(verbose), |scanner, path| {
                scanner.exclude(path)
            });
        let scan = scanner.scan(&self.directory);

        let LoadResult { registry, modules } = DynamicLoader::new(self.host.clone())
            .with_verbose(verbose)
            .load(&scan.modules);

        let mut report = DiscoveryReport::new(&self.directory, scan.status);
        report.modules = modules;
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Extension discovery took {} ms: {} module(s), {} extension(s)",
            report.elapsed_ms,
            report.modules.len(),
            registry.len()
        );

        let pass = self.pass.insert(DiscoveryPass { registry, report });
        pass.registry.activate_all()?;
        Ok(&pass.report)
    }

    /// Deactivate everything the pass activated. Runs once; later calls and
    /// calls without a pass do nothing.
    pub fn end_discovery(&mut self) {
        if self.ended {
            return;
        }
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        self.ended = true;
        pass.registry.deactivate_all();
        info!("Extension teardown complete");
    }

    pub fn registry(&self) -> Option<&PluginRegistry> {
        self.pass.as_ref().map(|p| &p.registry)
    }

    pub fn report(&self) -> Option<&DiscoveryReport> {
        self.pass.as_ref().map(|p| &p.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{BundleWriter, ExtensionState};
    use plughost_extension_sdk::{Extension, ExtensionResult};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Noop;

    impl Extension for Noop {
        fn activate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }

        fn deactivate(&mut self) -> ExtensionResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut discovery = RuntimeDiscovery::new(temp.path(), DiscoveryConfig::default());

        assert!(discovery.begin_discovery().is_ok());
        assert!(matches!(
            discovery.begin_discovery(),
            Err(HostError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_end_without_begin_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut discovery = RuntimeDiscovery::new(temp.path(), DiscoveryConfig::default());
        discovery.end_discovery();
        assert!(discovery.registry().is_none());
    }

    #[test]
    fn test_full_cycle() {
        let temp = TempDir::new().unwrap();
        BundleWriter::new()
            .with_type("pkg::Noop")
            .write_to(&temp.path().join("noop.bundle"))
            .unwrap();
        let mut host = HostTypes::new();
        host.register_extension::<Noop>("pkg::Noop");

        let mut discovery = RuntimeDiscovery::new(
            temp.path(),
            DiscoveryConfig {
                verbose_logging: true,
            },
        )
        .with_host_types(host);

        let registered = discovery.begin_discovery().unwrap().registered_count();
        assert_eq!(registered, 1);
        assert_eq!(
            discovery.registry().unwrap().get(0).unwrap().state(),
            ExtensionState::Activated
        );

        discovery.end_discovery();
        assert_eq!(
            discovery.registry().unwrap().get(0).unwrap().state(),
            ExtensionState::Deactivated
        );
    }
}
