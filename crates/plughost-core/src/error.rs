//! Error types for plughost.
//!
//! Discovery-internal errors (`BundleError`, `NativeLoadError`,
//! `ConstructError`) never leave a discovery pass: they end up in the
//! [`DiscoveryReport`](crate::extension::DiscoveryReport) and the log.
//! Only [`LifecycleError`] and [`HostError`] reach the host.

use std::path::PathBuf;

use plughost_extension_sdk::ExtensionError;

/// Failure to read a bundle archive.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid entry name: {0}")]
    InvalidEntryName(String),
}

/// Failure to make a bundle's native library available to the namespace.
#[derive(Debug, thiserror::Error)]
pub enum NativeLoadError {
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("Staging failed: {0}")]
    Stage(#[source] std::io::Error),

    #[error("Load failed: {0}")]
    Open(#[source] libloading::Error),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(#[source] libloading::Error),

    #[error("Incompatible version: expected {expected}, got {got}")]
    IncompatibleVersion { expected: u32, got: u32 },

    #[error("Invalid type table: {0}")]
    InvalidTable(String),
}

/// Failure to construct a resolved extension type.
#[derive(Debug, thiserror::Error)]
pub enum ConstructError {
    #[error("no zero-argument constructor")]
    MissingConstructor,

    #[error("constructor returned no instance")]
    NullInstance,

    #[error("constructor panicked: {0}")]
    Panicked(String),

    #[error("constructor failed: {0}")]
    Failed(#[from] ExtensionError),
}

/// Lifecycle failures that propagate to the host.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Activation of {type_name} failed: {source}")]
    Activation {
        type_name: String,
        #[source]
        source: ExtensionError,
    },

    #[error("Activation already aborted at {type_name}")]
    Aborted { type_name: String },
}

/// Configuration read/write failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors surfaced by the host integration points.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Discovery already ran in this process")]
    AlreadyStarted,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NativeLoadError::IncompatibleVersion {
            expected: 1,
            got: 7,
        };
        assert_eq!(err.to_string(), "Incompatible version: expected 1, got 7");

        let err = LifecycleError::Activation {
            type_name: "pkg::Alpha".to_string(),
            source: ExtensionError::ActivationFailed("boom".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Activation of pkg::Alpha failed: Activation failed: boom"
        );
    }

    #[test]
    fn test_host_error_wraps_lifecycle() {
        let err: HostError = LifecycleError::Activation {
            type_name: "pkg::Alpha".to_string(),
            source: ExtensionError::Other("x".to_string()),
        }
        .into();
        assert!(err.to_string().starts_with("Activation of pkg::Alpha"));
    }
}
