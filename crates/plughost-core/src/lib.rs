//! Core of plughost: discovers extension bundles in a directory, builds one
//! extension per bundle and drives their activation and deactivation.
//!
//! The host only calls [`RuntimeDiscovery::begin_discovery`] at startup and
//! [`RuntimeDiscovery::end_discovery`] at shutdown.

pub mod config;
pub mod discovery;
pub mod error;
pub mod extension;

pub use config::DiscoveryConfig;
pub use discovery::RuntimeDiscovery;
pub use error::{
    BundleError, ConfigError, ConstructError, HostError, LifecycleError, NativeLoadError,
};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{env_vars, DiscoveryConfig, DEFAULT_CONFIG_FILE, DEFAULT_EXTENSION_DIR};
    pub use crate::discovery::RuntimeDiscovery;
    pub use crate::error::{HostError, LifecycleError};
    pub use crate::extension::{
        BundleWriter, DiscoveryReport, DynamicLoader, ExtensionState, HostTypes, ModuleScanner,
        PluginRegistry, SkipReason, TypeDescriptor,
    };
    pub use plughost_extension_sdk::{Extension, ExtensionError, ExtensionResult};
}
