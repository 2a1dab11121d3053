//! Smoke-test extension.
//!
//! Build with `cargo build -p plughost-smoke-extension`, then pack the
//! resulting library:
//!
//! ```text
//! plughost pack target/debug/libplughost_smoke_extension.so --output extensions/smoke.bundle
//! ```
//!
//! `smoke::Helper` is listed first and is not an extension, so the host
//! skips it and registers `smoke::Greeter`.

use plughost_extension_sdk::prelude::*;

/// Greets on activation and says goodbye on deactivation.
pub struct Greeter {
    greeting: String,
    active: bool,
}

impl Default for Greeter {
    fn default() -> Self {
        Self {
            greeting: "hello from the smoke extension".to_string(),
            active: false,
        }
    }
}

impl Extension for Greeter {
    fn activate(&mut self) -> ExtensionResult<()> {
        if self.active {
            return Err(ExtensionError::ActivationFailed("already active".to_string()));
        }
        self.active = true;
        eprintln!("[smoke] {}", self.greeting);
        Ok(())
    }

    fn deactivate(&mut self) -> ExtensionResult<()> {
        if !self.active {
            return Err(ExtensionError::DeactivationFailed("not active".to_string()));
        }
        self.active = false;
        eprintln!("[smoke] goodbye");
        Ok(())
    }
}

export_types![
    TypeEntry::opaque("smoke::Helper"),
    TypeEntry::extension::<Greeter>("smoke::Greeter"),
];
