//! Lifecycle coordination over a [`PluginRegistry`].
//!
//! Each entry moves `Constructed -> Activated -> Deactivated`, entering every
//! state at most once. Both walks run sequentially in registry order.

use tracing::{debug, info, warn};

use super::registry::{PluginRegistry, RegisteredExtension};
use super::types::ExtensionState;
use crate::error::LifecycleError;

impl RegisteredExtension {
    fn activate(&mut self) -> Result<(), LifecycleError> {
        self.instance
            .activate()
            .map_err(|source| LifecycleError::Activation {
                type_name: self.type_name().to_string(),
                source,
            })?;
        self.state = ExtensionState::Activated;
        Ok(())
    }

    fn deactivate(&mut self) {
        // Marked first so a failing deactivate() is never retried.
        self.state = ExtensionState::Deactivated;
        if let Err(e) = self.instance.deactivate() {
            warn!(
                extension = %self.type_name(),
                error = %e,
                "Extension failed to deactivate"
            );
        }
    }
}

impl PluginRegistry {
    /// Activate every constructed extension in registry order.
    ///
    /// The first failure stops the walk and is returned; extensions after it
    /// stay `Constructed`. Extensions already activated are skipped, and once
    /// a walk has failed every later call returns [`LifecycleError::Aborted`]
    /// without calling into any extension.
    pub fn activate_all(&mut self) -> Result<(), LifecycleError> {
        if let Some(index) = self.activation_failed {
            let type_name = self
                .get(index)
                .map(|e| e.type_name().to_string())
                .unwrap_or_default();
            return Err(LifecycleError::Aborted { type_name });
        }

        let mut activated = 0usize;
        let mut failed = None;
        for (index, entry) in self.entries_mut().enumerate() {
            if entry.state != ExtensionState::Constructed {
                continue;
            }
            if let Err(e) = entry.activate() {
                failed = Some((index, e));
                break;
            }
            debug!(extension = %entry.type_name(), "Activated extension");
            activated += 1;
        }

        if let Some((index, e)) = failed {
            self.activation_failed = Some(index);
            return Err(e);
        }
        info!("Activated {} extension(s)", activated);
        Ok(())
    }

    /// Deactivate every activated extension in registry order.
    ///
    /// Errors are logged and the walk continues. Entries that never activated
    /// are left alone, and a second call is a no-op.
    pub fn deactivate_all(&mut self) {
        let mut deactivated = 0usize;
        for entry in self.entries_mut() {
            if entry.state != ExtensionState::Activated {
                continue;
            }
            entry.deactivate();
            debug!(extension = %entry.type_name(), "Deactivated extension");
            deactivated += 1;
        }
        if deactivated > 0 {
            info!("Deactivated {} extension(s)", deactivated);
        }
    }
}
