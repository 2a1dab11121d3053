//! Capability interface shared by the host and extension modules.

/// The capability interface every extension entry type implements.
///
/// A discovery pass constructs exactly one instance per module through the
/// type's zero-argument constructor, then calls `activate` once at host
/// startup and `deactivate` once at host shutdown.
pub trait Extension: Send {
    /// Called once, in registry order, after discovery completes.
    fn activate(&mut self) -> ExtensionResult<()>;

    /// Called once at host teardown, only if `activate` succeeded.
    fn deactivate(&mut self) -> ExtensionResult<()>;
}

/// Extension errors
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("Activation failed: {0}")]
    ActivationFailed(String),

    #[error("Deactivation failed: {0}")]
    DeactivationFailed(String),

    #[error("Construction failed: {0}")]
    ConstructionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other: {0}")]
    Other(String),
}

/// Result type for extension operations
pub type ExtensionResult<T> = std::result::Result<T, ExtensionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtensionError::ActivationFailed("port in use".to_string());
        assert_eq!(err.to_string(), "Activation failed: port in use");

        let err = ExtensionError::ConstructionFailed("no config".to_string());
        assert_eq!(err.to_string(), "Construction failed: no config");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ExtensionError = io.into();
        assert!(matches!(err, ExtensionError::Io(_)));
    }
}
