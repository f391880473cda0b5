//! Error handling for deskforge
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every failure is local to the sub-action or step that produced it; nothing
//! propagates past the orchestrator boundary except truly unanticipated faults.

use thiserror::Error;

/// Main error type for deskforge
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// IO errors (file operations, console, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An invoked external tool exited non-zero
    #[error("External tool failed: {0}")]
    ExternalTool(String),

    /// Registry write without sufficient privilege (typically HKLM unelevated)
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Expected environment variable, directory, or file is missing
    #[error("Resource absent: {0}")]
    ResourceAbsent(String),

    /// A confirmation was required but no operator is present
    #[error("Confirmation required but no interactive terminal is attached")]
    NonInteractive,

    /// Registry operation errors other than access denial
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for deskforge operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

// Convenient error constructors
impl ProvisionError {
    /// Create an external tool failure
    pub fn external_tool(msg: impl Into<String>) -> Self {
        Self::ExternalTool(msg.into())
    }

    /// Create an access denied error
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    /// Create a resource absent error
    pub fn resource_absent(msg: impl Into<String>) -> Self {
        Self::ResourceAbsent(msg.into())
    }

    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }

    /// Returns true when the failure is recoverable at the step level,
    /// i.e. it should be reported and the step should continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ExternalTool(_)
                | Self::AccessDenied(_)
                | Self::ResourceAbsent(_)
                | Self::Registry(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProvisionError::access_denied("HKLM\\Software");
        assert_eq!(err.to_string(), "Access denied: HKLM\\Software");

        let err = ProvisionError::resource_absent("APPDATA not set");
        assert_eq!(err.to_string(), "Resource absent: APPDATA not set");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ProvisionError = io_err.into();
        assert!(matches!(err, ProvisionError::Io(_)));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ProvisionError::external_tool("winget exited 1").is_recoverable());
        assert!(ProvisionError::access_denied("HKLM").is_recoverable());
        assert!(ProvisionError::resource_absent("npm").is_recoverable());
        assert!(!ProvisionError::NonInteractive.is_recoverable());
        assert!(!ProvisionError::general("boom").is_recoverable());
    }
}
