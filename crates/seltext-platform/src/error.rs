//! Common error types for seltext-platform.

use thiserror::Error;

/// Platform-level errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("not supported on this platform")]
    Unsupported,
    #[error("accessibility permission not granted")]
    AccessibilityNotTrusted,
    #[error("injection failed: {0}")]
    InjectionFailed(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
