//! Error types for the Prism GLES driver core
//!
//! This module defines the error types used throughout the driver,
//! covering backend failures, allocation failures, and initialization.
//!
//! Framebuffer completeness problems are deliberately NOT errors: they are
//! status values (`framebuffer::Completeness`) that the API layer above
//! translates into its own error codes.

use std::fmt;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Driver errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, renderbuffer, image, etc.)
    InvalidResource(String),

    /// Initialization failed (device, surface, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
