/// Tests for the error type

use super::*;

// ============================================================================
// Tests: Display
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkCreateFramebuffer failed".to_string());
    assert_eq!(err.to_string(), "Backend error: vkCreateFramebuffer failed");
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(Error::OutOfMemory.to_string(), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Texture 7 has no storage".to_string());
    assert_eq!(err.to_string(), "Invalid resource: Texture 7 has no storage");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("No suitable GPU".to_string());
    assert_eq!(err.to_string(), "Initialization failed: No suitable GPU");
}

// ============================================================================
// Tests: Trait Implementations
// ============================================================================

#[test]
fn test_implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&Error::OutOfMemory);
}

#[test]
fn test_result_alias() {
    fn produces() -> Result<u32> {
        Ok(7)
    }
    assert_eq!(produces().unwrap(), 7);
}
