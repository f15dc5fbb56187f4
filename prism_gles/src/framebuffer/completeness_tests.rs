/// Tests for completeness validation ordering and rules

use super::*;
use super::super::format::InternalFormat;
use super::super::texture::Texture;

fn texture(width: i32, height: i32, format: InternalFormat) -> Texture {
    let mut t = Texture::new(1);
    t.set_storage(width, height, format);
    t
}

// ============================================================================
// Tests: Missing Attachment
// ============================================================================

#[test]
fn test_no_attachments_is_missing() {
    assert_eq!(check(None, None, None), Completeness::MissingAttachment);
}

// ============================================================================
// Tests: Complete Configurations
// ============================================================================

#[test]
fn test_color_only_is_complete() {
    let color = texture(64, 64, InternalFormat::RGBA8);
    assert_eq!(check(Some(&color), None, None), Completeness::Complete);
}

#[test]
fn test_depth_only_is_complete() {
    let depth = texture(64, 64, InternalFormat::DEPTH_COMPONENT24);
    assert_eq!(check(None, Some(&depth), None), Completeness::Complete);
}

#[test]
fn test_stencil_only_is_complete() {
    let stencil = texture(64, 64, InternalFormat::STENCIL_INDEX8);
    assert_eq!(check(None, None, Some(&stencil)), Completeness::Complete);
}

#[test]
fn test_all_three_matching_is_complete() {
    let color = texture(32, 32, InternalFormat::RGB565);
    let depth = texture(32, 32, InternalFormat::DEPTH_COMPONENT16);
    let stencil = texture(32, 32, InternalFormat::STENCIL_INDEX8);
    assert_eq!(
        check(Some(&color), Some(&depth), Some(&stencil)),
        Completeness::Complete
    );
}

#[test]
fn test_combined_format_on_both_points_is_complete() {
    let ds = texture(32, 32, InternalFormat::DEPTH24_STENCIL8);
    let ds2 = texture(32, 32, InternalFormat::DEPTH24_STENCIL8);
    assert_eq!(check(None, Some(&ds), Some(&ds2)), Completeness::Complete);
}

// ============================================================================
// Tests: Bad Attachments
// ============================================================================

#[test]
fn test_non_renderable_color_format() {
    let color = texture(64, 64, InternalFormat::LUMINANCE8);
    assert_eq!(check(Some(&color), None, None), Completeness::BadAttachment);
}

#[test]
fn test_color_format_on_depth_point() {
    let depth = texture(64, 64, InternalFormat::RGBA8);
    assert_eq!(check(None, Some(&depth), None), Completeness::BadAttachment);
}

#[test]
fn test_depth_format_on_stencil_point() {
    let stencil = texture(64, 64, InternalFormat::DEPTH_COMPONENT24);
    assert_eq!(
        check(None, None, Some(&stencil)),
        Completeness::BadAttachment
    );
}

#[test]
fn test_zero_dimensions() {
    let color = texture(0, 64, InternalFormat::RGBA8);
    assert_eq!(check(Some(&color), None, None), Completeness::BadAttachment);
}

// ============================================================================
// Tests: Dimension Mismatch
// ============================================================================

#[test]
fn test_dimension_mismatch() {
    let color = texture(64, 64, InternalFormat::RGBA8);
    let depth = texture(32, 32, InternalFormat::DEPTH_COMPONENT24);
    assert_eq!(
        check(Some(&color), Some(&depth), None),
        Completeness::DimensionMismatch
    );
}

#[test]
fn test_depth_stencil_pair_mismatch() {
    let depth = texture(64, 64, InternalFormat::DEPTH_COMPONENT24);
    let stencil = texture(64, 32, InternalFormat::STENCIL_INDEX8);
    assert_eq!(
        check(None, Some(&depth), Some(&stencil)),
        Completeness::DimensionMismatch
    );
}

// ============================================================================
// Tests: Rule Ordering
// ============================================================================

#[test]
fn test_bad_attachment_reported_before_mismatch() {
    // Both a non-renderable format and mismatched dimensions: the
    // per-attachment check runs first
    let color = texture(64, 64, InternalFormat::ALPHA8);
    let depth = texture(32, 32, InternalFormat::DEPTH_COMPONENT24);
    assert_eq!(
        check(Some(&color), Some(&depth), None),
        Completeness::BadAttachment
    );
}
