/// Tests for PixelRect byte-layout computations

use super::*;

fn rect(x: i32, y: i32, width: u32, height: u32) -> Rect2D {
    Rect2D {
        x,
        y,
        width,
        height,
    }
}

// ============================================================================
// Tests: Pixel and Row Sizes
// ============================================================================

#[test]
fn test_pixel_byte_offset() {
    let layout = PixelRect::new(rect(0, 0, 4, 4), 4, 1, DEFAULT_PIXEL_ALIGNMENT);
    assert_eq!(layout.pixel_byte_offset(), 4);

    let layout = PixelRect::new(rect(0, 0, 4, 4), 1, 2, DEFAULT_PIXEL_ALIGNMENT);
    assert_eq!(layout.pixel_byte_offset(), 2);
}

#[test]
fn test_aligned_row_bytes_pads_to_alignment() {
    // 3 pixels of 1 byte each -> 3 bytes, padded to 4
    let layout = PixelRect::new(rect(0, 0, 3, 2), 1, 1, 4);
    assert_eq!(layout.aligned_row_bytes(), 4);
}

#[test]
fn test_aligned_row_bytes_exact_fit() {
    let layout = PixelRect::new(rect(0, 0, 4, 2), 4, 1, 4);
    assert_eq!(layout.aligned_row_bytes(), 16);
}

#[test]
fn test_alignment_one_means_tight_rows() {
    let layout = PixelRect::new(rect(0, 0, 3, 2), 1, 1, 1);
    assert_eq!(layout.aligned_row_bytes(), 3);
}

#[test]
fn test_buffer_size() {
    let layout = PixelRect::new(rect(0, 0, 3, 5), 1, 1, 4);
    assert_eq!(layout.buffer_size(), 20);
}

// ============================================================================
// Tests: Positioning
// ============================================================================

#[test]
fn test_at_origin_keeps_shape() {
    let layout = PixelRect::new(rect(7, 9, 3, 5), 4, 1, 4);
    let origin = layout.at_origin();
    assert_eq!(origin.x, 0);
    assert_eq!(origin.y, 0);
    assert_eq!(origin.width, 3);
    assert_eq!(origin.height, 5);
    assert_eq!(origin.pixel_byte_offset(), layout.pixel_byte_offset());
}

#[test]
fn test_start_row_offset() {
    let layout = PixelRect::new(rect(2, 3, 3, 5), 4, 1, 4);
    // 3 rows of 16 bytes, plus 2 pixels of 4 bytes
    assert_eq!(layout.start_row_offset(16), 56);
}

#[test]
fn test_start_row_offset_at_origin_is_zero() {
    let layout = PixelRect::new(rect(5, 5, 3, 5), 4, 1, 4).at_origin();
    assert_eq!(layout.start_row_offset(16), 0);
}
