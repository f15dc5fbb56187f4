/// Tests for the masked stencil clear emulation

use super::*;
use crate::device::mock_device::MockImage;
use crate::device::{DeviceFormat, ImageDesc, ImageUsage, Rect2D};

fn ds_image(width: u32, height: u32) -> MockImage {
    MockImage::new(&ImageDesc {
        width,
        height,
        format: DeviceFormat::D24_UNORM_S8_UINT,
        usage: ImageUsage::DepthStencil,
    })
}

fn full_rect(width: u32, height: u32) -> Rect2D {
    Rect2D {
        x: 0,
        y: 0,
        width,
        height,
    }
}

// ============================================================================
// Tests: Mask Detection
// ============================================================================

#[test]
fn test_full_mask_needs_no_emulation() {
    assert!(!needs_masked_clear(0xFF));
    // Bits above the low byte are ignored
    assert!(!needs_masked_clear(0x1FF));
}

#[test]
fn test_partial_mask_needs_emulation() {
    assert!(needs_masked_clear(0x00));
    assert!(needs_masked_clear(0xF0));
    assert!(needs_masked_clear(0x7F));
}

// ============================================================================
// Tests: Merge Formula
// ============================================================================

#[test]
fn test_masked_clear_merges_under_mask() {
    let image = ds_image(4, 4);
    image.fill_stencil(0x0F);

    clear_masked(&image, DeviceFormat::D24_UNORM_S8_UINT, full_rect(4, 4), 0xA5, 0xF0).unwrap();

    // new = clear | (old & !mask) = 0xA5 | (0x0F & 0x0F) = 0xAF
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(image.stencil_at(x, y), 0xAF);
        }
    }
}

#[test]
fn test_masked_clear_zero_mask_keeps_masked_bits() {
    let image = ds_image(2, 2);
    image.fill_stencil(0x3C);

    clear_masked(&image, DeviceFormat::D24_UNORM_S8_UINT, full_rect(2, 2), 0x00, 0x00).unwrap();

    assert_eq!(image.stencil_at(0, 0), 0x3C);
}

#[test]
fn test_masked_clear_respects_rect() {
    let image = ds_image(4, 4);
    image.fill_stencil(0x00);

    let rect = Rect2D {
        x: 1,
        y: 1,
        width: 2,
        height: 2,
    };
    clear_masked(&image, DeviceFormat::D24_UNORM_S8_UINT, rect, 0xFF, 0x0F).unwrap();

    assert_eq!(image.stencil_at(1, 1), 0xFF);
    assert_eq!(image.stencil_at(2, 2), 0xFF);
    // Outside the rect is untouched
    assert_eq!(image.stencil_at(0, 0), 0x00);
    assert_eq!(image.stencil_at(3, 3), 0x00);
    assert_eq!(image.stencil_at(0, 1), 0x00);
}

#[test]
fn test_masked_clear_on_s8_format() {
    let image = MockImage::new(&ImageDesc {
        width: 2,
        height: 2,
        format: DeviceFormat::S8_UINT,
        usage: ImageUsage::DepthStencil,
    });
    image.fill_stencil(0xFF);

    clear_masked(&image, DeviceFormat::S8_UINT, full_rect(2, 2), 0x00, 0x0F).unwrap();

    // Low nibble cleared, high nibble preserved
    assert_eq!(image.stencil_at(0, 0), 0xF0);
}

// ============================================================================
// Tests: Errors
// ============================================================================

#[test]
fn test_masked_clear_rejects_stencil_free_format() {
    let image = MockImage::new(&ImageDesc {
        width: 2,
        height: 2,
        format: DeviceFormat::D16_UNORM,
        usage: ImageUsage::DepthStencil,
    });
    assert!(clear_masked(&image, DeviceFormat::D16_UNORM, full_rect(2, 2), 0, 0x0F).is_err());
}
