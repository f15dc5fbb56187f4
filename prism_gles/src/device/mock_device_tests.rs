/// Tests for the mock backend

use super::*;
use crate::device::{
    CommandBuffer, CopyOptions, Device, DeviceFormat, FramebufferDesc, ImageDesc, ImageLayout,
    ImageUsage, PixelRect, Rect2D, RenderPassBeginInfo, RenderPassDesc, RenderPassFlags,
    WindowSurface, DEFAULT_PIXEL_ALIGNMENT,
};
use crate::device::image::Image as _;

// ============================================================================
// Tests: Depth-Stencil Format Selection
// ============================================================================

#[test]
fn test_find_exact_combined_format() {
    let device = MockDevice::new();
    assert_eq!(
        device.find_depth_stencil_format(24, 8),
        DeviceFormat::D24_UNORM_S8_UINT
    );
}

#[test]
fn test_find_downgrades_unsupported_depth() {
    // D32_SFLOAT_S8_UINT is not in the supported set
    let device = MockDevice::new();
    assert_eq!(
        device.find_depth_stencil_format(32, 8),
        DeviceFormat::D24_UNORM_S8_UINT
    );
}

#[test]
fn test_find_depth_only() {
    let device = MockDevice::new();
    assert_eq!(
        device.find_depth_stencil_format(16, 0),
        DeviceFormat::D16_UNORM
    );
    assert_eq!(
        device.find_depth_stencil_format(32, 0),
        DeviceFormat::D32_SFLOAT
    );
}

#[test]
fn test_find_stencil_only() {
    let device = MockDevice::new();
    assert_eq!(
        device.find_depth_stencil_format(0, 8),
        DeviceFormat::S8_UINT
    );
}

#[test]
fn test_find_nothing_requested() {
    let device = MockDevice::new();
    assert_eq!(
        device.find_depth_stencil_format(0, 0),
        DeviceFormat::UNDEFINED
    );
}

#[test]
fn test_find_with_restricted_support() {
    let device =
        MockDevice::with_supported_ds_formats(vec![DeviceFormat::D24_UNORM_S8_UINT]);
    // Nothing fits under 16 bits, fall back to what exists
    assert_eq!(
        device.find_depth_stencil_format(16, 8),
        DeviceFormat::D24_UNORM_S8_UINT
    );
}

// ============================================================================
// Tests: Image Host Copies
// ============================================================================

#[test]
fn test_copy_roundtrip_subrect() {
    let image = MockImage::new(&ImageDesc {
        width: 8,
        height: 8,
        format: DeviceFormat::S8_UINT,
        usage: ImageUsage::DepthStencil,
    });
    image.fill_stencil(0x11);

    let rect = Rect2D {
        x: 2,
        y: 3,
        width: 3,
        height: 2,
    };
    let src = PixelRect::new(rect, 1, 1, DEFAULT_PIXEL_ALIGNMENT);
    let dst = src.at_origin();
    let mut data = vec![0u8; dst.buffer_size()];

    image
        .copy_to_host(&src, &dst, CopyOptions::default(), &mut data)
        .unwrap();
    assert_eq!(data[0], 0x11);

    // Write modified data back and check only the subrect changed
    for row in 0..2 {
        for col in 0..3 {
            data[row * dst.aligned_row_bytes() + col] = 0x77;
        }
    }
    image
        .copy_from_host(&dst, &src, CopyOptions::default(), &data)
        .unwrap();

    assert_eq!(image.stencil_at(2, 3), 0x77);
    assert_eq!(image.stencil_at(4, 4), 0x77);
    assert_eq!(image.stencil_at(1, 3), 0x11);
    assert_eq!(image.stencil_at(2, 5), 0x11);
}

#[test]
fn test_copy_to_host_rejects_small_buffer() {
    let image = MockImage::new(&ImageDesc {
        width: 4,
        height: 4,
        format: DeviceFormat::S8_UINT,
        usage: ImageUsage::DepthStencil,
    });
    let src = PixelRect::new(
        Rect2D {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        },
        1,
        1,
        DEFAULT_PIXEL_ALIGNMENT,
    );
    let dst = src.at_origin();
    let mut data = vec![0u8; 3];
    assert!(image
        .copy_to_host(&src, &dst, CopyOptions::default(), &mut data)
        .is_err());
}

#[test]
fn test_prepare_layout() {
    let image = MockImage::new(&ImageDesc {
        width: 4,
        height: 4,
        format: DeviceFormat::D24_UNORM_S8_UINT,
        usage: ImageUsage::DepthStencil,
    });
    assert_eq!(image.layout(), ImageLayout::Undefined);
    image
        .prepare_layout(ImageLayout::DepthStencilAttachment)
        .unwrap();
    assert_eq!(image.layout(), ImageLayout::DepthStencilAttachment);
}

// ============================================================================
// Tests: Failure Injection
// ============================================================================

#[test]
fn test_fail_framebuffers() {
    let device = MockDevice::new();
    let render_pass = device
        .create_render_pass(&RenderPassDesc {
            flags: RenderPassFlags::empty(),
            color_format: DeviceFormat::R8G8B8A8_UNORM,
            depth_stencil_format: DeviceFormat::UNDEFINED,
        })
        .unwrap();

    device.set_fail_framebuffers(true);
    let result = device.create_framebuffer(&FramebufferDesc {
        render_pass,
        attachments: Vec::new(),
        width: 4,
        height: 4,
    });
    assert!(result.is_err());
    assert_eq!(device.framebuffers_created(), 0);
}

#[test]
fn test_fail_images() {
    let device = MockDevice::new();
    device.set_fail_images(true);
    assert!(device
        .create_image(&ImageDesc {
            width: 4,
            height: 4,
            format: DeviceFormat::R8G8B8A8_UNORM,
            usage: ImageUsage::RenderTarget,
        })
        .is_err());
}

// ============================================================================
// Tests: Window Surface
// ============================================================================

#[test]
fn test_window_surface_acquire_cycles() {
    let surface = MockWindowSurface::new(3, 64, 64, DeviceFormat::R8G8B8A8_UNORM);
    assert_eq!(surface.next_image_index(), 0);
    assert_eq!(surface.acquire_next_image().unwrap(), 1);
    assert_eq!(surface.acquire_next_image().unwrap(), 2);
    assert_eq!(surface.acquire_next_image().unwrap(), 0);
}

#[test]
fn test_window_surface_set_index() {
    let surface = MockWindowSurface::new(3, 64, 64, DeviceFormat::R8G8B8A8_UNORM);
    surface.set_next_image_index(2);
    assert_eq!(surface.next_image_index(), 2);
}

// ============================================================================
// Tests: Command Buffer Recording
// ============================================================================

#[test]
fn test_command_buffer_records() {
    let device = MockDevice::new();
    let render_pass = device
        .create_render_pass(&RenderPassDesc {
            flags: RenderPassFlags::CLEAR_COLOR,
            color_format: DeviceFormat::R8G8B8A8_UNORM,
            depth_stencil_format: DeviceFormat::UNDEFINED,
        })
        .unwrap();
    let framebuffer = device
        .create_framebuffer(&FramebufferDesc {
            render_pass: render_pass.clone(),
            attachments: Vec::new(),
            width: 16,
            height: 16,
        })
        .unwrap();

    let mut cmd = MockCommandBuffer::new();
    cmd.begin_render_pass(&RenderPassBeginInfo {
        render_pass: &render_pass,
        framebuffer: &framebuffer,
        clear_rect: Rect2D {
            x: 0,
            y: 0,
            width: 16,
            height: 16,
        },
        clear_color: [1.0, 0.0, 0.0, 1.0],
        clear_depth: 1.0,
        clear_stencil: 7,
    })
    .unwrap();
    cmd.end_render_pass().unwrap();

    assert_eq!(
        cmd.commands,
        vec!["begin_render_pass 16x16".to_string(), "end_render_pass".to_string()]
    );
    assert_eq!(cmd.last_begin().unwrap().clear_stencil, 7);
}
