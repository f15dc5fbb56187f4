/// Image trait, image descriptor, and backend pixel formats

use crate::error::Result;
use super::pixel_rect::PixelRect;

/// Backend pixel format
///
/// The explicit-API view of a pixel format. The GLES-side internal formats
/// (`framebuffer::format::InternalFormat`) map onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum DeviceFormat {
    /// No format (used for absent depth-stencil attachments)
    UNDEFINED,

    // Color formats
    R8G8B8A8_UNORM,
    B8G8R8A8_UNORM,
    R5G6B5_UNORM,
    R4G4B4A4_UNORM,
    R5G5B5A1_UNORM,

    // Depth/stencil formats
    D16_UNORM,
    D32_SFLOAT,
    D16_UNORM_S8_UINT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
    S8_UINT,
}

impl DeviceFormat {
    /// Number of depth bits stored by this format
    pub fn depth_bits(self) -> u32 {
        match self {
            DeviceFormat::D16_UNORM | DeviceFormat::D16_UNORM_S8_UINT => 16,
            DeviceFormat::D24_UNORM_S8_UINT => 24,
            DeviceFormat::D32_SFLOAT | DeviceFormat::D32_SFLOAT_S8_UINT => 32,
            _ => 0,
        }
    }

    /// Number of stencil bits stored by this format
    pub fn stencil_bits(self) -> u32 {
        match self {
            DeviceFormat::D16_UNORM_S8_UINT
            | DeviceFormat::D24_UNORM_S8_UINT
            | DeviceFormat::D32_SFLOAT_S8_UINT
            | DeviceFormat::S8_UINT => 8,
            _ => 0,
        }
    }

    /// Returns true if this format stores depth and/or stencil data
    pub fn is_depth_stencil(self) -> bool {
        self.depth_bits() > 0 || self.stencil_bits() > 0
    }

    /// Bytes per pixel as laid out for host copies
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            DeviceFormat::UNDEFINED => 0,
            DeviceFormat::R5G6B5_UNORM
            | DeviceFormat::R4G4B4A4_UNORM
            | DeviceFormat::R5G5B5A1_UNORM
            | DeviceFormat::D16_UNORM => 2,
            DeviceFormat::R8G8B8A8_UNORM
            | DeviceFormat::B8G8R8A8_UNORM
            | DeviceFormat::D32_SFLOAT
            | DeviceFormat::D24_UNORM_S8_UINT => 4,
            DeviceFormat::D16_UNORM_S8_UINT => 3,
            DeviceFormat::D32_SFLOAT_S8_UINT => 5,
            DeviceFormat::S8_UINT => 1,
        }
    }
}

/// Image layout, as understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Undefined layout (initial state)
    Undefined,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for shader read-only access
    ShaderReadOnly,
    /// Layout for transfer source
    TransferSrc,
    /// Layout for transfer destination
    TransferDst,
    /// Layout for presenting to swapchain
    PresentSrc,
}

/// Image usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUsage {
    /// Image can be sampled in shaders
    Sampled,
    /// Image can be used as color render target
    RenderTarget,
    /// Image can be used for both
    SampledAndRenderTarget,
    /// Image can be used as depth/stencil attachment (transfer-capable for
    /// the stencil clear emulation read-back)
    DepthStencil,
}

/// Descriptor for creating an image
#[derive(Debug, Clone)]
pub struct ImageDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: DeviceFormat,
    /// Usage flags
    pub usage: ImageUsage,
}

/// Read-only properties of a created image
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: DeviceFormat,
    /// Usage flags
    pub usage: ImageUsage,
}

/// Options for host copies
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOptions {
    /// Flip the image vertically during the copy (GLES read-back
    /// convention). The stencil clear emulation disables this.
    pub invert_y: bool,
    /// Extract/update only the stencil aspect. The host buffer then holds
    /// the stencil byte at offset 0 of each pixel block.
    pub stencil_only: bool,
}

/// Image resource trait
///
/// Implemented by backend-specific image types. The image is destroyed
/// when the last reference is dropped.
pub trait Image: Send + Sync {
    /// Get the read-only properties of this image
    fn info(&self) -> &ImageInfo;

    /// Copy the pixels of `src` (a rectangle of this image) into `buf`,
    /// laid out according to `dst`.
    ///
    /// Blocks until the copy has completed; the caller may read `buf`
    /// immediately on return.
    fn copy_to_host(
        &self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &mut [u8],
    ) -> Result<()>;

    /// Copy `buf`, laid out according to `src`, into the `dst` rectangle
    /// of this image.
    fn copy_from_host(
        &self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &[u8],
    ) -> Result<()>;

    /// Transition the image to a new layout
    fn prepare_layout(&self, new_layout: ImageLayout) -> Result<()>;
}
