/// GLES-side internal formats and renderability rules

use crate::device::DeviceFormat;

/// GLES internal format of a texture or renderbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum InternalFormat {
    // Color formats
    RGBA4,
    RGB5_A1,
    RGB565,
    RGB8,
    RGBA8,

    // Sampling-only formats (not renderable)
    LUMINANCE8,
    ALPHA8,

    // Depth/stencil formats
    DEPTH_COMPONENT16,
    DEPTH_COMPONENT24,
    DEPTH_COMPONENT32,
    DEPTH24_STENCIL8,
    STENCIL_INDEX8,
}

impl InternalFormat {
    /// Color-renderable per the GLES completeness rules
    pub fn is_color_renderable(self) -> bool {
        matches!(
            self,
            InternalFormat::RGBA4
                | InternalFormat::RGB5_A1
                | InternalFormat::RGB565
                | InternalFormat::RGB8
                | InternalFormat::RGBA8
        )
    }

    /// Depth-renderable per the GLES completeness rules
    pub fn is_depth_renderable(self) -> bool {
        matches!(
            self,
            InternalFormat::DEPTH_COMPONENT16
                | InternalFormat::DEPTH_COMPONENT24
                | InternalFormat::DEPTH_COMPONENT32
                | InternalFormat::DEPTH24_STENCIL8
        )
    }

    /// Stencil-renderable per the GLES completeness rules
    pub fn is_stencil_renderable(self) -> bool {
        matches!(
            self,
            InternalFormat::STENCIL_INDEX8 | InternalFormat::DEPTH24_STENCIL8
        )
    }

    /// Depth bits requested by this format
    pub fn depth_bits(self) -> u32 {
        match self {
            InternalFormat::DEPTH_COMPONENT16 => 16,
            InternalFormat::DEPTH_COMPONENT24 | InternalFormat::DEPTH24_STENCIL8 => 24,
            InternalFormat::DEPTH_COMPONENT32 => 32,
            _ => 0,
        }
    }

    /// Stencil bits requested by this format
    pub fn stencil_bits(self) -> u32 {
        match self {
            InternalFormat::DEPTH24_STENCIL8 | InternalFormat::STENCIL_INDEX8 => 8,
            _ => 0,
        }
    }

    /// The backend format this internal format maps to
    pub fn to_device_format(self) -> DeviceFormat {
        match self {
            InternalFormat::RGBA4 => DeviceFormat::R4G4B4A4_UNORM,
            InternalFormat::RGB5_A1 => DeviceFormat::R5G5B5A1_UNORM,
            InternalFormat::RGB565 => DeviceFormat::R5G6B5_UNORM,
            // RGB8 is stored with an opaque alpha channel
            InternalFormat::RGB8 | InternalFormat::RGBA8 => DeviceFormat::R8G8B8A8_UNORM,
            InternalFormat::LUMINANCE8 | InternalFormat::ALPHA8 => DeviceFormat::R8G8B8A8_UNORM,
            InternalFormat::DEPTH_COMPONENT16 => DeviceFormat::D16_UNORM,
            InternalFormat::DEPTH_COMPONENT24 => DeviceFormat::D24_UNORM_S8_UINT,
            InternalFormat::DEPTH_COMPONENT32 => DeviceFormat::D32_SFLOAT,
            InternalFormat::DEPTH24_STENCIL8 => DeviceFormat::D24_UNORM_S8_UINT,
            InternalFormat::STENCIL_INDEX8 => DeviceFormat::S8_UINT,
        }
    }
}

/// The internal format a swap image surfaces as on the GLES side
pub fn internal_format_for_surface(format: DeviceFormat) -> InternalFormat {
    match format {
        DeviceFormat::R5G6B5_UNORM => InternalFormat::RGB565,
        DeviceFormat::R4G4B4A4_UNORM => InternalFormat::RGBA4,
        DeviceFormat::R5G5B5A1_UNORM => InternalFormat::RGB5_A1,
        _ => InternalFormat::RGBA8,
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
