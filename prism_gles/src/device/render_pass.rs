/// RenderPass trait and descriptor
///
/// A render pass is immutable once created: a new clear/write-enable
/// combination or a format change requires creating a new one.

use bitflags::bitflags;
use super::image::DeviceFormat;

bitflags! {
    /// Per-channel clear/write enables baked into a render pass
    ///
    /// Clear flags select the load operation (clear vs. load), write flags
    /// select the store operation (store vs. don't-care).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RenderPassFlags: u8 {
        const CLEAR_COLOR   = 1 << 0;
        const CLEAR_DEPTH   = 1 << 1;
        const CLEAR_STENCIL = 1 << 2;
        const WRITE_COLOR   = 1 << 3;
        const WRITE_DEPTH   = 1 << 4;
        const WRITE_STENCIL = 1 << 5;
    }
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    /// Clear/write enables per channel
    pub flags: RenderPassFlags,
    /// Color attachment format (`UNDEFINED` when no color attachment)
    pub color_format: DeviceFormat,
    /// Depth-stencil attachment format (`UNDEFINED` when no depth/stencil
    /// attachment is bound)
    pub depth_stencil_format: DeviceFormat,
}

/// Render pass trait
///
/// Implemented by backend-specific render pass types.
pub trait RenderPass: Send + Sync {
    /// The clear/write flags this pass was built with
    fn flags(&self) -> RenderPassFlags;
}
