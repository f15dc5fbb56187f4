/// RenderPass - Vulkan implementation of the driver RenderPass trait

use ash::vk;
use prism_gles::device::{RenderPass as DriverRenderPass, RenderPassFlags};

/// Vulkan render pass implementation
///
/// Wraps a vk::RenderPass together with the clear/write flags it was built
/// with. Immutable once created; a new flag or format combination requires
/// creating a new one.
pub struct RenderPass {
    /// Vulkan render pass handle
    pub(crate) render_pass: vk::RenderPass,
    /// Clear/write enables baked into the pass
    pub(crate) flags: RenderPassFlags,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl DriverRenderPass for RenderPass {
    fn flags(&self) -> RenderPassFlags {
        self.flags
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
