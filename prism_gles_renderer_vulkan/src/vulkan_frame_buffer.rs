/// Framebuffer - Vulkan implementation of the driver Framebuffer trait
///
/// Wraps a VkFramebuffer that groups the color and depth/stencil attachment
/// views for one buffer slot. Created via Device::create_framebuffer(),
/// reused each frame until the owning render target is rebuilt.

use ash::vk;
use prism_gles::device::Framebuffer as DriverFramebuffer;

/// Vulkan framebuffer implementation
///
/// Wraps a VkFramebuffer. Destroyed when dropped.
pub struct Framebuffer {
    /// Vulkan framebuffer handle
    pub(crate) framebuffer: vk::Framebuffer,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Framebuffer {
    pub(crate) fn new(
        framebuffer: vk::Framebuffer,
        width: u32,
        height: u32,
        device: ash::Device,
    ) -> Self {
        Self { framebuffer, width, height, device }
    }
}

impl DriverFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
