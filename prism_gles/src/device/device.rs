/// Device trait - main backend factory interface

use std::sync::Arc;
use winit::window::Window;
use crate::error::Result;
use super::command_buffer::CommandBuffer;
use super::framebuffer::{Framebuffer, FramebufferDesc};
use super::image::{DeviceFormat, Image, ImageDesc};
use super::render_pass::{RenderPass, RenderPassDesc};
use super::window_surface::WindowSurface;

/// Main device trait
///
/// This is the central factory interface for creating lower-level GPU
/// objects. Implemented by backend-specific devices (e.g. VulkanDevice).
pub trait Device: Send + Sync {
    /// Create an image
    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn Image>>;

    /// Create a render pass
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a device framebuffer binding images to a render pass
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create a command buffer for render pass recording
    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>>;

    /// Create a window surface (swapchain) for on-screen rendering
    fn create_window_surface(&self, window: &Window) -> Result<Arc<dyn WindowSurface>>;

    /// Find the nearest supported combined depth/stencil format for the
    /// requested bit depths
    ///
    /// Downgrades, never upgrades, when the exact combination is not
    /// supported by the hardware.
    fn find_depth_stencil_format(&self, depth_bits: u32, stencil_bits: u32) -> DeviceFormat;
}
