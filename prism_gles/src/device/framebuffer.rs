/// Framebuffer trait and descriptor
///
/// A device framebuffer binds concrete image views to a render pass.
/// On-screen targets own one per swap image; off-screen targets own one.

use std::sync::Arc;
use super::image::Image;
use super::render_pass::RenderPass;

/// Descriptor for creating a device framebuffer
#[derive(Clone)]
pub struct FramebufferDesc {
    /// Render pass the framebuffer is bound against
    pub render_pass: Arc<dyn RenderPass>,
    /// Attachment images, color first, then depth-stencil
    pub attachments: Vec<Arc<dyn Image>>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Device framebuffer trait
///
/// Implemented by backend-specific framebuffer types. Destroyed when the
/// last reference is dropped.
pub trait Framebuffer: Send + Sync {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;
}
