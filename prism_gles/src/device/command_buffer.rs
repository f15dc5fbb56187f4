/// CommandBuffer trait - render pass recording at the device boundary

use std::sync::Arc;
use crate::error::Result;
use super::framebuffer::Framebuffer;
use super::render_pass::RenderPass;

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Begin-time parameters for a render pass
///
/// These change freely between passes without requiring the render pass
/// object itself to be rebuilt.
pub struct RenderPassBeginInfo<'a> {
    /// The render pass to begin
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// The framebuffer for the current buffer slot
    pub framebuffer: &'a Arc<dyn Framebuffer>,
    /// Area affected by the pass's clear operations
    pub clear_rect: Rect2D,
    /// Color clear value (RGBA)
    pub clear_color: [f32; 4],
    /// Depth clear value
    pub clear_depth: f32,
    /// Stencil clear value
    pub clear_stencil: u32,
}

/// Command buffer for recording render passes
///
/// Implemented by backend-specific command buffer types. Recording is
/// serialized by the owning context.
pub trait CommandBuffer: Send + Sync {
    /// Begin a render pass with the given begin-time parameters
    fn begin_render_pass(&mut self, info: &RenderPassBeginInfo<'_>) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;
}

/// Command submission collaborator
///
/// Supplies the command buffer currently accepting commands for this
/// context's frame.
pub trait CommandBufferManager: Send + Sync {
    /// Get the command buffer currently recording
    fn active_command_buffer(&mut self) -> &mut dyn CommandBuffer;
}
