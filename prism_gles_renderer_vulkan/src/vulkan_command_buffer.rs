/// CommandBuffer - Vulkan implementation of the driver CommandBuffer trait
///
/// Records render passes for later submission to the GPU. Owns a dedicated
/// command pool so reset and reuse do not interfere with other recordings.

use ash::vk;
use prism_gles::device::{
    CommandBuffer as DriverCommandBuffer, RenderPassBeginInfo,
};
use prism_gles::error::{Error, Result};
use prism_gles::{driver_err, driver_error};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_render_pass::RenderPass;

/// Vulkan command buffer implementation
pub struct CommandBuffer {
    /// Shared GPU context
    context: Arc<GpuContext>,
    /// Command pool for allocating the command buffer
    command_pool: vk::CommandPool,
    /// Command buffer for recording
    command_buffer: vk::CommandBuffer,
    /// Whether the command buffer is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
}

impl CommandBuffer {
    pub(crate) fn new(context: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = context
                .device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to create command pool: {:?}", e);
                    Error::BackendError(format!("Failed to create command pool: {:?}", e))
                })?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = context
                .device
                .allocate_command_buffers(&command_buffer_allocate_info)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to allocate command buffer: {:?}", e);
                    Error::BackendError(format!("Failed to allocate command buffers: {:?}", e))
                })?;
            let command_buffer = command_buffers[0];

            Ok(Self {
                context,
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Begin recording; resets the command buffer
    fn begin(&mut self) -> Result<()> {
        unsafe {
            self.context
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| driver_err!("prism::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.context
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to begin command buffer: {:?}", e))?;

            self.is_recording = true;
            self.in_render_pass = false;
            Ok(())
        }
    }

    /// End recording; the buffer is ready for queue submission
    pub fn end(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }
        if self.in_render_pass {
            return Err(Error::BackendError(
                "Render pass not ended before ending command buffer".to_string(),
            ));
        }

        unsafe {
            self.context
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to end command buffer: {:?}", e))?;

            self.is_recording = false;
            Ok(())
        }
    }
}

impl DriverCommandBuffer for CommandBuffer {
    fn begin_render_pass(&mut self, info: &RenderPassBeginInfo<'_>) -> Result<()> {
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }
        if !self.is_recording {
            self.begin()?;
        }

        unsafe {
            // Downcast to Vulkan types
            let vk_render_pass = info.render_pass.as_ref()
                as *const dyn prism_gles::device::RenderPass
                as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;

            let vk_framebuffer = info.framebuffer.as_ref()
                as *const dyn prism_gles::device::Framebuffer
                as *const Framebuffer;
            let vk_framebuffer = &*vk_framebuffer;

            // Clear values are indexed by attachment; the depth-stencil
            // value is harmless for color-only passes.
            let clear_values = [
                vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: info.clear_color,
                    },
                },
                vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue {
                        depth: info.clear_depth,
                        stencil: info.clear_stencil,
                    },
                },
            ];

            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .framebuffer(vk_framebuffer.framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D {
                        x: info.clear_rect.x,
                        y: info.clear_rect.y,
                    },
                    extent: vk::Extent2D {
                        width: info.clear_rect.width,
                        height: info.clear_rect.height,
                    },
                })
                .clear_values(&clear_values);

            self.context.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );

            self.in_render_pass = true;
            Ok(())
        }
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }

        unsafe {
            self.context.device.cmd_end_render_pass(self.command_buffer);
            self.in_render_pass = false;
            Ok(())
        }
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
