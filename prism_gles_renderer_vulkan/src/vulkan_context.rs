/// GpuContext - Shared GPU resources for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Queue for command submission
/// - Command pool for one-shot transfer operations

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use prism_gles::driver_err;
use prism_gles::error::Result;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

/// Shared GPU context for all Vulkan resources.
///
/// This struct is shared (via `Arc`) by all GPU resources (images, render
/// passes, framebuffers) to avoid duplicating device/allocator/queue
/// references in each resource.
///
/// Note: Device and instance destruction is handled by VulkanDevice::drop()
/// to avoid issues with drop ordering and callback exceptions on Windows.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop to ensure it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Reusable command pool for one-shot transfer operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub transfer_command_pool: Mutex<vk::CommandPool>,

    /// Vulkan instance (kept for reference, destroyed by VulkanDevice)
    #[allow(dead_code)]
    instance: ash::Instance,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        transfer_command_pool: vk::CommandPool,
        instance: ash::Instance,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            graphics_queue,
            graphics_queue_family,
            transfer_command_pool: Mutex::new(transfer_command_pool),
            instance,
        }
    }

    /// Record and synchronously execute a one-shot command buffer
    ///
    /// Allocates from the shared transfer pool, records via `record`, submits
    /// on the graphics queue, and blocks until execution completes. Used by
    /// the host copy paths and layout transitions.
    pub fn one_shot_commands<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        unsafe {
            let pool = self.transfer_command_pool.lock().unwrap();

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| {
                    driver_err!("prism::vulkan", "Failed to allocate one-shot command buffer: {:?}", e)
                })?;
            let command_buffer = command_buffers[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            let result = self
                .device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to begin one-shot command buffer: {:?}", e))
                .and_then(|_| {
                    record(command_buffer);
                    self.device
                        .end_command_buffer(command_buffer)
                        .map_err(|e| driver_err!("prism::vulkan", "Failed to end one-shot command buffer: {:?}", e))
                })
                .and_then(|_| {
                    let command_buffers = [command_buffer];
                    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
                    self.device
                        .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                        .map_err(|e| driver_err!("prism::vulkan", "Failed to submit one-shot commands: {:?}", e))
                })
                .and_then(|_| {
                    self.device
                        .queue_wait_idle(self.graphics_queue)
                        .map_err(|e| driver_err!("prism::vulkan", "Failed to wait for one-shot commands: {:?}", e))
                });

            self.device.free_command_buffers(*pool, &command_buffers);

            result
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        // NOTE: Device and instance destruction is handled by VulkanDevice::drop()
        // to avoid issues with drop ordering and callback exceptions on Windows.
        // This Drop impl intentionally does nothing.
    }
}
