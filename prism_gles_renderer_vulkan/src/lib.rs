/*!
# Prism GLES - Vulkan Backend

Vulkan implementation of the `prism_gles` device traits.

This crate provides the concrete backend behind the framebuffer core: images,
render passes, device framebuffers, command buffers, and the swapchain, built
on the Ash bindings with gpu-allocator for memory management.
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_command_buffer;
mod vulkan_context;
mod vulkan_frame_buffer;
mod vulkan_image;
mod vulkan_render_pass;
mod vulkan_swapchain;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan::VulkanDevice;
pub use vulkan_swapchain::Swapchain as VulkanSwapchain;
