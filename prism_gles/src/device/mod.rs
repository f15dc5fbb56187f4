/// Device module - the backend trait boundary
///
/// Everything the GLES-side core needs from the lower-level, explicit
/// graphics API is expressed here as traits and plain descriptor structs.
/// Backend crates (e.g. the Vulkan backend) implement these traits.

// Module declarations
pub mod command_buffer;
pub mod device;
pub mod framebuffer;
pub mod image;
pub mod pixel_rect;
pub mod render_pass;
pub mod window_surface;

// Mock backend for unit tests (no GPU required)
#[cfg(test)]
pub mod mock_device;

// Re-exports
pub use command_buffer::*;
pub use device::*;
pub use framebuffer::*;
pub use image::*;
pub use pixel_rect::*;
pub use render_pass::*;
pub use window_surface::*;
