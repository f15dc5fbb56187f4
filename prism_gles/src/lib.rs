/*!
# Prism GLES core

Core of a GLES-style rendering driver layered on an explicit, Vulkan-style
graphics device. This crate owns the render-target (framebuffer) resource
management: the mutable, attachment-based framebuffer object model of the
higher API mapped onto the immutable render-pass/framebuffer objects of the
lower one.

## Architecture

- **device**: the backend trait boundary (`Device`, `Image`, `RenderPass`,
  `Framebuffer`, `CommandBuffer`, `WindowSurface`). Backend implementations
  (e.g. the Vulkan backend crate) provide concrete types for these traits.
- **framebuffer**: the GLES-side object graph — attachments, textures and
  renderbuffers, completeness validation, shared depth-stencil surfaces,
  masked stencil clear emulation, and the lazy render-pass lifecycle.

All framebuffer operations are serialized by the owning rendering context:
the subsystem performs no internal locking.
*/

// Internal modules
pub mod config;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod log;

pub use config::Config;
pub use error::{Error, Result};
