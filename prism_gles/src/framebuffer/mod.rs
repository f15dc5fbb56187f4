/// Framebuffer module - GLES render target resource management
///
/// Maps the mutable GLES framebuffer object model onto immutable backend
/// render passes and framebuffers: attachment bindings and their
/// memoized resolution, shared combined depth-stencil surfaces,
/// completeness validation, dirty tracking with lazy rebuilds, and the
/// masked stencil clear emulation.

// Module declarations
pub mod attachment;
pub mod completeness;
pub mod depth_stencil;
pub mod dirty;
pub mod format;
#[allow(clippy::module_inception)]
pub mod framebuffer;
pub mod registry;
pub mod stencil_clear;
pub mod texture;

// Re-exports
pub use attachment::{AttachmentBinding, AttachmentCache, AttachmentPoint, ResolvedAttachment};
pub use completeness::Completeness;
pub use depth_stencil::{DepthStencilKey, DepthStencilStore, SharedDepthStencil};
pub use dirty::DirtyState;
pub use format::InternalFormat;
pub use framebuffer::{Framebuffer, PrepareParams};
pub use registry::{ObjectRegistry, RenderbufferKey, TextureKey};
pub use texture::{Renderbuffer, Texture};
