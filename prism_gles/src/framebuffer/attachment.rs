/// Attachment points, bindings, and the resolution cache
///
/// An attachment point holds a binding: nothing, a texture name, or a
/// renderbuffer name. Name lookups are memoized per attachment point as
/// registry keys; any binding change invalidates the cached entry for
/// that point only.

use super::registry::{ObjectRegistry, RenderbufferKey, TextureKey};
use super::texture::Texture;

/// The three attachment points of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentPoint {
    Color,
    Depth,
    Stencil,
}

impl AttachmentPoint {
    pub const ALL: [AttachmentPoint; 3] = [
        AttachmentPoint::Color,
        AttachmentPoint::Depth,
        AttachmentPoint::Stencil,
    ];

    pub fn index(self) -> usize {
        match self {
            AttachmentPoint::Color => 0,
            AttachmentPoint::Depth => 1,
            AttachmentPoint::Stencil => 2,
        }
    }
}

/// What an attachment point is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentBinding {
    #[default]
    None,
    Texture(u32),
    Renderbuffer(u32),
}

impl AttachmentBinding {
    pub fn is_none(self) -> bool {
        matches!(self, AttachmentBinding::None)
    }

    /// The bound object's name, if any
    pub fn name(self) -> Option<u32> {
        match self {
            AttachmentBinding::None => None,
            AttachmentBinding::Texture(name) | AttachmentBinding::Renderbuffer(name) => Some(name),
        }
    }
}

/// A binding resolved to a registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAttachment {
    Texture(TextureKey),
    Renderbuffer(RenderbufferKey),
}

/// One attachment point's state
#[derive(Default)]
pub struct Attachment {
    binding: AttachmentBinding,
}

impl Attachment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binding(&self) -> AttachmentBinding {
        self.binding
    }

    /// Rebind this attachment point, adjusting bind counts on the old and
    /// new objects
    pub fn attach(&mut self, binding: AttachmentBinding, registry: &mut ObjectRegistry) {
        self.release(registry);
        if let Some(texture) = bound_texture_mut(binding, registry) {
            texture.bind();
        }
        self.binding = binding;
    }

    /// Clear this attachment point
    pub fn detach(&mut self, registry: &mut ObjectRegistry) {
        self.release(registry);
        self.binding = AttachmentBinding::None;
    }

    fn release(&mut self, registry: &mut ObjectRegistry) {
        if let Some(texture) = bound_texture_mut(self.binding, registry) {
            texture.unbind();
        }
    }

    /// Resolve the binding to a registry key, without caching
    pub fn resolve(&self, registry: &ObjectRegistry) -> Option<ResolvedAttachment> {
        match self.binding {
            AttachmentBinding::None => None,
            AttachmentBinding::Texture(name) => {
                registry.texture_key(name).map(ResolvedAttachment::Texture)
            }
            AttachmentBinding::Renderbuffer(name) => registry
                .renderbuffer_key(name)
                .map(ResolvedAttachment::Renderbuffer),
        }
    }
}

fn bound_texture_mut(
    binding: AttachmentBinding,
    registry: &mut ObjectRegistry,
) -> Option<&mut Texture> {
    match binding {
        AttachmentBinding::None => None,
        AttachmentBinding::Texture(name) => registry.texture_mut(name),
        AttachmentBinding::Renderbuffer(name) => {
            registry.renderbuffer_mut(name).map(|rb| rb.texture_mut())
        }
    }
}

/// Memoized attachment resolution, one slot per attachment point
#[derive(Default)]
pub struct AttachmentCache {
    resolved: [Option<ResolvedAttachment>; 3],
}

impl AttachmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: AttachmentPoint) -> Option<ResolvedAttachment> {
        self.resolved[point.index()]
    }

    pub fn set(&mut self, point: AttachmentPoint, resolved: Option<ResolvedAttachment>) {
        self.resolved[point.index()] = resolved;
    }

    /// Invalidate the cached resolution for one attachment point
    pub fn invalidate(&mut self, point: AttachmentPoint) {
        self.resolved[point.index()] = None;
    }

    pub fn invalidate_all(&mut self) {
        self.resolved = [None; 3];
    }
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;
