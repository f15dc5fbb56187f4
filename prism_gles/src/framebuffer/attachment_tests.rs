/// Tests for attachment bindings, bind counts, and the resolution cache

use super::*;
use crate::framebuffer::registry::ObjectRegistry;

// ============================================================================
// Tests: Bindings
// ============================================================================

#[test]
fn test_default_binding_is_none() {
    let attachment = Attachment::new();
    assert!(attachment.binding().is_none());
    assert_eq!(attachment.binding().name(), None);
}

#[test]
fn test_binding_name() {
    assert_eq!(AttachmentBinding::Texture(7).name(), Some(7));
    assert_eq!(AttachmentBinding::Renderbuffer(9).name(), Some(9));
}

// ============================================================================
// Tests: Bind Counts
// ============================================================================

#[test]
fn test_attach_increments_bind_count() {
    let mut registry = ObjectRegistry::new();
    let name = registry.create_texture();

    let mut attachment = Attachment::new();
    attachment.attach(AttachmentBinding::Texture(name), &mut registry);

    assert_eq!(registry.texture(name).unwrap().bind_count(), 1);
}

#[test]
fn test_rebind_moves_bind_count() {
    let mut registry = ObjectRegistry::new();
    let a = registry.create_texture();
    let b = registry.create_texture();

    let mut attachment = Attachment::new();
    attachment.attach(AttachmentBinding::Texture(a), &mut registry);
    attachment.attach(AttachmentBinding::Texture(b), &mut registry);

    assert_eq!(registry.texture(a).unwrap().bind_count(), 0);
    assert_eq!(registry.texture(b).unwrap().bind_count(), 1);
}

#[test]
fn test_detach_decrements_bind_count() {
    let mut registry = ObjectRegistry::new();
    let name = registry.create_renderbuffer();

    let mut attachment = Attachment::new();
    attachment.attach(AttachmentBinding::Renderbuffer(name), &mut registry);
    attachment.detach(&mut registry);

    assert!(attachment.binding().is_none());
    assert_eq!(
        registry.renderbuffer(name).unwrap().texture().bind_count(),
        0
    );
}

#[test]
fn test_two_attachments_share_one_texture() {
    let mut registry = ObjectRegistry::new();
    let name = registry.create_texture();

    let mut first = Attachment::new();
    let mut second = Attachment::new();
    first.attach(AttachmentBinding::Texture(name), &mut registry);
    second.attach(AttachmentBinding::Texture(name), &mut registry);
    assert_eq!(registry.texture(name).unwrap().bind_count(), 2);

    first.detach(&mut registry);
    assert_eq!(registry.texture(name).unwrap().bind_count(), 1);
}

// ============================================================================
// Tests: Resolution
// ============================================================================

#[test]
fn test_resolve_texture_binding() {
    let mut registry = ObjectRegistry::new();
    let name = registry.create_texture();

    let mut attachment = Attachment::new();
    attachment.attach(AttachmentBinding::Texture(name), &mut registry);

    let expected = ResolvedAttachment::Texture(registry.texture_key(name).unwrap());
    assert_eq!(attachment.resolve(&registry), Some(expected));
}

#[test]
fn test_resolve_dangling_name() {
    let mut registry = ObjectRegistry::new();
    let mut attachment = Attachment::new();
    attachment.attach(AttachmentBinding::Texture(42), &mut registry);
    assert_eq!(attachment.resolve(&registry), None);
}

// ============================================================================
// Tests: Cache
// ============================================================================

#[test]
fn test_cache_set_get_invalidate() {
    let mut registry = ObjectRegistry::new();
    let name = registry.create_texture();
    let resolved = ResolvedAttachment::Texture(registry.texture_key(name).unwrap());

    let mut cache = AttachmentCache::new();
    assert_eq!(cache.get(AttachmentPoint::Depth), None);

    cache.set(AttachmentPoint::Depth, Some(resolved));
    assert_eq!(cache.get(AttachmentPoint::Depth), Some(resolved));
    // Other points are untouched
    assert_eq!(cache.get(AttachmentPoint::Color), None);
    assert_eq!(cache.get(AttachmentPoint::Stencil), None);

    cache.invalidate(AttachmentPoint::Depth);
    assert_eq!(cache.get(AttachmentPoint::Depth), None);
}

#[test]
fn test_cache_invalidate_all() {
    let mut registry = ObjectRegistry::new();
    let name = registry.create_texture();
    let resolved = ResolvedAttachment::Texture(registry.texture_key(name).unwrap());

    let mut cache = AttachmentCache::new();
    for point in AttachmentPoint::ALL {
        cache.set(point, Some(resolved));
    }
    cache.invalidate_all();
    for point in AttachmentPoint::ALL {
        assert_eq!(cache.get(point), None);
    }
}

#[test]
fn test_attachment_point_indexes() {
    assert_eq!(AttachmentPoint::Color.index(), 0);
    assert_eq!(AttachmentPoint::Depth.index(), 1);
    assert_eq!(AttachmentPoint::Stencil.index(), 2);
}
