/// Framebuffer completeness validation
///
/// Pure checks over the resolved attachment textures. Rules are applied
/// in a fixed order so the reported status is deterministic: missing
/// attachments first, then per-attachment validity, then pairwise
/// dimension agreement.

use super::attachment::AttachmentPoint;
use super::texture::Texture;

/// Completeness status of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    /// No attachment point is bound to a live object
    MissingAttachment,
    /// An attachment has a non-renderable format for its point, or
    /// zero/negative dimensions
    BadAttachment,
    /// Attached images do not all share the same dimensions
    DimensionMismatch,
}

impl Completeness {
    pub fn is_complete(self) -> bool {
        self == Completeness::Complete
    }
}

/// Check completeness over the resolved attachments
///
/// A framebuffer with only depth and/or stencil attachments is complete;
/// a color attachment is not required.
pub fn check(
    color: Option<&Texture>,
    depth: Option<&Texture>,
    stencil: Option<&Texture>,
) -> Completeness {
    if color.is_none() && depth.is_none() && stencil.is_none() {
        return Completeness::MissingAttachment;
    }

    let attachments = [
        (AttachmentPoint::Color, color),
        (AttachmentPoint::Depth, depth),
        (AttachmentPoint::Stencil, stencil),
    ];

    for (point, texture) in attachments {
        let Some(texture) = texture else { continue };
        if !renderable_for(point, texture) {
            return Completeness::BadAttachment;
        }
        if texture.width() <= 0 || texture.height() <= 0 {
            return Completeness::BadAttachment;
        }
    }

    let mut dims: Option<(i32, i32)> = None;
    for (_, texture) in attachments {
        let Some(texture) = texture else { continue };
        let size = (texture.width(), texture.height());
        match dims {
            None => dims = Some(size),
            Some(expected) if expected != size => return Completeness::DimensionMismatch,
            Some(_) => {}
        }
    }

    Completeness::Complete
}

fn renderable_for(point: AttachmentPoint, texture: &Texture) -> bool {
    let format = texture.internal_format();
    match point {
        AttachmentPoint::Color => format.is_color_renderable(),
        AttachmentPoint::Depth => format.is_depth_renderable(),
        AttachmentPoint::Stencil => format.is_stencil_renderable(),
    }
}

#[cfg(test)]
#[path = "completeness_tests.rs"]
mod tests;
