/// Shared combined depth-stencil surfaces
///
/// Separate GLES depth and stencil attachments of matching size collapse
/// into one combined backend image. The store owns these surfaces in a
/// slotmap arena and reference-counts them explicitly: a surface is held
/// by the framebuffer that built it and, for texture attachments, by the
/// depth texture it was recorded on. Release finalizes the surface
/// exactly when the count reaches zero.

use std::sync::Arc;
use slotmap::{new_key_type, SlotMap};
use crate::device::{DeviceFormat, Image};

new_key_type! {
    /// Stable key of a combined depth-stencil surface
    pub struct DepthStencilKey;
}

/// A combined depth-stencil surface
pub struct SharedDepthStencil {
    pub image: Arc<dyn Image>,
    pub format: DeviceFormat,
    pub width: u32,
    pub height: u32,
    refcount: u32,
}

/// Arena of shared combined depth-stencil surfaces
#[derive(Default)]
pub struct DepthStencilStore {
    surfaces: SlotMap<DepthStencilKey, SharedDepthStencil>,
}

impl DepthStencilStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new surface with a reference count of one
    pub fn insert(
        &mut self,
        image: Arc<dyn Image>,
        format: DeviceFormat,
        width: u32,
        height: u32,
    ) -> DepthStencilKey {
        self.surfaces.insert(SharedDepthStencil {
            image,
            format,
            width,
            height,
            refcount: 1,
        })
    }

    /// Take one more reference on `key`
    ///
    /// Panics if `key` is stale; a retain after finalization is a
    /// bookkeeping bug, not a recoverable condition.
    pub fn retain(&mut self, key: DepthStencilKey) {
        let surface = self
            .surfaces
            .get_mut(key)
            .unwrap_or_else(|| panic!("retain on finalized depth-stencil surface"));
        surface.refcount += 1;
    }

    /// Drop one reference on `key`; finalizes the surface when the count
    /// reaches zero. Returns true if the surface was finalized.
    ///
    /// Panics if `key` is stale (double release).
    pub fn release(&mut self, key: DepthStencilKey) -> bool {
        let surface = self
            .surfaces
            .get_mut(key)
            .unwrap_or_else(|| panic!("release on finalized depth-stencil surface"));
        debug_assert!(surface.refcount > 0);
        surface.refcount -= 1;
        if surface.refcount == 0 {
            self.surfaces.remove(key);
            true
        } else {
            false
        }
    }

    pub fn get(&self, key: DepthStencilKey) -> Option<&SharedDepthStencil> {
        self.surfaces.get(key)
    }

    pub fn contains(&self, key: DepthStencilKey) -> bool {
        self.surfaces.contains_key(key)
    }

    /// Current reference count of `key`, zero if finalized
    pub fn refcount(&self, key: DepthStencilKey) -> u32 {
        self.surfaces.get(key).map(|s| s.refcount).unwrap_or(0)
    }

    /// Number of live surfaces
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
#[path = "depth_stencil_tests.rs"]
mod tests;
