/// Object registry - name-keyed storage for textures and renderbuffers
///
/// GLES objects are referred to by integer names. The registry owns the
/// objects in slotmap arenas and keeps name-to-key indexes so attachment
/// bindings can store names while resolution caches store keys.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use super::attachment::ResolvedAttachment;
use super::depth_stencil::DepthStencilStore;
use super::texture::{Renderbuffer, Texture};

new_key_type! {
    /// Stable key of a texture in the registry
    pub struct TextureKey;
    /// Stable key of a renderbuffer in the registry
    pub struct RenderbufferKey;
}

/// Registry of named GLES objects
#[derive(Default)]
pub struct ObjectRegistry {
    textures: SlotMap<TextureKey, Texture>,
    renderbuffers: SlotMap<RenderbufferKey, Renderbuffer>,
    texture_names: FxHashMap<u32, TextureKey>,
    renderbuffer_names: FxHashMap<u32, RenderbufferKey>,
    next_name: u32,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            next_name: 1,
            ..Default::default()
        }
    }

    fn allocate_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    /// Create a new texture and return its name
    pub fn create_texture(&mut self) -> u32 {
        let name = self.allocate_name();
        let key = self.textures.insert(Texture::new(name));
        self.texture_names.insert(name, key);
        name
    }

    /// Insert an externally constructed texture (swap image wrappers)
    pub fn insert_texture(&mut self, texture: Texture) -> u32 {
        let name = texture.name();
        let key = self.textures.insert(texture);
        self.texture_names.insert(name, key);
        name
    }

    /// Reserve a fresh name without creating an object
    pub fn reserve_name(&mut self) -> u32 {
        self.allocate_name()
    }

    /// Create a new renderbuffer and return its name
    pub fn create_renderbuffer(&mut self) -> u32 {
        let name = self.allocate_name();
        let key = self.renderbuffers.insert(Renderbuffer::new(name));
        self.renderbuffer_names.insert(name, key);
        name
    }

    pub fn texture_key(&self, name: u32) -> Option<TextureKey> {
        self.texture_names.get(&name).copied()
    }

    pub fn renderbuffer_key(&self, name: u32) -> Option<RenderbufferKey> {
        self.renderbuffer_names.get(&name).copied()
    }

    pub fn texture(&self, name: u32) -> Option<&Texture> {
        self.texture_key(name).and_then(|key| self.textures.get(key))
    }

    pub fn texture_mut(&mut self, name: u32) -> Option<&mut Texture> {
        let key = self.texture_key(name)?;
        self.textures.get_mut(key)
    }

    pub fn renderbuffer(&self, name: u32) -> Option<&Renderbuffer> {
        self.renderbuffer_key(name)
            .and_then(|key| self.renderbuffers.get(key))
    }

    pub fn renderbuffer_mut(&mut self, name: u32) -> Option<&mut Renderbuffer> {
        let key = self.renderbuffer_key(name)?;
        self.renderbuffers.get_mut(key)
    }

    pub fn texture_by_key(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn texture_by_key_mut(&mut self, key: TextureKey) -> Option<&mut Texture> {
        self.textures.get_mut(key)
    }

    pub fn renderbuffer_by_key(&self, key: RenderbufferKey) -> Option<&Renderbuffer> {
        self.renderbuffers.get(key)
    }

    pub fn renderbuffer_by_key_mut(&mut self, key: RenderbufferKey) -> Option<&mut Renderbuffer> {
        self.renderbuffers.get_mut(key)
    }

    /// The texture a resolved attachment refers to (a renderbuffer's
    /// backing texture for renderbuffer attachments)
    pub fn attached_texture(&self, resolved: ResolvedAttachment) -> Option<&Texture> {
        match resolved {
            ResolvedAttachment::Texture(key) => self.textures.get(key),
            ResolvedAttachment::Renderbuffer(key) => {
                self.renderbuffers.get(key).map(|rb| rb.texture())
            }
        }
    }

    pub fn attached_texture_mut(&mut self, resolved: ResolvedAttachment) -> Option<&mut Texture> {
        match resolved {
            ResolvedAttachment::Texture(key) => self.textures.get_mut(key),
            ResolvedAttachment::Renderbuffer(key) => {
                self.renderbuffers.get_mut(key).map(|rb| rb.texture_mut())
            }
        }
    }

    /// Delete a texture, releasing any combined depth-stencil surface it
    /// recorded
    pub fn delete_texture(&mut self, name: u32, ds_store: &mut DepthStencilStore) -> bool {
        let Some(key) = self.texture_names.remove(&name) else {
            return false;
        };
        if let Some(texture) = self.textures.remove(key) {
            if let Some(ds_key) = texture.depth_stencil() {
                ds_store.release(ds_key);
            }
        }
        true
    }

    /// Delete a renderbuffer
    pub fn delete_renderbuffer(&mut self, name: u32, ds_store: &mut DepthStencilStore) -> bool {
        let Some(key) = self.renderbuffer_names.remove(&name) else {
            return false;
        };
        if let Some(rb) = self.renderbuffers.remove(key) {
            if let Some(ds_key) = rb.texture().depth_stencil() {
                ds_store.release(ds_key);
            }
        }
        true
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn renderbuffer_count(&self) -> usize {
        self.renderbuffers.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
