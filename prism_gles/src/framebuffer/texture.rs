/// Texture and renderbuffer storage
///
/// A texture owns (or borrows, for swap images) a backend image plus the
/// GLES-side state the framebuffer core needs: dimensions, internal
/// format, a bind count, and an optional link to a shared combined
/// depth-stencil surface.

use std::sync::Arc;
use crate::device::{
    CopyOptions, Device, DeviceFormat, Image, ImageDesc, ImageLayout, ImageUsage, PixelRect,
};
use crate::driver_err;
use crate::error::{Error, Result};
use super::depth_stencil::DepthStencilKey;
use super::format::InternalFormat;

/// Texture object
pub struct Texture {
    name: u32,
    width: i32,
    height: i32,
    internal_format: InternalFormat,
    usage: ImageUsage,
    image: Option<Arc<dyn Image>>,
    bind_count: u32,
    // Combined depth-stencil surface allocated for this texture, if any
    depth_stencil: Option<DepthStencilKey>,
    data_updated: bool,
}

impl Texture {
    /// Create an empty texture with no storage
    pub fn new(name: u32) -> Self {
        Self {
            name,
            width: 0,
            height: 0,
            internal_format: InternalFormat::RGBA8,
            usage: ImageUsage::SampledAndRenderTarget,
            image: None,
            bind_count: 0,
            depth_stencil: None,
            data_updated: false,
        }
    }

    /// Create a texture wrapping an existing backend image (swap images)
    pub fn from_image(name: u32, image: Arc<dyn Image>, internal_format: InternalFormat) -> Self {
        let info = image.info().clone();
        Self {
            name,
            width: info.width as i32,
            height: info.height as i32,
            internal_format,
            usage: info.usage,
            image: Some(image),
            bind_count: 0,
            depth_stencil: None,
            data_updated: false,
        }
    }

    /// Define the texture's storage shape; any existing backend image is
    /// released and recreated lazily on the next `allocate`
    pub fn set_storage(&mut self, width: i32, height: i32, internal_format: InternalFormat) {
        self.width = width;
        self.height = height;
        self.internal_format = internal_format;
        self.image = None;
        self.data_updated = true;
    }

    /// Allocate the backend image if storage is defined and not yet backed
    pub fn allocate(&mut self, device: &dyn Device) -> Result<()> {
        if self.image.is_some() {
            return Ok(());
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(driver_err!(
                "prism::Texture",
                "Cannot allocate texture {} with dimensions {}x{}",
                self.name,
                self.width,
                self.height
            ));
        }

        let format = self.internal_format.to_device_format();
        let usage = if format.is_depth_stencil() {
            ImageUsage::DepthStencil
        } else {
            self.usage
        };
        let image = device.create_image(&ImageDesc {
            width: self.width as u32,
            height: self.height as u32,
            format,
            usage,
        })?;
        self.image = Some(image);
        Ok(())
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn internal_format(&self) -> InternalFormat {
        self.internal_format
    }

    /// The backend format the texture's storage uses
    pub fn device_format(&self) -> DeviceFormat {
        match &self.image {
            Some(image) => image.info().format,
            None => self.internal_format.to_device_format(),
        }
    }

    /// The backend image, if storage has been allocated
    pub fn image(&self) -> Option<&Arc<dyn Image>> {
        self.image.as_ref()
    }

    /// Number of framebuffer attachment points referencing this texture
    pub fn bind_count(&self) -> u32 {
        self.bind_count
    }

    pub(super) fn bind(&mut self) {
        self.bind_count += 1;
    }

    pub(super) fn unbind(&mut self) {
        debug_assert!(self.bind_count > 0, "unbind without matching bind");
        self.bind_count = self.bind_count.saturating_sub(1);
    }

    /// Combined depth-stencil surface recorded on this texture
    pub fn depth_stencil(&self) -> Option<DepthStencilKey> {
        self.depth_stencil
    }

    pub(super) fn set_depth_stencil(&mut self, key: Option<DepthStencilKey>) {
        self.depth_stencil = key;
    }

    /// True when the texture's contents changed since the last time the
    /// flag was consumed
    pub fn data_updated(&self) -> bool {
        self.data_updated
    }

    pub fn mark_data_updated(&mut self) {
        self.data_updated = true;
    }

    /// Consume the data-updated flag
    pub fn take_data_updated(&mut self) -> bool {
        std::mem::take(&mut self.data_updated)
    }

    /// Transition the backing image to a new layout
    pub fn prepare_layout(&self, new_layout: ImageLayout) -> Result<()> {
        match &self.image {
            Some(image) => image.prepare_layout(new_layout),
            None => Ok(()),
        }
    }

    /// Read a rectangle of the texture into a host buffer
    pub fn copy_pixels_to_host(
        &self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &mut [u8],
    ) -> Result<()> {
        let image = self.backed_image()?;
        image.copy_to_host(src, dst, options, buf)
    }

    /// Write a host buffer into a rectangle of the texture
    pub fn copy_pixels_from_host(
        &mut self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &[u8],
    ) -> Result<()> {
        let image = self.backed_image()?;
        image.copy_from_host(src, dst, options, buf)?;
        self.data_updated = true;
        Ok(())
    }

    fn backed_image(&self) -> Result<&Arc<dyn Image>> {
        self.image.as_ref().ok_or_else(|| {
            Error::InvalidResource(format!("Texture {} has no storage", self.name))
        })
    }
}

/// Renderbuffer object
///
/// A renderbuffer is a texture that can only be rendered to, never
/// sampled. It wraps a `Texture` for its storage.
pub struct Renderbuffer {
    name: u32,
    texture: Texture,
}

impl Renderbuffer {
    pub fn new(name: u32) -> Self {
        let mut texture = Texture::new(name);
        texture.usage = ImageUsage::RenderTarget;
        Self { name, texture }
    }

    /// Define the renderbuffer's storage shape
    pub fn set_storage(&mut self, width: i32, height: i32, internal_format: InternalFormat) {
        self.texture.set_storage(width, height, internal_format);
    }

    pub fn name(&self) -> u32 {
        self.name
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn texture_mut(&mut self) -> &mut Texture {
        &mut self.texture
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
