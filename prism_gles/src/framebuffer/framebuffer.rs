/// Framebuffer orchestrator
///
/// Owns the attachment state of one GLES framebuffer object and the
/// backend objects derived from it: the render pass, one device
/// framebuffer per buffer slot, and (via the shared store) the combined
/// depth-stencil surface. Backend objects are immutable, so the
/// orchestrator tracks dirty state and rebuilds them lazily when a pass
/// is prepared.

use std::sync::Arc;
use crate::device::{
    CommandBuffer, Device, DeviceFormat, Framebuffer as DeviceFramebuffer, FramebufferDesc, Image,
    ImageDesc, ImageLayout, ImageUsage, RenderPass, RenderPassBeginInfo, RenderPassDesc,
    RenderPassFlags, Rect2D, WindowSurface,
};
use crate::error::{Error, Result};
use crate::{driver_err, driver_error, driver_trace};
use super::attachment::{
    Attachment, AttachmentBinding, AttachmentCache, AttachmentPoint, ResolvedAttachment,
};
use super::completeness::{self, Completeness};
use super::depth_stencil::{DepthStencilKey, DepthStencilStore};
use super::dirty::DirtyState;
use super::format::internal_format_for_surface;
use super::registry::ObjectRegistry;
use super::stencil_clear;
use super::texture::Texture;

const LOG_SOURCE: &str = "prism::Framebuffer";

/// Parameters for preparing a render pass
///
/// The flags feed the render pass object (rebuilt when they change); the
/// clear values are begin-time state and never force a rebuild.
#[derive(Debug, Clone)]
pub struct PrepareParams {
    pub flags: RenderPassFlags,
    pub clear_rect: Rect2D,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

impl Default for PrepareParams {
    fn default() -> Self {
        Self {
            flags: RenderPassFlags::WRITE_COLOR
                | RenderPassFlags::WRITE_DEPTH
                | RenderPassFlags::WRITE_STENCIL,
            clear_rect: Rect2D {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }
}

/// A GLES framebuffer object
pub struct Framebuffer {
    // One color attachment per buffer slot; on-screen targets hold one
    // per swap image, off-screen targets at most one
    colors: Vec<Attachment>,
    depth: Attachment,
    stencil: Attachment,
    cache: AttachmentCache,
    width: i32,
    height: i32,
    dirty: DirtyState,
    surface: Option<Arc<dyn WindowSurface>>,
    depth_stencil: Option<DepthStencilKey>,
    render_pass: Option<Arc<dyn RenderPass>>,
    buffers: Vec<Arc<dyn DeviceFramebuffer>>,
    clear_rect: Rect2D,
    clear_color: [f32; 4],
    clear_depth: f32,
    clear_stencil: u32,
    pass_active: bool,
}

impl Framebuffer {
    /// Create an off-screen framebuffer with no attachments
    pub fn new() -> Self {
        Self {
            colors: Vec::new(),
            depth: Attachment::new(),
            stencil: Attachment::new(),
            cache: AttachmentCache::new(),
            width: 0,
            height: 0,
            dirty: DirtyState::Clean,
            surface: None,
            depth_stencil: None,
            render_pass: None,
            buffers: Vec::new(),
            clear_rect: Rect2D {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            pass_active: false,
        }
    }

    /// Create the on-screen framebuffer for a window surface
    ///
    /// Wraps each swap image in a texture and binds one color attachment
    /// per image. When `with_depth_stencil` is set, a combined
    /// depth-stencil surface sized to the swap images is created up
    /// front; the on-screen target owns it for its whole lifetime.
    pub fn from_window_surface(
        device: &dyn Device,
        surface: Arc<dyn WindowSurface>,
        registry: &mut ObjectRegistry,
        ds_store: &mut DepthStencilStore,
        with_depth_stencil: bool,
    ) -> Result<Self> {
        let mut framebuffer = Self::new();
        framebuffer.width = surface.width() as i32;
        framebuffer.height = surface.height() as i32;

        let internal_format = internal_format_for_surface(surface.format());
        for index in 0..surface.image_count() {
            let name = registry.reserve_name();
            let texture = Texture::from_image(name, surface.image(index), internal_format);
            registry.insert_texture(texture);

            let mut attachment = Attachment::new();
            attachment.attach(AttachmentBinding::Texture(name), registry);
            framebuffer.colors.push(attachment);
        }

        if with_depth_stencil {
            let format = device.find_depth_stencil_format(24, 8);
            if format == DeviceFormat::UNDEFINED {
                return Err(driver_err!(
                    LOG_SOURCE,
                    "No supported depth-stencil format for the window surface"
                ));
            }
            let image = device.create_image(&ImageDesc {
                width: surface.width(),
                height: surface.height(),
                format,
                usage: ImageUsage::DepthStencil,
            })?;
            image.prepare_layout(ImageLayout::DepthStencilAttachment)?;
            let key = ds_store.insert(image, format, surface.width(), surface.height());
            framebuffer.depth_stencil = Some(key);
        }

        framebuffer.surface = Some(surface);
        framebuffer.dirty.mark_attachments();
        Ok(framebuffer)
    }

    pub fn is_window_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The buffer slot rendering targets this frame: the acquired swap
    /// image for on-screen targets, always zero off-screen
    pub fn current_buffer_index(&self) -> usize {
        match &self.surface {
            Some(surface) => surface.next_image_index(),
            None => 0,
        }
    }

    /// Number of buffer slots (swap images on-screen, one off-screen)
    pub fn buffer_count(&self) -> usize {
        match &self.surface {
            Some(_) => self.colors.len(),
            None => 1,
        }
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn render_pass(&self) -> Option<&Arc<dyn RenderPass>> {
        self.render_pass.as_ref()
    }

    pub fn device_framebuffer(&self, index: usize) -> Option<&Arc<dyn DeviceFramebuffer>> {
        self.buffers.get(index)
    }

    pub fn depth_stencil(&self) -> Option<DepthStencilKey> {
        self.depth_stencil
    }

    pub fn attachment_binding(&self, point: AttachmentPoint) -> AttachmentBinding {
        match point {
            AttachmentPoint::Color => self
                .colors
                .first()
                .map(|a| a.binding())
                .unwrap_or(AttachmentBinding::None),
            AttachmentPoint::Depth => self.depth.binding(),
            AttachmentPoint::Stencil => self.stencil.binding(),
        }
    }

    // ===== ATTACHMENT MANAGEMENT =====

    /// Bind an object to an attachment point
    ///
    /// Rebinding adjusts bind counts on the old and new objects and
    /// invalidates the memoized resolution for that point only. Color
    /// attachments define the framebuffer's dimensions; a dimension
    /// change or any depth/stencil rebind also marks the size dirty so
    /// the shared depth-stencil surface is rebuilt.
    pub fn attach(
        &mut self,
        point: AttachmentPoint,
        binding: AttachmentBinding,
        registry: &mut ObjectRegistry,
    ) {
        match point {
            AttachmentPoint::Color => {
                if self.colors.is_empty() {
                    self.colors.push(Attachment::new());
                }
                self.colors[0].attach(binding, registry);
                let dims = self.colors[0]
                    .resolve(registry)
                    .and_then(|r| registry.attached_texture(r))
                    .map(|t| (t.width(), t.height()));
                if let Some((width, height)) = dims {
                    if (width, height) != (self.width, self.height) {
                        self.width = width;
                        self.height = height;
                        self.dirty.mark_size();
                    }
                }
            }
            AttachmentPoint::Depth => {
                self.depth.attach(binding, registry);
                let resolved = self.depth.resolve(registry);
                self.adopt_dimensions(resolved, registry);
                self.dirty.mark_size();
            }
            AttachmentPoint::Stencil => {
                self.stencil.attach(binding, registry);
                let resolved = self.stencil.resolve(registry);
                self.adopt_dimensions(resolved, registry);
                self.dirty.mark_size();
            }
        }
        self.cache.invalidate(point);
        self.dirty.mark_attachments();
    }

    /// Unbind an attachment point
    pub fn detach(&mut self, point: AttachmentPoint, registry: &mut ObjectRegistry) {
        match point {
            AttachmentPoint::Color => {
                if let Some(attachment) = self.colors.first_mut() {
                    attachment.detach(registry);
                }
            }
            AttachmentPoint::Depth => {
                self.depth.detach(registry);
                self.dirty.mark_size();
            }
            AttachmentPoint::Stencil => {
                self.stencil.detach(registry);
                self.dirty.mark_size();
            }
        }
        self.cache.invalidate(point);
        self.dirty.mark_attachments();
    }

    // Depth/stencil-only framebuffers take their dimensions from the
    // attachment being bound; an attached color texture keeps authority
    // over the dimensions
    fn adopt_dimensions(
        &mut self,
        resolved: Option<ResolvedAttachment>,
        registry: &ObjectRegistry,
    ) {
        let color_defined = self
            .colors
            .first()
            .and_then(|a| a.resolve(registry))
            .and_then(|r| registry.attached_texture(r))
            .is_some();
        if color_defined {
            return;
        }
        if let Some(texture) = resolved.and_then(|r| registry.attached_texture(r)) {
            self.width = texture.width();
            self.height = texture.height();
        }
    }

    /// Define the framebuffer's dimensions without a color attachment
    ///
    /// Marks the size dirty unless the held depth-stencil surface already
    /// matches the new dimensions.
    pub fn set_size(&mut self, width: i32, height: i32, ds_store: &DepthStencilStore) {
        if self.colors.is_empty() {
            self.colors.push(Attachment::new());
        }
        self.width = width;
        self.height = height;
        let ds_matches = self
            .depth_stencil
            .and_then(|key| ds_store.get(key))
            .map(|s| (s.width as i32, s.height as i32) == (width, height))
            .unwrap_or(false);
        if ds_matches {
            self.dirty.mark_attachments();
        } else {
            self.dirty.mark_size();
        }
    }

    // ===== ATTACHMENT RESOLUTION =====

    fn resolved(
        &mut self,
        point: AttachmentPoint,
        registry: &ObjectRegistry,
    ) -> Option<ResolvedAttachment> {
        if point == AttachmentPoint::Color && self.is_window_surface() {
            // On-screen color resolution tracks the acquired swap image
            // and is not memoized
            let index = self.current_buffer_index();
            return self.colors.get(index)?.resolve(registry);
        }
        if let Some(hit) = self.cache.get(point) {
            return Some(hit);
        }
        let attachment = match point {
            AttachmentPoint::Color => self.colors.first()?,
            AttachmentPoint::Depth => &self.depth,
            AttachmentPoint::Stencil => &self.stencil,
        };
        let resolved = attachment.resolve(registry)?;
        self.cache.set(point, Some(resolved));
        Some(resolved)
    }

    /// The texture attached at `point`, if the binding resolves to a live
    /// object
    pub fn attached_texture<'r>(
        &mut self,
        point: AttachmentPoint,
        registry: &'r ObjectRegistry,
    ) -> Option<&'r Texture> {
        let resolved = self.resolved(point, registry)?;
        match registry.attached_texture(resolved) {
            Some(texture) => Some(texture),
            None => {
                // The object was deleted out from under the cache
                self.cache.invalidate(point);
                None
            }
        }
    }

    // ===== COMPLETENESS =====

    /// Validate the framebuffer per the GLES completeness rules
    pub fn check_completeness(&mut self, registry: &ObjectRegistry) -> Completeness {
        let color = self.attached_texture(AttachmentPoint::Color, registry);
        let depth = self.attached_texture(AttachmentPoint::Depth, registry);
        let stencil = self.attached_texture(AttachmentPoint::Stencil, registry);
        completeness::check(color, depth, stencil)
    }

    // ===== RENDER PASS LIFECYCLE =====

    /// Consume the data-updated flags of all attached textures, marking
    /// the framebuffer dirty if any attachment's contents changed
    ///
    /// An in-place storage redefinition of the color attachment also
    /// re-derives the framebuffer's dimensions and marks the size dirty
    /// so the shared depth-stencil surface is rebuilt to match.
    pub fn refresh_attachment_state(&mut self, registry: &mut ObjectRegistry) {
        for point in AttachmentPoint::ALL {
            let Some(resolved) = self.resolved(point, registry) else {
                continue;
            };
            if let Some(texture) = registry.attached_texture_mut(resolved) {
                if texture.take_data_updated() {
                    self.dirty.mark_attachments();
                }
            }
        }

        if !self.is_window_surface() {
            let dims = self
                .resolved(AttachmentPoint::Color, registry)
                .and_then(|r| registry.attached_texture(r))
                .map(|t| (t.width(), t.height()));
            if let Some((width, height)) = dims {
                if (width, height) != (self.width, self.height) {
                    self.width = width;
                    self.height = height;
                    self.dirty.mark_size();
                }
            }
        }
    }

    /// Bring the backend objects up to date and latch the begin-time
    /// clear parameters
    ///
    /// Rebuilds the render pass and device framebuffers when attachments
    /// changed, the size changed, or the requested clear/write flags
    /// differ from the current render pass. A size change on an
    /// off-screen target rebuilds the shared depth-stencil surface first.
    /// Clear parameters are always updated, rebuild or not.
    pub fn prepare_for_render(
        &mut self,
        device: &dyn Device,
        registry: &mut ObjectRegistry,
        ds_store: &mut DepthStencilStore,
        params: &PrepareParams,
    ) -> Result<()> {
        self.refresh_attachment_state(registry);

        let flags_changed = match &self.render_pass {
            Some(render_pass) => render_pass.flags() != params.flags,
            None => true,
        };
        if self.dirty.needs_rebuild() || flags_changed {
            driver_trace!(
                LOG_SOURCE,
                "Rebuilding render target (dirty: {:?}, flags changed: {})",
                self.dirty,
                flags_changed
            );
            if !self.is_window_surface() && self.dirty.size_dirty() {
                self.rebuild_depth_stencil_surface(device, registry, ds_store)?;
                self.dirty.resolve_size();
            }
            self.create_render_pass(device, registry, ds_store, params.flags)?;
            self.rebuild_buffers(device, registry, ds_store)?;
            self.dirty.resolve();
        }

        self.clear_rect = params.clear_rect;
        self.clear_color = params.clear_color;
        self.clear_depth = params.clear_depth;
        self.clear_stencil = params.clear_stencil;
        Ok(())
    }

    /// Begin the render pass on the device framebuffer for the current
    /// buffer slot
    pub fn begin_pass(&mut self, cmd: &mut dyn CommandBuffer) -> Result<()> {
        let Some(render_pass) = self.render_pass.as_ref() else {
            return Err(Error::InvalidResource(
                "Render pass not prepared before begin".to_string(),
            ));
        };
        let index = self.current_buffer_index();
        let Some(framebuffer) = self.buffers.get(index) else {
            return Err(Error::InvalidResource(format!(
                "No device framebuffer for buffer slot {index}"
            )));
        };
        cmd.begin_render_pass(&RenderPassBeginInfo {
            render_pass,
            framebuffer,
            clear_rect: self.clear_rect,
            clear_color: self.clear_color,
            clear_depth: self.clear_depth,
            clear_stencil: self.clear_stencil,
        })?;
        self.pass_active = true;
        Ok(())
    }

    /// End the active render pass
    ///
    /// Returns true if a pass was actually ended. Calling without an
    /// active pass is a no-op.
    pub fn end_pass(&mut self, cmd: &mut dyn CommandBuffer) -> bool {
        if !self.pass_active {
            return false;
        }
        self.pass_active = false;
        match cmd.end_render_pass() {
            Ok(()) => true,
            Err(e) => {
                driver_error!(LOG_SOURCE, "Failed to end render pass: {}", e);
                false
            }
        }
    }

    pub fn pass_active(&self) -> bool {
        self.pass_active
    }

    // ===== DEPTH-STENCIL SHARING =====

    // Bring the combined depth-stencil surface in line with the current
    // depth/stencil attachments: reuse the surface recorded on the
    // attached depth texture when one exists, otherwise release the held
    // surface and allocate a fresh one covering the union of the
    // requested depth and stencil bits.
    fn rebuild_depth_stencil_surface(
        &mut self,
        device: &dyn Device,
        registry: &mut ObjectRegistry,
        ds_store: &mut DepthStencilStore,
    ) -> Result<()> {
        let depth_resolved = self.resolved(AttachmentPoint::Depth, registry);
        let stencil_resolved = self.resolved(AttachmentPoint::Stencil, registry);

        let recorded = depth_resolved
            .and_then(|r| registry.attached_texture(r))
            .and_then(|t| t.depth_stencil());
        if let Some(key) = recorded {
            let size_matches = ds_store
                .get(key)
                .map(|s| (s.width as i32, s.height as i32) == (self.width, self.height))
                .unwrap_or(false);
            if size_matches {
                if self.depth_stencil != Some(key) {
                    if let Some(held) = self.depth_stencil.take() {
                        ds_store.release(held);
                    }
                    ds_store.retain(key);
                    self.depth_stencil = Some(key);
                }
                return Ok(());
            }
        }

        if let Some(held) = self.depth_stencil.take() {
            ds_store.release(held);
        }

        let depth_format = depth_resolved
            .and_then(|r| registry.attached_texture(r))
            .map(|t| t.internal_format());
        let stencil_format = stencil_resolved
            .and_then(|r| registry.attached_texture(r))
            .map(|t| t.internal_format());
        if depth_format.is_none() && stencil_format.is_none() {
            return Ok(());
        }

        let requested = [depth_format, stencil_format];
        let depth_bits = requested
            .iter()
            .flatten()
            .map(|f| f.depth_bits())
            .max()
            .unwrap_or(0);
        let stencil_bits = requested
            .iter()
            .flatten()
            .map(|f| f.stencil_bits())
            .max()
            .unwrap_or(0);

        let format = device.find_depth_stencil_format(depth_bits, stencil_bits);
        if format == DeviceFormat::UNDEFINED {
            return Err(driver_err!(
                LOG_SOURCE,
                "No supported depth-stencil format for {}d{}s",
                depth_bits,
                stencil_bits
            ));
        }

        let width = self.width.max(0) as u32;
        let height = self.height.max(0) as u32;
        let image = device.create_image(&ImageDesc {
            width,
            height,
            format,
            usage: ImageUsage::DepthStencil,
        })?;
        image.prepare_layout(ImageLayout::DepthStencilAttachment)?;
        let key = ds_store.insert(image, format, width, height);
        self.depth_stencil = Some(key);

        // Record the surface on the depth texture so other framebuffers
        // attaching the same texture share it; drop the texture's
        // reference to any stale surface first
        if let Some(texture) = depth_resolved.and_then(|r| registry.attached_texture_mut(r)) {
            if let Some(stale) = texture.depth_stencil() {
                ds_store.release(stale);
            }
            texture.set_depth_stencil(Some(key));
            ds_store.retain(key);
        }
        Ok(())
    }

    fn create_render_pass(
        &mut self,
        device: &dyn Device,
        registry: &ObjectRegistry,
        ds_store: &DepthStencilStore,
        flags: RenderPassFlags,
    ) -> Result<()> {
        let color_format = self
            .attached_texture(AttachmentPoint::Color, registry)
            .map(|t| t.device_format())
            .unwrap_or(DeviceFormat::UNDEFINED);
        let depth_stencil_format = self
            .depth_stencil
            .and_then(|key| ds_store.get(key))
            .map(|s| s.format)
            .unwrap_or(DeviceFormat::UNDEFINED);
        let render_pass = device.create_render_pass(&RenderPassDesc {
            flags,
            color_format,
            depth_stencil_format,
        })?;
        self.render_pass = Some(render_pass);
        Ok(())
    }

    // Release all device framebuffers, then create one per buffer slot.
    // A creation failure aborts the whole rebuild and leaves no buffers.
    fn rebuild_buffers(
        &mut self,
        device: &dyn Device,
        registry: &mut ObjectRegistry,
        ds_store: &DepthStencilStore,
    ) -> Result<()> {
        self.buffers.clear();

        let Some(render_pass) = self.render_pass.clone() else {
            return Err(Error::InvalidResource(
                "Render pass missing during framebuffer rebuild".to_string(),
            ));
        };
        let ds_image = self
            .depth_stencil
            .and_then(|key| ds_store.get(key))
            .map(|s| s.image.clone());

        let count = self.buffer_count();
        let mut buffers = Vec::with_capacity(count);
        for index in 0..count {
            let resolved = if self.is_window_surface() {
                self.colors.get(index).and_then(|a| a.resolve(registry))
            } else {
                self.resolved(AttachmentPoint::Color, registry)
            };

            let mut attachments: Vec<Arc<dyn Image>> = Vec::with_capacity(2);
            if let Some(resolved) = resolved {
                if let Some(texture) = registry.attached_texture_mut(resolved) {
                    texture.allocate(device)?;
                    if let Some(image) = texture.image() {
                        attachments.push(image.clone());
                    }
                }
            }
            if let Some(image) = &ds_image {
                attachments.push(image.clone());
            }

            let framebuffer = device.create_framebuffer(&FramebufferDesc {
                render_pass: render_pass.clone(),
                attachments,
                width: self.width.max(0) as u32,
                height: self.height.max(0) as u32,
            })?;
            buffers.push(framebuffer);
        }

        self.buffers = buffers;
        Ok(())
    }

    // ===== STENCIL CLEAR EMULATION =====

    /// Clear the stencil aspect inside `rect`, honoring the front stencil
    /// write mask
    ///
    /// With a full eight-bit mask the render pass clear applies and no
    /// emulation runs; otherwise the clear is merged on the host.
    pub fn clear_stencil_masked(
        &mut self,
        ds_store: &DepthStencilStore,
        rect: Rect2D,
        clear_stencil: u32,
        write_mask: u32,
    ) -> Result<()> {
        if !stencil_clear::needs_masked_clear(write_mask) {
            return Ok(());
        }
        let surface = self
            .depth_stencil
            .and_then(|key| ds_store.get(key))
            .ok_or_else(|| {
                Error::InvalidResource("No depth-stencil surface to clear".to_string())
            })?;
        stencil_clear::clear_masked(
            surface.image.as_ref(),
            surface.format,
            rect,
            clear_stencil,
            write_mask,
        )
    }

    // ===== LAYOUT =====

    /// Transition an attachment image to a new layout
    ///
    /// The depth-stencil attachment layout routes to the shared combined
    /// surface; every other layout targets the current color attachment.
    pub fn prepare_image_layout(
        &mut self,
        layout: ImageLayout,
        registry: &ObjectRegistry,
        ds_store: &DepthStencilStore,
    ) -> Result<()> {
        if layout == ImageLayout::DepthStencilAttachment {
            if let Some(surface) = self.depth_stencil.and_then(|key| ds_store.get(key)) {
                surface.image.prepare_layout(layout)?;
            }
            return Ok(());
        }
        if let Some(texture) = self.attached_texture(AttachmentPoint::Color, registry) {
            texture.prepare_layout(layout)?;
        }
        Ok(())
    }

    // ===== TEARDOWN =====

    /// Release all backend objects and attachment references
    ///
    /// Ordering matters: device framebuffers first, then the render pass,
    /// then the shared depth-stencil surface, then the attachment bind
    /// counts.
    pub fn destroy(mut self, registry: &mut ObjectRegistry, ds_store: &mut DepthStencilStore) {
        self.buffers.clear();
        self.render_pass = None;
        if let Some(key) = self.depth_stencil.take() {
            ds_store.release(key);
        }
        for mut attachment in std::mem::take(&mut self.colors) {
            attachment.detach(registry);
        }
        self.depth.detach(registry);
        self.stencil.detach(registry);
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
