/// Mock backend for unit tests
///
/// Implements the device traits entirely on the host so the framebuffer
/// core can be exercised without a GPU. Images store their pixels in a
/// plain byte vector (tightly packed rows, stencil byte at offset 0 of
/// each depth-stencil pixel block); command buffers record what was
/// asked of them for assertions.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use winit::window::Window;
use crate::error::{Error, Result};
use super::command_buffer::{CommandBuffer, Rect2D, RenderPassBeginInfo};
use super::device::Device;
use super::framebuffer::{Framebuffer, FramebufferDesc};
use super::image::{CopyOptions, DeviceFormat, Image, ImageDesc, ImageInfo, ImageLayout};
use super::pixel_rect::PixelRect;
use super::render_pass::{RenderPass, RenderPassDesc, RenderPassFlags};
use super::window_surface::WindowSurface;

// ===== MOCK IMAGE =====

pub struct MockImage {
    info: ImageInfo,
    pixels: Mutex<Vec<u8>>,
    layout: Mutex<ImageLayout>,
}

impl MockImage {
    pub fn new(desc: &ImageDesc) -> Self {
        let size = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel();
        Self {
            info: ImageInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
            },
            pixels: Mutex::new(vec![0; size]),
            layout: Mutex::new(ImageLayout::Undefined),
        }
    }

    pub fn layout(&self) -> ImageLayout {
        *self.layout.lock().unwrap()
    }

    /// Set every stencil byte (offset 0 of each pixel block)
    pub fn fill_stencil(&self, value: u8) {
        let bpp = self.info.format.bytes_per_pixel();
        let mut pixels = self.pixels.lock().unwrap();
        for pixel in pixels.chunks_mut(bpp) {
            pixel[0] = value;
        }
    }

    /// Stencil byte of the pixel at (x, y)
    pub fn stencil_at(&self, x: u32, y: u32) -> u8 {
        let bpp = self.info.format.bytes_per_pixel();
        let index = (y as usize * self.info.width as usize + x as usize) * bpp;
        self.pixels.lock().unwrap()[index]
    }
}

impl Image for MockImage {
    fn info(&self) -> &ImageInfo {
        &self.info
    }

    fn copy_to_host(
        &self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &mut [u8],
    ) -> Result<()> {
        if buf.len() < dst.buffer_size() {
            return Err(Error::BackendError("Host buffer too small".to_string()));
        }
        let pixels = self.pixels.lock().unwrap();
        let bpp = self.info.format.bytes_per_pixel();
        let image_stride = self.info.width as usize * bpp;
        let host_stride = dst.aligned_row_bytes();
        let host_pixel = dst.pixel_byte_offset();
        let bytes = if options.stencil_only { 1 } else { bpp.min(host_pixel) };

        for row in 0..src.height as usize {
            let image_row = if options.invert_y {
                src.y as usize + src.height as usize - 1 - row
            } else {
                src.y as usize + row
            };
            for col in 0..src.width as usize {
                let ipx = image_row * image_stride + (src.x as usize + col) * bpp;
                let hpx =
                    (dst.y as usize + row) * host_stride + (dst.x as usize + col) * host_pixel;
                buf[hpx..hpx + bytes].copy_from_slice(&pixels[ipx..ipx + bytes]);
            }
        }
        Ok(())
    }

    fn copy_from_host(
        &self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &[u8],
    ) -> Result<()> {
        if buf.len() < src.buffer_size() {
            return Err(Error::BackendError("Host buffer too small".to_string()));
        }
        let mut pixels = self.pixels.lock().unwrap();
        let bpp = self.info.format.bytes_per_pixel();
        let image_stride = self.info.width as usize * bpp;
        let host_stride = src.aligned_row_bytes();
        let host_pixel = src.pixel_byte_offset();
        let bytes = if options.stencil_only { 1 } else { bpp.min(host_pixel) };

        for row in 0..dst.height as usize {
            let image_row = if options.invert_y {
                dst.y as usize + dst.height as usize - 1 - row
            } else {
                dst.y as usize + row
            };
            for col in 0..dst.width as usize {
                let ipx = image_row * image_stride + (dst.x as usize + col) * bpp;
                let hpx =
                    (src.y as usize + row) * host_stride + (src.x as usize + col) * host_pixel;
                pixels[ipx..ipx + bytes].copy_from_slice(&buf[hpx..hpx + bytes]);
            }
        }
        Ok(())
    }

    fn prepare_layout(&self, new_layout: ImageLayout) -> Result<()> {
        *self.layout.lock().unwrap() = new_layout;
        Ok(())
    }
}

// ===== MOCK RENDER PASS =====

pub struct MockRenderPass {
    desc: RenderPassDesc,
}

impl MockRenderPass {
    pub fn color_format(&self) -> DeviceFormat {
        self.desc.color_format
    }

    pub fn depth_stencil_format(&self) -> DeviceFormat {
        self.desc.depth_stencil_format
    }
}

impl RenderPass for MockRenderPass {
    fn flags(&self) -> RenderPassFlags {
        self.desc.flags
    }
}

// ===== MOCK FRAMEBUFFER =====

pub struct MockFramebuffer {
    width: u32,
    height: u32,
    attachment_count: usize,
}

impl MockFramebuffer {
    pub fn attachment_count(&self) -> usize {
        self.attachment_count
    }
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

// ===== MOCK COMMAND BUFFER =====

/// Begin-time parameters captured by the mock command buffer
#[derive(Debug, Clone, PartialEq)]
pub struct BeginRecord {
    pub clear_rect: Rect2D,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

#[derive(Default)]
pub struct MockCommandBuffer {
    pub commands: Vec<String>,
    pub begins: Vec<BeginRecord>,
    pub fail_end: bool,
}

impl MockCommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_begin(&self) -> Option<&BeginRecord> {
        self.begins.last()
    }
}

impl CommandBuffer for MockCommandBuffer {
    fn begin_render_pass(&mut self, info: &RenderPassBeginInfo<'_>) -> Result<()> {
        self.commands.push(format!(
            "begin_render_pass {}x{}",
            info.framebuffer.width(),
            info.framebuffer.height()
        ));
        self.begins.push(BeginRecord {
            clear_rect: info.clear_rect,
            clear_color: info.clear_color,
            clear_depth: info.clear_depth,
            clear_stencil: info.clear_stencil,
        });
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if self.fail_end {
            return Err(Error::BackendError("Mock end_render_pass failure".to_string()));
        }
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }
}

// ===== MOCK WINDOW SURFACE =====

pub struct MockWindowSurface {
    images: Vec<Arc<MockImage>>,
    next: Mutex<usize>,
    width: u32,
    height: u32,
    format: DeviceFormat,
}

impl MockWindowSurface {
    pub fn new(image_count: usize, width: u32, height: u32, format: DeviceFormat) -> Self {
        let images = (0..image_count)
            .map(|_| {
                Arc::new(MockImage::new(&ImageDesc {
                    width,
                    height,
                    format,
                    usage: super::image::ImageUsage::RenderTarget,
                }))
            })
            .collect();
        Self {
            images,
            next: Mutex::new(0),
            width,
            height,
            format,
        }
    }

    /// Force the acquired image index (tests drive acquisition directly)
    pub fn set_next_image_index(&self, index: usize) {
        *self.next.lock().unwrap() = index % self.images.len();
    }

    pub fn mock_image(&self, index: usize) -> &Arc<MockImage> {
        &self.images[index]
    }
}

impl WindowSurface for MockWindowSurface {
    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn next_image_index(&self) -> usize {
        *self.next.lock().unwrap()
    }

    fn acquire_next_image(&self) -> Result<usize> {
        let mut next = self.next.lock().unwrap();
        *next = (*next + 1) % self.images.len();
        Ok(*next)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> DeviceFormat {
        self.format
    }

    fn image(&self, index: usize) -> Arc<dyn Image> {
        self.images[index].clone()
    }
}

// ===== MOCK DEVICE =====

pub struct MockDevice {
    supported_ds_formats: Vec<DeviceFormat>,
    images_created: AtomicUsize,
    render_passes_created: AtomicUsize,
    framebuffers_created: AtomicUsize,
    fail_framebuffers: AtomicBool,
    fail_images: AtomicBool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            // Typical hardware: no sampled D16S8, no pure D24
            supported_ds_formats: vec![
                DeviceFormat::D16_UNORM,
                DeviceFormat::D24_UNORM_S8_UINT,
                DeviceFormat::D32_SFLOAT,
                DeviceFormat::S8_UINT,
            ],
            images_created: AtomicUsize::new(0),
            render_passes_created: AtomicUsize::new(0),
            framebuffers_created: AtomicUsize::new(0),
            fail_framebuffers: AtomicBool::new(false),
            fail_images: AtomicBool::new(false),
        }
    }

    pub fn with_supported_ds_formats(formats: Vec<DeviceFormat>) -> Self {
        Self {
            supported_ds_formats: formats,
            ..Self::new()
        }
    }

    pub fn images_created(&self) -> usize {
        self.images_created.load(Ordering::Relaxed)
    }

    pub fn render_passes_created(&self) -> usize {
        self.render_passes_created.load(Ordering::Relaxed)
    }

    pub fn framebuffers_created(&self) -> usize {
        self.framebuffers_created.load(Ordering::Relaxed)
    }

    /// Make all subsequent framebuffer creations fail
    pub fn set_fail_framebuffers(&self, fail: bool) {
        self.fail_framebuffers.store(fail, Ordering::Relaxed);
    }

    /// Make all subsequent image creations fail
    pub fn set_fail_images(&self, fail: bool) {
        self.fail_images.store(fail, Ordering::Relaxed);
    }

    fn supports(&self, format: DeviceFormat) -> bool {
        self.supported_ds_formats.contains(&format)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MockDevice {
    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn Image>> {
        if self.fail_images.load(Ordering::Relaxed) {
            return Err(Error::BackendError("Mock image creation failure".to_string()));
        }
        self.images_created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MockImage::new(desc)))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        self.render_passes_created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        if self.fail_framebuffers.load(Ordering::Relaxed) {
            return Err(Error::BackendError(
                "Mock framebuffer creation failure".to_string(),
            ));
        }
        self.framebuffers_created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            attachment_count: desc.attachments.len(),
        }))
    }

    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>> {
        Ok(Box::new(MockCommandBuffer::new()))
    }

    fn create_window_surface(&self, _window: &Window) -> Result<Arc<dyn WindowSurface>> {
        Ok(Arc::new(MockWindowSurface::new(
            3,
            640,
            480,
            DeviceFormat::R8G8B8A8_UNORM,
        )))
    }

    fn find_depth_stencil_format(&self, depth_bits: u32, stencil_bits: u32) -> DeviceFormat {
        let candidates: &[DeviceFormat] = match (depth_bits > 0, stencil_bits > 0) {
            (true, true) => &[
                DeviceFormat::D32_SFLOAT_S8_UINT,
                DeviceFormat::D24_UNORM_S8_UINT,
                DeviceFormat::D16_UNORM_S8_UINT,
            ],
            (true, false) => &[
                DeviceFormat::D32_SFLOAT,
                DeviceFormat::D24_UNORM_S8_UINT,
                DeviceFormat::D16_UNORM,
            ],
            (false, true) => &[
                DeviceFormat::S8_UINT,
                DeviceFormat::D16_UNORM_S8_UINT,
                DeviceFormat::D24_UNORM_S8_UINT,
            ],
            (false, false) => return DeviceFormat::UNDEFINED,
        };

        // Prefer the largest supported format not exceeding the request,
        // then fall back to anything supported
        if let Some(format) = candidates
            .iter()
            .copied()
            .find(|f| self.supports(*f) && f.depth_bits() <= depth_bits)
        {
            return format;
        }
        candidates
            .iter()
            .copied()
            .find(|f| self.supports(*f))
            .unwrap_or(DeviceFormat::UNDEFINED)
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
