/// Image - Vulkan implementation of the driver Image trait
///
/// Owns a vk::Image plus its view and allocation (swapchain images are
/// borrowed: the swapchain owns the image handle, the wrapper owns only the
/// view). Host copies go through a CPU-visible staging buffer and a one-shot
/// command submission; the rectangle repacking between the tightly packed
/// staging rows and the aligned host rows happens on the CPU.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use prism_gles::device::{
    CopyOptions, DeviceFormat, Image as DriverImage, ImageInfo, ImageLayout, PixelRect,
};
use prism_gles::error::Result;
use prism_gles::{driver_bail, driver_err, driver_error};
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;

/// Vulkan image implementation
pub struct Image {
    /// Vulkan image handle
    pub(crate) image: vk::Image,
    /// Vulkan image view
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation (None for swapchain images)
    allocation: Mutex<Option<Allocation>>,
    /// Whether the image handle is owned (false for swapchain images)
    owns_image: bool,
    /// Last layout the image was transitioned to
    layout: Mutex<vk::ImageLayout>,
    /// Read-only image properties
    info: ImageInfo,
    /// Shared GPU context (for cleanup and transfer submission)
    context: Arc<GpuContext>,
}

impl Image {
    pub(crate) fn new(
        image: vk::Image,
        view: vk::ImageView,
        allocation: Option<Allocation>,
        info: ImageInfo,
        context: Arc<GpuContext>,
    ) -> Self {
        Self {
            image,
            view,
            allocation: Mutex::new(allocation),
            owns_image: true,
            layout: Mutex::new(vk::ImageLayout::UNDEFINED),
            info,
            context,
        }
    }

    /// Wrap a swapchain image; the swapchain keeps ownership of the image
    /// handle, the wrapper owns the view.
    pub(crate) fn from_swapchain_image(
        image: vk::Image,
        view: vk::ImageView,
        info: ImageInfo,
        context: Arc<GpuContext>,
    ) -> Self {
        Self {
            image,
            view,
            allocation: Mutex::new(None),
            owns_image: false,
            layout: Mutex::new(vk::ImageLayout::UNDEFINED),
            info,
            context,
        }
    }

    /// The aspect used for transfer operations on this image
    fn copy_aspect(&self, options: CopyOptions) -> vk::ImageAspectFlags {
        if options.stencil_only {
            vk::ImageAspectFlags::STENCIL
        } else if self.info.format.depth_bits() > 0 {
            vk::ImageAspectFlags::DEPTH
        } else if self.info.format.stencil_bits() > 0 {
            vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::COLOR
        }
    }

    /// Bytes per texel moved by a transfer with the given options
    fn copy_texel_size(&self, options: CopyOptions) -> usize {
        if options.stencil_only {
            1
        } else {
            self.info.format.bytes_per_pixel()
        }
    }

    fn create_staging_buffer(&self, size: u64) -> Result<(vk::Buffer, Allocation)> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .context
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to create staging buffer: {:?}", e))?;

            let requirements = self.context.device.get_buffer_memory_requirements(buffer);

            let allocation = self
                .context
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name: "image_staging_buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    driver_error!("prism::vulkan", "Out of GPU memory for staging buffer ({:.2} MB)", size_mb);
                    self.context.device.destroy_buffer(buffer, None);
                    prism_gles::Error::OutOfMemory
                })?;

            self.context
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| driver_err!("prism::vulkan", "Failed to bind staging buffer memory: {:?}", e))?;

            Ok((buffer, allocation))
        }
    }

    fn destroy_staging_buffer(&self, buffer: vk::Buffer, allocation: Allocation) {
        unsafe {
            self.context.allocator.lock().unwrap().free(allocation).ok();
            self.context.device.destroy_buffer(buffer, None);
        }
    }

    /// Run `transfer_layout` transfers for the `src` rectangle against a
    /// staging buffer, transitioning in and out of the transfer layout
    /// around `record`.
    fn with_transfer(
        &self,
        transfer_layout: vk::ImageLayout,
        record: impl FnOnce(vk::CommandBuffer),
    ) -> Result<()> {
        let mut layout = self.layout.lock().unwrap();
        let old_layout = *layout;
        let aspect = aspect_mask_for(self.info.format);

        self.context.one_shot_commands(|cb| {
            record_transition(&self.context.device, cb, self.image, aspect, old_layout, transfer_layout);
            record(cb);
            // An undefined image has no contents worth restoring; leave it
            // in the transfer layout.
            if old_layout != vk::ImageLayout::UNDEFINED {
                record_transition(&self.context.device, cb, self.image, aspect, transfer_layout, old_layout);
            }
        })?;

        if old_layout == vk::ImageLayout::UNDEFINED {
            *layout = transfer_layout;
        }
        Ok(())
    }
}

impl DriverImage for Image {
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
            driver_bail!(
                "prism::vulkan",
                "Host buffer too small for copy: {} < {}",
                buf.len(),
                dst.buffer_size()
            );
        }

        let texel_size = self.copy_texel_size(options);
        let tight_row = src.width as usize * texel_size;
        let staging_size = (src.height as usize * tight_row).max(1);
        let (buffer, allocation) = self.create_staging_buffer(staging_size as u64)?;

        let aspect = self.copy_aspect(options);
        let region = buffer_image_copy(src, aspect);

        let result = self
            .with_transfer(vk::ImageLayout::TRANSFER_SRC_OPTIMAL, |cb| unsafe {
                self.context.device.cmd_copy_image_to_buffer(
                    cb,
                    self.image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    buffer,
                    &[region],
                );
            })
            .and_then(|_| {
                let mapped = allocation
                    .mapped_ptr()
                    .ok_or_else(|| driver_err!("prism::vulkan", "Staging buffer is not host mapped"))?;
                let staging = unsafe {
                    std::slice::from_raw_parts(mapped.as_ptr() as *const u8, staging_size)
                };

                // Repack tight staging rows into the aligned host layout
                let block = dst.pixel_byte_offset();
                let stride = dst.aligned_row_bytes();
                let base = dst.start_row_offset(stride);
                let copy_bytes = texel_size.min(block);
                for row in 0..src.height as usize {
                    let src_row = if options.invert_y {
                        src.height as usize - 1 - row
                    } else {
                        row
                    };
                    for col in 0..src.width as usize {
                        let s = src_row * tight_row + col * texel_size;
                        let d = base + row * stride + col * block;
                        buf[d..d + copy_bytes].copy_from_slice(&staging[s..s + copy_bytes]);
                    }
                }
                Ok(())
            });

        self.destroy_staging_buffer(buffer, allocation);
        result
    }

    fn copy_from_host(
        &self,
        src: &PixelRect,
        dst: &PixelRect,
        options: CopyOptions,
        buf: &[u8],
    ) -> Result<()> {
        if buf.len() < src.buffer_size() {
            driver_bail!(
                "prism::vulkan",
                "Host buffer too small for copy: {} < {}",
                buf.len(),
                src.buffer_size()
            );
        }

        let texel_size = self.copy_texel_size(options);
        let tight_row = dst.width as usize * texel_size;
        let staging_size = (dst.height as usize * tight_row).max(1);
        let (buffer, allocation) = self.create_staging_buffer(staging_size as u64)?;

        let result = (|| {
            let mapped = allocation
                .mapped_ptr()
                .ok_or_else(|| driver_err!("prism::vulkan", "Staging buffer is not host mapped"))?;
            let staging = unsafe {
                std::slice::from_raw_parts_mut(mapped.as_ptr() as *mut u8, staging_size)
            };

            // Gather the aligned host rows into tight staging rows
            let block = src.pixel_byte_offset();
            let stride = src.aligned_row_bytes();
            let base = src.start_row_offset(stride);
            let copy_bytes = texel_size.min(block);
            for row in 0..dst.height as usize {
                let dst_row = if options.invert_y {
                    dst.height as usize - 1 - row
                } else {
                    row
                };
                for col in 0..dst.width as usize {
                    let s = base + row * stride + col * block;
                    let d = dst_row * tight_row + col * texel_size;
                    staging[d..d + copy_bytes].copy_from_slice(&buf[s..s + copy_bytes]);
                }
            }

            let aspect = self.copy_aspect(options);
            let region = buffer_image_copy(dst, aspect);
            self.with_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, |cb| unsafe {
                self.context.device.cmd_copy_buffer_to_image(
                    cb,
                    buffer,
                    self.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            })
        })();

        self.destroy_staging_buffer(buffer, allocation);
        result
    }

    fn prepare_layout(&self, new_layout: ImageLayout) -> Result<()> {
        let vk_new = layout_to_vk(new_layout);
        let mut layout = self.layout.lock().unwrap();
        if *layout == vk_new || vk_new == vk::ImageLayout::UNDEFINED {
            return Ok(());
        }

        let old_layout = *layout;
        let aspect = aspect_mask_for(self.info.format);
        self.context.one_shot_commands(|cb| {
            record_transition(&self.context.device, cb, self.image, aspect, old_layout, vk_new);
        })?;

        *layout = vk_new;
        Ok(())
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_image_view(self.view, None);

            if let Some(allocation) = self.allocation.lock().unwrap().take() {
                self.context.allocator.lock().unwrap().free(allocation).ok();
            }

            if self.owns_image {
                self.context.device.destroy_image(self.image, None);
            }
        }
    }
}

/// Build the buffer-image copy region for a tightly packed staging buffer
fn buffer_image_copy(rect: &PixelRect, aspect: vk::ImageAspectFlags) -> vk::BufferImageCopy {
    vk::BufferImageCopy::default()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(vk::ImageSubresourceLayers {
            aspect_mask: aspect,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        })
        .image_offset(vk::Offset3D {
            x: rect.x,
            y: rect.y,
            z: 0,
        })
        .image_extent(vk::Extent3D {
            width: rect.width,
            height: rect.height,
            depth: 1,
        })
}

/// Record a layout transition barrier
pub(crate) fn record_transition(
    device: &ash::Device,
    cb: vk::CommandBuffer,
    image: vk::Image,
    aspect: vk::ImageAspectFlags,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    if old_layout == new_layout {
        return;
    }

    let (src_stage, src_access) = layout_sync(old_layout);
    let (dst_stage, dst_access) = layout_sync(new_layout);

    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .src_access_mask(src_access)
        .dst_access_mask(dst_access);

    unsafe {
        device.cmd_pipeline_barrier(
            cb,
            src_stage,
            dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

/// Pipeline stage and access mask implied by a layout
fn layout_sync(layout: vk::ImageLayout) -> (vk::PipelineStageFlags, vk::AccessFlags) {
    match layout {
        vk::ImageLayout::UNDEFINED => (vk::PipelineStageFlags::TOP_OF_PIPE, vk::AccessFlags::empty()),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        ),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => (
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => (
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::AccessFlags::SHADER_READ,
        ),
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => {
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_READ)
        }
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => {
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE)
        }
        vk::ImageLayout::PRESENT_SRC_KHR => {
            (vk::PipelineStageFlags::BOTTOM_OF_PIPE, vk::AccessFlags::empty())
        }
        _ => (vk::PipelineStageFlags::ALL_COMMANDS, vk::AccessFlags::empty()),
    }
}

/// Convert a driver image layout to the Vulkan layout
pub(crate) fn layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

/// Convert a driver format to the Vulkan format
pub(crate) fn format_to_vk(format: DeviceFormat) -> vk::Format {
    match format {
        DeviceFormat::UNDEFINED => vk::Format::UNDEFINED,
        DeviceFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        DeviceFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        DeviceFormat::R5G6B5_UNORM => vk::Format::R5G6B5_UNORM_PACK16,
        DeviceFormat::R4G4B4A4_UNORM => vk::Format::R4G4B4A4_UNORM_PACK16,
        DeviceFormat::R5G5B5A1_UNORM => vk::Format::R5G5B5A1_UNORM_PACK16,
        DeviceFormat::D16_UNORM => vk::Format::D16_UNORM,
        DeviceFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        DeviceFormat::D16_UNORM_S8_UINT => vk::Format::D16_UNORM_S8_UINT,
        DeviceFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        DeviceFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        DeviceFormat::S8_UINT => vk::Format::S8_UINT,
    }
}

/// Aspect flags implied by a format
pub(crate) fn aspect_mask_for(format: DeviceFormat) -> vk::ImageAspectFlags {
    let mut aspect = vk::ImageAspectFlags::empty();
    if format.depth_bits() > 0 {
        aspect |= vk::ImageAspectFlags::DEPTH;
    }
    if format.stencil_bits() > 0 {
        aspect |= vk::ImageAspectFlags::STENCIL;
    }
    if aspect.is_empty() {
        aspect = vk::ImageAspectFlags::COLOR;
    }
    aspect
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
