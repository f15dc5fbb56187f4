/// Swapchain - Vulkan implementation of the driver WindowSurface trait
///
/// Manages presentation to the window, completely separated from rendering
/// logic. Owns the swap images; the framebuffer core consumes them through
/// non-owning `Image` wrappers.

use ash::vk;
use prism_gles::device::{
    DeviceFormat, Image as DriverImage, ImageInfo, ImageUsage, WindowSurface,
};
use prism_gles::error::{Error, Result};
use prism_gles::{driver_err, driver_error};
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_image::Image;

/// Number of frames that can be processed concurrently
const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Vulkan swapchain implementation
pub struct Swapchain {
    /// Shared GPU context
    context: Arc<GpuContext>,

    /// Present queue
    present_queue: vk::Queue,

    /// Surface
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    /// Swapchain
    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    /// Swap images wrapped for the framebuffer core (views owned by the
    /// wrappers, image handles owned by the swapchain)
    images: Vec<Arc<Image>>,
    format: DeviceFormat,
    extent: vk::Extent2D,

    /// Synchronization primitives
    /// One semaphore per frame in flight (for acquire)
    image_available_semaphores: Vec<vk::Semaphore>,
    /// One semaphore per swapchain image (for present)
    render_finished_semaphores: Vec<vk::Semaphore>,

    /// Index of the swap image acquired for the current frame
    next_image: Mutex<usize>,
    /// Current frame in flight (0 or 1 for double buffering)
    current_frame: Mutex<usize>,
}

impl Swapchain {
    pub(crate) fn new(
        context: Arc<GpuContext>,
        physical_device: vk::PhysicalDevice,
        instance: &ash::Instance,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        present_queue: vk::Queue,
    ) -> Result<Self> {
        unsafe {
            // Query surface capabilities
            let surface_capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to get surface capabilities: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface capabilities: {:?}", e))
                })?;

            // Choose surface format; the GLES side works in UNORM
            let surface_formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?;

            let surface_format = surface_formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_UNORM || f.format == vk::Format::R8G8B8A8_UNORM
                })
                .unwrap_or(&surface_formats[0]);

            let extent = surface_capabilities.current_extent;

            // Triple buffering when the surface allows it
            let mut image_count = 3.max(surface_capabilities.min_image_count);
            if surface_capabilities.max_image_count > 0 {
                image_count = image_count.min(surface_capabilities.max_image_count);
            }

            // Create swapchain
            let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(
                    vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC,
                )
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(surface_capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO);

            let swapchain_loader = ash::khr::swapchain::Device::new(instance, &context.device);
            let swapchain = swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            // Get swapchain images and wrap them for the framebuffer core
            let swapchain_images = swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to get swapchain images: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get swapchain images: {:?}", e))
                })?;

            let format = vk_format_to_device(surface_format.format);
            let mut images = Vec::with_capacity(swapchain_images.len());
            for &image in &swapchain_images {
                let create_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(surface_format.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                let view = context
                    .device
                    .create_image_view(&create_info, None)
                    .map_err(|e| {
                        driver_error!("prism::vulkan", "Failed to create swapchain image view: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create image view: {:?}", e))
                    })?;

                images.push(Arc::new(Image::from_swapchain_image(
                    image,
                    view,
                    ImageInfo {
                        width: extent.width,
                        height: extent.height,
                        format,
                        usage: ImageUsage::RenderTarget,
                    },
                    Arc::clone(&context),
                )));
            }

            // Create synchronization primitives
            let image_count = images.len();
            let semaphore_create_info = vk::SemaphoreCreateInfo::default();

            let mut image_available_semaphores = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
            let mut render_finished_semaphores = Vec::with_capacity(image_count);

            for _ in 0..MAX_FRAMES_IN_FLIGHT {
                image_available_semaphores.push(
                    context
                        .device
                        .create_semaphore(&semaphore_create_info, None)
                        .map_err(|e| {
                            driver_error!("prism::vulkan", "Failed to create image-available semaphore: {:?}", e);
                            Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                        })?,
                );
            }

            for _ in 0..image_count {
                render_finished_semaphores.push(
                    context
                        .device
                        .create_semaphore(&semaphore_create_info, None)
                        .map_err(|e| {
                            driver_error!("prism::vulkan", "Failed to create render-finished semaphore: {:?}", e);
                            Error::InitializationFailed(format!("Failed to create semaphore: {:?}", e))
                        })?,
                );
            }

            Ok(Self {
                context,
                present_queue,
                surface,
                surface_loader,
                swapchain,
                swapchain_loader,
                images,
                format,
                extent,
                image_available_semaphores,
                render_finished_semaphores,
                next_image: Mutex::new(0),
                current_frame: Mutex::new(0),
            })
        }
    }

    /// Get the image available semaphore for the current frame (to wait on in submit)
    pub fn image_available_semaphore(&self) -> vk::Semaphore {
        self.image_available_semaphores[*self.current_frame.lock().unwrap()]
    }

    /// Get the render finished semaphore for a specific image (to signal in submit)
    pub fn render_finished_semaphore(&self, image_index: usize) -> vk::Semaphore {
        self.render_finished_semaphores[image_index]
    }

    /// Present the swap image at `image_index`
    pub fn present(&self, image_index: usize) -> Result<()> {
        unsafe {
            let swapchains = [self.swapchain];
            let image_indices = [image_index as u32];
            let wait_semaphores = [self.render_finished_semaphores[image_index]];

            let present_info = vk::PresentInfoKHR::default()
                .wait_semaphores(&wait_semaphores)
                .swapchains(&swapchains)
                .image_indices(&image_indices);

            let result = self
                .swapchain_loader
                .queue_present(self.present_queue, &present_info);

            // Move to next frame regardless of suboptimal/out-of-date
            let mut frame = self.current_frame.lock().unwrap();
            *frame = (*frame + 1) % MAX_FRAMES_IN_FLIGHT;

            match result {
                Ok(_) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(()),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    Err(driver_err!("prism::vulkan", "Swapchain out of date during present"))
                }
                Err(e) => Err(driver_err!("prism::vulkan", "Failed to present swapchain image: {:?}", e)),
            }
        }
    }
}

impl WindowSurface for Swapchain {
    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn next_image_index(&self) -> usize {
        *self.next_image.lock().unwrap()
    }

    fn acquire_next_image(&self) -> Result<usize> {
        unsafe {
            let frame = *self.current_frame.lock().unwrap();
            let (image_index, _is_suboptimal) = self
                .swapchain_loader
                .acquire_next_image(
                    self.swapchain,
                    u64::MAX,
                    self.image_available_semaphores[frame],
                    vk::Fence::null(),
                )
                .map_err(|e| {
                    if e == vk::Result::ERROR_OUT_OF_DATE_KHR {
                        driver_err!("prism::vulkan", "Swapchain out of date during acquire")
                    } else {
                        driver_err!("prism::vulkan", "Failed to acquire next swapchain image: {:?}", e)
                    }
                })?;

            *self.next_image.lock().unwrap() = image_index as usize;
            Ok(image_index as usize)
        }
    }

    fn width(&self) -> u32 {
        self.extent.width
    }

    fn height(&self) -> u32 {
        self.extent.height
    }

    fn format(&self) -> DeviceFormat {
        self.format
    }

    fn image(&self, index: usize) -> Arc<dyn DriverImage> {
        Arc::clone(&self.images[index]) as Arc<dyn DriverImage>
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.context.device.device_wait_idle().ok();

            // Destroy synchronization primitives
            for &semaphore in &self.image_available_semaphores {
                self.context.device.destroy_semaphore(semaphore, None);
            }
            for &semaphore in &self.render_finished_semaphores {
                self.context.device.destroy_semaphore(semaphore, None);
            }

            // Drop the image wrappers (destroys their views) before the
            // swapchain that owns the image handles
            self.images.clear();

            // Destroy swapchain
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);

            // Destroy surface
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

/// Convert a Vulkan surface format to a driver format
fn vk_format_to_device(format: vk::Format) -> DeviceFormat {
    match format {
        vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_SRGB => DeviceFormat::R8G8B8A8_UNORM,
        vk::Format::B8G8R8A8_UNORM | vk::Format::B8G8R8A8_SRGB => DeviceFormat::B8G8R8A8_UNORM,
        // Fallback
        _ => DeviceFormat::B8G8R8A8_UNORM,
    }
}
