/// VulkanDevice - Vulkan implementation of the driver Device trait
///
/// Central object for creating resources and submitting commands.
/// Completely separated from swapchain and presentation logic.

use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation;
use prism_gles::config::Config;
use prism_gles::device::{
    CommandBuffer as DriverCommandBuffer, Device, DeviceFormat, Framebuffer as DriverFramebuffer,
    FramebufferDesc, Image as DriverImage, ImageDesc, ImageUsage, RenderPass as DriverRenderPass,
    RenderPassDesc, RenderPassFlags, WindowSurface,
};
use prism_gles::error::{Error, Result};
use prism_gles::{driver_err, driver_error, driver_info};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use winit::window::Window;

use crate::vulkan_command_buffer::CommandBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_image::{aspect_mask_for, format_to_vk, Image};
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_swapchain::Swapchain;

/// Vulkan device implementation
pub struct VulkanDevice {
    /// Vulkan entry (needed for surface creation)
    entry: ash::Entry,
    /// Vulkan instance
    instance: ash::Instance,
    /// Physical device
    physical_device: vk::PhysicalDevice,
    /// Logical device reference (stored in GpuContext, kept here for convenience)
    device: ash::Device,

    /// Graphics queue
    graphics_queue: vk::Queue,
    /// Present queue (may be same as graphics)
    present_queue: vk::Queue,
    #[allow(dead_code)]
    present_queue_family: u32,

    /// GPU memory allocator reference (stored in GpuContext)
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Fences for submit synchronization
    submit_fences: Vec<vk::Fence>,
    current_submit_fence: Mutex<usize>,

    /// Debug utils loader (for validation layers)
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    /// Debug messenger handle
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    /// Shared GPU context for all resources (images, command buffers)
    gpu_context: Arc<GpuContext>,
}

/// Number of submits that can be in flight concurrently
const MAX_SUBMITS_IN_FLIGHT: usize = 2;

impl VulkanDevice {
    /// Create a new Vulkan device
    ///
    /// # Arguments
    ///
    /// * `window` - Window used to select queue families with present support
    /// * `config` - Driver configuration
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: Config) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load().map_err(|e| {
                driver_error!("prism::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let enable_validation =
                cfg!(feature = "vulkan-validation") && config.enable_validation;

            // Application Info
            let app_name = CString::new(config.app_name.as_str()).unwrap_or_default();
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Prism")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Get required extensions
            let display_handle = window.display_handle().map_err(|e| {
                driver_error!("prism::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        driver_error!("prism::vulkan", "Failed to get required extensions: {}", e);
                        Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                    })?
                    .to_vec();

            // Add debug utils extension if validation is enabled
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            // Validation layers
            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                driver_error!("prism::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // Setup debug messenger if validation is enabled
            let (debug_utils_loader, debug_messenger) =
                Self::create_debug_messenger(&entry, &instance, enable_validation)?;

            // Create Surface (temporary for queue selection)
            let window_handle = window.window_handle().map_err(|e| {
                driver_error!("prism::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                driver_error!("prism::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick Physical Device
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                driver_error!("prism::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

            let physical_device = physical_devices.into_iter().next().ok_or_else(|| {
                driver_error!("prism::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

            // Find Queue Families
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);

            let graphics_family_index = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| {
                    driver_error!("prism::vulkan", "No graphics queue family found");
                    Error::InitializationFailed("No graphics queue family found".to_string())
                })?;

            let present_family_index = (0..queue_families.len() as u32)
                .find(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    driver_error!("prism::vulkan", "No present queue family found");
                    Error::InitializationFailed("No present queue family found".to_string())
                })?;

            // Destroy temporary surface
            surface_loader.destroy_surface(surface, None);

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = if graphics_family_index == present_family_index {
                vec![vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities)]
            } else {
                vec![
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(graphics_family_index)
                        .queue_priorities(&queue_priorities),
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family_index)
                        .queue_priorities(&queue_priorities),
                ]
            };

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                driver_error!("prism::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            // Create submit fences (2 for double buffering)
            let fence_create_info =
                vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

            let mut submit_fences = Vec::with_capacity(MAX_SUBMITS_IN_FLIGHT);
            for _ in 0..MAX_SUBMITS_IN_FLIGHT {
                submit_fences.push(device.create_fence(&fence_create_info, None).map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to create submit fence: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create fence: {:?}", e))
                })?);
            }

            // Create transfer command pool (TRANSIENT + RESET for reusable one-shot copies)
            let transfer_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .flags(
                    vk::CommandPoolCreateFlags::TRANSIENT
                        | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
                );

            let transfer_command_pool = device
                .create_command_pool(&transfer_pool_create_info, None)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to create transfer command pool: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create transfer command pool: {:?}", e))
                })?;

            // Create shared GPU context for all resources
            let allocator_arc = Arc::new(Mutex::new(allocator));
            let gpu_context = Arc::new(GpuContext::new(
                device.clone(),
                Arc::clone(&allocator_arc),
                graphics_queue,
                graphics_family_index,
                transfer_command_pool,
                instance.clone(),
            ));

            driver_info!("prism::vulkan", "Vulkan device initialized for '{}'", config.app_name);

            Ok(Self {
                entry,
                instance,
                physical_device,
                device,
                graphics_queue,
                present_queue,
                present_queue_family: present_family_index,
                allocator: ManuallyDrop::new(allocator_arc),
                submit_fences,
                current_submit_fence: Mutex::new(0),
                debug_utils_loader,
                debug_messenger,
                gpu_context,
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        enable_validation: bool,
    ) -> Result<(
        Option<ash::ext::debug_utils::Instance>,
        Option<vk::DebugUtilsMessengerEXT>,
    )> {
        if !enable_validation {
            return Ok((None, None));
        }

        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));

        let messenger = unsafe {
            debug_utils
                .create_debug_utils_messenger(&debug_info, None)
                .map_err(|e| {
                    driver_error!("prism::vulkan", "Failed to create debug messenger: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                })?
        };

        Ok((Some(debug_utils), Some(messenger)))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
        _enable_validation: bool,
    ) -> Result<(
        Option<ash::ext::debug_utils::Instance>,
        Option<vk::DebugUtilsMessengerEXT>,
    )> {
        Ok((None, None))
    }

    /// Submit command buffers with synchronization for swapchain presentation
    ///
    /// # Arguments
    ///
    /// * `commands` - Slice of command buffers to submit
    /// * `wait_semaphore` - Semaphore to wait on before execution (from swapchain)
    /// * `signal_semaphore` - Semaphore to signal after execution (for present)
    pub fn submit_with_sync(
        &self,
        commands: &[&dyn DriverCommandBuffer],
        wait_semaphore: vk::Semaphore,
        signal_semaphore: vk::Semaphore,
    ) -> Result<()> {
        unsafe {
            let mut fence_index = self.current_submit_fence.lock().unwrap();
            let fence = self.submit_fences[*fence_index];
            *fence_index = (*fence_index + 1) % MAX_SUBMITS_IN_FLIGHT;
            drop(fence_index);

            // Wait for the previous submit with this fence
            self.device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to wait for submit fence: {:?}", e))?;

            self.device
                .reset_fences(&[fence])
                .map_err(|e| driver_err!("prism::vulkan", "Failed to reset submit fence: {:?}", e))?;

            // Collect command buffers
            let command_buffers: Vec<vk::CommandBuffer> = commands
                .iter()
                .map(|cmd| {
                    let vk_cmd = *cmd as *const dyn DriverCommandBuffer as *const CommandBuffer;
                    (*vk_cmd).command_buffer()
                })
                .collect();

            let wait_semaphores = [wait_semaphore];
            let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
            let signal_semaphores = [signal_semaphore];

            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.device
                .queue_submit(self.graphics_queue, &[submit_info], fence)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to submit commands to GPU queue: {:?}", e))?;

            Ok(())
        }
    }

    /// Image usage flags for the declared driver usage
    fn usage_flags(usage: ImageUsage) -> vk::ImageUsageFlags {
        match usage {
            ImageUsage::Sampled => {
                vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST
            }
            ImageUsage::RenderTarget => {
                vk::ImageUsageFlags::COLOR_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSFER_SRC
                    | vk::ImageUsageFlags::TRANSFER_DST
            }
            ImageUsage::SampledAndRenderTarget => {
                vk::ImageUsageFlags::SAMPLED
                    | vk::ImageUsageFlags::COLOR_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSFER_SRC
                    | vk::ImageUsageFlags::TRANSFER_DST
            }
            // Transfer in both directions for the stencil clear emulation
            ImageUsage::DepthStencil => {
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSFER_SRC
                    | vk::ImageUsageFlags::TRANSFER_DST
            }
        }
    }

    /// True if the format can be used as a depth/stencil attachment with
    /// optimal tiling on this physical device
    fn supports_depth_stencil(&self, format: DeviceFormat) -> bool {
        let vk_format = format_to_vk(format);
        let props = unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, vk_format)
        };
        props
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    }

    fn allocate_image_memory(
        &self,
        image: vk::Image,
        desc: &ImageDesc,
    ) -> Result<Allocation> {
        let requirements = unsafe { self.device.get_image_memory_requirements(image) };

        self.allocator
            .lock()
            .unwrap()
            .allocate(&AllocationCreateDesc {
                name: "image",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                driver_error!(
                    "prism::vulkan",
                    "Out of GPU memory for image ({}x{}, {:.2} MB)",
                    desc.width,
                    desc.height,
                    size_mb
                );
                Error::OutOfMemory
            })
    }
}

impl Device for VulkanDevice {
    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn DriverImage>> {
        unsafe {
            let format = format_to_vk(desc.format);
            let aspect_mask = aspect_mask_for(desc.format);

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(Self::usage_flags(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to create image: {:?}", e))?;

            let allocation = match self.allocate_image_memory(image, desc) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            self.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| driver_err!("prism::vulkan", "Failed to bind image memory: {:?}", e))?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = self
                .device
                .create_image_view(&view_create_info, None)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to create image view: {:?}", e))?;

            Ok(Arc::new(Image::new(
                image,
                view,
                Some(allocation),
                prism_gles::device::ImageInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    usage: desc.usage,
                },
                Arc::clone(&self.gpu_context),
            )))
        }
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn DriverRenderPass>> {
        unsafe {
            let mut attachments = Vec::new();
            let mut color_attachment_refs = Vec::new();
            let mut depth_attachment_ref: Option<vk::AttachmentReference> = None;

            let load_op = |clear: bool| {
                if clear {
                    vk::AttachmentLoadOp::CLEAR
                } else {
                    vk::AttachmentLoadOp::LOAD
                }
            };
            let store_op = |write: bool| {
                if write {
                    vk::AttachmentStoreOp::STORE
                } else {
                    vk::AttachmentStoreOp::DONT_CARE
                }
            };

            if desc.color_format != DeviceFormat::UNDEFINED {
                let clear_color = desc.flags.contains(RenderPassFlags::CLEAR_COLOR);
                attachments.push(
                    vk::AttachmentDescription::default()
                        .format(format_to_vk(desc.color_format))
                        .samples(vk::SampleCountFlags::TYPE_1)
                        .load_op(load_op(clear_color))
                        .store_op(store_op(desc.flags.contains(RenderPassFlags::WRITE_COLOR)))
                        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                        // A loaded attachment must arrive with defined contents
                        .initial_layout(if clear_color {
                            vk::ImageLayout::UNDEFINED
                        } else {
                            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
                        })
                        .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
                );

                color_attachment_refs.push(
                    vk::AttachmentReference::default()
                        .attachment(0)
                        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
                );
            }

            if desc.depth_stencil_format != DeviceFormat::UNDEFINED {
                let depth_index = attachments.len() as u32;
                attachments.push(
                    vk::AttachmentDescription::default()
                        .format(format_to_vk(desc.depth_stencil_format))
                        .samples(vk::SampleCountFlags::TYPE_1)
                        .load_op(load_op(desc.flags.contains(RenderPassFlags::CLEAR_DEPTH)))
                        .store_op(store_op(desc.flags.contains(RenderPassFlags::WRITE_DEPTH)))
                        .stencil_load_op(load_op(desc.flags.contains(RenderPassFlags::CLEAR_STENCIL)))
                        .stencil_store_op(store_op(
                            desc.flags.contains(RenderPassFlags::WRITE_STENCIL),
                        ))
                        .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                        .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
                );

                depth_attachment_ref = Some(
                    vk::AttachmentReference::default()
                        .attachment(depth_index)
                        .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
                );
            }

            // Create subpass
            let mut subpass = vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_attachment_refs);

            if let Some(ref depth_ref) = depth_attachment_ref {
                subpass = subpass.depth_stencil_attachment(depth_ref);
            }

            // Subpass dependency - include depth stages when a depth-stencil
            // attachment is present
            let has_depth = depth_attachment_ref.is_some();
            let (stage_mask, access_mask) = if has_depth {
                (
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                )
            } else {
                (
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                )
            };

            let dependency = vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(stage_mask)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(stage_mask)
                .dst_access_mask(access_mask);

            let render_pass_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(std::slice::from_ref(&subpass))
                .dependencies(std::slice::from_ref(&dependency));

            let render_pass = self
                .device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to create render pass: {:?}", e))?;

            Ok(Arc::new(RenderPass {
                render_pass,
                flags: desc.flags,
                device: self.device.clone(),
            }))
        }
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn DriverFramebuffer>> {
        unsafe {
            // Downcast render pass to the Vulkan type
            let vk_render_pass =
                desc.render_pass.as_ref() as *const dyn DriverRenderPass as *const RenderPass;
            let vk_render_pass = &*vk_render_pass;

            // Collect image views from attachments
            let mut attachments = Vec::with_capacity(desc.attachments.len());
            for attachment in &desc.attachments {
                let vk_image = attachment.as_ref() as *const dyn DriverImage as *const Image;
                attachments.push((*vk_image).view);
            }

            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .attachments(&attachments)
                .width(desc.width)
                .height(desc.height)
                .layers(1);

            let framebuffer = self
                .device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| driver_err!("prism::vulkan", "Failed to create framebuffer: {:?}", e))?;

            Ok(Arc::new(Framebuffer::new(
                framebuffer,
                desc.width,
                desc.height,
                self.device.clone(),
            )))
        }
    }

    fn create_command_buffer(&self) -> Result<Box<dyn DriverCommandBuffer>> {
        Ok(Box::new(CommandBuffer::new(Arc::clone(&self.gpu_context))?))
    }

    fn create_window_surface(&self, window: &Window) -> Result<Arc<dyn WindowSurface>> {
        unsafe {
            let display_handle = window.display_handle().map_err(|e| {
                driver_err!("prism::vulkan", "Failed to get display handle: {}", e)
            })?;
            let window_handle = window.window_handle().map_err(|e| {
                driver_err!("prism::vulkan", "Failed to get window handle: {}", e)
            })?;

            let surface = ash_window::create_surface(
                &self.entry,
                &self.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| driver_err!("prism::vulkan", "Failed to create surface: {:?}", e))?;

            let surface_loader = ash::khr::surface::Instance::new(&self.entry, &self.instance);

            Ok(Arc::new(Swapchain::new(
                Arc::clone(&self.gpu_context),
                self.physical_device,
                &self.instance,
                surface,
                surface_loader,
                self.present_queue,
            )?))
        }
    }

    fn find_depth_stencil_format(&self, depth_bits: u32, stencil_bits: u32) -> DeviceFormat {
        // Candidates ordered by preference, strongest depth first so the
        // first pass below can downgrade without ever upgrading
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

        // Prefer a supported format that does not exceed the requested depth
        for &candidate in candidates {
            if self.supports_depth_stencil(candidate) && candidate.depth_bits() <= depth_bits {
                return candidate;
            }
        }

        // Otherwise fall back to anything supported
        for &candidate in candidates {
            if self.supports_depth_stencil(candidate) {
                return candidate;
            }
        }

        DeviceFormat::UNDEFINED
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();

            // 1. Destroy VulkanDevice-owned objects
            for &fence in &self.submit_fences {
                self.device.destroy_fence(fence, None);
            }

            // 2. Destroy transfer command pool from GpuContext
            {
                let mut pool = self.gpu_context.transfer_command_pool.lock().unwrap();
                if *pool != vk::CommandPool::null() {
                    self.device.destroy_command_pool(*pool, None);
                    *pool = vk::CommandPool::null();
                }
            }

            // 3. Drop allocator: free VkDeviceMemory pages BEFORE destroying
            //    the device. First drop VulkanDevice's Arc, then GpuContext's
            //    ManuallyDrop Arc.
            ManuallyDrop::drop(&mut self.allocator);
            if let Some(ctx) = Arc::get_mut(&mut self.gpu_context) {
                ManuallyDrop::drop(&mut ctx.allocator);
            }

            // 4. Destroy debug messenger BEFORE device and instance
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }

            // 5. Destroy device and instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
