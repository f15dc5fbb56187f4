/// Vulkan debug messenger - routes validation layer messages into the
/// driver log
///
/// Only compiled with the `vulkan-validation` feature.

use ash::vk;
use prism_gles::{driver_error, driver_info, driver_warn};
use std::ffi::CStr;

/// Vulkan debug messenger callback
///
/// Called by the validation layers when they detect issues; forwards the
/// message to the driver logger with a matching severity.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        driver_error!("prism::vulkan", "[{}] {}", message_id_name, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        driver_warn!("prism::vulkan", "[{}] {}", message_id_name, message);
    } else {
        driver_info!("prism::vulkan", "[{}] {}", message_id_name, message);
    }

    vk::FALSE
}
