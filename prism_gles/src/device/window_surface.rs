/// WindowSurface trait - the windowing/platform collaborator
///
/// A window surface owns a set of swap images presented to the screen in
/// sequence. The framebuffer core only consumes the image set and the
/// index of the image acquired for the current frame; acquisition and
/// presentation are driven by the surface's owner.

use std::sync::Arc;
use crate::error::Result;
use super::image::{DeviceFormat, Image};

/// Window surface trait
///
/// Implemented by backend-specific swapchain types.
pub trait WindowSurface: Send + Sync {
    /// Number of swap images
    fn image_count(&self) -> usize;

    /// Index of the swap image acquired for the current frame
    fn next_image_index(&self) -> usize;

    /// Acquire the next swap image; updates `next_image_index`
    fn acquire_next_image(&self) -> Result<usize>;

    /// Width of the swap images in pixels
    fn width(&self) -> u32;

    /// Height of the swap images in pixels
    fn height(&self) -> u32;

    /// Pixel format of the swap images
    fn format(&self) -> DeviceFormat;

    /// The swap image at `index`
    fn image(&self, index: usize) -> Arc<dyn Image>;
}
