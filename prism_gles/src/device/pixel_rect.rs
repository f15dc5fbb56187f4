/// PixelRect - byte layout of an image sub-rectangle
///
/// Describes how a rectangle of pixels is laid out in a linear host
/// buffer: per-pixel byte size, row stride (honoring the unpack
/// alignment), total buffer size, and the byte offset of the rectangle's
/// first row. Used by the host-copy paths and the stencil clear
/// emulation.

use super::command_buffer::Rect2D;

/// Default row alignment for host pixel buffers (GLES unpack alignment)
pub const DEFAULT_PIXEL_ALIGNMENT: usize = 4;

/// Byte layout of an image sub-rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge in pixels
    pub x: i32,
    /// Top edge in pixels
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Elements per pixel (e.g. 4 for RGBA)
    pub num_elements: usize,
    /// Bytes per element
    pub element_size: usize,
    /// Row alignment in bytes
    pub alignment: usize,
}

impl PixelRect {
    /// Create a layout for `rect` with the given per-pixel element shape
    pub fn new(rect: Rect2D, num_elements: usize, element_size: usize, alignment: usize) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            num_elements,
            element_size,
            alignment,
        }
    }

    /// The same rectangle repositioned at the origin
    ///
    /// Host-side staging buffers are sized to the rectangle, not the full
    /// image, so the destination layout starts at (0, 0).
    pub fn at_origin(&self) -> Self {
        Self { x: 0, y: 0, ..*self }
    }

    /// Bytes from the start of one pixel to the next within a row
    pub fn pixel_byte_offset(&self) -> usize {
        self.num_elements * self.element_size
    }

    /// Size of an entire row in bytes, rounded up to the alignment
    pub fn aligned_row_bytes(&self) -> usize {
        let row = self.width as usize * self.pixel_byte_offset();
        let align = self.alignment.max(1);
        (row + align - 1) / align * align
    }

    /// Total buffer size in bytes for the full rectangle
    pub fn buffer_size(&self) -> usize {
        self.height as usize * self.aligned_row_bytes()
    }

    /// Byte offset of the rectangle's first pixel within a buffer whose
    /// rows are `row_stride` bytes long
    pub fn start_row_offset(&self, row_stride: usize) -> usize {
        self.y as usize * row_stride + self.x as usize * self.pixel_byte_offset()
    }
}

#[cfg(test)]
#[path = "pixel_rect_tests.rs"]
mod tests;
