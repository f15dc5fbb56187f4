/// Masked stencil clear emulation
///
/// Render passes can only clear the stencil aspect wholesale. When the
/// front stencil write mask does not cover all eight bits, the clear is
/// emulated on the host: read the stencil bytes back, merge the clear
/// value under the mask, and write the result into the image.

use crate::device::{CopyOptions, DeviceFormat, Image, PixelRect, Rect2D, DEFAULT_PIXEL_ALIGNMENT};
use crate::driver_bail;
use crate::error::Result;

/// True when `write_mask` does not cover all eight stencil bits and the
/// clear must therefore be emulated
pub fn needs_masked_clear(write_mask: u32) -> bool {
    write_mask & 0xFF != 0xFF
}

/// Clear the stencil aspect of `image` inside `rect`, honoring the front
/// stencil write mask
///
/// Only bits enabled in `write_mask` take the clear value; masked-off
/// bits keep their previous contents.
pub fn clear_masked(
    image: &dyn Image,
    format: DeviceFormat,
    rect: Rect2D,
    clear_stencil: u32,
    write_mask: u32,
) -> Result<()> {
    if format.stencil_bits() == 0 {
        driver_bail!(
            "prism::Framebuffer",
            "Masked stencil clear on format without stencil bits"
        );
    }

    let src = PixelRect::new(rect, format.bytes_per_pixel(), 1, DEFAULT_PIXEL_ALIGNMENT);
    let dst = src.at_origin();
    let options = CopyOptions {
        invert_y: false,
        stencil_only: true,
    };

    let mut data = vec![0u8; dst.buffer_size()];
    image.copy_to_host(&src, &dst, options, &mut data)?;

    let clear = (clear_stencil & 0xFF) as u8;
    let mask = (write_mask & 0xFF) as u8;
    let row_stride = dst.aligned_row_bytes();
    let pixel_stride = dst.pixel_byte_offset();
    for row in 0..dst.height as usize {
        let row_start = row * row_stride;
        for col in 0..dst.width as usize {
            let index = row_start + col * pixel_stride;
            data[index] = clear | (data[index] & !mask);
        }
    }

    image.copy_from_host(&dst, &src, options, &data)
}

#[cfg(test)]
#[path = "stencil_clear_tests.rs"]
mod tests;
