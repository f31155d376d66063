//! Renderer seam for painting decoded frames onto a pixel surface.
//!
//! The surface itself lives outside this crate; it only needs to expose
//! [`Renderer`]. Renderer coordinates have `y = 0` at the bottom row, so
//! stored rows are flipped on the way out.

mod canvas;

pub use canvas::Canvas;

use crate::animation::DecodedFrame;

/// A raster surface that can be cleared and painted one opaque point at a time.
pub trait Renderer {
    /// Erase the whole surface.
    fn clear(&mut self);
    /// Set the pen colour for subsequent `draw_pixel` calls.
    fn set_color(&mut self, r: u8, g: u8, b: u8);
    /// Paint one point at renderer coordinates.
    fn draw_pixel(&mut self, x: u16, y: u16);
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        (**self).set_color(r, g, b);
    }

    fn draw_pixel(&mut self, x: u16, y: u16) {
        (**self).draw_pixel(x, y);
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        (**self).set_color(r, g, b);
    }

    fn draw_pixel(&mut self, x: u16, y: u16) {
        (**self).draw_pixel(x, y);
    }
}

/// Paint a frame: clear, then draw every pixel whose alpha is nonzero.
///
/// Returns the number of pixels drawn.
pub fn render_frame<R: Renderer + ?Sized>(renderer: &mut R, frame: &DecodedFrame) -> usize {
    let width = frame.width() as usize;
    let height = frame.height();

    renderer.clear();

    let (pixels, _) = frame.pixels().as_chunks::<4>();
    let mut drawn = 0;
    for (i, &[r, g, b, a]) in pixels.iter().enumerate() {
        if a == 0 {
            continue;
        }
        let x = (i % width) as u16;
        let y = (i / width) as u16;
        renderer.set_color(r, g, b);
        renderer.draw_pixel(x, height - 1 - y);
        drawn += 1;
    }
    drawn
}
