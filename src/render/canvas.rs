//! In-memory RGB surface.

use super::Renderer;

/// Luminance ramp used by [`Canvas::to_ascii`], darkest first.
const ASCII_RAMP: &[u8] = b".:-=+*#%@";

/// A fixed-size RGB surface implementing [`Renderer`].
///
/// Coordinates follow the renderer convention: `(0, 0)` is the bottom-left
/// corner. Points outside the surface are ignored.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u16,
    height: u16,
    /// Row-major, indexed by renderer `y` (bottom row first).
    pixels: Vec<Option<[u8; 3]>>,
    pen: [u8; 3],
    clears: usize,
    draws: usize,
}

impl Canvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width as usize * height as usize],
            pen: [0, 0, 0],
            clears: 0,
            draws: 0,
        }
    }

    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Colour painted at `(x, y)`, or `None` if untouched since the last clear.
    pub fn get(&self, x: u16, y: u16) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Number of times the surface has been cleared.
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Number of points painted in total.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Render the surface as text, top row first. Unpainted points are spaces.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let c = match self.get(x, y) {
                    None => ' ',
                    Some([r, g, b]) => {
                        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
                        let i = luma as usize * (ASCII_RAMP.len() - 1) / 255;
                        ASCII_RAMP[i] as char
                    }
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

impl Renderer for Canvas {
    fn clear(&mut self) {
        self.pixels.fill(None);
        self.clears += 1;
    }

    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.pen = [r, g, b];
    }

    fn draw_pixel(&mut self, x: u16, y: u16) {
        if x >= self.width || y >= self.height {
            log::trace!("Point ({}, {}) outside {}x{} canvas", x, y, self.width, self.height);
            return;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = Some(self.pen);
        self.draws += 1;
    }
}
