//! 128x64 monochrome frame buffer
//!
//! Laid out the way SSD1306-class controllers store GDDRAM: eight pages
//! of 128 column bytes, bit 0 of each byte is the top row of the page.
//! A copy of what was last sent to the panel decides which pages are
//! dirty, so redrawing identical content costs no bus traffic.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
pub const PAGES: usize = HEIGHT / 8;

pub struct FrameBuffer {
    pages: [[u8; WIDTH]; PAGES],
    /// Panel contents as of the last flush
    flushed: [[u8; WIDTH]; PAGES],
    /// Pages to resend regardless of content
    stale: u8,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Blank frame; every page is stale until first flushed
    pub const fn new() -> Self {
        Self {
            pages: [[0; WIDTH]; PAGES],
            flushed: [[0; WIDTH]; PAGES],
            stale: 0xFF,
        }
    }

    pub fn clear(&mut self) {
        for page in self.pages.iter_mut() {
            page.fill(0);
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let bit = 1 << (y % 8);
        let byte = &mut self.pages[y / 8][x];
        if on {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.pages[y / 8][x] & (1 << (y % 8)) != 0
    }

    pub fn page(&self, index: usize) -> &[u8; WIDTH] {
        &self.pages[index % PAGES]
    }

    pub fn is_page_dirty(&self, index: usize) -> bool {
        index < PAGES && (self.stale & (1 << index) != 0 || self.pages[index] != self.flushed[index])
    }

    pub fn is_dirty(&self) -> bool {
        (0..PAGES).any(|i| self.is_page_dirty(i))
    }

    pub fn dirty_pages(&self) -> impl Iterator<Item = usize> + '_ {
        (0..PAGES).filter(|&i| self.is_page_dirty(i))
    }

    /// Record that `index` now matches the panel
    pub fn mark_clean(&mut self, index: usize) {
        if index < PAGES {
            self.flushed[index] = self.pages[index];
            self.stale &= !(1 << index);
        }
    }

    /// Force every page out on the next flush (after a panel reset)
    pub fn invalidate(&mut self) {
        self.stale = 0xFF;
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as usize, point.y as usize, color.is_on());
            }
        }
        Ok(())
    }
}
