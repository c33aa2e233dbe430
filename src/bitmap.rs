//! Getting pixels out of rendered bitmaps.
//!
//! Engines own their bitmap representation; all this crate asks of one is that it can copy
//! a rectangle of packed ARGB pixels (alpha in the high byte) into a buffer.

use crate::error::Error;

const OPAQUE: u32 = 0xFF00_0000;

/// A rectangle of pixels, in bitmap coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub trait TileBitmap: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Copies `rect` into `dst` as packed ARGB. Row `r` of the rectangle lands at
    /// `dst[offset + r * stride..]`.
    ///
    /// # Panics
    ///
    /// May panic if `rect` leaves the bitmap or `dst` is too short.
    fn read_argb(&self, rect: PixelRect, dst: &mut [u32], offset: usize, stride: usize);
}

/// A plain in-memory ARGB bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgbBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl ArgbBitmap {
    /// A fully transparent bitmap.
    pub fn new(width: u32, height: u32) -> ArgbBitmap {
        ArgbBitmap::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, argb: u32) -> ArgbBitmap {
        ArgbBitmap {
            width,
            height,
            pixels: vec![argb; width as usize * height as usize],
        }
    }

    /// Wraps row-major ARGB pixels. Returns `None` if the length doesn't match the size.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<ArgbBitmap> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }

        Some(ArgbBitmap {
            width,
            height,
            pixels,
        })
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = argb;
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

impl TileBitmap for ArgbBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_argb(&self, rect: PixelRect, dst: &mut [u32], offset: usize, stride: usize) {
        let width = rect.width as usize;

        for row in 0..rect.height as usize {
            let src_start = (rect.y as usize + row) * self.width as usize + rect.x as usize;
            let dst_start = offset + row * stride;
            dst[dst_start..dst_start + width]
                .copy_from_slice(&self.pixels[src_start..src_start + width]);
        }
    }
}

/// Flattens a bitmap into row-major ARGB pixels, top to bottom, with no row padding.
///
/// Without alpha the tile is opaque, so the alpha byte is forced to `0xFF`.
pub fn extract_pixels<B: TileBitmap + ?Sized>(bitmap: &B, has_alpha: bool) -> Vec<u32> {
    let (width, height) = (bitmap.width(), bitmap.height());
    let mut pixels = vec![0u32; width as usize * height as usize];

    let rect = PixelRect {
        x: 0,
        y: 0,
        width,
        height,
    };
    bitmap.read_argb(rect, &mut pixels, 0, width as usize);

    if !has_alpha {
        for pixel in pixels.iter_mut() {
            *pixel |= OPAQUE;
        }
    }

    pixels
}

/// A rendered tile, detached from the engine's bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl TileImage {
    pub fn from_bitmap<B: TileBitmap + ?Sized>(bitmap: &B, has_alpha: bool) -> TileImage {
        TileImage {
            width: bitmap.width(),
            height: bitmap.height(),
            pixels: extract_pixels(bitmap, has_alpha),
        }
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// The pixels as RGBA bytes, the layout most image libraries expect.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for argb in self.pixels.iter() {
            let [a, r, g, b] = argb.to_be_bytes();
            rgba.extend_from_slice(&[r, g, b, a]);
        }
        rgba
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, Error> {
        let mut png_bytes = Vec::new();

        let mut encoder = png::Encoder::new(&mut png_bytes, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgba8())?;
        writer.finish()?;

        Ok(png_bytes)
    }
}
