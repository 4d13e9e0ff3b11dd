//! Tile rendering: layout boxes, typefaces, paint commands and the rasterizer.
//!
//! Rendering is split in two pure stages. [`projector::Projector`] turns editor
//! state into a list of [`paint::PaintCommand`]s, and [`raster::execute`] paints
//! that list onto a [`Surface`]. Same inputs always give the same pixels.

pub mod font;
pub mod layout;
pub mod paint;
pub mod projector;
pub mod raster;

use image::{ImageOutputFormat, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::{Error, Result};

/// Side length of the square tile, in pixels.
pub const TILE_SIZE: u32 = 450;

/// An RGBA drawing surface with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// A transparent surface of tile size.
    pub fn tile() -> Self {
        Self::new(TILE_SIZE, TILE_SIZE)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Composite `rgba` over the pixel at (x, y) with the given coverage.
    /// Coordinates outside the surface are ignored.
    pub fn blend(&mut self, x: i32, y: i32, rgba: [u8; 4], coverage: u8) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let src_a = (rgba[3] as u32 * coverage as u32 + 127) / 255;
        if src_a == 0 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        let dst_a = dst.0[3] as u32;
        let inv = 255 - src_a;
        let out_a = src_a + (dst_a * inv + 127) / 255;
        if out_a == 0 {
            return;
        }
        let mut out = [0u8; 4];
        for i in 0..3 {
            let src_c = rgba[i] as u32 * src_a;
            let dst_c = (dst.0[i] as u32 * dst_a * inv + 127) / 255;
            out[i] = ((src_c + dst_c + out_a / 2) / out_a).min(255) as u8;
        }
        out[3] = out_a.min(255) as u8;
        dst.0 = out;
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Hex SHA-256 of the raw pixels. Equal digests mean identical output.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.as_raw()))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut buf, ImageOutputFormat::Png)
            .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))?;
        Ok(buf.into_inner())
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_surface_starts_transparent() {
        let s = Surface::tile();
        assert_eq!(s.width(), 450);
        assert_eq!(s.height(), 450);
        assert_eq!(s.pixel(10, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn blend_full_coverage_replaces_pixel() {
        let mut s = Surface::new(4, 4);
        s.blend(1, 1, [10, 20, 30, 255], 255);
        assert_eq!(s.pixel(1, 1), [10, 20, 30, 255]);
        s.blend(1, 1, [255, 255, 255, 255], 255);
        assert_eq!(s.pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn blend_half_coverage_mixes_over_opaque() {
        let mut s = Surface::new(2, 2);
        s.blend(0, 0, [0, 0, 0, 255], 255);
        s.blend(0, 0, [255, 255, 255, 255], 128);
        let p = s.pixel(0, 0);
        assert_eq!(p[3], 255);
        assert!(p[0] > 120 && p[0] < 135, "got {:?}", p);
    }

    #[test]
    fn blend_outside_is_ignored() {
        let mut s = Surface::new(2, 2);
        s.blend(-1, 0, [255, 0, 0, 255], 255);
        s.blend(0, 2, [255, 0, 0, 255], 255);
        assert!(s.as_raw().iter().all(|b| *b == 0));
    }

    #[test]
    fn png_has_signature() {
        let png = Surface::new(8, 8).encode_png().unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
