#![allow(dead_code)]

use image::{ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;

use kachel::rendering::font::Typeface;
use kachel::rendering::projector::{Projector, TextOverflow};

/// PNG bytes of a `w`×`h` image filled with `rgba`, with a darker diagonal so
/// resampling has something to work on.
pub fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_fn(w, h, |x, y| {
        if x == y {
            Rgba([rgba[0] / 2, rgba[1] / 2, rgba[2] / 2, 255])
        } else {
            Rgba(rgba)
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .expect("encode fixture");
    out.into_inner()
}

pub fn projector() -> Projector {
    Projector::new(Typeface::builtin(), TextOverflow::Visible)
}
