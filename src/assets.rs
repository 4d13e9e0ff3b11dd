//! Icon assets: decoding, `data:` URLs and resampling.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use sha2::{Digest, Sha256};

use crate::model::IconRef;
use crate::store::TileStore;
use crate::{Error, Result};

/// A decoded icon in RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    pixels: RgbaImage,
}

impl IconImage {
    /// Decode PNG/JPEG/etc. bytes. Undecodable input is a `DecodeError`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self {
            pixels: img.to_rgba8(),
        })
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Lanczos-resample to a `side`×`side` square.
    pub fn resized(&self, side: u32) -> RgbaImage {
        if self.pixels.width() == side && self.pixels.height() == side {
            return self.pixels.clone();
        }
        imageops::resize(&self.pixels, side, side, FilterType::Lanczos3)
    }

    /// Hex SHA-256 of the decoded pixels.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.pixels.as_raw()))
    }
}

/// Decode the payload of a `data:` URL. Returns `None` for any other locator.
pub fn decode_data_url(locator: &str) -> Option<Result<Vec<u8>>> {
    let rest = locator.strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err(Error::DecodeError("data URL without payload".into())));
    };
    if !meta.ends_with(";base64") {
        return Some(Ok(payload.as_bytes().to_vec()));
    }
    Some(
        STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::DecodeError(format!("invalid base64 in data URL: {}", e))),
    )
}

/// Fetch and decode the preview asset of `icon`.
pub fn load_icon<S: TileStore + ?Sized>(store: &S, icon: &IconRef) -> Result<IconImage> {
    let bytes = store.fetch_asset(&icon.preview_url)?;
    let image = IconImage::decode(&bytes)?;
    log::debug!(
        "decoded icon {} ({}x{})",
        icon.id,
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .expect("encode fixture");
    buf.into_inner()
}
