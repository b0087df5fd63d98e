//! RGBA8 raster containers fed into the particle converter.

use std::sync::Arc;

use crate::error::Error;

fn expected_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// An immutable, named RGBA8 image.
///
/// Pixels are shared behind an [`Arc`] so the collection, the loader and an
/// in-flight transition can hold the same image without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    name: String,
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl RasterImage {
    /// Wraps a row-major RGBA8 buffer.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBuffer`] when `pixels.len() != width * height * 4`.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, Error> {
        let expected = expected_len(width, height);
        if pixels.len() != expected {
            return Err(Error::InvalidBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            pixels: pixels.into(),
        })
    }

    pub fn from_rgba(name: impl Into<String>, image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            name: name.into(),
            width,
            height,
            pixels: image.into_raw().into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn view(&self) -> RasterView<'_> {
        RasterView {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }
}

/// Borrowed RGBA8 pixels with their dimensions.
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> RasterView<'a> {
    /// # Errors
    /// Returns [`Error::InvalidBuffer`] when the buffer length does not match.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self, Error> {
        let expected = expected_len(width, height);
        if pixels.len() != expected {
            return Err(Error::InvalidBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Normalized RGBA at byte offset `index`.
    pub(crate) fn sample(&self, index: usize) -> [f32; 4] {
        let px = &self.pixels[index..index + 4];
        [
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
            f32::from(px[3]) / 255.0,
        ]
    }
}
