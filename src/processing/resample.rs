//! Aspect-preserving resampling used to align rasters before blending.

use fast_image_resize as fir;
use tracing::debug;

use crate::error::Error;
use crate::particles::raster::{RasterImage, RasterView};
use crate::processing::layout::{fit_within, letterbox};

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

/// Scales `src` to exactly `target_w x target_h` RGBA8 pixels.
pub fn resize_rgba(src: RasterView<'_>, target_w: u32, target_h: u32) -> Result<Vec<u8>, Error> {
    if target_w == 0 || target_h == 0 {
        return Err(Error::Resize("resize dimensions must be positive".into()));
    }
    if src.dimensions() == (target_w, target_h) {
        return Ok(src.pixels().to_vec());
    }

    let src_view = fir::images::ImageRef::new(
        src.width(),
        src.height(),
        src.pixels(),
        fir::PixelType::U8x4,
    )
    .map_err(|err| Error::Resize(err.to_string()))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| Error::Resize(err.to_string()))?;
    Ok(dst_image.into_vec())
}

/// Letterboxes `src` into a `target_w x target_h` canvas of opaque black.
///
/// The source is contain-fit (uniform scale, aspect preserved), centered, and
/// composited source-over onto the black fill, so the result is fully opaque.
/// The returned buffer always holds exactly `target_w * target_h * 4` bytes.
pub fn resample(src: RasterView<'_>, target_w: u32, target_h: u32) -> Result<Vec<u8>, Error> {
    let stride = target_w as usize * 4;
    let mut out = OPAQUE_BLACK.repeat(target_w as usize * target_h as usize);

    let Some(placement) = letterbox(target_w, target_h, src.width(), src.height()) else {
        return Ok(out);
    };
    let scaled = resize_rgba(src, placement.scaled_w, placement.scaled_h)?;
    let row_bytes = placement.scaled_w as usize * 4;

    for (row, src_row) in scaled.chunks_exact(row_bytes).enumerate() {
        let y = placement.offset_y as usize + row;
        let start = y * stride + placement.offset_x as usize * 4;
        let dst_row = &mut out[start..start + row_bytes];
        for (dst, px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            let alpha = u16::from(px[3]);
            for c in 0..3 {
                dst[c] = ((u16::from(px[c]) * alpha + 127) / 255) as u8;
            }
            dst[3] = 255;
        }
    }

    debug!(
        src_w = src.width(),
        src_h = src.height(),
        target_w,
        target_h,
        scaled_w = placement.scaled_w,
        scaled_h = placement.scaled_h,
        "resampled raster"
    );
    Ok(out)
}

/// Shrinks `image` so that neither side exceeds `max_dim`.
pub fn downscale_to_fit(image: RasterImage, max_dim: u32) -> Result<RasterImage, Error> {
    let (w, h) = image.dimensions();
    if image.is_empty() || (w <= max_dim && h <= max_dim) {
        return Ok(image);
    }
    let (target_w, target_h) = fit_within(w, h, max_dim);
    let pixels = resize_rgba(image.view(), target_w, target_h)?;
    debug!(
        name = image.name(),
        from_w = w,
        from_h = h,
        to_w = target_w,
        to_h = target_h,
        "downscaled image"
    );
    RasterImage::new(image.name(), target_w, target_h, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RasterImage {
        RasterImage::new("solid", w, h, rgba.repeat((w * h) as usize)).unwrap()
    }

    #[test]
    fn pads_with_opaque_black() {
        let src = solid(2, 1, [255, 255, 255, 255]);
        let out = resample(src.view(), 2, 3).unwrap();
        assert_eq!(out.len(), 2 * 3 * 4);
        // top and bottom rows are padding, middle row is the image
        assert_eq!(&out[0..4], &OPAQUE_BLACK);
        assert_eq!(&out[8..12], &[255, 255, 255, 255]);
        assert_eq!(&out[16..20], &OPAQUE_BLACK);
    }

    #[test]
    fn premultiplies_transparent_source() {
        let src = solid(1, 1, [200, 100, 50, 0]);
        let out = resample(src.view(), 1, 1).unwrap();
        assert_eq!(out, vec![0, 0, 0, 255]);
    }

    #[test]
    fn empty_source_yields_black_canvas() {
        let src = RasterImage::new("empty", 0, 0, Vec::new()).unwrap();
        let out = resample(src.view(), 3, 2).unwrap();
        assert_eq!(out, OPAQUE_BLACK.repeat(6));
    }

    #[test]
    fn downscale_keeps_name_and_bounds() {
        let src = solid(400, 100, [10, 20, 30, 255]);
        let out = downscale_to_fit(src, 200).unwrap();
        assert_eq!(out.dimensions(), (200, 50));
        assert_eq!(out.name(), "solid");
    }
}
