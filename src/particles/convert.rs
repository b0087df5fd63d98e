//! Raster-to-particle conversion.
//!
//! Pixels are scanned row-major, top-to-bottom and left-to-right. Emission
//! stops as soon as the capacity estimate is reached, so under a tight
//! capacity the emitted particles are biased toward the top of the image.

use rand::Rng;
use tracing::debug;

use crate::config::GenerationParameters;
use crate::error::Error;
use crate::particles::cloud::{BRIGHTNESS_FALLBACK, POSITION_FALLBACK, ParticleCloud, SIZE_FALLBACK};
use crate::particles::raster::RasterView;
use crate::processing::color::{brightness, particle_color};

/// Pixels with less alpha than this never become particles.
pub const MIN_ALPHA: f32 = 0.1;

/// Over-allocation applied to the capacity estimate when sampling.
const SAMPLING_HEADROOM: f32 = 1.2;

/// A secondary raster mixed into the primary at `factor` (0 = primary only).
#[derive(Debug, Clone, Copy)]
pub struct Blend<'a> {
    pub secondary: RasterView<'a>,
    pub factor: f32,
}

/// Number of particle slots allocated for a raster of `total_pixels`.
pub fn estimate_capacity(total_pixels: usize, density: f32) -> usize {
    if density < 1.0 {
        let estimate = (total_pixels as f32 * density.max(0.0) * SAMPLING_HEADROOM).floor() as usize;
        estimate.min(total_pixels)
    } else {
        total_pixels
    }
}

/// Converts `primary` (optionally blended with a same-sized secondary raster)
/// into a particle cloud.
///
/// `rng` drives the per-pixel density trial; with `particle_density == 1` it
/// is never consulted and the result depends only on the pixels.
///
/// # Errors
/// Returns [`Error::DimensionMismatch`] when a blend raster differs in size.
pub fn generate<R: Rng + ?Sized>(
    primary: RasterView<'_>,
    params: &GenerationParameters,
    blend: Option<Blend<'_>>,
    rng: &mut R,
) -> Result<ParticleCloud, Error> {
    if let Some(blend) = &blend {
        if blend.secondary.dimensions() != primary.dimensions() {
            return Err(Error::DimensionMismatch {
                primary: primary.dimensions(),
                secondary: blend.secondary.dimensions(),
            });
        }
    }
    if primary.is_empty() {
        return Ok(ParticleCloud::with_capacity(0));
    }

    let (width, height) = primary.dimensions();
    let total_pixels = width as usize * height as usize;
    let density = params.particle_density;
    let sampling = density < 1.0;
    let mut cloud = ParticleCloud::with_capacity(estimate_capacity(total_pixels, density));
    let blend = blend.filter(|b| b.factor > 0.0);
    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;

    'scan: for py in 0..height {
        for px in 0..width {
            if cloud.is_full() {
                break 'scan;
            }
            let index = (py as usize * width as usize + px as usize) * 4;
            let [mut r, mut g, mut b, mut alpha] = primary.sample(index);
            if let Some(blend) = &blend {
                let t = blend.factor;
                let [r2, g2, b2, a2] = blend.secondary.sample(index);
                r = lerp(r, r2, t);
                g = lerp(g, g2, t);
                b = lerp(b, b2, t);
                alpha = lerp(alpha, a2, t);
            }
            let lum = brightness([r, g, b]);

            if lum < params.brightness_threshold || alpha < MIN_ALPHA {
                continue;
            }
            if sampling && rng.random::<f32>() >= density {
                continue;
            }

            let position = [
                finite_or((px as f32 - half_w) / 100.0 * params.image_scale, POSITION_FALLBACK),
                finite_or(-((py as f32 - half_h) / 100.0) * params.image_scale, POSITION_FALLBACK),
                finite_or(lum * params.depth_multiplier, POSITION_FALLBACK),
            ];
            let color = particle_color(params.color_mode, [r, g, b], lum);
            let size = finite_or(params.point_size * (0.5 + lum * 0.5), SIZE_FALLBACK);
            cloud.push(position, color, size, finite_or(lum, BRIGHTNESS_FALLBACK));
        }
    }

    cloud.sanitize();
    debug!(
        particles = cloud.len(),
        capacity = cloud.capacity(),
        width,
        height,
        density,
        blended = blend.is_some(),
        "generated particle cloud"
    );
    Ok(cloud)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
