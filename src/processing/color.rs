use palette::{FromColor, Hsl, Srgb};

use crate::config::ColorMode;

const RAINBOW_SATURATION: f32 = 0.8;
const RAINBOW_LIGHTNESS: f32 = 0.6;

/// Mean of the red, green and blue channels.
pub fn brightness(rgb: [f32; 3]) -> f32 {
    (rgb[0] + rgb[1] + rgb[2]) / 3.0
}

/// Converts HSL with every component in `0..=1` to RGB in `0..=1`.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let hsl: Hsl = Hsl::new(hue.rem_euclid(1.0) * 360.0, saturation, lightness);
    let rgb: Srgb = Srgb::from_color(hsl);
    [rgb.red, rgb.green, rgb.blue]
}

/// Particle color for a sampled pixel under `mode`.
pub fn particle_color(mode: ColorMode, rgb: [f32; 3], brightness: f32) -> [f32; 3] {
    match mode {
        ColorMode::Original => rgb,
        ColorMode::Brightness => [brightness; 3],
        ColorMode::Rainbow => hsl_to_rgb(
            brightness * 0.8 + 0.1,
            RAINBOW_SATURATION,
            RAINBOW_LIGHTNESS,
        ),
    }
}

/// Placeholder-cloud color for a hue in `0..=1`.
pub fn rainbow_hue(hue: f32) -> [f32; 3] {
    hsl_to_rgb(hue, RAINBOW_SATURATION, RAINBOW_LIGHTNESS)
}
