use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow, ensure};
use serde::Deserialize;

use crate::error::Error;

/// How particle colors are derived from the sampled pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    Original,
    Brightness,
    Rainbow,
}

impl ColorMode {
    const ALL: &'static [Self] = &[Self::Original, Self::Brightness, Self::Rainbow];
    const NAMES: &'static [&'static str] = &["original", "brightness", "rainbow"];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Brightness => "brightness",
            Self::Rainbow => "rainbow",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == raw)
            .ok_or_else(|| {
                anyhow!(
                    "unknown color mode '{}', expected one of: {}",
                    raw,
                    Self::NAMES.join(", ")
                )
            })
    }
}

/// How the displayed cloud moves from one image to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionMode {
    #[default]
    Morph,
    Dissolve,
    Slide,
}

impl TransitionMode {
    const ALL: &'static [Self] = &[Self::Morph, Self::Dissolve, Self::Slide];
    const NAMES: &'static [&'static str] = &["morph", "dissolve", "slide"];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Morph => "morph",
            Self::Dissolve => "dissolve",
            Self::Slide => "slide",
        }
    }

    /// Morph and dissolve interpolate pixels; slide swaps images at the midpoint.
    pub fn blends(&self) -> bool {
        matches!(self, Self::Morph | Self::Dissolve)
    }
}

impl fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == raw)
            .ok_or_else(|| {
                anyhow!(
                    "unknown transition mode '{}', expected one of: {}",
                    raw,
                    Self::NAMES.join(", ")
                )
            })
    }
}

/// Knobs read by the raster-to-particle converter.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenerationParameters {
    /// Base point size; brighter pixels grow up to this value.
    pub point_size: f32,
    /// World units per 100 pixels.
    pub image_scale: f32,
    /// Z displacement applied per unit of brightness.
    pub depth_multiplier: f32,
    /// Pixels darker than this are skipped.
    pub brightness_threshold: f32,
    /// Probability that a passing pixel is emitted.
    pub particle_density: f32,
    pub color_mode: ColorMode,
}

impl GenerationParameters {
    const fn default_point_size() -> f32 {
        0.2
    }

    const fn default_image_scale() -> f32 {
        4.0
    }

    const fn default_depth_multiplier() -> f32 {
        0.5
    }

    const fn default_brightness_threshold() -> f32 {
        0.1
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.point_size > 0.0,
            "generation.point-size must be greater than zero"
        );
        ensure!(
            self.image_scale > 0.0,
            "generation.image-scale must be greater than zero"
        );
        ensure!(
            self.depth_multiplier >= 0.0,
            "generation.depth-multiplier must not be negative"
        );
        ensure!(
            (0.0..=1.0).contains(&self.brightness_threshold),
            "generation.brightness-threshold must be within [0, 1]"
        );
        ensure!(
            self.particle_density > 0.0 && self.particle_density <= 1.0,
            "generation.particle-density must be within (0, 1]"
        );
        Ok(())
    }
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            point_size: Self::default_point_size(),
            image_scale: Self::default_image_scale(),
            depth_multiplier: Self::default_depth_multiplier(),
            brightness_threshold: Self::default_brightness_threshold(),
            particle_density: 1.0,
            color_mode: ColorMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TransitionOptions {
    /// Progress gained per second of frame time.
    pub speed: f32,
    pub mode: TransitionMode,
    /// Transitions running longer than this are forced to completion.
    #[serde(with = "humantime_serde")]
    pub max_duration: Duration,
    /// Advance to the next image periodically while idle.
    pub auto: bool,
    #[serde(with = "humantime_serde")]
    pub auto_interval: Duration,
}

impl TransitionOptions {
    const fn default_max_duration() -> Duration {
        Duration::from_secs(5)
    }

    const fn default_auto_interval() -> Duration {
        Duration::from_secs(5)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.speed > 0.0 && self.speed.is_finite(),
            "transition.speed must be a positive number"
        );
        ensure!(
            !self.max_duration.is_zero(),
            "transition.max-duration must be positive"
        );
        ensure!(
            !self.auto_interval.is_zero(),
            "transition.auto-interval must be positive"
        );
        Ok(())
    }
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            mode: TransitionMode::default(),
            max_duration: Self::default_max_duration(),
            auto: false,
            auto_interval: Self::default_auto_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoaderOptions {
    /// Decoded images are downscaled so neither side exceeds this.
    pub max_dimension: u32,
    /// Maximum number of concurrent image decodes.
    pub max_concurrent_decodes: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_dimension: 200,
            max_concurrent_decodes: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FrameOptions {
    pub fps: u32,
    /// Used in place of frame deltas shorter than a millisecond.
    #[serde(with = "humantime_serde")]
    pub fallback_delta: Duration,
}

impl FrameOptions {
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            fallback_delta: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    pub generation: GenerationParameters,
    pub transition: TransitionOptions,
    pub loader: LoaderOptions,
    pub frame: FrameOptions,
    /// Number of points in the placeholder cloud shown with no images loaded.
    pub fallback_particle_count: usize,
    /// Optional deterministic seed for density sampling.
    pub random_seed: Option<u64>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path).map_err(Error::from)?;
        Ok(serde_yaml::from_str(&s).map_err(Error::from)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.generation.validate()?;
        self.transition.validate()?;
        ensure!(
            self.loader.max_dimension > 0,
            "loader.max-dimension must be greater than zero"
        );
        ensure!(
            self.loader.max_concurrent_decodes > 0,
            "loader.max-concurrent-decodes must be greater than zero"
        );
        ensure!(self.frame.fps > 0, "frame.fps must be greater than zero");
        ensure!(
            !self.frame.fallback_delta.is_zero(),
            "frame.fallback-delta must be positive"
        );
        ensure!(
            self.fallback_particle_count > 0,
            "fallback-particle-count must be greater than zero"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            generation: GenerationParameters::default(),
            transition: TransitionOptions::default(),
            loader: LoaderOptions::default(),
            frame: FrameOptions::default(),
            fallback_particle_count: 1000,
            random_seed: None,
        }
    }
}
