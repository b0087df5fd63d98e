//! Particle cloud data model and generation.

pub mod cloud;
pub mod convert;
pub mod fallback;
pub mod raster;

pub use cloud::{ParticleCloud, ParticleVertex};
pub use convert::{Blend, generate};
pub use fallback::fallback_cloud;
pub use raster::{RasterImage, RasterView};
