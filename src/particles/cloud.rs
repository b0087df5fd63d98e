use bytemuck::{Pod, Zeroable};
use tracing::warn;

/// Neutral values substituted for non-finite particle data.
pub const POSITION_FALLBACK: f32 = 0.0;
pub const SIZE_FALLBACK: f32 = 1.0;
pub const BRIGHTNESS_FALLBACK: f32 = 0.5;
pub const COLOR_FALLBACK: f32 = 0.5;

/// Interleaved per-particle record for GPU vertex buffers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
    pub brightness: f32,
}

/// Generated particles stored as parallel attribute arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleCloud {
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    brightness: Vec<f32>,
    capacity: usize,
}

impl ParticleCloud {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity * 3),
            colors: Vec::with_capacity(capacity * 3),
            sizes: Vec::with_capacity(capacity),
            brightness: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a particle. Returns `false` without storing when the cloud is full.
    pub(crate) fn push(
        &mut self,
        position: [f32; 3],
        color: [f32; 3],
        size: f32,
        brightness: f32,
    ) -> bool {
        if self.is_full() {
            return false;
        }
        self.positions.extend_from_slice(&position);
        self.colors.extend_from_slice(&color);
        self.sizes.push(size);
        self.brightness.push(brightness);
        true
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Allocation estimate the cloud was generated against.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// `x, y, z` triples.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// `r, g, b` triples in `0..=1`.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn brightness(&self) -> &[f32] {
        &self.brightness
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        triple(&self.positions, index)
    }

    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        triple(&self.colors, index)
    }

    pub fn is_finite(&self) -> bool {
        self.positions
            .iter()
            .chain(&self.colors)
            .chain(&self.sizes)
            .chain(&self.brightness)
            .all(|v| v.is_finite())
    }

    /// Replaces every non-finite value with its neutral fallback.
    ///
    /// Runs after generation regardless of the per-value guards in the
    /// converter. Returns how many values were corrected.
    pub fn sanitize(&mut self) -> usize {
        let corrected = replace_non_finite(&mut self.positions, POSITION_FALLBACK)
            + replace_non_finite(&mut self.colors, COLOR_FALLBACK)
            + replace_non_finite(&mut self.sizes, SIZE_FALLBACK)
            + replace_non_finite(&mut self.brightness, BRIGHTNESS_FALLBACK);
        if corrected > 0 {
            warn!(corrected, particles = self.len(), "replaced non-finite particle values");
        }
        corrected
    }

    pub fn vertices(&self) -> Vec<ParticleVertex> {
        (0..self.len())
            .map(|i| ParticleVertex {
                position: [
                    self.positions[i * 3],
                    self.positions[i * 3 + 1],
                    self.positions[i * 3 + 2],
                ],
                color: [self.colors[i * 3], self.colors[i * 3 + 1], self.colors[i * 3 + 2]],
                size: self.sizes[i],
                brightness: self.brightness[i],
            })
            .collect()
    }
}

fn triple(values: &[f32], index: usize) -> Option<[f32; 3]> {
    let chunk = values.get(index * 3..index * 3 + 3)?;
    Some([chunk[0], chunk[1], chunk[2]])
}

fn replace_non_finite(values: &mut [f32], fallback: f32) -> usize {
    let mut corrected = 0;
    for value in values.iter_mut().filter(|v| !v.is_finite()) {
        *value = fallback;
        corrected += 1;
    }
    corrected
}
