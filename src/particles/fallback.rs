use std::f32::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::particles::cloud::ParticleCloud;
use crate::processing::color::rainbow_hue;

const FALLBACK_SEED: u64 = 0x5eed_c10d;

/// Placeholder cloud shown while no image is loaded.
///
/// Points lie on a shell of radius `1..1.5` around the origin with random hue
/// and size. The internal seed is fixed, so every call returns the same cloud.
pub fn fallback_cloud(count: usize) -> ParticleCloud {
    let mut rng = StdRng::seed_from_u64(FALLBACK_SEED);
    let mut cloud = ParticleCloud::with_capacity(count);
    for _ in 0..count {
        let theta = rng.random::<f32>() * TAU;
        let phi = (rng.random::<f32>() * 2.0 - 1.0).clamp(-1.0, 1.0).acos();
        let radius = 1.0 + rng.random::<f32>() * 0.5;
        let position = [
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        ];
        let color = rainbow_hue(rng.random::<f32>());
        let size = rng.random::<f32>() * 2.0 + 1.0;
        cloud.push(position, color, size, 1.0);
    }
    cloud.sanitize();
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_cloud(64), fallback_cloud(64));
    }

    #[test]
    fn fallback_points_lie_on_shell() {
        let cloud = fallback_cloud(500);
        assert_eq!(cloud.len(), 500);
        assert!(cloud.is_finite());
        for p in cloud.positions().chunks_exact(3) {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((0.999..=1.501).contains(&r), "radius {r}");
        }
        for s in cloud.sizes() {
            assert!((1.0..=3.0).contains(s));
        }
    }
}
