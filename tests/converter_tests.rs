use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_particle_frame::config::{ColorMode, GenerationParameters};
use rust_particle_frame::particles::{ParticleCloud, RasterImage, generate};

fn params(threshold: f32, density: f32) -> GenerationParameters {
    GenerationParameters {
        brightness_threshold: threshold,
        particle_density: density,
        ..GenerationParameters::default()
    }
}

fn run(image: &RasterImage, params: &GenerationParameters, seed: u64) -> ParticleCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(image.view(), params, None, &mut rng).unwrap()
}

fn noise_image(w: u32, h: u32, seed: u64) -> RasterImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels: Vec<u8> = (0..w * h * 4).map(|_| rng.random::<u8>()).collect();
    RasterImage::new("noise", w, h, pixels).unwrap()
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn four_color_square_maps_in_closed_form() {
    // red, green / blue, white
    let pixels = vec![
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 255, 255, 255, 255,
    ];
    let image = RasterImage::new("quad", 2, 2, pixels).unwrap();
    let p = params(0.0, 1.0);
    let cloud = run(&image, &p, 1);
    assert_eq!(cloud.len(), 4);

    let third = 1.0 / 3.0;
    let expected = [
        ([-0.04, 0.04, third * 0.5], [1.0, 0.0, 0.0]),
        ([0.0, 0.04, third * 0.5], [0.0, 1.0, 0.0]),
        ([-0.04, 0.0, third * 0.5], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 0.5], [1.0, 1.0, 1.0]),
    ];
    for (i, (position, color)) in expected.iter().enumerate() {
        let got_pos = cloud.position(i).unwrap();
        let got_color = cloud.color(i).unwrap();
        for axis in 0..3 {
            assert!(close(got_pos[axis], position[axis]), "particle {i} position {got_pos:?}");
            assert!(close(got_color[axis], color[axis]), "particle {i} color {got_color:?}");
        }
    }
    assert!(close(cloud.brightness()[3], 1.0));
    assert!(close(cloud.sizes()[3], p.point_size));
    assert!(close(cloud.sizes()[0], p.point_size * (0.5 + third * 0.5)));
}

#[test]
fn brightness_mode_writes_grey() {
    let image = RasterImage::new("px", 1, 1, vec![255, 0, 0, 255]).unwrap();
    let p = GenerationParameters {
        color_mode: ColorMode::Brightness,
        ..params(0.0, 1.0)
    };
    let cloud = run(&image, &p, 1);
    let third = 1.0 / 3.0;
    let color = cloud.color(0).unwrap();
    assert!(color.iter().all(|c| close(*c, third)));
}

#[test]
fn full_density_keeps_every_passing_pixel() {
    let image = noise_image(64, 48, 11);
    let p = params(0.3, 1.0);

    let passing = image
        .pixels()
        .chunks_exact(4)
        .filter(|px| {
            let lum = (f32::from(px[0]) + f32::from(px[1]) + f32::from(px[2])) / 3.0 / 255.0;
            let alpha = f32::from(px[3]) / 255.0;
            lum >= 0.3 && alpha >= 0.1
        })
        .count();

    let a = run(&image, &p, 1);
    let b = run(&image, &p, 99);
    assert_eq!(a.len(), passing);
    assert_eq!(a, b);
}

#[test]
fn rejected_pixels_never_emit() {
    let image = noise_image(40, 40, 5);
    let p = params(0.45, 1.0);
    let cloud = run(&image, &p, 1);
    assert!(!cloud.is_empty());
    for b in cloud.brightness() {
        assert!(*b >= 0.45);
    }

    // every pixel transparent: nothing survives the alpha cut
    let transparent = RasterImage::new("clear", 8, 8, [255, 255, 255, 20].repeat(64)).unwrap();
    assert!(run(&transparent, &params(0.0, 1.0), 1).is_empty());
}

#[test]
fn density_fraction_converges() {
    let image = RasterImage::new("white", 200, 200, vec![255u8; 200 * 200 * 4]).unwrap();
    for density in [0.25_f32, 0.5, 0.8] {
        let cloud = run(&image, &params(0.0, density), 42);
        let fraction = cloud.len() as f32 / 40_000.0;
        assert!(
            (fraction - density).abs() < 0.02,
            "density {density} produced fraction {fraction}"
        );
        assert!(cloud.len() <= cloud.capacity());
    }
}

#[test]
fn degenerate_inputs_stay_finite() {
    let empty = RasterImage::new("empty", 0, 5, Vec::new()).unwrap();
    let cloud = run(&empty, &params(0.0, 1.0), 1);
    assert!(cloud.is_empty());

    let image = noise_image(16, 16, 3);
    let p = GenerationParameters {
        image_scale: f32::NAN,
        depth_multiplier: f32::INFINITY,
        point_size: f32::INFINITY,
        ..params(0.0, 1.0)
    };
    let cloud = run(&image, &p, 1);
    assert!(!cloud.is_empty());
    assert!(cloud.is_finite());
    assert!(cloud.positions().iter().all(|v| *v == 0.0));
    assert!(cloud.sizes().iter().all(|s| *s == 1.0));
}
