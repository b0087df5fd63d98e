use rust_particle_frame::config::{ColorMode, Configuration, TransitionMode};
use std::time::Duration;

#[test]
fn empty_document_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    let cfg = cfg.validated().unwrap();
    assert!((cfg.generation.point_size - 0.2).abs() < f32::EPSILON);
    assert!((cfg.generation.image_scale - 4.0).abs() < f32::EPSILON);
    assert!((cfg.generation.particle_density - 1.0).abs() < f32::EPSILON);
    assert_eq!(cfg.generation.color_mode, ColorMode::Original);
    assert_eq!(cfg.transition.mode, TransitionMode::Morph);
    assert_eq!(cfg.transition.max_duration, Duration::from_secs(5));
    assert_eq!(cfg.transition.auto_interval, Duration::from_secs(5));
    assert!(!cfg.transition.auto);
    assert_eq!(cfg.loader.max_dimension, 200);
    assert_eq!(cfg.frame.fps, 60);
    assert_eq!(cfg.frame.fallback_delta, Duration::from_millis(16));
    assert_eq!(cfg.fallback_particle_count, 1000);
    assert_eq!(cfg.random_seed, None);
}

#[test]
fn parse_kebab_case_sections() {
    let yaml = r#"
generation:
  point-size: 0.35
  brightness-threshold: 0.25
  particle-density: 0.5
  color-mode: rainbow
transition:
  speed: 2.0
  mode: slide
  max-duration: 3s
  auto: true
  auto-interval: 1500ms
loader:
  max-concurrent-decodes: 2
frame:
  fallback-delta: 20ms
random-seed: 7
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert!((cfg.generation.point_size - 0.35).abs() < f32::EPSILON);
    assert!((cfg.generation.brightness_threshold - 0.25).abs() < f32::EPSILON);
    assert_eq!(cfg.generation.color_mode, ColorMode::Rainbow);
    // untouched keys keep their defaults
    assert!((cfg.generation.depth_multiplier - 0.5).abs() < f32::EPSILON);
    assert_eq!(cfg.transition.mode, TransitionMode::Slide);
    assert_eq!(cfg.transition.max_duration, Duration::from_secs(3));
    assert_eq!(cfg.transition.auto_interval, Duration::from_millis(1500));
    assert!(cfg.transition.auto);
    assert_eq!(cfg.loader.max_concurrent_decodes, 2);
    assert_eq!(cfg.loader.max_dimension, 200);
    assert_eq!(cfg.frame.fallback_delta, Duration::from_millis(20));
    assert_eq!(cfg.random_seed, Some(7));
}

#[test]
fn unknown_mode_is_rejected() {
    let yaml = "transition:\n  mode: wipe\n";
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());

    let err = "wipe".parse::<TransitionMode>().unwrap_err();
    assert!(err.to_string().contains("morph, dissolve, slide"));
    assert_eq!("dissolve".parse::<TransitionMode>().unwrap(), TransitionMode::Dissolve);
    assert_eq!("brightness".parse::<ColorMode>().unwrap(), ColorMode::Brightness);
}

#[test]
fn validation_names_offending_key() {
    let cases = [
        ("generation:\n  particle-density: 0\n", "generation.particle-density"),
        ("generation:\n  particle-density: 1.5\n", "generation.particle-density"),
        ("generation:\n  brightness-threshold: -0.1\n", "generation.brightness-threshold"),
        ("generation:\n  point-size: 0\n", "generation.point-size"),
        ("transition:\n  speed: 0\n", "transition.speed"),
        ("transition:\n  max-duration: 0s\n", "transition.max-duration"),
        ("loader:\n  max-dimension: 0\n", "loader.max-dimension"),
        ("frame:\n  fps: 0\n", "frame.fps"),
        ("fallback-particle-count: 0\n", "fallback-particle-count"),
    ];
    for (yaml, key) in cases {
        let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
        let err = cfg.validated().unwrap_err();
        assert!(
            err.to_string().contains(key),
            "expected '{key}' in error for {yaml:?}, got: {err}"
        );
    }
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "transition:\n  mode: dissolve\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.transition.mode, TransitionMode::Dissolve);

    assert!(Configuration::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}
