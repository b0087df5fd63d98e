//! Owner of all mutable show state: the image collection, the transition
//! engine, the sampling RNG and the cloud currently handed to the renderer.
//!
//! Everything here runs on a single frame loop; callers hand in `now` so the
//! controller never reads the clock itself.

use std::time::{Duration, Instant};

use anyhow::Result;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::collection::ImageCollection;
use crate::config::{
    Configuration, FrameOptions, GenerationParameters, TransitionMode, TransitionOptions,
};
use crate::events::Command;
use crate::particles::cloud::ParticleCloud;
use crate::particles::convert::generate;
use crate::particles::fallback::fallback_cloud;
use crate::particles::raster::RasterImage;
use crate::transition::{Step, TransitionEngine};

/// Frame deltas shorter than this are treated as a stalled clock.
const MIN_FRAME_DELTA: Duration = Duration::from_millis(1);

/// Derives per-frame deltas from successive tick instants.
#[derive(Debug, Clone)]
struct FrameClock {
    last: Instant,
    fallback: Duration,
}

impl FrameClock {
    fn new(now: Instant, fallback: Duration) -> Self {
        Self {
            last: now,
            fallback,
        }
    }

    fn delta(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        if delta < MIN_FRAME_DELTA {
            self.fallback
        } else {
            delta
        }
    }
}

/// Summary of the controller state for status output.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub images: Vec<String>,
    pub current: usize,
    pub transitioning: bool,
    pub progress: f32,
    pub mode: TransitionMode,
    pub auto: bool,
    pub particles: usize,
    pub showing_fallback: bool,
}

pub struct Controller {
    collection: ImageCollection,
    engine: TransitionEngine,
    params: GenerationParameters,
    transition: TransitionOptions,
    fallback_count: usize,
    rng: StdRng,
    cloud: ParticleCloud,
    cloud_version: u64,
    showing_fallback: bool,
    clock: FrameClock,
    auto_anchor: Instant,
}

impl Controller {
    /// Builds an empty controller showing the placeholder cloud.
    pub fn new(cfg: &Configuration, now: Instant) -> Self {
        let rng = match cfg.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(cfg, rng, now)
    }

    pub fn with_rng(cfg: &Configuration, rng: StdRng, now: Instant) -> Self {
        let FrameOptions { fallback_delta, .. } = cfg.frame;
        Self {
            collection: ImageCollection::new(),
            engine: TransitionEngine::new(cfg.transition.max_duration),
            params: cfg.generation,
            transition: cfg.transition,
            fallback_count: cfg.fallback_particle_count,
            rng,
            cloud: fallback_cloud(cfg.fallback_particle_count),
            cloud_version: 0,
            showing_fallback: true,
            clock: FrameClock::new(now, fallback_delta),
            auto_anchor: now,
        }
    }

    /// Cloud the renderer should draw this frame.
    pub fn cloud(&self) -> &ParticleCloud {
        &self.cloud
    }

    /// Increments whenever [`cloud`](Self::cloud) is replaced.
    pub fn cloud_version(&self) -> u64 {
        self.cloud_version
    }

    pub fn is_showing_fallback(&self) -> bool {
        self.showing_fallback
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn parameters(&self) -> &GenerationParameters {
        &self.params
    }

    pub fn transition_options(&self) -> &TransitionOptions {
        &self.transition
    }

    /// Appends a decoded image; the first image replaces the placeholder.
    pub fn add(&mut self, image: RasterImage) -> usize {
        info!(
            name = image.name(),
            width = image.width(),
            height = image.height(),
            "adding image to collection"
        );
        let index = self.collection.add(image);
        if self.collection.len() == 1 {
            self.collection.set_current(0);
            self.regenerate();
        }
        index
    }

    /// Drops the current image and shows whichever image takes its place.
    pub fn remove_current(&mut self) {
        self.engine.reset();
        match self.collection.remove_current() {
            Some(removed) => info!(
                name = removed.name(),
                remaining = self.collection.len(),
                "removed current image"
            ),
            None => debug!("no image to remove"),
        }
        self.regenerate();
    }

    pub fn clear(&mut self) {
        self.engine.reset();
        self.collection.clear();
        info!("cleared all images");
        self.regenerate();
    }

    /// Begins a transition to `index`. Invalid requests are ignored.
    pub fn select(&mut self, index: usize, now: Instant) -> bool {
        self.engine
            .begin(index, &self.collection, self.transition.mode, now)
    }

    pub fn next(&mut self, now: Instant) -> bool {
        match self.collection.next_index() {
            Some(index) => self.select(index, now),
            None => false,
        }
    }

    pub fn prev(&mut self, now: Instant) -> bool {
        match self.collection.prev_index() {
            Some(index) => self.select(index, now),
            None => false,
        }
    }

    /// Abandons any running transition and redraws the current image.
    pub fn reset_transition(&mut self) {
        let was_running = self.engine.is_transitioning();
        self.engine.reset();
        if was_running {
            self.regenerate();
        }
        info!(
            current = self.collection.current_index(),
            "transition state reset"
        );
    }

    /// Replaces the generation parameters, redrawing immediately when idle.
    pub fn set_parameters(&mut self, params: GenerationParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        if !self.engine.is_transitioning() {
            self.regenerate();
        }
        Ok(())
    }

    /// Applies to transitions started after the call.
    pub fn set_transition_mode(&mut self, mode: TransitionMode) {
        self.transition.mode = mode;
    }

    pub fn set_transition_speed(&mut self, speed: f32) {
        if speed > 0.0 && speed.is_finite() {
            self.transition.speed = speed;
        } else {
            warn!(speed, "ignoring non-positive transition speed");
        }
    }

    pub fn set_auto(&mut self, enabled: bool, now: Instant) {
        self.transition.auto = enabled;
        self.auto_anchor = now;
    }

    /// Applies a UI command. `Quit` is left to the caller.
    pub fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::Add(image) => {
                self.add(image);
            }
            Command::RemoveCurrent => self.remove_current(),
            Command::Clear => self.clear(),
            Command::Select(index) => {
                self.select(index, now);
            }
            Command::Next => {
                self.next(now);
            }
            Command::Prev => {
                self.prev(now);
            }
            Command::ResetTransition => self.reset_transition(),
            Command::SetAuto(enabled) => self.set_auto(enabled, now),
            Command::SetMode(mode) => self.set_transition_mode(mode),
            Command::Status => info!("{:#?}", self.snapshot()),
            Command::Quit => {}
        }
    }

    /// Runs one frame: advances a running transition and fires auto-advance.
    pub fn tick(&mut self, now: Instant) {
        let delta = self.clock.delta(now);

        if self.engine.is_transitioning() {
            match self.engine.tick(
                now,
                delta,
                self.transition.speed,
                &mut self.collection,
                &self.params,
                &mut self.rng,
            ) {
                Ok(Some((step, cloud))) => {
                    self.install(cloud, false);
                    if matches!(step, Step::Completed(_)) {
                        self.auto_anchor = now;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "transition frame failed; keeping previous cloud");
                }
            }
        }

        if self.transition.auto
            && !self.engine.is_transitioning()
            && self.collection.len() > 1
            && now.saturating_duration_since(self.auto_anchor) >= self.transition.auto_interval
        {
            self.auto_anchor = now;
            debug!("auto transition firing");
            self.next(now);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            images: self.collection.names(),
            current: self.collection.current_index(),
            transitioning: self.engine.is_transitioning(),
            progress: self.engine.progress(),
            mode: self.transition.mode,
            auto: self.transition.auto,
            particles: self.cloud.len(),
            showing_fallback: self.showing_fallback,
        }
    }

    fn regenerate(&mut self) {
        let Some(image) = self.collection.current() else {
            self.install(fallback_cloud(self.fallback_count), true);
            return;
        };
        match generate(image.view(), &self.params, None, &mut self.rng) {
            Ok(cloud) => self.install(cloud, false),
            Err(err) => warn!(
                name = image.name(),
                error = %err,
                "failed to generate cloud; keeping previous"
            ),
        }
    }

    fn install(&mut self, cloud: ParticleCloud, fallback: bool) {
        self.cloud = cloud;
        self.showing_fallback = fallback;
        self.cloud_version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Configuration {
        let mut cfg = Configuration::default();
        cfg.generation.brightness_threshold = 0.0;
        cfg.random_seed = Some(9);
        cfg.fallback_particle_count = 32;
        cfg
    }

    fn image(name: &str, value: u8) -> RasterImage {
        RasterImage::new(name, 2, 2, [value, value, value, 255].repeat(4)).unwrap()
    }

    #[test]
    fn frame_clock_substitutes_stalled_deltas() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new(t0, Duration::from_millis(16));
        assert_eq!(clock.delta(t0), Duration::from_millis(16));
        assert_eq!(
            clock.delta(t0 + Duration::from_millis(40)),
            Duration::from_millis(40)
        );
    }

    #[test]
    fn starts_on_fallback_and_switches_on_first_image() {
        let t0 = Instant::now();
        let mut ctl = Controller::new(&cfg(), t0);
        assert!(ctl.is_showing_fallback());
        assert_eq!(ctl.cloud().len(), 32);

        ctl.add(image("a", 200));
        assert!(!ctl.is_showing_fallback());
        assert_eq!(ctl.cloud().len(), 4);

        let version = ctl.cloud_version();
        ctl.add(image("b", 100));
        assert_eq!(ctl.cloud_version(), version);
    }

    #[test]
    fn removing_last_image_restores_fallback() {
        let t0 = Instant::now();
        let mut ctl = Controller::new(&cfg(), t0);
        ctl.add(image("a", 200));
        ctl.add(image("b", 100));
        assert!(ctl.next(t0));
        ctl.remove_current();
        assert!(!ctl.engine().is_transitioning());
        assert_eq!(ctl.collection().names(), vec!["b"]);
        ctl.remove_current();
        assert!(ctl.is_showing_fallback());
        assert_eq!(ctl.cloud(), &fallback_cloud(32));
    }

    #[test]
    fn auto_transition_waits_for_interval() {
        let t0 = Instant::now();
        let mut cfg = cfg();
        cfg.transition.auto = true;
        cfg.transition.auto_interval = Duration::from_secs(5);
        let mut ctl = Controller::new(&cfg, t0);
        ctl.add(image("a", 200));
        ctl.add(image("b", 100));

        ctl.tick(t0 + Duration::from_secs(4));
        assert!(!ctl.engine().is_transitioning());
        ctl.tick(t0 + Duration::from_secs(5));
        assert!(ctl.engine().is_transitioning());
        assert_eq!(ctl.engine().state().unwrap().to, 1);
    }

    #[test]
    fn parameter_change_redraws_current_image() {
        let t0 = Instant::now();
        let mut ctl = Controller::new(&cfg(), t0);
        ctl.add(image("a", 200));
        let mut params = *ctl.parameters();
        params.brightness_threshold = 0.9;
        ctl.set_parameters(params).unwrap();
        assert!(ctl.cloud().is_empty());

        params.particle_density = 0.0;
        assert!(ctl.set_parameters(params).is_err());
    }
}
