//! Time-bounded transitions between two images of the collection.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::collection::ImageCollection;
use crate::config::{GenerationParameters, TransitionMode};
use crate::error::Error;
use crate::particles::cloud::ParticleCloud;
use crate::particles::convert::{Blend, generate};
use crate::particles::raster::RasterView;
use crate::processing::resample::resample;

/// Slide swaps from the source to the target image at this progress.
pub const SLIDE_SWAP_POINT: f32 = 0.5;

/// Snapshot of an in-flight transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    pub from: usize,
    pub to: usize,
    /// Non-decreasing, in `0..=1`.
    pub progress: f32,
    pub started_at: Instant,
    pub mode: TransitionMode,
}

/// What a single tick asks the renderer to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Mix `from` toward `to` by `factor`.
    Blend { from: usize, to: usize, factor: f32 },
    /// Show one image unblended while still transitioning.
    Show(usize),
    /// The transition finished and `to` is now current.
    Completed(usize),
}

/// Both endpoints letterboxed to a shared size, computed once per transition.
#[derive(Debug, Clone, PartialEq)]
struct AlignedPair {
    width: u32,
    height: u32,
    from: Vec<u8>,
    to: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveTransition {
    state: TransitionState,
    aligned: Option<AlignedPair>,
}

/// Idle/transitioning state machine driven once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEngine {
    active: Option<ActiveTransition>,
    max_duration: Duration,
}

impl TransitionEngine {
    pub fn new(max_duration: Duration) -> Self {
        Self {
            active: None,
            max_duration,
        }
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> Option<&TransitionState> {
        self.active.as_ref().map(|active| &active.state)
    }

    /// Progress of the running transition, `0.0` when idle.
    pub fn progress(&self) -> f32 {
        self.state().map_or(0.0, |state| state.progress)
    }

    /// Starts a transition from the collection's current image to `to`.
    ///
    /// Returns `false` and changes nothing when `to` is out of bounds, is
    /// already current, or another transition is running.
    pub fn begin(
        &mut self,
        to: usize,
        collection: &ImageCollection,
        mode: TransitionMode,
        now: Instant,
    ) -> bool {
        if to >= collection.len() {
            debug!(to, len = collection.len(), "transition_rejected_out_of_bounds");
            return false;
        }
        let from = collection.current_index();
        if to == from {
            debug!(to, "transition_rejected_already_current");
            return false;
        }
        if let Some(active) = &self.active {
            debug!(
                to,
                running_to = active.state.to,
                "transition_rejected_already_running"
            );
            return false;
        }

        debug!(
            "transition_start mode={} from={} to={}",
            mode,
            collection.get(from).map_or("?", |img| img.name()),
            collection.get(to).map_or("?", |img| img.name()),
        );
        self.active = Some(ActiveTransition {
            state: TransitionState {
                from,
                to,
                progress: 0.0,
                started_at: now,
                mode,
            },
            aligned: None,
        });
        true
    }

    /// Forces the engine back to idle regardless of its state.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(
                from = active.state.from,
                to = active.state.to,
                progress = active.state.progress,
                "transition_reset"
            );
        }
    }

    /// Advances progress by one frame and reports what should be displayed.
    ///
    /// Progress grows by `frame_delta * speed`, except that once more than
    /// `max_duration` has elapsed since the start it jumps straight to 1. On
    /// completion the collection's current index moves to the target and the
    /// engine returns to idle. Returns `None` while idle.
    pub fn advance(
        &mut self,
        now: Instant,
        frame_delta: Duration,
        speed: f32,
        collection: &mut ImageCollection,
    ) -> Option<Step> {
        let active = self.active.as_mut()?;
        let state = &mut active.state;
        if collection.get(state.from).is_none() || collection.get(state.to).is_none() {
            warn!(
                from = state.from,
                to = state.to,
                len = collection.len(),
                "transition endpoints vanished; returning to idle"
            );
            self.active = None;
            return None;
        }

        let elapsed = now.saturating_duration_since(state.started_at);
        let before = state.progress;
        if elapsed > self.max_duration {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                progress = before,
                "transition timed out; forcing completion"
            );
            state.progress = 1.0;
        } else {
            let step = frame_delta.as_secs_f32() * speed;
            let step = if step.is_nan() || step < 0.0 { 0.0 } else { step };
            state.progress = (state.progress + step).min(1.0);
        }
        trace!(before, after = state.progress, "transition_progress");

        if state.progress >= 1.0 {
            state.progress = 1.0;
            let to = state.to;
            collection.set_current(to);
            debug!(
                "transition_end mode={} to={} elapsed_ms={}",
                state.mode,
                collection.get(to).map_or("?", |img| img.name()),
                elapsed.as_millis()
            );
            self.active = None;
            return Some(Step::Completed(to));
        }

        let step = if state.mode.blends() {
            Step::Blend {
                from: state.from,
                to: state.to,
                factor: state.progress,
            }
        } else if state.progress < SLIDE_SWAP_POINT {
            Step::Show(state.from)
        } else {
            Step::Show(state.to)
        };
        Some(step)
    }

    /// Generates the cloud for `step`.
    pub fn render<R: Rng + ?Sized>(
        &mut self,
        step: Step,
        collection: &ImageCollection,
        params: &GenerationParameters,
        rng: &mut R,
    ) -> Result<Option<ParticleCloud>, Error> {
        match step {
            Step::Show(index) | Step::Completed(index) => collection
                .get(index)
                .map(|img| generate(img.view(), params, None, rng))
                .transpose(),
            Step::Blend { from, to, factor } => {
                let (Some(from_img), Some(to_img)) = (collection.get(from), collection.get(to))
                else {
                    return Ok(None);
                };
                let Some(active) = self.active.as_mut() else {
                    return Ok(None);
                };
                if active.aligned.is_none() {
                    let width = from_img.width().max(to_img.width());
                    let height = from_img.height().max(to_img.height());
                    active.aligned = Some(AlignedPair {
                        width,
                        height,
                        from: resample(from_img.view(), width, height)?,
                        to: resample(to_img.view(), width, height)?,
                    });
                }
                let Some(pair) = active.aligned.as_ref() else {
                    return Ok(None);
                };
                let primary = RasterView::new(pair.width, pair.height, &pair.from)?;
                let secondary = RasterView::new(pair.width, pair.height, &pair.to)?;
                generate(primary, params, Some(Blend { secondary, factor }), rng).map(Some)
            }
        }
    }

    /// [`advance`](Self::advance) followed by [`render`](Self::render).
    ///
    /// Returns the step taken and the cloud it produced; `None` while idle.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now: Instant,
        frame_delta: Duration,
        speed: f32,
        collection: &mut ImageCollection,
        params: &GenerationParameters,
        rng: &mut R,
    ) -> Result<Option<(Step, ParticleCloud)>, Error> {
        let Some(step) = self.advance(now, frame_delta, speed, collection) else {
            return Ok(None);
        };
        Ok(self
            .render(step, collection, params, rng)?
            .map(|cloud| (step, cloud)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::raster::RasterImage;
    use rand::{SeedableRng, rngs::StdRng};

    const FRAME: Duration = Duration::from_millis(100);

    fn collection(n: usize) -> ImageCollection {
        let mut c = ImageCollection::new();
        for i in 0..n {
            let v = (i * 60) as u8 + 40;
            c.add(RasterImage::new(format!("img{i}"), 2, 2, [v, v, v, 255].repeat(4)).unwrap());
        }
        c
    }

    #[test]
    fn begin_rejects_invalid_requests() {
        let t0 = Instant::now();
        let c = collection(2);
        let mut engine = TransitionEngine::new(Duration::from_secs(5));

        assert!(!engine.begin(2, &c, TransitionMode::Morph, t0));
        assert!(!engine.begin(0, &c, TransitionMode::Morph, t0));
        assert!(!engine.is_transitioning());

        assert!(engine.begin(1, &c, TransitionMode::Morph, t0));
        let snapshot = engine.clone();
        assert!(!engine.begin(1, &c, TransitionMode::Slide, t0 + FRAME));
        assert_eq!(engine, snapshot);
    }

    #[test]
    fn progress_accumulates_until_completion() {
        let t0 = Instant::now();
        let mut c = collection(2);
        let mut engine = TransitionEngine::new(Duration::from_secs(5));
        engine.begin(1, &c, TransitionMode::Dissolve, t0);

        let mut last = 0.0;
        let mut now = t0;
        let mut completed = None;
        for _ in 0..20 {
            now += FRAME;
            match engine.advance(now, FRAME, 2.0, &mut c) {
                Some(Step::Blend { factor, .. }) => {
                    assert!(factor >= last);
                    last = factor;
                }
                Some(Step::Completed(to)) => {
                    completed = Some(to);
                    break;
                }
                other => panic!("unexpected step {other:?}"),
            }
        }
        assert_eq!(completed, Some(1));
        assert_eq!(c.current_index(), 1);
        assert!(!engine.is_transitioning());
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn stalled_clock_is_forced_to_finish() {
        let t0 = Instant::now();
        let mut c = collection(2);
        let mut engine = TransitionEngine::new(Duration::from_secs(5));
        engine.begin(1, &c, TransitionMode::Morph, t0);

        // zero frame deltas never move progress on their own
        let step = engine.advance(t0 + Duration::from_secs(1), Duration::ZERO, 1.0, &mut c);
        assert_eq!(step, Some(Step::Blend { from: 0, to: 1, factor: 0.0 }));

        let step = engine.advance(t0 + Duration::from_millis(5001), Duration::ZERO, 0.0, &mut c);
        assert_eq!(step, Some(Step::Completed(1)));
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn slide_swaps_at_midpoint() {
        let t0 = Instant::now();
        let mut c = collection(2);
        let mut engine = TransitionEngine::new(Duration::from_secs(5));
        engine.begin(1, &c, TransitionMode::Slide, t0);

        let step = engine.advance(t0 + FRAME, Duration::from_millis(490), 1.0, &mut c);
        assert_eq!(step, Some(Step::Show(0)));
        let step = engine.advance(t0 + FRAME * 2, Duration::from_millis(20), 1.0, &mut c);
        assert_eq!(step, Some(Step::Show(1)));
    }

    #[test]
    fn blend_render_aligns_differently_sized_images() {
        let t0 = Instant::now();
        let mut c = ImageCollection::new();
        c.add(RasterImage::new("wide", 4, 2, [255, 255, 255, 255].repeat(8)).unwrap());
        c.add(RasterImage::new("tall", 2, 4, [255, 255, 255, 255].repeat(8)).unwrap());
        let mut engine = TransitionEngine::new(Duration::from_secs(5));
        engine.begin(1, &c, TransitionMode::Morph, t0);

        let params = GenerationParameters {
            brightness_threshold: 0.0,
            ..GenerationParameters::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let (step, cloud) = engine
            .tick(t0 + FRAME, FRAME, 1.0, &mut c, &params, &mut rng)
            .unwrap()
            .unwrap();
        assert!(matches!(step, Step::Blend { .. }));
        // blended on a 4x4 canvas
        assert_eq!(cloud.capacity(), 16);
        assert!(cloud.is_finite());
    }

    #[test]
    fn reset_returns_to_idle() {
        let t0 = Instant::now();
        let mut c = collection(3);
        let mut engine = TransitionEngine::new(Duration::from_secs(5));
        engine.begin(2, &c, TransitionMode::Morph, t0);
        engine.advance(t0 + FRAME, FRAME, 1.0, &mut c);
        engine.reset();
        assert!(!engine.is_transitioning());
        assert_eq!(engine.progress(), 0.0);
        assert_eq!(engine.advance(t0 + FRAME * 2, FRAME, 1.0, &mut c), None);
        assert_eq!(c.current_index(), 0);
    }
}
