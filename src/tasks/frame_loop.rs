//! The single frame-driven loop that owns the [`Controller`].
//!
//! Loader results and commands queue up in channels and are applied only
//! between frames, so every mutation of show state happens on this task.

use std::time::Instant;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::FrameOptions;
use crate::controller::Controller;
use crate::events::{Command, ImageLoaded};
use crate::particles::cloud::ParticleCloud;

/// Receives the displayed cloud whenever it changes.
pub trait Presenter {
    fn present(&mut self, cloud: &ParticleCloud);
}

impl<F: FnMut(&ParticleCloud)> Presenter for F {
    fn present(&mut self, cloud: &ParticleCloud) {
        self(cloud)
    }
}

/// Drives `controller` at `frame.fps` until cancelled, asked to quit, or
/// `max_frames` frames have run. Returns the controller for inspection.
pub async fn run<P: Presenter>(
    mut controller: Controller,
    frame: FrameOptions,
    mut loaded_rx: Receiver<ImageLoaded>,
    mut command_rx: Receiver<Command>,
    cancel: CancellationToken,
    presenter: &mut P,
    max_frames: Option<u64>,
) -> Result<Controller> {
    let mut ticker = interval(frame.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames: u64 = 0;
    let mut presented: Option<u64> = None;

    loop {
        select! {
            _ = cancel.cancelled() => {
                debug!(frames, "frame loop cancelled");
                break;
            }
            tick = ticker.tick() => {
                let now: Instant = tick.into_std();
                while let Ok(ImageLoaded(image)) = loaded_rx.try_recv() {
                    controller.add(image);
                }
                if drain_commands(&mut controller, &mut command_rx, now) {
                    info!("quit requested");
                    cancel.cancel();
                    break;
                }

                controller.tick(now);
                let version = controller.cloud_version();
                if presented != Some(version) {
                    presenter.present(controller.cloud());
                    presented = Some(version);
                }
                if let Some(state) = controller.engine().state() {
                    trace!(progress = state.progress, from = state.from, to = state.to, "frame");
                }

                frames += 1;
                if max_frames.is_some_and(|max| frames >= max) {
                    debug!(frames, "frame limit reached");
                    break;
                }
            }
        }
    }
    Ok(controller)
}

/// Applies queued commands; returns `true` once `Quit` is seen.
fn drain_commands(
    controller: &mut Controller,
    command_rx: &mut Receiver<Command>,
    now: Instant,
) -> bool {
    while let Ok(command) = command_rx.try_recv() {
        if command == Command::Quit {
            return true;
        }
        debug!(?command, "applying command");
        controller.apply(command, now);
    }
    false
}
