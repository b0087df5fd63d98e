use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use rust_particle_frame::config::{Configuration, TransitionMode};
use rust_particle_frame::events::{Command, ImageLoaded, InvalidImage, LoadImage};
use rust_particle_frame::particles::{ParticleCloud, ParticleVertex};
use rust_particle_frame::tasks::{frame_loop, loader};
use rust_particle_frame::{Controller, scan};

#[derive(Debug, Parser)]
#[command(
    name = "particle-frame",
    version,
    about = "Turns images into particle clouds and transitions between them"
)]
struct Args {
    /// Image files or directories to load, in display order
    #[arg(value_name = "PATH")]
    images: Vec<PathBuf>,
    /// Path to YAML config; built-in defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Deterministic seed for density sampling
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Advance to the next image automatically
    #[arg(long)]
    auto: bool,
    /// Transition mode override (morph, dissolve, slide)
    #[arg(long, value_name = "MODE")]
    mode: Option<TransitionMode>,
    /// Exit after this many frames
    #[arg(long, value_name = "COUNT")]
    frames: Option<u64>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "rust_particle_frame=debug,info",
        _ => "rust_particle_frame=trace,debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .compact()
        .init();
}

fn load_configuration(args: &Args) -> Result<Configuration> {
    let mut cfg = match &args.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(seed) = args.seed {
        cfg.random_seed = Some(seed);
    }
    if args.auto {
        cfg.transition.auto = true;
    }
    if let Some(mode) = args.mode {
        cfg.transition.mode = mode;
    }
    cfg.validated().context("invalid configuration values")
}

fn present(cloud: &ParticleCloud) {
    let vertices = cloud.vertices();
    let bytes: &[u8] = bytemuck::cast_slice::<ParticleVertex, u8>(&vertices);
    tracing::debug!(
        particles = cloud.len(),
        bytes = bytes.len(),
        "cloud ready for upload"
    );
}

async fn read_commands(
    command_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
) -> Result<()> {
    let interactive = io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else {
            if interactive {
                tracing::info!("stdin closed; initiating shutdown");
                cancel.cancel();
            }
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if command_tx.send(command).await.is_err() {
                    break;
                }
            }
            Err(err) => tracing::warn!("{err:#}"),
        }
    }
    Ok(())
}

async fn report_invalid(mut invalid_rx: mpsc::Receiver<InvalidImage>) -> Result<()> {
    while let Some(InvalidImage { path, reason }) = invalid_rx.recv().await {
        tracing::warn!(path = %path.display(), %reason, "skipping image");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cfg = load_configuration(&args)?;
    tracing::debug!("configuration:\n{:#?}", cfg);
    tracing::info!(
        "transition mode={} speed={} max-duration={} auto={} every {}",
        cfg.transition.mode,
        cfg.transition.speed,
        humantime::format_duration(cfg.transition.max_duration),
        cfg.transition.auto,
        humantime::format_duration(cfg.transition.auto_interval),
    );

    let paths = scan::discover_images(&args.images).context("failed to resolve image paths")?;
    tracing::info!(count = paths.len(), "discovered images");

    let (load_tx, load_rx) = mpsc::channel::<LoadImage>(cfg.loader.max_concurrent_decodes);
    let (loaded_tx, loaded_rx) = mpsc::channel::<ImageLoaded>(16);
    let (invalid_tx, invalid_rx) = mpsc::channel::<InvalidImage>(16);
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let cancel = cancel.clone();
        let options = cfg.loader;
        async move {
            loader::run(load_rx, loaded_tx, invalid_tx, cancel, options)
                .await
                .context("loader task failed")
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            for path in paths {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = load_tx.send(LoadImage(path)) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(())
        }
    });

    tasks.spawn(report_invalid(invalid_rx));

    // Not joined: a pending stdin read would block shutdown.
    tokio::spawn(read_commands(command_tx, cancel.clone()));

    let controller = Controller::new(&cfg, Instant::now());
    let mut presenter = present;
    let controller = frame_loop::run(
        controller,
        cfg.frame,
        loaded_rx,
        command_rx,
        cancel.clone(),
        &mut presenter,
        args.frames,
    )
    .await
    .context("frame loop failed")?;
    tracing::info!("final state: {:?}", controller.snapshot());

    cancel.cancel();
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }
    Ok(())
}
