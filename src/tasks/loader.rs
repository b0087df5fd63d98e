use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{RgbaImage, imageops};
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LoaderOptions;
use crate::error::Error;
use crate::events::{ImageLoaded, InvalidImage, LoadImage};
use crate::particles::raster::RasterImage;
use crate::processing::resample::downscale_to_fit;

/// Decodes `path` to RGBA8, applies EXIF orientation and caps the longer side
/// at `max_dimension`.
pub fn decode_image(path: &Path, max_dimension: u32) -> Result<RasterImage, Error> {
    let name = display_name(path);
    let rgba = decode_rgba8_oriented(path).map_err(|err| Error::Decode {
        name: name.clone(),
        reason: err.to_string(),
    })?;
    let original = rgba.dimensions();
    let image = downscale_to_fit(RasterImage::from_rgba(name, rgba), max_dimension)?;
    debug!(
        path = %path.display(),
        original_w = original.0,
        original_h = original.1,
        width = image.width(),
        height = image.height(),
        "decoded image"
    );
    Ok(image)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn decode_rgba8_oriented(path: &Path) -> Result<RgbaImage, image::ImageError> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    Ok(apply_orientation(img, read_orientation(path).unwrap_or(1)))
}

/// Maps an EXIF orientation tag onto the upright image. Unknown values pass through.
fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    match orientation {
        2 => imageops::flip_horizontal(&img),
        3 => imageops::rotate180(&img),
        4 => imageops::flip_vertical(&img),
        5 => imageops::flip_horizontal(&imageops::rotate90(&img)),
        6 => imageops::rotate90(&img),
        7 => imageops::flip_horizontal(&imageops::rotate270(&img)),
        8 => imageops::rotate270(&img),
        _ => img,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let orientation = u16::try_from(field.value.get_uint(0)?).ok()?;
    debug!(path = %path.display(), orientation, "exif orientation");
    Some(orientation)
}

/// Decodes requested files on the blocking pool, at most
/// `max_concurrent_decodes` at a time, and forwards the results.
pub async fn run(
    mut load_rx: Receiver<LoadImage>,
    loaded_tx: Sender<ImageLoaded>,
    invalid_tx: Sender<InvalidImage>,
    cancel: CancellationToken,
    options: LoaderOptions,
) -> Result<()> {
    let LoaderOptions {
        max_dimension,
        max_concurrent_decodes,
    } = options;
    let max_in_flight = max_concurrent_decodes.max(1);
    let mut in_flight: HashSet<PathBuf> = HashSet::new();
    let mut tasks: JoinSet<(PathBuf, Result<RasterImage, String>)> = JoinSet::new();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            Some(LoadImage(path)) = load_rx.recv(), if in_flight.len() < max_in_flight => {
                if in_flight.insert(path.clone()) {
                    tasks.spawn(async move {
                        let p = path.clone();
                        let res = tokio::task::spawn_blocking(move || decode_image(&p, max_dimension)).await;
                        let outcome = match res {
                            Ok(Ok(image)) => Ok(image),
                            Ok(Err(err)) => Err(err.to_string()),
                            Err(join) => Err(format!("decode task failed: {join}")),
                        };
                        (path, outcome)
                    });
                } else {
                    debug!(path = %path.display(), "already decoding; ignoring duplicate request");
                }
            }

            Some(joined) = tasks.join_next() => {
                let Ok((path, outcome)) = joined else {
                    continue;
                };
                in_flight.remove(&path);
                match outcome {
                    Ok(image) => {
                        info!(path = %path.display(), "image loaded");
                        if loaded_tx.send(ImageLoaded(image)).await.is_err() {
                            debug!("image receiver dropped; stopping loader");
                            break;
                        }
                    }
                    Err(reason) => {
                        warn!(path = %path.display(), %reason, "invalid image");
                        let _ = invalid_tx.send(InvalidImage { path, reason }).await;
                    }
                }
            }

            else => break,
        }
    }
    tasks.abort_all();
    Ok(())
}
