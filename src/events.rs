use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};

use crate::config::TransitionMode;
use crate::particles::raster::RasterImage;

#[derive(Debug, Clone)]
pub struct LoadImage(pub PathBuf);

/// A decoded image ready to join the collection.
#[derive(Debug, Clone)]
pub struct ImageLoaded(pub RasterImage);

#[derive(Debug)]
pub struct InvalidImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Commands accepted from the outer UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(RasterImage),
    RemoveCurrent,
    Clear,
    Select(usize),
    Next,
    Prev,
    ResetTransition,
    SetAuto(bool),
    SetMode(TransitionMode),
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    /// Parses the line-oriented text form used on stdin, e.g. `select 2`.
    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let arg = words.next();
        let cmd = match (verb, arg) {
            ("next", None) => Command::Next,
            ("prev", None) => Command::Prev,
            ("remove", None) => Command::RemoveCurrent,
            ("clear", None) => Command::Clear,
            ("reset", None) => Command::ResetTransition,
            ("status", None) => Command::Status,
            ("quit", None) => Command::Quit,
            ("select", Some(index)) => Command::Select(
                index
                    .parse()
                    .with_context(|| format!("invalid image index '{index}'"))?,
            ),
            ("auto", Some("on")) => Command::SetAuto(true),
            ("auto", Some("off")) => Command::SetAuto(false),
            ("mode", Some(mode)) => Command::SetMode(mode.parse()?),
            _ => return Err(anyhow!("unrecognized command '{}'", line.trim())),
        };
        if words.next().is_some() {
            bail!("too many arguments in '{}'", line.trim());
        }
        Ok(cmd)
    }
}
