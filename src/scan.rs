//! Resolves command-line paths into the list of image files to load.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

/// Extensions the decoder is built to handle, lowercase without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Return `true` if `path` has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Expands `paths` into image files.
///
/// Files are taken as given, in argument order, regardless of extension.
/// Directories are walked recursively, skipping hidden subdirectories, and
/// contribute their supported images in sorted order.
///
/// # Errors
/// Returns [`Error::BadPath`] naming every path that does not exist.
pub fn discover_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let missing: Vec<_> = paths.iter().filter(|p| !p.exists()).collect();
    if !missing.is_empty() {
        let joined = missing
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Error::BadPath(joined));
    }

    let mut out = Vec::new();
    for root in paths {
        if !root.is_dir() {
            out.push(root.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
            .flatten()
            .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
            .map(DirEntry::into_path)
            .collect();
        found.sort();
        out.extend(found);
    }
    Ok(out)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    // tempdir roots may themselves be dot-dirs
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
