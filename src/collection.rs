//! Ordered set of loaded images with a current-index cursor.

use crate::particles::raster::RasterImage;

/// Images in display (insertion) order.
///
/// Invariant: `current < len()` whenever the collection is non-empty, and
/// `current == 0` when it is empty.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    items: Vec<RasterImage>,
    current: usize,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&RasterImage> {
        self.items.get(self.current)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RasterImage> {
        self.items.get(index)
    }

    /// Appends an image and returns its index.
    pub fn add(&mut self, image: RasterImage) -> usize {
        self.items.push(image);
        self.items.len() - 1
    }

    /// Moves the cursor. Returns `false` and leaves it untouched when out of range.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.current = index;
        true
    }

    /// Removes the current image, clamping the cursor to the new last index.
    pub fn remove_current(&mut self) -> Option<RasterImage> {
        if self.items.is_empty() {
            return None;
        }
        let removed = self.items.remove(self.current);
        if self.current >= self.items.len() {
            self.current = self.items.len().saturating_sub(1);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = 0;
    }

    /// Index after the current one, wrapping at the end.
    #[must_use]
    pub fn next_index(&self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        Some((self.current + 1) % self.items.len())
    }

    /// Index before the current one, wrapping at the start.
    #[must_use]
    pub fn prev_index(&self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let len = self.items.len();
        Some((self.current + len - 1) % len)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RasterImage> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|img| img.name().to_owned()).collect()
    }
}
