//! Square single-channel glyph atlas with shelf packing.
//!
//! Glyph bitmaps are placed left-to-right in rows ("shelves"). A new shelf
//! starts below the tallest glyph of the current one when a bitmap no longer
//! fits horizontally. When a bitmap does not fit vertically either, `reserve`
//! returns `None` and the owner must `grow`, which doubles the side length
//! and wipes the backing store: every previously handed-out placement is
//! meaningless afterwards.

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};

/// Smallest side length the atlas grows to from an uninitialized state.
pub const MIN_ATLAS_SIZE: u32 = 256;

/// Empty pixels kept to the right of and below every placed bitmap.
///
/// The atlas is sampled with wrap addressing and filled left-to-right,
/// top-to-bottom, so no margin is needed on the left or above.
pub const GLYPH_MARGIN: u32 = 1;

/// Backing store for the atlas pixels (a GPU texture or a CPU image).
pub trait TextureStorage {
    /// Largest side length this storage can hold.
    fn max_size(&self) -> u32;

    /// (Re)allocate as a `size`x`size` image with every pixel zeroed.
    fn clear(&mut self, size: u32) -> Result<()>;

    /// Overwrite a `width`x`height` region at `(x, y)` with row-major coverage bytes.
    fn upload_region(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> Result<()>;
}

/// Packing cursor: insertion point plus the tallest bitmap (margin included)
/// placed on the current row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shelf {
    pub x: u32,
    pub y: u32,
    pub height: u32,
}

/// Location of a reserved bitmap in atlas pixels (margin excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Glyph atlas over a [`TextureStorage`].
#[derive(Debug)]
pub struct GlyphAtlas<S> {
    storage: S,
    /// Side length in pixels; 0 until the first grow.
    size: u32,
    shelf: Shelf,
    /// Bumped on every grow so holders of placements can detect staleness.
    generation: u64,
}

impl<S: TextureStorage> GlyphAtlas<S> {
    /// Create an uninitialized atlas (size 0). The first `reserve` will ask
    /// for a grow.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            size: 0,
            shelf: Shelf::default(),
            generation: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn shelf(&self) -> Shelf {
        self.shelf
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Side length repeated grows can reach before the storage limit.
    /// Returns the current size when not even [`MIN_ATLAS_SIZE`] fits.
    pub fn largest_size(&self) -> u32 {
        let max = self.storage.max_size();
        let mut size = self.size.max(MIN_ATLAS_SIZE);
        if size > max {
            return self.size;
        }
        while let Some(next) = size.checked_mul(2).filter(|&n| n <= max) {
            size = next;
        }
        size
    }

    /// Whether a `width`x`height` bitmap fits into an empty atlas of
    /// [`largest_size`](Self::largest_size).
    pub fn can_ever_fit(&self, width: u32, height: u32) -> bool {
        let largest = self.largest_size();
        width.saturating_add(GLYPH_MARGIN) <= largest
            && height.saturating_add(GLYPH_MARGIN) <= largest
    }

    /// Find space for a `width`x`height` bitmap.
    ///
    /// Returns `None` when the atlas needs to grow. A miss may still have
    /// moved the cursor to a fresh shelf, which is harmless since growing
    /// resets it.
    pub fn reserve(&mut self, width: u32, height: u32) -> Option<Placement> {
        let w = width.checked_add(GLYPH_MARGIN)?;
        let h = height.checked_add(GLYPH_MARGIN)?;

        if self.shelf.x.saturating_add(w) > self.size {
            self.shelf.x = 0;
            self.shelf.y += self.shelf.height;
            self.shelf.height = 0;
        }

        if self.shelf.x.saturating_add(w) > self.size || self.shelf.y.saturating_add(h) > self.size {
            return None;
        }

        let placement = Placement {
            x: self.shelf.x,
            y: self.shelf.y,
            width,
            height,
        };
        self.shelf.x += w;
        self.shelf.height = self.shelf.height.max(h);
        Some(placement)
    }

    /// Double the side length (minimum [`MIN_ATLAS_SIZE`]), zero the backing
    /// store and reset the shelf.
    ///
    /// Returns the new side length. Fails with `AtlasExhausted` instead of
    /// growing past the storage limit, so repeated growth always terminates.
    pub fn grow(&mut self) -> Result<u32> {
        let max = self.storage.max_size();
        let next = self.size.saturating_mul(2).max(MIN_ATLAS_SIZE);
        if next > max || next == self.size {
            return Err(Error::AtlasExhausted {
                size: self.size,
                max,
            });
        }

        self.storage.clear(next)?;
        log::debug!("atlas: grew {}px -> {next}px", self.size);
        self.size = next;
        self.shelf = Shelf::default();
        self.generation += 1;
        Ok(next)
    }

    /// Write a coverage bitmap into a reserved placement.
    pub fn upload(&mut self, placement: Placement, bitmap: &[u8]) -> Result<()> {
        let right = placement.x.saturating_add(placement.width);
        let bottom = placement.y.saturating_add(placement.height);
        if right > self.size || bottom > self.size {
            return Err(Error::OutOfRange {
                x: right.saturating_sub(1),
                y: bottom.saturating_sub(1),
                width: self.size,
                height: self.size,
            });
        }
        self.storage
            .upload_region(placement.x, placement.y, placement.width, placement.height, bitmap)
    }
}
