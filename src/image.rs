//! CPU-side single-channel coverage image.
//!
//! Every access is bounds-checked and reports `Error::OutOfRange` instead of
//! clamping. `CoverageImage` also implements [`TextureStorage`], so a glyph
//! atlas can be backed by plain memory for headless use and for tests.

use crate::atlas::TextureStorage;
use crate::error::{Error, Result};

/// Row-major 8-bit coverage image (0 = empty, 255 = fully covered).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl CoverageImage {
    /// Create a zero-filled image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap existing row-major pixel data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::RegionSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Result<u8> {
        Ok(self.pixels[self.offset(x, y)?])
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) -> Result<()> {
        let i = self.offset(x, y)?;
        self.pixels[i] = value;
        Ok(())
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// The whole destination rectangle is validated before any pixel is
    /// written, so a failed blit leaves the image untouched.
    pub fn blit(&mut self, x: u32, y: u32, src: &Self) -> Result<()> {
        if src.width == 0 || src.height == 0 {
            return Ok(());
        }
        // Checks both opposite corners; everything in between is then in range.
        self.offset(x, y)?;
        let last_x = x.saturating_add(src.width - 1);
        let last_y = y.saturating_add(src.height - 1);
        self.offset(last_x, last_y)?;

        let w = src.width as usize;
        for row in 0..src.height {
            let dst = self.offset(x, y + row)?;
            let s = row as usize * w;
            self.pixels[dst..dst + w].copy_from_slice(&src.pixels[s..s + w]);
        }
        Ok(())
    }
}

impl TextureStorage for CoverageImage {
    fn max_size(&self) -> u32 {
        // Keeps a fully grown square image addressable in memory.
        16384
    }

    fn clear(&mut self, size: u32) -> Result<()> {
        *self = Self::new(size, size);
        Ok(())
    }

    fn upload_region(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> Result<()> {
        let region = Self::from_pixels(width, height, bytes.to_vec())?;
        self.blit(x, y, &region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_zeroed() {
        let img = CoverageImage::new(4, 3);
        assert_eq!(img.pixels().len(), 12);
        assert!(img.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn get_set_in_bounds() {
        let mut img = CoverageImage::new(4, 4);
        img.set(3, 2, 200).expect("in bounds");
        assert_eq!(img.get(3, 2).expect("in bounds"), 200);
        assert_eq!(img.pixels()[2 * 4 + 3], 200);
    }

    #[test]
    fn access_out_of_range_errors() {
        let mut img = CoverageImage::new(4, 4);
        assert!(matches!(img.get(4, 0), Err(Error::OutOfRange { x: 4, .. })));
        assert!(matches!(img.set(0, 4, 1), Err(Error::OutOfRange { y: 4, .. })));
    }

    #[test]
    fn from_pixels_rejects_wrong_length() {
        let err = CoverageImage::from_pixels(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, Error::RegionSize { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn blit_copies_rows() {
        let mut img = CoverageImage::new(5, 5);
        let src = CoverageImage::from_pixels(2, 2, vec![1, 2, 3, 4]).expect("valid");
        img.blit(3, 1, &src).expect("fits");
        assert_eq!(img.get(3, 1).unwrap(), 1);
        assert_eq!(img.get(4, 1).unwrap(), 2);
        assert_eq!(img.get(3, 2).unwrap(), 3);
        assert_eq!(img.get(4, 2).unwrap(), 4);
        assert_eq!(img.get(2, 1).unwrap(), 0);
    }

    #[test]
    fn blit_past_edge_leaves_image_untouched() {
        let mut img = CoverageImage::new(4, 4);
        let src = CoverageImage::from_pixels(2, 2, vec![9; 4]).expect("valid");
        assert!(img.blit(3, 0, &src).is_err());
        assert!(img.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn clear_resizes_square() {
        let mut img = CoverageImage::new(2, 2);
        img.set(0, 0, 7).unwrap();
        img.clear(8).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
        assert!(img.pixels().iter().all(|&p| p == 0));
    }
}
