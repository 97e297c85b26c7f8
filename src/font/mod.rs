//! Font engine capability, swash-backed faces, and the glyph cache.
//!
//! The cache and layout code only talk to fonts through [`FontEngine`]:
//! codepoint to glyph mapping, rasterization to 8-bit coverage, kerning and
//! line metrics. [`SwashFace`] is the production implementation.

mod cache;
mod discovery;
mod face;
#[cfg(test)]
pub(crate) mod testing;

pub use cache::{GlyphCache, GlyphKey};
pub use discovery::find_system_font;
pub use face::SwashFace;

use crate::error::Result;

/// Glyph ID within one face (not a Unicode codepoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlyphIndex(pub u16);

/// Identifies a loaded face for cache keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u64);

/// Atlas and quad rectangles for one glyph.
///
/// `t0`/`t1` are normalized atlas coordinates with v already flipped, so `t0`
/// pairs with the quad's bottom-left corner `p0`. `p0`/`p1` are in em units
/// relative to the pen position on the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    pub t0: [f32; 2],
    pub t1: [f32; 2],
    pub p0: [f32; 2],
    pub p1: [f32; 2],
}

impl GlyphMetrics {
    /// Shift the quad rectangle by `offset` em; atlas coordinates are untouched.
    #[must_use]
    pub fn translate(self, offset: [f32; 2]) -> Self {
        Self {
            p0: [self.p0[0] + offset[0], self.p0[1] + offset[1]],
            p1: [self.p1[0] + offset[0], self.p1[1] + offset[1]],
            ..self
        }
    }
}

/// Cached per-glyph data. Everything is in em units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphInfo {
    pub metrics: GlyphMetrics,
    /// Pen displacement after drawing this glyph.
    pub advance: [f32; 2],
}

/// Vertical face metrics in em units (descender is negative).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineMetrics {
    pub ascender: f32,
    pub descender: f32,
    /// Baseline-to-baseline distance.
    pub height: f32,
}

/// A glyph rasterized at the engine's pixel size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterizedGlyph {
    pub width: u32,
    pub height: u32,
    /// X bearing (positive = right of origin).
    pub left: i32,
    /// Y bearing (positive = above baseline).
    pub top: i32,
    /// Pen advance in pixels.
    pub advance: [f32; 2],
    /// Row-major coverage, one byte per pixel, not premultiplied.
    pub data: Vec<u8>,
}

/// What the glyph cache and layout need from a font engine.
///
/// Pixel quantities (bitmaps, bearings, advances, kerning) are in device
/// pixels at [`pixel_size`](Self::pixel_size). Line metrics are in em units.
pub trait FontEngine {
    fn face_id(&self) -> FaceId;

    /// Pixels per em the engine rasterizes at.
    fn pixel_size(&self) -> u32;

    /// Map a codepoint to a glyph. Unmapped codepoints return the face's
    /// missing-glyph index, which is rasterized like any other glyph.
    fn glyph_index(&self, ch: char) -> GlyphIndex;

    fn rasterize(&mut self, index: GlyphIndex) -> Result<RasterizedGlyph>;

    /// Pen adjustment between two consecutive glyphs; zero without a kern
    /// table. Takes `&mut self` so engines can memoize pair lookups.
    fn kerning(&mut self, previous: GlyphIndex, current: GlyphIndex) -> [f32; 2];

    fn line_metrics(&self) -> LineMetrics;
}
