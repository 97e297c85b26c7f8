//! Scripted font engine for cache, layout, and text tests.

use std::collections::HashMap;

use super::{FaceId, FontEngine, GlyphIndex, LineMetrics, RasterizedGlyph};
use crate::error::{Error, Result};

/// Glyph 0 is the missing glyph: a 6x8 box advancing 8px.
pub(crate) const NOTDEF: GlyphIndex = GlyphIndex(0);

pub(crate) struct FakeEngine {
    pixel_size: u32,
    face: FaceId,
    charmap: HashMap<char, GlyphIndex>,
    glyphs: HashMap<GlyphIndex, RasterizedGlyph>,
    kerning: HashMap<(GlyphIndex, GlyphIndex), [f32; 2]>,
    line: LineMetrics,
    /// Glyphs whose rasterization fails.
    broken: Vec<GlyphIndex>,
    pub(crate) rasterize_calls: usize,
}

impl FakeEngine {
    pub(crate) fn new(pixel_size: u32) -> Self {
        let mut glyphs = HashMap::new();
        glyphs.insert(NOTDEF, bitmap(6, 8, 1, 8, 8.0));
        Self {
            pixel_size,
            face: FaceId(1),
            charmap: HashMap::new(),
            glyphs,
            kerning: HashMap::new(),
            line: LineMetrics {
                ascender: 0.75,
                descender: -0.25,
                height: 1.0,
            },
            broken: Vec::new(),
            rasterize_calls: 0,
        }
    }

    pub(crate) fn with_face(mut self, face: u64) -> Self {
        self.face = FaceId(face);
        self
    }

    /// Map `ch` to the next glyph index with a `width`x`height` bitmap sitting
    /// on the baseline (top bearing = height, left bearing 0).
    pub(crate) fn glyph(mut self, ch: char, width: u32, height: u32, advance: f32) -> Self {
        let index = GlyphIndex(self.glyphs.len() as u16);
        self.charmap.insert(ch, index);
        self.glyphs
            .insert(index, bitmap(width, height, 0, height as i32, advance));
        self
    }

    /// Like [`glyph`](Self::glyph) with explicit bearings.
    pub(crate) fn glyph_at(mut self, ch: char, width: u32, height: u32, left: i32, top: i32, advance: f32) -> Self {
        let index = GlyphIndex(self.glyphs.len() as u16);
        self.charmap.insert(ch, index);
        self.glyphs.insert(index, bitmap(width, height, left, top, advance));
        self
    }

    pub(crate) fn kern(mut self, left: char, right: char, px: [f32; 2]) -> Self {
        let (l, r) = (self.glyph_index(left), self.glyph_index(right));
        self.kerning.insert((l, r), px);
        self
    }

    pub(crate) fn broken(mut self, ch: char) -> Self {
        let index = self.glyph_index(ch);
        self.broken.push(index);
        self
    }
}

fn bitmap(width: u32, height: u32, left: i32, top: i32, advance: f32) -> RasterizedGlyph {
    RasterizedGlyph {
        width,
        height,
        left,
        top,
        advance: [advance, 0.0],
        data: vec![255; width as usize * height as usize],
    }
}

impl FontEngine for FakeEngine {
    fn face_id(&self) -> FaceId {
        self.face
    }

    fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    fn glyph_index(&self, ch: char) -> GlyphIndex {
        self.charmap.get(&ch).copied().unwrap_or(NOTDEF)
    }

    fn rasterize(&mut self, index: GlyphIndex) -> Result<RasterizedGlyph> {
        self.rasterize_calls += 1;
        if self.broken.contains(&index) {
            return Err(Error::Rasterize { glyph: index });
        }
        self.glyphs
            .get(&index)
            .cloned()
            .ok_or(Error::Rasterize { glyph: index })
    }

    fn kerning(&mut self, previous: GlyphIndex, current: GlyphIndex) -> [f32; 2] {
        self.kerning
            .get(&(previous, current))
            .copied()
            .unwrap_or([0.0, 0.0])
    }

    fn line_metrics(&self) -> LineMetrics {
        self.line
    }
}
