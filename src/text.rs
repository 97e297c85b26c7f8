//! `Font`: a font engine paired with its glyph cache.
//!
//! Entry point for callers: turn text into positioned glyph quads
//! ([`Font::prepare`]) and, with a GPU-backed atlas, draw them
//! ([`Font::render`]).

use crate::atlas::TextureStorage;
use crate::error::{Error, Result};
use crate::font::{FontEngine, GlyphCache, LineMetrics};
use crate::gpu::{GpuContext, GpuTexture, TextPipeline, TextRenderer};
use crate::layout::{self, PositionedGlyph};

/// One face at one pixel size with its atlas.
#[derive(Debug)]
pub struct Font<E, S> {
    engine: E,
    cache: GlyphCache<S>,
}

impl<E: FontEngine, S: TextureStorage> Font<E, S> {
    pub fn new(engine: E, storage: S) -> Self {
        Self {
            engine,
            cache: GlyphCache::new(storage),
        }
    }

    /// Decode an ASCII string into codepoints, rejecting anything else.
    pub fn from_ascii(text: &str) -> Result<Vec<char>> {
        text.chars()
            .map(|ch| {
                if ch.is_ascii() {
                    Ok(ch)
                } else {
                    Err(Error::NotAscii { ch })
                }
            })
            .collect()
    }

    /// Ascender, descender and line height in em units.
    pub fn line_metrics(&self) -> LineMetrics {
        self.engine.line_metrics()
    }

    /// Lay out `text`, rasterizing any glyph not cached yet.
    pub fn prepare(&mut self, text: &[char]) -> Result<Vec<PositionedGlyph>> {
        layout::layout(&mut self.engine, &mut self.cache, text)
    }

    pub fn prepare_str(&mut self, text: &str) -> Result<Vec<PositionedGlyph>> {
        let chars: Vec<char> = text.chars().collect();
        self.prepare(&chars)
    }

    pub fn prepare_ascii(&mut self, text: &str) -> Result<Vec<PositionedGlyph>> {
        let chars = Self::from_ascii(text)?;
        self.prepare(&chars)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn cache(&self) -> &GlyphCache<S> {
        &self.cache
    }
}

impl<E: FontEngine> Font<E, GpuTexture> {
    /// Lay out `text` and record its instanced draw. Returns the number of
    /// glyphs drawn.
    pub fn render(
        &mut self,
        ctx: &GpuContext,
        pipeline: &TextPipeline,
        renderer: &mut TextRenderer,
        text: &[char],
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<u32> {
        let glyphs = self.prepare(text)?;
        renderer.render(ctx, pipeline, self.atlas_texture(), &glyphs, pass)
    }

    pub fn render_ascii(
        &mut self,
        ctx: &GpuContext,
        pipeline: &TextPipeline,
        renderer: &mut TextRenderer,
        text: &str,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<u32> {
        let chars = Self::from_ascii(text)?;
        self.render(ctx, pipeline, renderer, &chars, pass)
    }

    pub fn atlas_texture(&self) -> &GpuTexture {
        self.cache.atlas().storage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testing::FakeEngine;
    use crate::image::CoverageImage;

    fn font() -> Font<FakeEngine, CoverageImage> {
        let engine = FakeEngine::new(32)
            .glyph('H', 12, 20, 18.0)
            .glyph('i', 4, 20, 8.0);
        Font::new(engine, CoverageImage::default())
    }

    #[test]
    fn from_ascii_accepts_ascii() {
        let chars = Font::<FakeEngine, CoverageImage>::from_ascii("Hi\n!").unwrap();
        assert_eq!(chars, vec!['H', 'i', '\n', '!']);
    }

    #[test]
    fn from_ascii_rejects_first_non_ascii() {
        let err = Font::<FakeEngine, CoverageImage>::from_ascii("naïve ü").unwrap_err();
        assert!(matches!(err, Error::NotAscii { ch: 'ï' }));
    }

    #[test]
    fn prepare_ascii_lays_out_lines() {
        let mut font = font();
        let glyphs = font.prepare_ascii("Hi\nHi").unwrap();
        assert_eq!(glyphs.len(), 4);
        assert!(glyphs[2].metrics.p0[1] < glyphs[0].metrics.p0[1]);
        assert_eq!(font.cache().len(), 2);
    }

    #[test]
    fn prepare_ascii_fails_before_touching_the_cache() {
        let mut font = font();
        assert!(font.prepare_ascii("Hé").is_err());
        assert!(font.cache().is_empty());
        assert_eq!(font.engine().rasterize_calls, 0);
    }

    #[test]
    fn prepare_str_takes_any_codepoint() {
        let mut font = font();
        let glyphs = font.prepare_str("Hé").unwrap();
        assert_eq!(glyphs.len(), 2);
    }

    #[test]
    fn line_metrics_come_from_the_engine() {
        let m = font().line_metrics();
        assert!((m.height - (m.ascender - m.descender)).abs() < 1e-6);
    }
}
