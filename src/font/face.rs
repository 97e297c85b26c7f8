//! Font face backed by swash (rasterization) and ttf-parser (kerning).

use std::collections::HashMap;
use std::path::Path;

use rustybuzz::ttf_parser;
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;
use swash::{CacheKey, FontRef};

use super::{FaceId, FontEngine, GlyphIndex, LineMetrics, RasterizedGlyph};
use crate::error::{Error, Result};

/// A single face at a fixed pixel size.
///
/// Owns the raw font bytes; swash `FontRef`s are created transiently from
/// the stored offset and cache key.
pub struct SwashFace {
    data: Vec<u8>,
    /// Index within a .ttc collection (0 for single-font files).
    face_index: u32,
    /// Byte offset to the table directory (from `FontRef::from_index`).
    offset: u32,
    key: CacheKey,
    pixel_size: u32,
    scale_context: ScaleContext,
    /// Whether the face has a legacy `kern` table at all.
    has_kern: bool,
    /// Memoized pair kerning in whole pixels.
    kern_pairs: HashMap<(GlyphIndex, GlyphIndex), f32>,
}

impl std::fmt::Debug for SwashFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwashFace")
            .field("bytes", &self.data.len())
            .field("face_index", &self.face_index)
            .field("pixel_size", &self.pixel_size)
            .field("has_kern", &self.has_kern)
            .finish_non_exhaustive()
    }
}

impl SwashFace {
    /// Parse face `0` of `data` for rasterization at `pixel_size` pixels per em.
    pub fn new(data: Vec<u8>, pixel_size: u32) -> Result<Self> {
        Self::with_index(data, 0, pixel_size)
    }

    /// Parse face `face_index` of a font or font collection.
    pub fn with_index(data: Vec<u8>, face_index: u32, pixel_size: u32) -> Result<Self> {
        if pixel_size == 0 {
            return Err(Error::Font("pixel size must be positive".to_owned()));
        }
        let font = FontRef::from_index(&data, face_index as usize)
            .ok_or_else(|| Error::Font(format!("no face at index {face_index}")))?;
        if font.metrics(&[]).units_per_em == 0 {
            return Err(Error::Font("units per em is zero".to_owned()));
        }
        let (offset, key) = (font.offset, font.key);
        let has_kern = ttf_parser::Face::parse(&data, face_index)
            .is_ok_and(|face| face.tables().kern.is_some());
        log::debug!(
            "font: loaded face {face_index} ({} bytes) at {pixel_size}px, kern table: {has_kern}",
            data.len()
        );
        Ok(Self {
            data,
            face_index,
            offset,
            key,
            pixel_size,
            scale_context: ScaleContext::new(),
            has_kern,
            kern_pairs: HashMap::new(),
        })
    }

    /// Read and parse a font file.
    pub fn from_path(path: impl AsRef<Path>, pixel_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::Font(format!("failed to read {}: {e}", path.display())))?;
        Self::new(data, pixel_size)
    }

    fn font_ref(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    /// Kerning from the legacy `kern` table in font units.
    fn kern_units(&self, previous: GlyphIndex, current: GlyphIndex) -> Option<(i32, u16)> {
        let face = ttf_parser::Face::parse(&self.data, self.face_index).ok()?;
        let kern = face.tables().kern?;
        let units = kern
            .subtables
            .into_iter()
            .filter(|s| s.horizontal && !s.variable)
            .filter_map(|s| {
                s.glyphs_kerning(ttf_parser::GlyphId(previous.0), ttf_parser::GlyphId(current.0))
            })
            .map(i32::from)
            .sum();
        Some((units, face.units_per_em()))
    }
}

impl FontEngine for SwashFace {
    fn face_id(&self) -> FaceId {
        FaceId(self.key.value())
    }

    fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    fn glyph_index(&self, ch: char) -> GlyphIndex {
        GlyphIndex(self.font_ref().charmap().map(ch))
    }

    fn rasterize(&mut self, index: GlyphIndex) -> Result<RasterizedGlyph> {
        // Built from fields directly so `scale_context` can be borrowed mutably.
        let font = FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        };
        let size = self.pixel_size as f32;
        let advance = font.glyph_metrics(&[]).scale(size).advance_width(index.0);

        let mut scaler = self.scale_context.builder(font).size(size).hint(true).build();
        let image = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .render(&mut scaler, index.0);

        match image {
            Some(image) => Ok(RasterizedGlyph {
                width: image.placement.width,
                height: image.placement.height,
                left: image.placement.left,
                top: image.placement.top,
                advance: [advance, 0.0],
                data: image.data,
            }),
            // Whitespace has an outline with no contours.
            None if scaler
                .scale_outline(index.0)
                .is_some_and(|outline| outline.verbs().is_empty()) =>
            {
                Ok(RasterizedGlyph {
                    advance: [advance, 0.0],
                    ..RasterizedGlyph::default()
                })
            }
            None => Err(Error::Rasterize { glyph: index }),
        }
    }

    fn kerning(&mut self, previous: GlyphIndex, current: GlyphIndex) -> [f32; 2] {
        if !self.has_kern {
            return [0.0, 0.0];
        }
        if let Some(&px) = self.kern_pairs.get(&(previous, current)) {
            return [px, 0.0];
        }
        let px = match self.kern_units(previous, current) {
            // Rounded to whole pixels, like grid-fitted kerning.
            Some((units, upem)) if units != 0 && upem != 0 => {
                (units as f32 * self.pixel_size as f32 / f32::from(upem)).round()
            }
            _ => 0.0,
        };
        self.kern_pairs.insert((previous, current), px);
        [px, 0.0]
    }

    fn line_metrics(&self) -> LineMetrics {
        let m = self.font_ref().metrics(&[]);
        let upem = f32::from(m.units_per_em);
        LineMetrics {
            ascender: m.ascent / upem,
            descender: -m.descent / upem,
            height: (m.ascent + m.descent + m.leading) / upem,
        }
    }
}
