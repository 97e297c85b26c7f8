//! Text layout: codepoints to positioned glyph quads.
//!
//! Left-to-right pen advance with pair kerning and hard line breaks. No
//! shaping, bidi or wrapping: output order is input order, one quad per
//! non-newline codepoint.

#[cfg(test)]
mod tests;

use crate::atlas::TextureStorage;
use crate::error::Result;
use crate::font::{FontEngine, GlyphCache, GlyphIndex, GlyphMetrics};

/// Codepoint that ends a line.
pub const LINE_BREAK: char = '\n';

/// A glyph quad already translated to its pen position (em units).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionedGlyph {
    pub metrics: GlyphMetrics,
}

/// Lay out `text` starting at the origin, baseline at `y = 0`, lines going
/// down (negative y).
///
/// If the atlas grows while glyphs are being resolved, the quads emitted so
/// far point into discarded pixels, so layout starts over from the first
/// codepoint. Each grow strictly enlarges the atlas until the storage limit,
/// where growing fails, so this terminates.
pub fn layout<E, S>(
    engine: &mut E,
    cache: &mut GlyphCache<S>,
    text: &[char],
) -> Result<Vec<PositionedGlyph>>
where
    E: FontEngine + ?Sized,
    S: TextureStorage,
{
    loop {
        if let Some(glyphs) = layout_pass(engine, cache, text)? {
            return Ok(glyphs);
        }
        log::debug!(
            "layout: atlas grew to {}px mid-layout, restarting {} codepoints",
            cache.atlas().size(),
            text.len()
        );
    }
}

/// One pass over `text`. Returns `None` if the atlas grew after the first
/// quad was emitted.
fn layout_pass<E, S>(
    engine: &mut E,
    cache: &mut GlyphCache<S>,
    text: &[char],
) -> Result<Option<Vec<PositionedGlyph>>>
where
    E: FontEngine + ?Sized,
    S: TextureStorage,
{
    let line_height = engine.line_metrics().height;
    let ppem = engine.pixel_size() as f32;

    let mut out = Vec::with_capacity(text.len());
    let mut pen = [0.0f32; 2];
    let mut previous: Option<GlyphIndex> = None;
    let mut generation = cache.generation();

    for &ch in text {
        if ch == LINE_BREAK {
            pen[0] = 0.0;
            pen[1] -= line_height;
            previous = None;
            continue;
        }

        let index = engine.glyph_index(ch);
        let info = cache.glyph(engine, index)?;
        if cache.generation() != generation {
            // The glyph just returned lives in the new atlas; only earlier
            // quads are stale.
            if !out.is_empty() {
                return Ok(None);
            }
            generation = cache.generation();
        }

        if let Some(prev) = previous {
            let kern = engine.kerning(prev, index);
            pen[0] += kern[0] / ppem;
            pen[1] += kern[1] / ppem;
        }

        out.push(PositionedGlyph {
            metrics: info.metrics.translate(pen),
        });
        pen[0] += info.advance[0];
        pen[1] += info.advance[1];
        previous = Some(index);
    }

    Ok(Some(out))
}
