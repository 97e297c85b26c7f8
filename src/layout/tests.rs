use super::*;
use crate::error::Error;
use crate::font::GlyphKey;
use crate::font::testing::FakeEngine;
use crate::image::CoverageImage;

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn cache() -> GlyphCache<CoverageImage> {
    GlyphCache::new(CoverageImage::default())
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn letters(px: u32) -> FakeEngine {
    FakeEngine::new(px)
        .glyph('a', 10, 12, 16.0)
        .glyph('b', 10, 16, 16.0)
        .glyph('c', 8, 8, 12.0)
        .glyph('d', 10, 16, 16.0)
}

#[test]
fn one_quad_per_codepoint() {
    let mut engine = letters(32);
    let mut cache = cache();
    let text = chars("abcdzz");

    let glyphs = layout(&mut engine, &mut cache, &text).unwrap();

    assert_eq!(glyphs.len(), text.len());
}

#[test]
fn empty_text_lays_out_nothing() {
    let mut engine = letters(32);
    let mut cache = cache();

    assert!(layout(&mut engine, &mut cache, &[]).unwrap().is_empty());
    assert_eq!(engine.rasterize_calls, 0);
}

#[test]
fn pen_advances_left_to_right() {
    let mut engine = letters(32);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("abc")).unwrap();

    assert!(close(glyphs[0].metrics.p0[0], 0.0));
    assert!(close(glyphs[1].metrics.p0[0], 0.5));
    assert!(close(glyphs[2].metrics.p0[0], 1.0));
}

#[test]
fn line_break_emits_nothing_and_returns_pen() {
    let mut engine = letters(32);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("ab\ncd")).unwrap();

    assert_eq!(glyphs.len(), 4);
    let (a, c) = (glyphs[0].metrics, glyphs[2].metrics);
    assert!(close(c.p0[0], 0.0));
    // Both sit on their baseline; the second line is one line height down.
    assert!(close(a.p0[1], 0.0));
    assert!(close(c.p0[1], -1.0));
}

#[test]
fn consecutive_line_breaks_stack() {
    let mut engine = letters(32);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("\n\na")).unwrap();

    assert_eq!(glyphs.len(), 1);
    assert!(close(glyphs[0].metrics.p0[1], -2.0));
}

#[test]
fn kerning_pair_shifts_second_glyph() {
    let mut engine = FakeEngine::new(64)
        .glyph('A', 40, 44, 40.0)
        .glyph('V', 40, 44, 38.0)
        .kern('A', 'V', [-2.0, 0.0]);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("AV")).unwrap();

    assert_eq!(glyphs.len(), 2);
    assert!(close(glyphs[1].metrics.p0[0], 40.0 / 64.0 - 2.0 / 64.0));
}

#[test]
fn kerning_is_not_applied_across_line_break() {
    let mut engine = FakeEngine::new(64)
        .glyph('A', 40, 44, 40.0)
        .glyph('V', 40, 44, 38.0)
        .kern('A', 'V', [-2.0, 0.0]);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("A\nV")).unwrap();

    assert!(close(glyphs[1].metrics.p0[0], 0.0));
}

#[test]
fn kerning_only_for_the_defined_pair() {
    let mut engine = FakeEngine::new(64)
        .glyph('A', 40, 44, 40.0)
        .glyph('V', 40, 44, 38.0)
        .kern('A', 'V', [-2.0, 0.0]);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("VA")).unwrap();

    assert!(close(glyphs[1].metrics.p0[0], 38.0 / 64.0));
}

#[test]
fn bearings_offset_the_quad() {
    let mut engine = FakeEngine::new(32)
        .glyph('a', 10, 10, 16.0)
        .glyph_at('j', 6, 20, -2, 12, 8.0);
    let mut cache = cache();

    let glyphs = layout(&mut engine, &mut cache, &chars("aj")).unwrap();
    let j = glyphs[1].metrics;

    assert!(close(j.p0[0], 0.5 - 2.0 / 32.0));
    assert!(close(j.p0[1], -8.0 / 32.0));
    assert!(close(j.p1[0], 0.5 + 4.0 / 32.0));
    assert!(close(j.p1[1], 12.0 / 32.0));
}

#[test]
fn repeated_glyphs_rasterize_once() {
    let mut engine = letters(32);
    let mut cache = cache();

    layout(&mut engine, &mut cache, &chars("aaaa\naaaa")).unwrap();

    assert_eq!(engine.rasterize_calls, 1);
    assert_eq!(cache.hits(), 7);
}

#[test]
fn grow_mid_layout_restarts_from_first_codepoint() {
    // Four 100px glyphs fill a 256px atlas; the fifth forces a grow.
    let mut engine = FakeEngine::new(64)
        .glyph('a', 100, 100, 100.0)
        .glyph('b', 100, 100, 100.0)
        .glyph('c', 100, 100, 100.0)
        .glyph('d', 100, 100, 100.0)
        .glyph('e', 100, 100, 100.0);
    let mut cache = cache();
    let text = chars("abcde");

    let glyphs = layout(&mut engine, &mut cache, &text).unwrap();

    assert_eq!(cache.atlas().size(), 512);
    assert_eq!(cache.len(), 5);
    assert_eq!(glyphs.len(), 5);
    // Every quad samples the live atlas, not the discarded one.
    for (glyph, &ch) in glyphs.iter().zip(&text) {
        let key = GlyphKey::new(&engine, engine.glyph_index(ch));
        let cached = cache.get(&key).unwrap().metrics;
        assert_eq!(glyph.metrics.t0, cached.t0);
        assert_eq!(glyph.metrics.t1, cached.t1);
    }
}

#[test]
fn font_error_aborts_layout() {
    let mut engine = letters(32).broken('c');
    let mut cache = cache();

    let err = layout(&mut engine, &mut cache, &chars("abc")).unwrap_err();

    assert!(matches!(err, Error::Rasterize { .. }));
}
