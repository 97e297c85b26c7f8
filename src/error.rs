//! Crate error type.

use thiserror::Error;

use crate::font::GlyphIndex;

/// Errors surfaced by the atlas, font engine, and GPU layers.
///
/// Everything here is fatal for the call that produced it. The only retry
/// in the crate is placing a glyph again after an atlas grow in
/// `GlyphCache::lookup_or_rasterize`.
#[derive(Debug, Error)]
pub enum Error {
    /// Face bytes could not be parsed.
    #[error("malformed font data: {0}")]
    Font(String),

    /// The font engine produced no bitmap for a glyph.
    #[error("failed to rasterize glyph {glyph:?}")]
    Rasterize { glyph: GlyphIndex },

    /// Growing would exceed the largest texture the backing store supports.
    #[error("glyph atlas exhausted: cannot grow past {size}px (limit {max}px)")]
    AtlasExhausted { size: u32, max: u32 },

    /// A single glyph does not fit even in the largest empty atlas the
    /// storage allows.
    #[error("glyph bitmap {width}x{height} does not fit in a {atlas}px atlas")]
    GlyphTooLarge { width: u32, height: u32, atlas: u32 },

    /// Pixel access outside image bounds.
    #[error("pixel ({x}, {y}) outside {width}x{height} image")]
    OutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Upload data length does not match the region it targets.
    #[error("region {width}x{height} needs {expected} bytes, got {actual}")]
    RegionSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Non-ASCII input to an ASCII-only entry point.
    #[error("string must be ASCII, found {ch:?}")]
    NotAscii { ch: char },

    /// Config file could not be read, parsed, or written.
    #[error("config: {0}")]
    Config(String),

    /// Adapter, device, or surface acquisition failed.
    #[error("gpu: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, Error>;
