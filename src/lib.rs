//! Glyph atlas and instanced text rendering on wgpu.
//!
//! Text flows through four layers: a [`font::FontEngine`] rasterizes glyphs,
//! the [`font::GlyphCache`] packs them into a shelf-packed
//! [`atlas::GlyphAtlas`], [`layout::layout`] turns codepoints into quads in
//! em units, and [`gpu::TextRenderer`] draws those quads as one instanced
//! draw call. [`text::Font`] ties the first three together.

pub mod atlas;
pub mod config;
pub mod error;
pub mod font;
pub mod gpu;
pub mod image;
pub mod layout;
pub mod text;

pub use error::{Error, Result};
pub use text::Font;
