//! Glyph cache: lazily rasterized glyphs packed into a shared atlas.


use std::collections::HashMap;

use super::{FaceId, FontEngine, GlyphIndex, GlyphInfo, GlyphMetrics, RasterizedGlyph};
use crate::atlas::{GlyphAtlas, Placement, TextureStorage};
use crate::error::{Error, Result};

/// Cache key: face + pixel size + glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub face: FaceId,
    pub pixel_size: u32,
    pub index: GlyphIndex,
}

impl GlyphKey {
    pub fn new<E: FontEngine + ?Sized>(engine: &E, index: GlyphIndex) -> Self {
        Self {
            face: engine.face_id(),
            pixel_size: engine.pixel_size(),
            index,
        }
    }
}

/// Maps glyphs to their atlas rectangles and em-unit metrics.
///
/// Entries are never evicted one by one. Growing the atlas invalidates every
/// atlas coordinate, so it clears the whole map.
#[derive(Debug)]
pub struct GlyphCache<S> {
    atlas: GlyphAtlas<S>,
    glyphs: HashMap<GlyphKey, GlyphInfo>,
    hits: u64,
    misses: u64,
}

impl<S: TextureStorage> GlyphCache<S> {
    /// Create an empty cache over an uninitialized atlas.
    pub fn new(storage: S) -> Self {
        Self {
            atlas: GlyphAtlas::new(storage),
            glyphs: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn atlas(&self) -> &GlyphAtlas<S> {
        &self.atlas
    }

    /// Bumped whenever the atlas grows; quads built under an older
    /// generation point at discarded pixels.
    pub fn generation(&self) -> u64 {
        self.atlas.generation()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, key: &GlyphKey) -> Option<&GlyphInfo> {
        self.glyphs.get(key)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Resolve `ch` through the engine's charmap, then [`glyph`](Self::glyph).
    pub fn lookup_or_rasterize<E: FontEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        ch: char,
    ) -> Result<GlyphInfo> {
        let index = engine.glyph_index(ch);
        self.glyph(engine, index)
    }

    /// Return the cached glyph, rasterizing and packing it on a miss.
    ///
    /// A miss that finds the atlas full grows it (clearing the cache) and
    /// retries the placement. A glyph too big for the largest atlas the
    /// storage allows is `GlyphTooLarge`.
    pub fn glyph<E: FontEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        index: GlyphIndex,
    ) -> Result<GlyphInfo> {
        let key = GlyphKey::new(engine, index);
        if let Some(info) = self.glyphs.get(&key) {
            self.hits += 1;
            return Ok(*info);
        }
        self.misses += 1;

        let raster = engine.rasterize(index)?;
        let placement = self.place(&raster)?;
        let info = glyph_info(&raster, placement, self.atlas.size(), engine.pixel_size());
        self.glyphs.insert(key, info);
        Ok(info)
    }

    /// Grow the atlas and drop every cached glyph.
    pub fn grow(&mut self) -> Result<u32> {
        let size = self.atlas.grow()?;
        log::debug!("glyph cache: cleared {} glyphs on atlas grow", self.glyphs.len());
        self.glyphs.clear();
        Ok(size)
    }

    /// Reserve and upload a bitmap, growing until it fits.
    ///
    /// Placement is retried once per grow. Every grow strictly enlarges the
    /// atlas and fails with `AtlasExhausted` at the storage limit, so this
    /// terminates. A bitmap that cannot fit even the largest empty atlas is
    /// rejected up front.
    fn place(&mut self, raster: &RasterizedGlyph) -> Result<Option<Placement>> {
        if raster.width == 0 || raster.height == 0 {
            return Ok(None);
        }
        if !self.atlas.can_ever_fit(raster.width, raster.height) {
            return Err(Error::GlyphTooLarge {
                width: raster.width,
                height: raster.height,
                atlas: self.atlas.largest_size(),
            });
        }

        loop {
            if let Some(placement) = self.atlas.reserve(raster.width, raster.height) {
                self.atlas.upload(placement, &raster.data)?;
                return Ok(Some(placement));
            }
            self.grow()?;
        }
    }
}

/// Convert device-pixel raster data into em-unit metrics.
fn glyph_info(
    raster: &RasterizedGlyph,
    placement: Option<Placement>,
    atlas_size: u32,
    pixel_size: u32,
) -> GlyphInfo {
    let ppem = pixel_size as f32;
    let (w, h) = (raster.width as f32, raster.height as f32);

    let (t0, t1) = match placement {
        Some(p) => {
            let s = atlas_size as f32;
            let (x0, y0) = (p.x as f32 / s, p.y as f32 / s);
            let (x1, y1) = (x0 + w / s, y0 + h / s);
            // Bitmap row 0 is the glyph's top; p0 is its bottom-left corner.
            ([x0, y1], [x1, y0])
        }
        None => ([0.0; 2], [0.0; 2]),
    };

    let p0 = [
        raster.left as f32 / ppem,
        (raster.top - raster.height as i32) as f32 / ppem,
    ];
    let p1 = [p0[0] + w / ppem, p0[1] + h / ppem];

    GlyphInfo {
        metrics: GlyphMetrics { t0, t1, p0, p1 },
        advance: [raster.advance[0] / ppem, raster.advance[1] / ppem],
    }
}
