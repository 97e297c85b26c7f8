//! Shelf packing and growth tests.

use super::*;
use crate::image::CoverageImage;

fn atlas_of(size: u32) -> GlyphAtlas<CoverageImage> {
    let mut atlas = GlyphAtlas::new(CoverageImage::default());
    while atlas.size() < size {
        atlas.grow().expect("grow");
    }
    atlas
}

/// Bounding box including the right/bottom margin.
fn padded(p: Placement) -> (u32, u32, u32, u32) {
    (p.x, p.y, p.width + GLYPH_MARGIN, p.height + GLYPH_MARGIN)
}

#[test]
fn uninitialized_atlas_needs_grow() {
    let mut atlas = GlyphAtlas::new(CoverageImage::default());
    assert_eq!(atlas.size(), 0);
    assert!(atlas.reserve(10, 10).is_none());
    assert_eq!(atlas.grow().expect("grow"), MIN_ATLAS_SIZE);
    let p = atlas.reserve(10, 10).expect("fits after grow");
    assert_eq!((p.x, p.y, p.width, p.height), (0, 0, 10, 10));
}

#[test]
fn grow_doubles_with_minimum() {
    let mut atlas = GlyphAtlas::new(CoverageImage::default());
    assert_eq!(atlas.grow().unwrap(), 256);
    assert_eq!(atlas.grow().unwrap(), 512);
    assert_eq!(atlas.grow().unwrap(), 1024);
    assert_eq!(atlas.storage().width(), 1024);
    assert_eq!(atlas.generation(), 3);
}

#[test]
fn grow_resets_shelf_and_pixels() {
    let mut atlas = atlas_of(256);
    let p = atlas.reserve(4, 4).unwrap();
    atlas.upload(p, &[255; 16]).unwrap();
    assert_ne!(atlas.shelf(), Shelf::default());

    atlas.grow().unwrap();
    assert_eq!(atlas.shelf(), Shelf::default());
    assert!(atlas.storage().pixels().iter().all(|&v| v == 0));
}

/// CPU storage capped at 512px.
struct SmallStorage(CoverageImage);

impl TextureStorage for SmallStorage {
    fn max_size(&self) -> u32 {
        512
    }

    fn clear(&mut self, size: u32) -> Result<()> {
        self.0.clear(size)
    }

    fn upload_region(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> Result<()> {
        self.0.upload_region(x, y, width, height, bytes)
    }
}

#[test]
fn grow_past_storage_limit_fails() {
    let mut atlas = GlyphAtlas::new(SmallStorage(CoverageImage::default()));
    atlas.grow().unwrap();
    atlas.grow().unwrap();
    let err = atlas.grow().unwrap_err();
    assert!(matches!(err, Error::AtlasExhausted { size: 512, max: 512 }));
    // Failed grow leaves the atlas usable.
    assert_eq!(atlas.size(), 512);
    assert_eq!(atlas.generation(), 2);
    assert!(atlas.reserve(8, 8).is_some());
}

#[test]
fn placements_advance_with_margin() {
    let mut atlas = atlas_of(256);
    let a = atlas.reserve(10, 12).unwrap();
    let b = atlas.reserve(5, 3).unwrap();
    assert_eq!((a.x, a.y), (0, 0));
    assert_eq!((b.x, b.y), (11, 0));
    assert_eq!(atlas.shelf().height, 13);
}

#[test]
fn new_shelf_starts_below_tallest_glyph() {
    let mut atlas = atlas_of(256);
    // 101 + 155 fills the first row exactly.
    let a = atlas.reserve(100, 20).unwrap();
    let b = atlas.reserve(154, 8).unwrap();
    assert_eq!(b.x, 101);
    let c = atlas.reserve(10, 10).unwrap();
    assert_eq!((c.x, c.y), (0, 21));
    assert_eq!(a.y, 0);
}

#[test]
fn full_atlas_asks_for_grow() {
    let mut atlas = atlas_of(256);
    let mut count = 0;
    while atlas.reserve(63, 63).is_some() {
        count += 1;
        assert!(count <= 16, "packed too many");
    }
    // 64px slots (63 + margin): 4 per row, 4 rows.
    assert_eq!(count, 16);
}

#[test]
fn placements_never_overlap() {
    let mut atlas = atlas_of(MIN_ATLAS_SIZE);
    let sizes = [(7, 12), (13, 5), (1, 1), (30, 17), (9, 9), (22, 31), (3, 14), (16, 16)];
    let mut placed = Vec::new();
    for i in 0..200 {
        let (w, h) = sizes[i % sizes.len()];
        match atlas.reserve(w, h) {
            Some(p) => placed.push(padded(p)),
            None => break,
        }
    }
    assert!(placed.len() > 50);

    for (i, a) in placed.iter().enumerate() {
        assert!(a.0 + a.2 <= atlas.size() && a.1 + a.3 <= atlas.size());
        for b in &placed[i + 1..] {
            let overlap_x = a.0 < b.0 + b.2 && b.0 < a.0 + a.2;
            let overlap_y = a.1 < b.1 + b.3 && b.1 < a.1 + a.3;
            assert!(!(overlap_x && overlap_y), "overlap: {a:?} vs {b:?}");
        }
    }
}

#[test]
fn largest_size_follows_doubling_up_to_limit() {
    let mut atlas = GlyphAtlas::new(SmallStorage(CoverageImage::default()));
    assert_eq!(atlas.largest_size(), 512);
    atlas.grow().unwrap();
    assert_eq!(atlas.largest_size(), 512);

    let cpu = GlyphAtlas::new(CoverageImage::default());
    assert_eq!(cpu.largest_size(), 16384);
}

#[test]
fn can_ever_fit_counts_the_margin() {
    let atlas = GlyphAtlas::new(SmallStorage(CoverageImage::default()));
    assert!(atlas.can_ever_fit(511, 511));
    assert!(!atlas.can_ever_fit(512, 1));
    assert!(!atlas.can_ever_fit(1, 512));
}

#[test]
fn glyph_wider_than_atlas_never_fits() {
    let mut atlas = atlas_of(256);
    assert!(atlas.reserve(256, 1).is_none());
    assert!(atlas.reserve(255, 1).is_some());
}

#[test]
fn upload_writes_bitmap_in_place() {
    let mut atlas = atlas_of(256);
    atlas.reserve(3, 3).unwrap();
    let p = atlas.reserve(2, 2).unwrap();
    atlas.upload(p, &[10, 20, 30, 40]).unwrap();
    let img = atlas.storage();
    assert_eq!(img.get(4, 0).unwrap(), 10);
    assert_eq!(img.get(5, 0).unwrap(), 20);
    assert_eq!(img.get(4, 1).unwrap(), 30);
    assert_eq!(img.get(5, 1).unwrap(), 40);
}

#[test]
fn upload_outside_atlas_is_out_of_range() {
    let mut atlas = atlas_of(256);
    let p = Placement {
        x: 250,
        y: 0,
        width: 10,
        height: 1,
    };
    assert!(matches!(atlas.upload(p, &[0; 10]), Err(Error::OutOfRange { .. })));
}
