//! Per-instance quad arrays and their transient GPU buffers.

use super::context::GpuContext;
use super::handle::GpuHandle;
use crate::font::GlyphMetrics;

/// Bytes per instance in each array: one `vec4<f32>`.
pub const QUAD_STRIDE: u64 = 16;

/// Write `data` into the buffer held by `slot`, reallocating only when it
/// is too small. The replaced buffer is released through its handle.
pub(super) fn reuse_or_create_buffer(
    ctx: &GpuContext,
    slot: &mut GpuHandle<wgpu::Buffer>,
    data: &[u8],
    label: &str,
) {
    let needed = (data.len() as u64).max(QUAD_STRIDE);
    if let Some(buf) = slot.get() {
        if buf.size() >= needed {
            if !data.is_empty() {
                ctx.queue.write_buffer(buf, 0, data);
            }
            return;
        }
    }
    let buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: needed,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if !data.is_empty() {
        ctx.queue.write_buffer(&buf, 0, data);
    }
    *slot = GpuHandle::new(buf, ctx.epoch());
}

/// Two index-aligned byte arrays: atlas rects (`t0t1`) and quad rects
/// (`p0p1`), one `vec4<f32>` per glyph in each.
#[derive(Debug, Default)]
pub(super) struct QuadWriter {
    t0t1: Vec<u8>,
    p0p1: Vec<u8>,
}

impl QuadWriter {
    /// Empty the arrays, keeping their allocations.
    pub(super) fn clear(&mut self) {
        self.t0t1.clear();
        self.p0p1.clear();
    }

    pub(super) fn push(&mut self, m: &GlyphMetrics) {
        push_vec4(&mut self.t0t1, [m.t0[0], m.t0[1], m.t1[0], m.t1[1]]);
        push_vec4(&mut self.p0p1, [m.p0[0], m.p0[1], m.p1[0], m.p1[1]]);
    }

    pub(super) fn count(&self) -> u32 {
        (self.t0t1.len() / QUAD_STRIDE as usize) as u32
    }

    pub(super) fn t0t1(&self) -> &[u8] {
        &self.t0t1
    }

    pub(super) fn p0p1(&self) -> &[u8] {
        &self.p0p1
    }
}

fn push_vec4(out: &mut Vec<u8>, v: [f32; 4]) {
    for c in v {
        out.extend_from_slice(&c.to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn arrays_stay_index_aligned() {
        let mut w = QuadWriter::default();
        w.push(&GlyphMetrics {
            t0: [0.0, 0.5],
            t1: [0.25, 0.0],
            p0: [0.1, -0.2],
            p1: [0.6, 0.7],
        });
        w.push(&GlyphMetrics::default());

        assert_eq!(w.count(), 2);
        assert_eq!(w.t0t1().len(), 2 * QUAD_STRIDE as usize);
        assert_eq!(w.p0p1().len(), w.t0t1().len());
        assert_eq!(&floats(w.t0t1())[..4], &[0.0, 0.5, 0.25, 0.0]);
        assert_eq!(&floats(w.p0p1())[..4], &[0.1, -0.2, 0.6, 0.7]);
    }

    #[test]
    fn clear_empties_both_arrays() {
        let mut w = QuadWriter::default();
        w.push(&GlyphMetrics::default());
        w.clear();
        assert_eq!(w.count(), 0);
        assert!(w.t0t1().is_empty());
        assert!(w.p0p1().is_empty());
    }
}
