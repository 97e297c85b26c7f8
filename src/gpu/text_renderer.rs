//! Instanced draw of positioned glyphs.

use super::context::GpuContext;
use super::handle::GpuHandle;
use super::instance_writer::{QuadWriter, reuse_or_create_buffer};
use super::pipeline::TextPipeline;
use super::texture::GpuTexture;
use crate::error::Result;
use crate::font::GlyphMetrics;
use crate::layout::PositionedGlyph;

/// Instance buffers for one draw per submission.
///
/// `queue.write_buffer` lands before the submission executes, so two draws
/// recorded against the same buffers in one frame would both see the
/// second upload.
#[derive(Default)]
struct QuadBuffers {
    quads: QuadWriter,
    t0t1: GpuHandle<wgpu::Buffer>,
    p0p1: GpuHandle<wgpu::Buffer>,
}

impl QuadBuffers {
    /// Upload the quads and record one instanced draw. Returns the
    /// instance count; nothing is recorded for zero quads.
    fn draw<'m>(
        &mut self,
        ctx: &GpuContext,
        pipeline: &TextPipeline,
        atlas_bind_group: &wgpu::BindGroup,
        quads: impl IntoIterator<Item = &'m GlyphMetrics>,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<u32> {
        self.quads.clear();
        for m in quads {
            self.quads.push(m);
        }
        let count = self.quads.count();
        if count == 0 {
            return Ok(0);
        }

        reuse_or_create_buffer(ctx, &mut self.t0t1, self.quads.t0t1(), "text_t0t1");
        reuse_or_create_buffer(ctx, &mut self.p0p1, self.quads.p0p1(), "text_p0p1");

        pass.set_pipeline(pipeline.pipeline()?);
        pass.set_bind_group(0, pipeline.uniform_bind_group()?, &[]);
        pass.set_bind_group(1, atlas_bind_group, &[]);
        pass.set_vertex_buffer(0, self.t0t1.live("t0t1 buffer")?.slice(..));
        pass.set_vertex_buffer(1, self.p0p1.live("p0p1 buffer")?.slice(..));
        pass.draw(0..4, 0..count);
        Ok(count)
    }
}

/// Draws prepared glyph sequences through a [`TextPipeline`].
///
/// Instance data is rebuilt on every call; only buffer allocations and the
/// atlas bind group persist between frames.
#[derive(Default)]
pub struct TextRenderer {
    text: QuadBuffers,
    atlas_quad: QuadBuffers,
    atlas_bind_group: GpuHandle<wgpu::BindGroup>,
    /// Atlas texture generation the bind group was built for.
    bound_generation: Option<u64>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one instanced draw of `glyphs` into `pass`.
    ///
    /// Returns the number of instances drawn. Nothing is recorded for an
    /// empty sequence, or while the atlas is unallocated (every glyph so far
    /// had an empty bitmap). At most one call per renderer per submission.
    pub fn render(
        &mut self,
        ctx: &GpuContext,
        pipeline: &TextPipeline,
        atlas: &GpuTexture,
        glyphs: &[PositionedGlyph],
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<u32> {
        if glyphs.is_empty() || atlas.view().is_none() {
            return Ok(0);
        }
        self.sync_atlas(ctx, pipeline, atlas)?;
        let bind_group = self.atlas_bind_group.live("atlas bind group")?;
        self.text
            .draw(ctx, pipeline, bind_group, glyphs.iter().map(|g| &g.metrics), pass)
    }

    /// Draw the whole atlas texture upright as one `side`x`side` em quad
    /// with its bottom-left corner at `origin`. Skipped while the atlas is
    /// unallocated.
    pub fn render_atlas(
        &mut self,
        ctx: &GpuContext,
        pipeline: &TextPipeline,
        atlas: &GpuTexture,
        origin: [f32; 2],
        side: f32,
        pass: &mut wgpu::RenderPass<'_>,
    ) -> Result<u32> {
        if atlas.view().is_none() {
            return Ok(0);
        }
        self.sync_atlas(ctx, pipeline, atlas)?;
        let bind_group = self.atlas_bind_group.live("atlas bind group")?;
        let quad = GlyphMetrics {
            t0: [0.0, 1.0],
            t1: [1.0, 0.0],
            p0: [0.0, 0.0],
            p1: [side, side],
        }
        .translate(origin);
        self.atlas_quad
            .draw(ctx, pipeline, bind_group, std::iter::once(&quad), pass)
    }

    /// Rebuild the atlas bind group after the texture was reallocated.
    fn sync_atlas(
        &mut self,
        ctx: &GpuContext,
        pipeline: &TextPipeline,
        atlas: &GpuTexture,
    ) -> Result<()> {
        if self.bound_generation == Some(atlas.generation()) && !self.atlas_bind_group.is_empty() {
            return Ok(());
        }
        let Some(view) = atlas.view() else {
            return Ok(());
        };
        let bind_group = pipeline.atlas_bind_group(&ctx.device, view)?;
        self.atlas_bind_group = GpuHandle::new(bind_group, ctx.epoch());
        self.bound_generation = Some(atlas.generation());
        Ok(())
    }
}
