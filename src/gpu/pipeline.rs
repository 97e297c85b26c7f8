//! The text pipeline: instanced unit quads sampling the glyph atlas.
//!
//! Vertex input is two per-instance `vec4<f32>` streams:
//!   slot 0, @location(0) `t0t1`: atlas rect, `t0` paired with quad corner `p0`
//!   slot 1, @location(1) `p0p1`: quad rect in em units
//!
//! The vertex index (0..4, triangle strip) picks the corner. The fragment
//! stage mixes `background` into `color` by atlas coverage.

use super::context::GpuContext;
use super::handle::GpuHandle;
use super::instance_writer::QUAD_STRIDE;
use crate::error::Result;

const T0T1_ATTRS: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x4,
    offset: 0,
    shader_location: 0,
}];

const P0P1_ATTRS: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x4,
    offset: 0,
    shader_location: 1,
}];

fn instance_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: QUAD_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &T0T1_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: QUAD_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &P0P1_ATTRS,
        },
    ]
}

const TEXT_SHADER_SRC: &str = "
struct Uniforms {
    transform: mat4x4<f32>,
    background: vec4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(1) @binding(0) var atlas: texture_2d<f32>;
@group(1) @binding(1) var atlas_sampler: sampler;

struct QuadInput {
    @location(0) t0t1: vec4<f32>,
    @location(1) p0p1: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32, quad: QuadInput) -> VertexOutput {
    let corner = vec2<f32>(f32(vi & 1u), f32((vi >> 1u) & 1u));
    let pos = mix(quad.p0p1.xy, quad.p0p1.zw, corner);

    var out: VertexOutput;
    out.position = uniforms.transform * vec4<f32>(pos, 0.0, 1.0);
    out.uv = mix(quad.t0t1.xy, quad.t0t1.zw, corner);
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let coverage = textureSample(atlas, atlas_sampler, input.uv).r;
    return mix(uniforms.background, uniforms.color, coverage);
}
";

/// Size of [`TextUniforms`] on the GPU.
pub const UNIFORM_SIZE: u64 = 96;

/// Uniform block of the text shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextUniforms {
    /// Column-major em-to-clip-space transform.
    pub transform: [f32; 16],
    /// Color where coverage is 0.
    pub background: [f32; 4],
    /// Color where coverage is 1.
    pub color: [f32; 4],
}

impl TextUniforms {
    pub fn to_bytes(&self) -> [u8; UNIFORM_SIZE as usize] {
        let mut bytes = [0u8; UNIFORM_SIZE as usize];
        let values = self
            .transform
            .iter()
            .chain(&self.background)
            .chain(&self.color);
        for (dst, v) in bytes.chunks_exact_mut(4).zip(values) {
            dst.copy_from_slice(&v.to_ne_bytes());
        }
        bytes
    }
}

/// Orthographic transform placing the em-space origin (the first baseline)
/// at `origin` pixels from the top-left of a `width`x`height` viewport,
/// with one em spanning `scale` pixels. Em y points up.
pub fn em_to_clip(width: f32, height: f32, origin: [f32; 2], scale: f32) -> [f32; 16] {
    let sx = 2.0 * scale / width;
    let sy = 2.0 * scale / height;
    let tx = 2.0 * origin[0] / width - 1.0;
    let ty = 1.0 - 2.0 * origin[1] / height;
    [
        sx, 0.0, 0.0, 0.0, //
        0.0, sy, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        tx, ty, 0.0, 1.0,
    ]
}

/// Compiled text pipeline with its uniform buffer and atlas sampler.
pub struct TextPipeline {
    pipeline: GpuHandle<wgpu::RenderPipeline>,
    uniform_buffer: GpuHandle<wgpu::Buffer>,
    uniform_bind_group: GpuHandle<wgpu::BindGroup>,
    atlas_layout: GpuHandle<wgpu::BindGroupLayout>,
    sampler: GpuHandle<wgpu::Sampler>,
}

impl TextPipeline {
    /// Build the pipeline for render targets of `format`.
    pub fn simple(ctx: &GpuContext, format: wgpu::TextureFormat) -> Self {
        let device = &ctx.device;
        let epoch = ctx.epoch();

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let atlas_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text_atlas_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("text_uniforms"),
            size: UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Wrap addressing: glyphs only carry a margin to the right and below.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("text_atlas_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("text_shader"),
            source: wgpu::ShaderSource::Wgsl(TEXT_SHADER_SRC.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &atlas_layout],
            immediate_size: 0,
        });

        let buffers = instance_buffer_layouts();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("text_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline: GpuHandle::new(pipeline, epoch),
            uniform_buffer: GpuHandle::new(uniform_buffer, epoch),
            uniform_bind_group: GpuHandle::new(uniform_bind_group, epoch),
            atlas_layout: GpuHandle::new(atlas_layout, epoch),
            sampler: GpuHandle::new(sampler, epoch),
        }
    }

    pub fn set_uniforms(&self, queue: &wgpu::Queue, uniforms: &TextUniforms) -> Result<()> {
        let buffer = self.uniform_buffer.live("text uniform buffer")?;
        queue.write_buffer(buffer, 0, &uniforms.to_bytes());
        Ok(())
    }

    /// Bind group sampling `view` with the pipeline's atlas sampler.
    pub(super) fn atlas_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
    ) -> Result<wgpu::BindGroup> {
        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("text_atlas_bind_group"),
            layout: self.atlas_layout.live("atlas bind group layout")?,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(
                        self.sampler.live("atlas sampler")?,
                    ),
                },
            ],
        }))
    }

    pub(super) fn pipeline(&self) -> Result<&wgpu::RenderPipeline> {
        self.pipeline.live("text pipeline")
    }

    pub(super) fn uniform_bind_group(&self) -> Result<&wgpu::BindGroup> {
        self.uniform_bind_group.live("text uniform bind group")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &[f32; 16], p: [f32; 2]) -> [f32; 2] {
        [
            m[0] * p[0] + m[4] * p[1] + m[12],
            m[1] * p[0] + m[5] * p[1] + m[13],
        ]
    }

    #[test]
    fn origin_maps_to_pixel_position() {
        let m = em_to_clip(800.0, 600.0, [400.0, 300.0], 32.0);
        let c = apply(&m, [0.0, 0.0]);
        assert!(c[0].abs() < 1e-6 && c[1].abs() < 1e-6);
    }

    #[test]
    fn one_em_spans_scale_pixels_upward() {
        let m = em_to_clip(800.0, 600.0, [0.0, 600.0], 60.0);
        let c = apply(&m, [1.0, 1.0]);
        // 60px right of the left edge, 60px above the bottom edge.
        assert!((c[0] - (-1.0 + 120.0 / 800.0)).abs() < 1e-6);
        assert!((c[1] - (-1.0 + 120.0 / 600.0)).abs() < 1e-6);
    }

    #[test]
    fn uniform_bytes_follow_declaration_order() {
        let u = TextUniforms {
            transform: [1.0; 16],
            background: [0.0, 0.0, 0.0, 0.0],
            color: [0.25, 0.5, 0.75, 1.0],
        };
        let bytes = u.to_bytes();
        assert_eq!(&bytes[..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[64..68], &0.0f32.to_ne_bytes());
        assert_eq!(&bytes[80..84], &0.25f32.to_ne_bytes());
        assert_eq!(&bytes[88..92], &0.75f32.to_ne_bytes());
    }
}
