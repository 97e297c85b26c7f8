//! GPU side: context and epoch, resource handles, atlas texture, text
//! pipeline and the instanced text renderer.

mod context;
mod handle;
mod instance_writer;
mod pipeline;
mod text_renderer;
mod texture;

pub use context::GpuContext;
pub use handle::{ContextEpoch, GpuHandle, GpuResource};
pub use instance_writer::QUAD_STRIDE;
pub use pipeline::{TextPipeline, TextUniforms, UNIFORM_SIZE, em_to_clip};
pub use text_renderer::TextRenderer;
pub use texture::GpuTexture;
