//! R8 atlas texture: the GPU backing store of the glyph atlas.

use super::context::GpuContext;
use super::handle::{ContextEpoch, GpuHandle};
use crate::atlas::TextureStorage;
use crate::error::{Error, Result};

/// Single-channel 2D texture that is reallocated on every atlas grow.
///
/// Writes go through `queue.write_texture`; nothing is ever read back.
pub struct GpuTexture {
    device: wgpu::Device,
    queue: wgpu::Queue,
    epoch: ContextEpoch,
    texture: GpuHandle<wgpu::Texture>,
    view: GpuHandle<wgpu::TextureView>,
    size: u32,
    max_size: u32,
    /// Bumped on every reallocation so bind groups can be rebuilt.
    generation: u64,
}

impl GpuTexture {
    /// Unallocated texture; `max_size` is clamped to the device limit.
    pub fn new(ctx: &GpuContext, max_size: u32) -> Self {
        let max_size = max_size.min(ctx.max_texture_size());
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            epoch: ctx.epoch().clone(),
            texture: GpuHandle::default(),
            view: GpuHandle::default(),
            size: 0,
            max_size,
            generation: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// View for sampling, `None` before the first allocation.
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.get()
    }
}

impl TextureStorage for GpuTexture {
    fn max_size(&self) -> u32 {
        self.max_size
    }

    fn clear(&mut self, size: u32) -> Result<()> {
        if size == 0 || size > self.max_size {
            return Err(Error::Gpu(format!(
                "atlas texture size {size} outside 1..={}",
                self.max_size
            )));
        }

        // New textures are zero-initialized by wgpu.
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph_atlas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // View first: it references the texture being released.
        self.view = GpuHandle::new(view, &self.epoch);
        self.texture = GpuHandle::new(texture, &self.epoch);
        self.size = size;
        self.generation += 1;
        log::debug!("gpu: atlas texture {size}x{size} (generation {})", self.generation);
        Ok(())
    }

    fn upload_region(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> Result<()> {
        let expected = width as usize * height as usize;
        if bytes.len() != expected {
            return Err(Error::RegionSize {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }
        let right = x.saturating_add(width);
        let bottom = y.saturating_add(height);
        if right > self.size || bottom > self.size {
            return Err(Error::OutOfRange {
                x: right.saturating_sub(1),
                y: bottom.saturating_sub(1),
                width: self.size,
                height: self.size,
            });
        }
        if expected == 0 {
            return Ok(());
        }

        let texture = self.texture.live("atlas texture")?;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }
}
