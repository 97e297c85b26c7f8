//! wgpu instance, adapter, device and queue, plus the context epoch.

use std::sync::Arc;

use winit::window::Window;

use super::handle::ContextEpoch;
use crate::error::{Error, Result};

/// The graphics context every GPU object in this crate is created on.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub surface_alpha_mode: wgpu::CompositeAlphaMode,
    epoch: ContextEpoch,
}

impl GpuContext {
    /// Create a context able to present to `window`.
    pub fn new(window: &Arc<Window>, epoch: ContextEpoch) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        // Only used to pick a compatible adapter; windows get their own
        // surface from `create_surface`.
        let probe = instance
            .create_surface(Arc::clone(window))
            .map_err(|e| Error::Gpu(format!("failed to create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&probe),
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::Gpu(format!("no compatible GPU adapter: {e}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("ori_text"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| Error::Gpu(format!("failed to create GPU device: {e}")))?;

        let caps = probe.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| Error::Gpu("surface reports no formats".to_owned()))?;
        let surface_alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!(
            "gpu: adapter={}, backend={:?}, format={surface_format:?}, epoch={}",
            adapter.get_info().name,
            adapter.get_info().backend,
            epoch.current(),
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface_format,
            surface_alpha_mode,
            epoch,
        })
    }

    pub fn epoch(&self) -> &ContextEpoch {
        &self.epoch
    }

    /// Largest square texture the device accepts.
    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Tear the context down and build a fresh one.
    ///
    /// The epoch is bumped before the old device is dropped and again once
    /// the new one is ready, so every handle created before this call is
    /// stale afterwards and must be rebuilt by the caller. On error the
    /// first bump has already happened and the old context is still in
    /// place but unusable for existing handles.
    pub fn recreate(&mut self, window: &Arc<Window>) -> Result<()> {
        self.epoch.begin_teardown();
        let fresh = Self::new(window, self.epoch.clone())?;
        *self = fresh;
        self.epoch.finish_recreate();
        log::info!("gpu: context recreated (epoch {})", self.epoch.current());
        Ok(())
    }

    /// Create and configure a surface for `window`.
    pub fn create_surface(
        &self,
        window: &Arc<Window>,
    ) -> Result<(wgpu::Surface<'static>, wgpu::SurfaceConfiguration)> {
        let surface = self
            .instance
            .create_surface(Arc::clone(window))
            .map_err(|e| Error::Gpu(format!("failed to create surface: {e}")))?;
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: self.surface_alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&self.device, &config);
        Ok((surface, config))
    }
}
