//! Demo: draws the configured sample text and, optionally, the glyph atlas.
//!
//! `Esc` quits. `F5` tears down and recreates the GPU context.

use std::process::ExitCode;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use ori_text::config::{self, Config};
use ori_text::font::{SwashFace, find_system_font};
use ori_text::gpu::{
    ContextEpoch, GpuContext, GpuTexture, TextPipeline, TextRenderer, TextUniforms, em_to_clip,
};
use ori_text::{Error, Font, Result};

/// Distance from the window's top-left corner to the text, in pixels.
const MARGIN: f32 = 24.0;

/// On-screen side length of the atlas preview, in pixels.
const ATLAS_PREVIEW: f32 = 256.0;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--print-config") {
        match toml::to_string_pretty(&Config::default()) {
            Ok(s) => print!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--save-config") {
        return match Config::load().save() {
            Ok(path) => {
                println!("wrote {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if args.iter().any(|a| a == "--check-config") {
        return match Config::try_load() {
            Ok(Some(_)) => {
                println!("{}: ok", config::config_path().display());
                ExitCode::SUCCESS
            }
            Ok(None) => {
                println!("{}: not found, defaults apply", config::config_path().display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("ori_text {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("ori_text {}", env!("CARGO_PKG_VERSION"));
        println!("GPU glyph atlas and instanced text rendering demo\n");
        println!("USAGE:");
        println!("    ori_text [OPTIONS]\n");
        println!("OPTIONS:");
        println!("    --print-config    Print the default configuration to stdout");
        println!("    --save-config     Write the current configuration to the config file");
        println!("    --check-config    Validate the config file and report errors");
        println!("    --version, -V     Print version information");
        println!("    --help, -h        Print this help message\n");
        println!("KEYS:");
        println!("    Esc               Quit");
        println!("    F5                Recreate the GPU context");
        println!("\nConfig file: {}", config::config_path().display());
        return ExitCode::SUCCESS;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Config::load()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let path = match config.font.path.clone().or_else(find_system_font) {
        Some(p) => p,
        None => {
            return Err(Error::Font(format!(
                "no font found; set font.path in {}",
                config::config_path().display()
            ))
            .into());
        }
    };
    let font_bytes = std::fs::read(&path)
        .map_err(|e| Error::Font(format!("failed to read {}: {e}", path.display())))?;
    log::info!("font: {} ({} bytes)", path.display(), font_bytes.len());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);
    let mut demo = Demo::new(config, font_bytes);
    event_loop.run_app(&mut demo)?;

    match demo.error.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Everything created on one GPU context.
struct Scene {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: TextPipeline,
    renderer: TextRenderer,
    font: Font<SwashFace, GpuTexture>,
}

impl Scene {
    fn new(gpu: &GpuContext, window: &Arc<Window>, config: &Config, font_bytes: &[u8]) -> Result<Self> {
        let (surface, surface_config) = gpu.create_surface(window)?;
        let pipeline = TextPipeline::simple(gpu, surface_config.format);
        let face = SwashFace::new(font_bytes.to_vec(), config.font.em_texels)?;
        let font = Font::new(face, GpuTexture::new(gpu, config.atlas.max_size));
        Ok(Self {
            surface,
            surface_config,
            pipeline,
            renderer: TextRenderer::new(),
            font,
        })
    }
}

struct Demo {
    config: Config,
    font_bytes: Vec<u8>,
    sample: Vec<char>,
    epoch: ContextEpoch,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    scene: Option<Scene>,
    /// First fatal error; reported after the event loop exits.
    error: Option<Error>,
}

impl Demo {
    fn new(config: Config, font_bytes: Vec<u8>) -> Self {
        let sample = config.text.sample.chars().collect();
        Self {
            config,
            font_bytes,
            sample,
            epoch: ContextEpoch::new(),
            window: None,
            gpu: None,
            scene: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: Error) {
        log::error!("{e}");
        self.error.get_or_insert(e);
        event_loop.exit();
    }

    fn init(&mut self, window: &Arc<Window>) -> Result<()> {
        let gpu = GpuContext::new(window, self.epoch.clone())?;
        self.scene = Some(Scene::new(&gpu, window, &self.config, &self.font_bytes)?);
        self.gpu = Some(gpu);
        Ok(())
    }

    /// Throw away every GPU object and start over on a fresh context.
    fn recreate(&mut self) -> Result<()> {
        let (Some(window), Some(gpu)) = (self.window.clone(), self.gpu.as_mut()) else {
            return Ok(());
        };
        let old = self.scene.take();
        // The window can only back one surface at a time.
        let old = old.map(|s| {
            drop(s.surface);
            (s.pipeline, s.renderer, s.font)
        });

        gpu.recreate(&window)?;
        // Stale now: dropped without explicit release.
        drop(old);

        self.scene = Some(Scene::new(gpu, &window, &self.config, &self.font_bytes)?);
        window.request_redraw();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return;
        };
        scene.surface_config.width = width.max(1);
        scene.surface_config.height = height.max(1);
        scene.surface.configure(&gpu.device, &scene.surface_config);
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return Ok(());
        };

        let frame = match scene.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                scene.surface.configure(&gpu.device, &scene.surface_config);
                return Ok(());
            }
            Err(e) => {
                log::warn!("surface error: {e}");
                return Ok(());
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let text = &self.config.text;
        let scale = text.effective_scale();
        let line = scene.font.line_metrics();
        let width = scene.surface_config.width as f32;
        let height = scene.surface_config.height as f32;
        // First baseline one ascender below the margin.
        let origin = [MARGIN, MARGIN + line.ascender * scale];
        scene.pipeline.set_uniforms(
            &gpu.queue,
            &TextUniforms {
                transform: em_to_clip(width, height, origin, scale),
                background: text.background,
                color: text.color,
            },
        )?;

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("text_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.03,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let Scene {
                pipeline,
                renderer,
                font,
                ..
            } = scene;
            let drawn = font.render(gpu, pipeline, renderer, &self.sample, &mut pass)?;

            if text.show_atlas {
                let lines = self.sample.iter().filter(|&&c| c == '\n').count() + 1;
                let side = ATLAS_PREVIEW / scale;
                let below = -(lines as f32) * line.height - side;
                renderer.render_atlas(gpu, pipeline, font.atlas_texture(), [0.0, below], side, &mut pass)?;
            }

            log::trace!(
                "frame: {drawn} glyphs, atlas {}px, cache {} (hits {}, misses {})",
                font.cache().atlas().size(),
                font.cache().len(),
                font.cache().hits(),
                font.cache().misses(),
            );
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, Error::Gpu(format!("failed to create window: {e}")));
                return;
            }
        };

        if let Err(e) = self.init(&window) {
            self.fail(event_loop, e);
            return;
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                self.resize(size.width, size.height);
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    Key::Named(NamedKey::F5) if !event.repeat => {
                        log::info!("recreating GPU context");
                        if let Err(e) = self.recreate() {
                            self.fail(event_loop, e);
                        }
                    }
                    _ => {}
                }
            }

            _ => {}
        }
    }
}
