use std::path::PathBuf;

use anyhow::Context as _;
use winit::dpi::PhysicalSize;

use shaderdeck_config::AppConfig;
use shaderdeck_engine::core::{App, AppControl, FrameCtx};
use shaderdeck_engine::input::{InputFrame, Key, MouseButton};
use shaderdeck_engine::render::{RenderCtx, RenderTarget};
use shaderdeck_pipeline::{FrameState, GpuTextureCache, Pipeline};

/// Render-loop driver: owns the config, the texture cache and the pipeline.
///
/// The pipeline is built on the first frame, once a device and surface
/// format exist. A build failure at that point is fatal; failures during a
/// reload are logged and the previous passes keep running.
pub struct ShaderDeck {
    config_path: PathBuf,
    config: AppConfig,
    textures: GpuTextureCache,
    pipeline: Option<Pipeline>,
    started: bool,
    fatal: Option<anyhow::Error>,
}

/// Pointer and clock state captured before the frame is acquired.
struct FrameInputs {
    elapsed: f32,
    frame_index: u64,
    cursor: Option<(f32, f32)>,
    primary_down: bool,
    reload: bool,
}

struct Reloaded {
    clean: bool,
    resize: Option<(u32, u32)>,
}

impl ShaderDeck {
    pub fn new(config_path: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path,
            config,
            textures: GpuTextureCache::new(),
            pipeline: None,
            started: false,
            fatal: None,
        }
    }

    fn start(&mut self, rctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        self.started = true;

        let Some(layout) = self.config.pipeline() else {
            log::warn!(
                "{} configures no shader; edit it and press F5 or right click to reload",
                self.config_path.display()
            );
            return Ok(());
        };

        let pipeline = Pipeline::new(rctx, &mut self.textures, &layout)
            .context("failed to build the shader pipeline")?;
        log::info!("pipeline ready: {} passes", pipeline.pass_count());
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn reload(&mut self, rctx: &RenderCtx<'_>) -> Reloaded {
        log::info!("reloading {}", self.config_path.display());
        let config = AppConfig::load_or_default(&self.config_path);
        let resize = resize_target(self.config.window_size(), config.window_size());

        let clean = match config.pipeline() {
            None => {
                log::warn!("reloaded config has no shader; keeping current passes");
                false
            }
            Some(layout) => {
                if let Some(pipeline) = self.pipeline.as_mut() {
                    pipeline.reload(rctx, &mut self.textures, &layout).is_clean()
                } else {
                    match Pipeline::new(rctx, &mut self.textures, &layout) {
                        Ok(pipeline) => {
                            log::info!("pipeline ready: {} passes", pipeline.pass_count());
                            self.pipeline = Some(pipeline);
                            true
                        }
                        Err(err) => {
                            log::error!("{:#}", anyhow::Error::new(err));
                            false
                        }
                    }
                }
            }
        };

        self.config = config;
        Reloaded { clean, resize }
    }

    fn draw(
        &mut self,
        rctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        inputs: &FrameInputs,
    ) -> Option<Reloaded> {
        let reloaded = inputs.reload.then(|| self.reload(rctx));

        if let Some(pipeline) = self.pipeline.as_mut() {
            let frame = FrameState {
                elapsed: inputs.elapsed,
                frame_index: inputs.frame_index,
                size: rctx.size,
                cursor: inputs.cursor,
                primary_down: inputs.primary_down,
            };
            pipeline.render(rctx, target, &mut self.textures, &frame);
        }

        reloaded
    }
}

impl App for ShaderDeck {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let inputs = FrameInputs {
            elapsed: ctx.time.elapsed,
            frame_index: ctx.time.frame_index,
            cursor: ctx.input.pointer_pos,
            primary_down: ctx.input.button_down(MouseButton::Left),
            reload: reload_requested(ctx.input_frame),
        };

        let clear = self.pipeline.is_none().then_some(wgpu::Color::BLACK);
        let mut reloaded = None;

        let control = ctx.render(clear, |rctx, target| {
            if !self.started {
                if let Err(err) = self.start(rctx) {
                    self.fatal = Some(err);
                    return;
                }
            }
            reloaded = self.draw(rctx, target, &inputs);
        });

        if self.fatal.is_some() {
            return AppControl::Exit;
        }

        if let Some(r) = reloaded {
            if r.clean {
                ctx.runtime.restart_clock();
            }
            if let Some((w, h)) = r.resize {
                log::info!("resizing window to {w}x{h}");
                ctx.runtime.resize_window(PhysicalSize::new(w, h));
            }
        }

        control
    }

    fn on_exit(&mut self) -> anyhow::Result<()> {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.teardown(&mut self.textures);
        }
        self.textures.clear();

        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Right click or F5 this frame.
fn reload_requested(frame: &InputFrame) -> bool {
    frame.button_pressed(MouseButton::Right) || frame.key_pressed(Key::Function(5))
}

fn resize_target(current: (u32, u32), configured: (u32, u32)) -> Option<(u32, u32)> {
    (current != configured).then_some(configured)
}
