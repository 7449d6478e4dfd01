use std::path::Path;

use shaderdeck_config::{ChannelConfig, ChannelType, Filter, PassConfig, PipelineConfig, Wrap};
use shaderdeck_engine::render::{RenderCtx, RenderTarget};

use crate::error::{PipelineError, TextureLoadError};
use crate::frame::{FrameState, MouseTracker, ShaderInputs};
use crate::pass::{BindGroupKey, ChannelBinding, Pass, PassKind};
use crate::quad::Quad;
use crate::shader::{sampler_binding, texture_binding, ProgramBuilder, CHANNEL_COUNT, UNIFORM_BINDING};
use crate::texture::{
    BufferSlot, GpuAllocator, GpuTexture, ImageTexture, SamplerCache, TextureCache, TextureSource,
    RENDER_TARGET_FORMAT,
};

/// Texture cache holding GPU textures.
pub type GpuTextureCache = TextureCache<GpuTexture>;

/// Outcome of [`Pipeline::reload`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReloadReport {
    /// Passes rebuilt (or newly added) from the new configuration.
    pub rebuilt: usize,
    /// Passes whose rebuild failed; they keep their previous program, or
    /// stay absent if they are new.
    pub failed: usize,
    /// Channels that could not be loaded and were left unbound.
    pub skipped_channels: usize,
    /// Buffer passes dropped because the new configuration omits them.
    pub removed: usize,
}

impl ReloadReport {
    /// Every configured pass was rebuilt; skipped channels do not count.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Buffer A-D plus Image, sharing one common source, one quad and one
/// uniform buffer.
pub struct Pipeline {
    builder: ProgramBuilder,
    quad: Quad,
    samplers: SamplerCache,
    uniforms: wgpu::Buffer,
    fallback: ImageTexture,
    surface_format: wgpu::TextureFormat,

    common: String,
    buffers: [Option<Pass>; 4],
    image: Pass,

    mouse: MouseTracker,
}

impl Pipeline {
    /// Builds every configured pass.
    ///
    /// Order: common source, Image, then Buffer A, B, C, D. The first
    /// failure aborts construction.
    pub fn new(
        ctx: &RenderCtx<'_>,
        textures: &mut GpuTextureCache,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let common = match &config.common {
            Some(c) => read_source(&c.path)?,
            None => String::new(),
        };

        let image_cfg = config.image.as_ref().ok_or(PipelineError::MissingImagePass)?;

        let builder = ProgramBuilder::new(ctx.device).map_err(|source| PipelineError::Shader {
            pass: "quad vertex stage".to_string(),
            source,
        })?;

        let mut alloc = GpuAllocator::new(ctx.device, ctx.queue);
        let factory = PassFactory {
            builder: &builder,
            device: ctx.device,
            surface_format: ctx.target_format,
            common: &common,
        };

        let image = factory.build(textures, &mut alloc, PassKind::Image, image_cfg)?;
        log::info!("built {}", image.name());

        let mut buffers: [Option<Pass>; 4] = Default::default();
        for (slot, cfg) in BufferSlot::ALL.into_iter().zip(config.buffers()) {
            let Some(cfg) = cfg else { continue };
            let pass = factory.build(textures, &mut alloc, PassKind::Buffer(slot), cfg)?;
            log::info!("built {}", pass.name());
            buffers[slot.index()] = Some(pass);
        }

        let uniforms = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shaderdeck shader inputs"),
            size: std::mem::size_of::<ShaderInputs>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            quad: Quad::new(ctx.device),
            samplers: SamplerCache::new(),
            uniforms,
            fallback: ImageTexture::fallback(ctx.device, ctx.queue),
            surface_format: ctx.target_format,
            builder,
            common,
            buffers,
            image,
            mouse: MouseTracker::new(),
        })
    }

    /// Passes in execution order: Buffer A, B, C, D, then Image.
    pub fn passes(&self) -> impl Iterator<Item = &Pass> {
        self.buffers.iter().flatten().chain(std::iter::once(&self.image))
    }

    pub fn pass_count(&self) -> usize {
        self.passes().count()
    }

    pub fn common_source(&self) -> &str {
        &self.common
    }

    /// Records one frame: every buffer pass into its render target, then
    /// Image into `target`. Returns the number of draws issued.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        textures: &mut GpuTextureCache,
        frame: &FrameState,
    ) -> usize {
        if ctx.size.0 == 0 || ctx.size.1 == 0 {
            return 0;
        }

        let inputs = ShaderInputs::new(frame, self.mouse.update(frame));
        ctx.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&inputs));

        let Self {
            builder,
            quad,
            samplers,
            uniforms,
            fallback,
            buffers,
            image,
            ..
        } = self;

        let mut encoder = PassEncoder {
            device: ctx.device,
            size: ctx.size,
            layout: builder.bind_group_layout(),
            quad,
            uniforms,
            fallback,
            samplers,
            textures,
        };

        let mut draws = 0;
        for pass in buffers.iter_mut().flatten() {
            if encoder.draw(target.encoder, pass, None) {
                draws += 1;
            }
        }
        if encoder.draw(target.encoder, image, Some(target.color_view)) {
            draws += 1;
        }
        draws
    }

    /// Rebuilds passes from `config` without tearing the pipeline down.
    ///
    /// Lenient where [`Pipeline::new`] is strict: a pass whose source fails
    /// to read or compile keeps its previous program, and a channel that
    /// fails to load is left unbound. Each pass is assembled completely
    /// before it replaces the old one.
    pub fn reload(
        &mut self,
        ctx: &RenderCtx<'_>,
        textures: &mut GpuTextureCache,
        config: &PipelineConfig,
    ) -> ReloadReport {
        let mut report = ReloadReport::default();

        match &config.common {
            Some(c) => match read_source(&c.path) {
                Ok(src) => self.common = src,
                Err(err) => {
                    log::error!("{err}; keeping previous common source");
                    report.failed += 1;
                }
            },
            None => self.common.clear(),
        }

        let mut alloc = GpuAllocator::new(ctx.device, ctx.queue);
        let factory = PassFactory {
            builder: &self.builder,
            device: ctx.device,
            surface_format: self.surface_format,
            common: &self.common,
        };

        match &config.image {
            Some(cfg) => {
                match factory.build_lenient(textures, &mut alloc, PassKind::Image, cfg, &mut report) {
                    Some(pass) => self.image = pass,
                    None => log::warn!("keeping previous {}", self.image.name()),
                }
            }
            None => {
                log::warn!("reloaded config has no Image pass; keeping previous");
                report.failed += 1;
            }
        }

        for (slot, cfg) in BufferSlot::ALL.into_iter().zip(config.buffers()) {
            let current = &mut self.buffers[slot.index()];
            match cfg {
                Some(cfg) => {
                    let kind = PassKind::Buffer(slot);
                    match factory.build_lenient(textures, &mut alloc, kind, cfg, &mut report) {
                        Some(pass) => *current = Some(pass),
                        None if current.is_some() => log::warn!("keeping previous {kind}"),
                        None => {}
                    }
                }
                None => {
                    if let Some(old) = current.take() {
                        log::info!("removed {}", old.name());
                        release_output(textures, &old);
                        report.removed += 1;
                    }
                }
            }
        }

        log::info!(
            "reload: {} rebuilt, {} failed, {} channels skipped, {} removed",
            report.rebuilt,
            report.failed,
            report.skipped_channels,
            report.removed
        );
        report
    }

    /// Drops every pass program and frees render-target storage. Cached
    /// textures stay in `textures` until the driver clears it.
    pub fn teardown(self, textures: &mut GpuTextureCache) {
        let Self { buffers, image, .. } = self;
        for pass in buffers.into_iter().flatten() {
            release_output(textures, &pass);
            log::debug!("dropped {}", pass.name());
        }
        log::debug!("dropped {}", image.name());
        drop(image);
        log::info!("pipeline torn down");
    }
}

fn read_source(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::ReadSource {
        path: path.to_path_buf(),
        source,
    })
}

fn release_output(textures: &mut GpuTextureCache, pass: &Pass) {
    if let Some(rt) = pass
        .output()
        .and_then(|h| textures.get_mut(h))
        .and_then(GpuTexture::as_target_mut)
    {
        rt.release();
    }
}

fn resolve_channel(
    textures: &mut GpuTextureCache,
    alloc: &mut GpuAllocator<'_>,
    cfg: &ChannelConfig,
) -> Result<ChannelBinding, TextureLoadError> {
    if cfg.kind == ChannelType::Cube {
        return Err(TextureLoadError::Unsupported {
            path: cfg.path.clone(),
            reason: "cube map channels are not supported".to_string(),
        });
    }

    let source = TextureSource::from_channel_path(&cfg.path);
    let texture = textures.acquire(&source, alloc)?;
    Ok(ChannelBinding {
        texture,
        filter: cfg.filter,
        wrap: cfg.wrap,
    })
}

// ── pass construction ─────────────────────────────────────────────────────

struct PassFactory<'a> {
    builder: &'a ProgramBuilder,
    device: &'a wgpu::Device,
    surface_format: wgpu::TextureFormat,
    common: &'a str,
}

impl PassFactory<'_> {
    fn format(&self, kind: PassKind) -> wgpu::TextureFormat {
        match kind {
            PassKind::Image => self.surface_format,
            PassKind::Buffer(_) => RENDER_TARGET_FORMAT,
        }
    }

    /// Strict build: any failure is returned.
    fn build(
        &self,
        textures: &mut GpuTextureCache,
        alloc: &mut GpuAllocator<'_>,
        kind: PassKind,
        cfg: &PassConfig,
    ) -> Result<Pass, PipelineError> {
        let source = read_source(&cfg.path)?;

        let mut channels = [None; CHANNEL_COUNT];
        for (unit, ch) in cfg.bound_channels().iter().enumerate() {
            let binding = resolve_channel(textures, alloc, ch).map_err(|source| {
                PipelineError::Texture {
                    pass: kind.to_string(),
                    unit,
                    source,
                }
            })?;
            channels[unit] = Some(binding);
        }

        let program = self
            .builder
            .build(
                self.device,
                &kind.to_string(),
                self.common,
                &source,
                kind.target(),
                self.format(kind),
            )
            .map_err(|source| PipelineError::Shader {
                pass: kind.to_string(),
                source,
            })?;

        let output = match kind {
            PassKind::Buffer(slot) => Some(textures.acquire_render_target(slot, alloc)),
            PassKind::Image => None,
        };

        Ok(Pass::new(kind, &cfg.path, channels, program, output))
    }

    /// Reload build: missing channels are skipped, other failures logged.
    fn build_lenient(
        &self,
        textures: &mut GpuTextureCache,
        alloc: &mut GpuAllocator<'_>,
        kind: PassKind,
        cfg: &PassConfig,
        report: &mut ReloadReport,
    ) -> Option<Pass> {
        let source = match read_source(&cfg.path) {
            Ok(s) => s,
            Err(err) => {
                log::error!("{kind}: {err}");
                report.failed += 1;
                return None;
            }
        };

        let mut channels = [None; CHANNEL_COUNT];
        for (unit, ch) in cfg.bound_channels().iter().enumerate() {
            match resolve_channel(textures, alloc, ch) {
                Ok(binding) => channels[unit] = Some(binding),
                Err(err) => {
                    log::warn!("{kind}: channel {unit} skipped: {err}");
                    report.skipped_channels += 1;
                }
            }
        }

        let program = match self.builder.build(
            self.device,
            &kind.to_string(),
            self.common,
            &source,
            kind.target(),
            self.format(kind),
        ) {
            Ok(p) => p,
            Err(err) => {
                log::error!("{kind}: {err}");
                report.failed += 1;
                return None;
            }
        };

        let output = match kind {
            PassKind::Buffer(slot) => Some(textures.acquire_render_target(slot, alloc)),
            PassKind::Image => None,
        };

        report.rebuilt += 1;
        Some(Pass::new(kind, &cfg.path, channels, program, output))
    }
}

// ── per-frame encoding ────────────────────────────────────────────────────

struct PassEncoder<'a> {
    device: &'a wgpu::Device,
    size: (u32, u32),
    layout: &'a wgpu::BindGroupLayout,
    quad: &'a Quad,
    uniforms: &'a wgpu::Buffer,
    fallback: &'a ImageTexture,
    samplers: &'a mut SamplerCache,
    textures: &'a mut GpuTextureCache,
}

impl PassEncoder<'_> {
    /// Encodes one pass. `screen` is the surface view for the Image pass.
    /// Returns `false` if the pass had nowhere to draw.
    fn draw(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &mut Pass,
        screen: Option<&wgpu::TextureView>,
    ) -> bool {
        if let Some(out) = pass.output() {
            let Some(rt) = self.textures.get_mut(out).and_then(GpuTexture::as_target_mut) else {
                log::warn!("{}: output is not a render target", pass.name());
                return false;
            };
            rt.ensure_size(self.device, self.size);
        }

        let key = self.bind_key(pass);
        let bind_group = pass
            .bind_group(key, |channels, name| self.create_bind_group(channels, name))
            .clone();

        let view = match screen {
            Some(view) => view,
            None => match pass
                .output()
                .and_then(|h| self.textures.get(h))
                .and_then(GpuTexture::as_target)
                .and_then(|rt| rt.write_view())
            {
                Some(view) => view,
                None => return false,
            },
        };

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pass.program().render_pipeline());
            rpass.set_bind_group(0, &bind_group, &[]);
            self.quad.draw(&mut rpass);
        }

        if let Some(rt) = pass
            .output()
            .and_then(|h| self.textures.get_mut(h))
            .and_then(GpuTexture::as_target_mut)
        {
            rt.swap();
        }
        true
    }

    /// What each channel would sample right now.
    fn bind_key(&self, pass: &Pass) -> BindGroupKey {
        let channels = *pass.channels();
        channels.map(|binding| {
            binding
                .and_then(|b| self.textures.get(b.texture))
                .and_then(GpuTexture::sample_key)
        })
    }

    fn create_bind_group(
        &mut self,
        channels: &[Option<ChannelBinding>; CHANNEL_COUNT],
        name: &str,
    ) -> wgpu::BindGroup {
        log::trace!("{name}: building bind group");
        let mut views = Vec::with_capacity(CHANNEL_COUNT);
        let mut samplers = Vec::with_capacity(CHANNEL_COUNT);

        for binding in channels {
            let (view, filter, wrap) = match binding {
                Some(b) => (
                    self.textures
                        .get(b.texture)
                        .and_then(GpuTexture::sample_view)
                        .unwrap_or(self.fallback.view()),
                    b.filter,
                    b.wrap,
                ),
                None => (self.fallback.view(), Filter::default(), Wrap::default()),
            };
            views.push(view.clone());
            samplers.push(self.samplers.get(self.device, filter, wrap).clone());
        }

        let mut entries = Vec::with_capacity(1 + CHANNEL_COUNT * 2);
        entries.push(wgpu::BindGroupEntry {
            binding: UNIFORM_BINDING,
            resource: self.uniforms.as_entire_binding(),
        });
        for unit in 0..CHANNEL_COUNT {
            entries.push(wgpu::BindGroupEntry {
                binding: texture_binding(unit),
                resource: wgpu::BindingResource::TextureView(&views[unit]),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: sampler_binding(unit),
                resource: wgpu::BindingResource::Sampler(&samplers[unit]),
            });
        }

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: self.layout,
            entries: &entries,
        })
    }
}
