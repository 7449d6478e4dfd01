//! Headless end-to-end runs of the pipeline.
//!
//! Each test needs a GPU adapter; without one it logs and returns early.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use shaderdeck_config::{ChannelConfig, CommonConfig, PassConfig, PipelineConfig};
use shaderdeck_engine::device::{GpuInit, HeadlessGpu};
use shaderdeck_engine::render::{RenderCtx, RenderTarget};
use shaderdeck_pipeline::texture::BufferSlot;
use shaderdeck_pipeline::{
    FrameState, GpuTextureCache, PassKind, Pipeline, PipelineError, ShaderError, TextureLoadError,
};

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const RED: &str = "void mainImage(out vec4 c, in vec2 p) { c = vec4(1.0, 0.0, 0.0, 1.0); }";
const BLUE: &str = "void mainImage(out vec4 c, in vec2 p) { c = vec4(0.0, 0.0, 1.0, 1.0); }";
const GREEN: &str = "void mainImage(out vec4 c, in vec2 p) { c = vec4(0.0, 1.0, 0.0, 1.0); }";
const PASSTHROUGH: &str =
    "void mainImage(out vec4 c, in vec2 p) { c = texture(iChannel0, p / iResolution.xy); }";

fn gpu() -> Option<HeadlessGpu> {
    match HeadlessGpu::new_blocking(&GpuInit::default()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping: no GPU adapter ({err})");
            None
        }
    }
}

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("shaderdeck-render-{}", std::process::id()))
        .join(test);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    path
}

struct Canvas {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Canvas {
    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test canvas"),
            size: wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

fn ctx(gpu: &HeadlessGpu) -> RenderCtx<'_> {
    RenderCtx::new(gpu.device(), gpu.queue(), FORMAT, (SIZE, SIZE))
}

/// Renders one frame into `canvas` and returns the draw count.
fn frame(
    gpu: &HeadlessGpu,
    pipeline: &mut Pipeline,
    textures: &mut GpuTextureCache,
    canvas: &Canvas,
    index: u64,
) -> usize {
    let mut encoder = gpu
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    let state = FrameState {
        frame_index: index,
        ..FrameState::at_rest((SIZE, SIZE))
    };
    let draws = {
        let mut target = RenderTarget::new(&mut encoder, &canvas.view);
        pipeline.render(&ctx(gpu), &mut target, textures, &state)
    };
    gpu.queue().submit(Some(encoder.finish()));
    draws
}

/// Reads the canvas back as tightly packed RGBA8.
fn read_back(gpu: &HeadlessGpu, canvas: &Canvas) -> Vec<u8> {
    // 64 px * 4 bytes already meets the 256-byte row alignment.
    let bytes_per_row = SIZE * 4;
    let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("test readback"),
        size: u64::from(bytes_per_row * SIZE),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &canvas.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue().submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    let mapped = loop {
        let _ = gpu.device().poll(wgpu::PollType::Poll);
        match rx.try_recv() {
            Ok(res) => break res,
            Err(mpsc::TryRecvError::Empty) => std::thread::yield_now(),
            Err(mpsc::TryRecvError::Disconnected) => panic!("map callback dropped"),
        }
    };
    mapped.unwrap();

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();
    data
}

fn assert_every_pixel(pixels: &[u8], expected: [u8; 4], tolerance: u8) {
    for (i, px) in pixels.chunks_exact(4).enumerate() {
        let close = px
            .iter()
            .zip(expected)
            .all(|(&got, want)| got.abs_diff(want) <= tolerance);
        assert!(close, "pixel {i}: got {px:?}, expected {expected:?}");
    }
}

fn image_only(path: PathBuf) -> PipelineConfig {
    PipelineConfig {
        image: Some(PassConfig::new(path)),
        ..PipelineConfig::default()
    }
}

#[test]
fn solid_red_image_pass_fills_the_target() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("solid_red");
    let config = image_only(write(&dir, "image.glsl", RED));

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let canvas = Canvas::new(gpu.device());

    assert_eq!(frame(&gpu, &mut pipeline, &mut textures, &canvas, 0), 1);
    assert_every_pixel(&read_back(&gpu, &canvas), [255, 0, 0, 255], 0);
}

#[test]
fn image_pass_samples_buffer_a() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("buffer_a");
    let config = PipelineConfig {
        buffer_a: Some(PassConfig::new(write(&dir, "a.glsl", GREEN))),
        image: Some(
            PassConfig::new(write(&dir, "image.glsl", PASSTHROUGH))
                .with_channel(ChannelConfig::new("buffer_a")),
        ),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let canvas = Canvas::new(gpu.device());

    assert_eq!(frame(&gpu, &mut pipeline, &mut textures, &canvas, 0), 2);
    assert_every_pixel(&read_back(&gpu, &canvas), [0, 255, 0, 255], 0);
}

#[test]
fn buffer_sampling_itself_sees_the_previous_frame() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("feedback");
    let accumulate = "void mainImage(out vec4 c, in vec2 p) {
        vec4 prev = texture(iChannel0, p / iResolution.xy);
        c = vec4(prev.r + 0.25, 0.0, 0.0, 1.0);
    }";
    let config = PipelineConfig {
        buffer_a: Some(
            PassConfig::new(write(&dir, "a.glsl", accumulate))
                .with_channel(ChannelConfig::new("buffer_a")),
        ),
        image: Some(
            PassConfig::new(write(&dir, "image.glsl", PASSTHROUGH))
                .with_channel(ChannelConfig::new("buffer_a")),
        ),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let canvas = Canvas::new(gpu.device());

    // Frame 0 reads black (the front surface starts zeroed), frame 1 reads 0.25.
    frame(&gpu, &mut pipeline, &mut textures, &canvas, 0);
    frame(&gpu, &mut pipeline, &mut textures, &canvas, 1);
    assert_every_pixel(&read_back(&gpu, &canvas), [128, 0, 0, 255], 1);
}

#[test]
fn buffers_run_in_slot_order_before_image() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("order");
    let config = PipelineConfig {
        buffer_d: Some(PassConfig::new(write(&dir, "d.glsl", RED))),
        buffer_b: Some(PassConfig::new(write(&dir, "b.glsl", RED))),
        image: Some(PassConfig::new(write(&dir, "image.glsl", BLUE))),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let kinds: Vec<PassKind> = pipeline.passes().map(|p| p.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            PassKind::Buffer(BufferSlot::B),
            PassKind::Buffer(BufferSlot::D),
            PassKind::Image
        ]
    );

    let canvas = Canvas::new(gpu.device());
    assert_eq!(frame(&gpu, &mut pipeline, &mut textures, &canvas, 0), 3);
    assert_every_pixel(&read_back(&gpu, &canvas), [0, 0, 255, 255], 0);
}

#[test]
fn common_source_is_visible_to_every_pass() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("common");
    let config = PipelineConfig {
        common: Some(CommonConfig {
            path: write(&dir, "common.glsl", "vec4 tint() { return vec4(0.0, 0.0, 1.0, 1.0); }"),
        }),
        image: Some(PassConfig::new(write(
            &dir,
            "image.glsl",
            "void mainImage(out vec4 c, in vec2 p) { c = tint(); }",
        ))),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    assert!(pipeline.common_source().contains("tint"));

    let canvas = Canvas::new(gpu.device());
    frame(&gpu, &mut pipeline, &mut textures, &canvas, 0);
    assert_every_pixel(&read_back(&gpu, &canvas), [0, 0, 255, 255], 0);
}

#[test]
fn compile_error_aborts_init_with_diagnostic() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("compile_error");
    let config = image_only(write(
        &dir,
        "image.glsl",
        "void mainImage(out vec4 c, in vec2 p) { c = undefined_thing; }",
    ));

    let mut textures = GpuTextureCache::new();
    match Pipeline::new(&ctx(&gpu), &mut textures, &config) {
        Err(PipelineError::Shader {
            pass,
            source: ShaderError::Compile { log },
        }) => {
            assert_eq!(pass, "Image");
            assert!(!log.is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken shader built"),
    }
}

#[test]
fn missing_channel_file_names_the_path() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("missing_channel");
    let missing = dir.join("nope.png");
    let config = PipelineConfig {
        image: Some(
            PassConfig::new(write(&dir, "image.glsl", PASSTHROUGH))
                .with_channel(ChannelConfig::new(missing.clone())),
        ),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    match Pipeline::new(&ctx(&gpu), &mut textures, &config) {
        Err(PipelineError::Texture {
            unit,
            source: TextureLoadError::NotFound { path, .. },
            ..
        }) => {
            assert_eq!(unit, 0);
            assert_eq!(path, missing);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("pipeline built with a missing channel"),
    }
}

#[test]
fn config_without_image_pass_is_rejected() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("no_image");
    let config = PipelineConfig {
        buffer_a: Some(PassConfig::new(write(&dir, "a.glsl", RED))),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    assert!(matches!(
        Pipeline::new(&ctx(&gpu), &mut textures, &config),
        Err(PipelineError::MissingImagePass)
    ));
}

#[test]
fn reload_keeps_last_good_program_on_error() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("reload");
    let image = write(&dir, "image.glsl", RED);
    let config = image_only(image.clone());

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let canvas = Canvas::new(gpu.device());

    std::fs::write(&image, "void mainImage(out vec4 c, in vec2 p) { c = ; }").unwrap();
    let report = pipeline.reload(&ctx(&gpu), &mut textures, &config);
    assert_eq!(report.failed, 1);
    assert!(!report.is_clean());

    frame(&gpu, &mut pipeline, &mut textures, &canvas, 0);
    assert_every_pixel(&read_back(&gpu, &canvas), [255, 0, 0, 255], 0);

    std::fs::write(&image, BLUE).unwrap();
    let report = pipeline.reload(&ctx(&gpu), &mut textures, &config);
    assert!(report.is_clean());
    assert_eq!(report.rebuilt, 1);

    frame(&gpu, &mut pipeline, &mut textures, &canvas, 1);
    assert_every_pixel(&read_back(&gpu, &canvas), [0, 0, 255, 255], 0);
}

#[test]
fn reload_adds_and_removes_buffers() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("reload_buffers");
    let image = write(&dir, "image.glsl", RED);
    let mut config = image_only(image);

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    assert_eq!(pipeline.pass_count(), 1);

    config.buffer_c = Some(PassConfig::new(write(&dir, "c.glsl", GREEN)));
    let report = pipeline.reload(&ctx(&gpu), &mut textures, &config);
    assert_eq!(report.rebuilt, 2);
    assert_eq!(pipeline.pass_count(), 2);

    config.buffer_c = None;
    let report = pipeline.reload(&ctx(&gpu), &mut textures, &config);
    assert_eq!(report.removed, 1);
    assert_eq!(pipeline.pass_count(), 1);

    pipeline.teardown(&mut textures);
}

#[test]
fn image_failure_stops_init_before_buffers_are_read() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("init_short_circuit");
    let config = PipelineConfig {
        buffer_a: Some(PassConfig::new(dir.join("does_not_exist.glsl"))),
        image: Some(PassConfig::new(write(
            &dir,
            "image.glsl",
            "void mainImage(out vec4 c, in vec2 p) { c = vec4(1.0) +; }",
        ))),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    match Pipeline::new(&ctx(&gpu), &mut textures, &config) {
        Err(PipelineError::Shader { pass, .. }) => assert_eq!(pass, "Image"),
        Err(other) => panic!("Buffer A was attempted after Image failed: {other}"),
        Ok(_) => panic!("broken shader built"),
    }
    assert!(textures.is_empty());
}

const DOUBLES: &str =
    "void mainImage(out vec4 c, in vec2 p) { double d = double(p.x); c = vec4(float(d)); }";

#[test]
fn shader_needing_missing_device_features_is_a_shader_error() {
    let Some(gpu) = gpu() else { return };
    if gpu.device().features().contains(wgpu::Features::SHADER_F64) {
        eprintln!("skipping: device supports f64");
        return;
    }
    let dir = scratch_dir("device_features");

    let mut textures = GpuTextureCache::new();
    let config = image_only(write(&dir, "doubles.glsl", DOUBLES));
    match Pipeline::new(&ctx(&gpu), &mut textures, &config) {
        Err(PipelineError::Shader { pass, source }) => {
            assert_eq!(pass, "Image");
            assert!(!source.log().is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("f64 shader built without SHADER_F64"),
    }

    let image = write(&dir, "image.glsl", RED);
    let config = image_only(image.clone());
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let canvas = Canvas::new(gpu.device());

    std::fs::write(&image, DOUBLES).unwrap();
    let report = pipeline.reload(&ctx(&gpu), &mut textures, &config);
    assert_eq!(report.failed, 1);

    frame(&gpu, &mut pipeline, &mut textures, &canvas, 0);
    assert_every_pixel(&read_back(&gpu, &canvas), [255, 0, 0, 255], 0);
}

fn write_wide_png(dir: &Path, width: u32) -> PathBuf {
    let path = dir.join("wide.png");
    image::RgbaImage::from_pixel(width, 1, image::Rgba([255, 255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

#[test]
fn channel_larger_than_the_device_limit_is_a_texture_error() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("oversized_channel");
    let max = gpu.device().limits().max_texture_dimension_2d;
    let wide = write_wide_png(&dir, max + 1);

    let image = write(&dir, "image.glsl", RED);
    let with_wide = PipelineConfig {
        image: Some(PassConfig::new(image.clone()).with_channel(ChannelConfig::new(wide.clone()))),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    match Pipeline::new(&ctx(&gpu), &mut textures, &with_wide) {
        Err(PipelineError::Texture {
            pass,
            unit,
            source: TextureLoadError::Unsupported { path, .. },
        }) => {
            assert_eq!(pass, "Image");
            assert_eq!(unit, 0);
            assert_eq!(path, wide);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("pipeline built with an oversized channel"),
    }

    // On reload the channel is skipped and the pass still builds.
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &image_only(image)).unwrap();
    let report = pipeline.reload(&ctx(&gpu), &mut textures, &with_wide);
    assert_eq!(report.skipped_channels, 1);
    assert_eq!(report.rebuilt, 1);
    assert!(report.is_clean());

    let canvas = Canvas::new(gpu.device());
    frame(&gpu, &mut pipeline, &mut textures, &canvas, 0);
    assert_every_pixel(&read_back(&gpu, &canvas), [255, 0, 0, 255], 0);
}

#[test]
fn repeated_frames_keep_feedback_correct() {
    let Some(gpu) = gpu() else { return };
    let dir = scratch_dir("cached_bind_groups");
    let accumulate = "void mainImage(out vec4 c, in vec2 p) {
        vec4 prev = texture(iChannel0, p / iResolution.xy);
        c = vec4(min(prev.r + 0.125, 1.0), 0.0, 0.0, 1.0);
    }";
    let config = PipelineConfig {
        buffer_a: Some(
            PassConfig::new(write(&dir, "a.glsl", accumulate))
                .with_channel(ChannelConfig::new("buffer_a")),
        ),
        image: Some(
            PassConfig::new(write(&dir, "image.glsl", PASSTHROUGH))
                .with_channel(ChannelConfig::new("buffer_a")),
        ),
        ..PipelineConfig::default()
    };

    let mut textures = GpuTextureCache::new();
    let mut pipeline = Pipeline::new(&ctx(&gpu), &mut textures, &config).unwrap();
    let canvas = Canvas::new(gpu.device());

    // Bind groups are reused across frames; each frame must still see the
    // previous one. Frame n writes 0.125 * (n + 1).
    for index in 0..4 {
        frame(&gpu, &mut pipeline, &mut textures, &canvas, index);
    }
    assert_every_pixel(&read_back(&gpu, &canvas), [128, 0, 0, 255], 1);
}
