use std::path::Path;

use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::error::TextureLoadError;

use super::cache::TextureAllocator;
use super::decode::DecodedImage;
use super::source::BufferSlot;

/// Storage format of buffer-pass outputs.
pub const RENDER_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format of uploaded image files (raw bytes, no sRGB decode).
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A cached texture on the GPU.
pub enum GpuTexture {
    Image(ImageTexture),
    Target(RenderTargetTexture),
}

impl GpuTexture {
    /// View to sample from, or `None` for a render target without storage.
    pub fn sample_view(&self) -> Option<&wgpu::TextureView> {
        match self {
            Self::Image(img) => Some(&img.view),
            Self::Target(rt) => rt.read_view(),
        }
    }

    /// Changes whenever [`GpuTexture::sample_view`] would return a
    /// different view; `None` when there is nothing to sample.
    pub fn sample_key(&self) -> Option<SampleKey> {
        match self {
            Self::Image(_) => Some(SampleKey::default()),
            Self::Target(rt) => rt.sample_key(),
        }
    }

    pub fn as_target_mut(&mut self) -> Option<&mut RenderTargetTexture> {
        match self {
            Self::Target(rt) => Some(rt),
            Self::Image(_) => None,
        }
    }

    pub fn as_target(&self) -> Option<&RenderTargetTexture> {
        match self {
            Self::Target(rt) => Some(rt),
            Self::Image(_) => None,
        }
    }
}

/// Storage generation and front index of a sampled texture.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SampleKey {
    pub generation: u64,
    pub front: usize,
}

/// Immutable texture uploaded from an image file, with a full mip chain.
pub struct ImageTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ImageTexture {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// 1x1 opaque black, bound to channels that have nothing to sample.
    pub fn fallback(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("shaderdeck fallback channel"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: IMAGE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &[0, 0, 0, 255],
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
        }
    }
}

struct TargetSurface {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Ping-pong pair backing one buffer pass.
///
/// The pass draws into the back surface while channels sample the front
/// one; [`RenderTargetTexture::swap`] publishes the new frame. A pass that
/// samples itself therefore sees its previous frame, and later passes see
/// the current one.
pub struct RenderTargetTexture {
    slot: BufferSlot,
    size: (u32, u32),
    surfaces: Option<[TargetSurface; 2]>,
    front: usize,
    /// Bumped on every (re)allocation and release.
    generation: u64,
}

impl RenderTargetTexture {
    pub fn placeholder(slot: BufferSlot) -> Self {
        Self {
            slot,
            size: (0, 0),
            surfaces: None,
            front: 0,
            generation: 0,
        }
    }

    pub fn sample_key(&self) -> Option<SampleKey> {
        self.surfaces.as_ref().map(|_| SampleKey {
            generation: self.generation,
            front: self.front,
        })
    }

    /// (Re)creates both surfaces when `size` differs from the current one.
    /// Contents start zeroed. Returns `true` if storage was (re)allocated.
    pub fn ensure_size(&mut self, device: &wgpu::Device, size: (u32, u32)) -> bool {
        if size.0 == 0 || size.1 == 0 {
            return false;
        }
        if self.surfaces.is_some() && self.size == size {
            return false;
        }

        let slot = self.slot;
        let make = |side: &str| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("shaderdeck {slot} {side}")),
                size: wgpu::Extent3d {
                    width: size.0,
                    height: size.1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: RENDER_TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            TargetSurface {
                _texture: texture,
                view,
            }
        };

        log::debug!("{slot}: render target sized to {}x{}", size.0, size.1);
        self.surfaces = Some([make("ping"), make("pong")]);
        self.size = size;
        self.front = 0;
        self.generation += 1;
        true
    }

    /// Last completed frame.
    pub fn read_view(&self) -> Option<&wgpu::TextureView> {
        self.surfaces.as_ref().map(|s| &s[self.front].view)
    }

    /// Surface the owning pass draws into this frame.
    pub fn write_view(&self) -> Option<&wgpu::TextureView> {
        self.surfaces.as_ref().map(|s| &s[1 - self.front].view)
    }

    pub fn swap(&mut self) {
        if self.surfaces.is_some() {
            self.front = 1 - self.front;
        }
    }

    /// Releases storage; the next `ensure_size` reallocates.
    pub fn release(&mut self) {
        self.surfaces = None;
        self.size = (0, 0);
        self.front = 0;
        self.generation += 1;
    }
}

/// Rejects images with a side longer than the device allows.
fn check_extent(path: &Path, width: u32, height: u32, max: u32) -> Result<(), TextureLoadError> {
    if width > max || height > max {
        return Err(TextureLoadError::Unsupported {
            path: path.to_path_buf(),
            reason: format!("{width}x{height} exceeds the device limit of {max} texels per side"),
        });
    }
    Ok(())
}

/// [`TextureAllocator`] backed by a wgpu device.
pub struct GpuAllocator<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> GpuAllocator<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl TextureAllocator for GpuAllocator<'_> {
    type Texture = GpuTexture;

    fn upload(
        &mut self,
        path: &Path,
        image: &DecodedImage,
    ) -> Result<GpuTexture, TextureLoadError> {
        let max = self.device.limits().max_texture_dimension_2d;
        check_extent(path, image.width(), image.height(), max)?;

        let label = path.display().to_string();
        let texture = self.device.create_texture_with_data(
            self.queue,
            &wgpu::TextureDescriptor {
                label: Some(&label),
                size: wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: image.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: IMAGE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &image.mip_chain(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(GpuTexture::Image(ImageTexture {
            _texture: texture,
            view,
        }))
    }

    fn render_target(&mut self, slot: BufferSlot) -> GpuTexture {
        GpuTexture::Target(RenderTargetTexture::placeholder(slot))
    }
}
