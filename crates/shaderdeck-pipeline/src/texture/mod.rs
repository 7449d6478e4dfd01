//! Channel textures: cache, decoding, GPU storage and samplers.

mod cache;
mod decode;
mod gpu;
mod sampler;
mod source;

pub use cache::{TextureAllocator, TextureCache, TextureHandle};
pub use decode::{decode_file, DecodedImage};
pub use gpu::{
    GpuAllocator, GpuTexture, ImageTexture, RenderTargetTexture, SampleKey, IMAGE_FORMAT,
    RENDER_TARGET_FORMAT,
};
pub use sampler::{sampler_descriptor, SamplerCache};
pub use source::{BufferSlot, TextureSource};
