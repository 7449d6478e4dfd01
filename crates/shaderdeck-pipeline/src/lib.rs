//! Multi-pass fragment shader pipeline.
//!
//! Up to four offscreen buffer passes (A-D) run before the Image pass, which
//! draws to the window. Every pass is a `mainImage` fragment shader over a
//! full-screen quad; channels sample image files or the output of a buffer.

mod error;
mod frame;
mod pass;
mod pipeline;
mod quad;

pub mod shader;
pub mod texture;

pub use error::{PipelineError, ShaderError, TextureLoadError};
pub use frame::{FrameState, MouseTracker, ShaderInputs};
pub use pass::{ChannelBinding, Pass, PassKind};
pub use pipeline::{GpuTextureCache, Pipeline, ReloadReport};
pub use quad::{Quad, QuadVertex, QUAD_INDICES, QUAD_VERTICES};
