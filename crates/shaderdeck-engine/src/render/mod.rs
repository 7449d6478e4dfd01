//! Renderer-facing handles.
//!
//! A frame is recorded through a [`RenderCtx`] (device, queue, target format,
//! drawable size) and a [`RenderTarget`] (encoder + color view). The surface
//! and offscreen textures look the same to consumers of these types.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
