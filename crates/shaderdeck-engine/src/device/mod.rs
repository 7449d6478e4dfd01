//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - surface-less devices for offscreen work

mod error;
mod gpu;
mod headless;
mod init;
mod surface;

pub use error::{GraphicsInitError, SurfaceErrorAction};
pub use gpu::{Gpu, GpuFrame};
pub use headless::HeadlessGpu;
pub use init::GpuInit;
