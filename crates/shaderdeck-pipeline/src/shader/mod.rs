//! Pass programs.
//!
//! A pass source only defines `mainImage`; the template wraps it with the
//! fixed interface (uniforms, channels, output) and an entry point. The
//! result is checked with naga against the device's features before wgpu
//! sees it, and module and pipeline creation run inside a validation error
//! scope, so diagnostics come back as [`crate::ShaderError`] instead of a
//! device error.

mod compile;
mod program;
mod template;

pub use compile::{capabilities_for, check_glsl};
pub use program::{Program, ProgramBuilder};
pub use template::{
    assemble, sampler_binding, texture_binding, AssembledShader, PassTarget, Section,
    CHANNEL_COUNT, UNIFORM_BINDING, VERTEX_SHADER,
};
