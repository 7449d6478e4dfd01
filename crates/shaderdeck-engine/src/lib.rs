//! Shaderdeck engine crate.
//!
//! Platform + GPU runtime: window and event loop, surface management,
//! input translation, frame timing and logging.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
