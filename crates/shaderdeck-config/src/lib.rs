//! Shaderdeck configuration.
//!
//! Deserializes the PascalCase JSON file describing window size, passes and
//! channel bindings, and normalizes the single-shader and multi-pass layouts.

mod app;
mod channel;
mod error;
mod load;

pub use app::{AppConfig, CommonConfig, PassConfig, PipelineConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use channel::{ChannelConfig, ChannelType, Filter, Wrap, MAX_CHANNELS};
pub use error::{ConfigLoadError, UnknownCode};
