//! Input subsystem.
//!
//! Tracks the pointer and the keys/buttons the studio reacts to. The public
//! types do not expose winit; the runtime translates through
//! `platform::winit`.

mod frame;
pub(crate) mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{InputEvent, Key, MouseButton, Transition};
