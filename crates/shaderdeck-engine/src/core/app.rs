use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the studio (or any other driver).
pub trait App {
    /// Called for raw window events, before the runtime's own handling.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once after the event loop has stopped.
    ///
    /// An error returned here becomes the result of `Runtime::run`, which is
    /// how an application reports a fatal failure raised inside a frame.
    fn on_exit(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
