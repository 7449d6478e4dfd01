/// Keyboard key, by physical position.
///
/// Function keys are numbered from 1. Keys the studio does not bind keep
/// the platform key code in `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Function(u8),
    Other(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Press or release of a key or button.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transition {
    Pressed,
    Released,
}

/// Platform-agnostic input event.
///
/// Pointer coordinates are physical pixels from the window's top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Focused(bool),
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    Button { button: MouseButton, transition: Transition },
    Key { key: Key, transition: Transition, repeat: bool },
}
