use bytemuck::{Pod, Zeroable};

/// Per-frame inputs sampled by the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameState {
    /// Seconds since the pipeline started or was last reloaded.
    pub elapsed: f32,
    pub frame_index: u64,
    /// Drawable size in physical pixels.
    pub size: (u32, u32),
    /// Cursor in physical pixels, top-left origin; `None` outside the window.
    pub cursor: Option<(f32, f32)>,
    pub primary_down: bool,
}

impl FrameState {
    /// A still frame at `t = 0` with no pointer.
    pub fn at_rest(size: (u32, u32)) -> Self {
        Self {
            elapsed: 0.0,
            frame_index: 0,
            size,
            cursor: None,
            primary_down: false,
        }
    }
}

/// Builds `iMouse` from successive frames.
///
/// While the primary button is held, `xy` follows the cursor (even past the
/// window edge) and `zw` holds the position captured at the press. While
/// released, `xy` only moves to cursor positions strictly inside the window
/// and `zw` is zero. Coordinates use a bottom-left origin like `fragCoord`.
#[derive(Debug, Default, Clone)]
pub struct MouseTracker {
    mouse: [f32; 4],
    held: bool,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, frame: &FrameState) -> [f32; 4] {
        let (width, height) = (frame.size.0 as f32, frame.size.1 as f32);

        if let Some((x, y)) = frame.cursor {
            let inside = x > 0.0 && y > 0.0 && x < width && y < height;
            if inside || frame.primary_down {
                self.mouse[0] = x;
                self.mouse[1] = height - y;
            }
        }

        match (frame.primary_down, self.held) {
            (true, false) => {
                self.mouse[2] = self.mouse[0];
                self.mouse[3] = self.mouse[1];
            }
            (false, _) => {
                self.mouse[2] = 0.0;
                self.mouse[3] = 0.0;
            }
            (true, true) => {}
        }
        self.held = frame.primary_down;

        self.mouse
    }
}

/// CPU mirror of the `ShaderInputs` uniform block (std140).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShaderInputs {
    pub resolution: [f32; 3],
    pub time: f32,
    pub mouse: [f32; 4],
    pub frame: i32,
    pub _pad: [i32; 3],
}

impl ShaderInputs {
    pub fn new(frame: &FrameState, mouse: [f32; 4]) -> Self {
        Self {
            resolution: [frame.size.0 as f32, frame.size.1 as f32, 1.0],
            time: frame.elapsed,
            mouse,
            frame: frame.frame_index.min(i32::MAX as u64) as i32,
            _pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    fn frame(cursor: Option<(f32, f32)>, down: bool) -> FrameState {
        FrameState {
            cursor,
            primary_down: down,
            ..FrameState::at_rest((200, 100))
        }
    }

    #[test]
    fn shader_inputs_follow_std140_layout() {
        assert_eq!(size_of::<ShaderInputs>(), 48);
        assert_eq!(offset_of!(ShaderInputs, resolution), 0);
        assert_eq!(offset_of!(ShaderInputs, time), 12);
        assert_eq!(offset_of!(ShaderInputs, mouse), 16);
        assert_eq!(offset_of!(ShaderInputs, frame), 32);
    }

    #[test]
    fn shader_inputs_carry_frame_state() {
        let f = FrameState {
            elapsed: 2.5,
            frame_index: 7,
            ..FrameState::at_rest((640, 360))
        };
        let u = ShaderInputs::new(&f, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(u.resolution, [640.0, 360.0, 1.0]);
        assert_eq!(u.time, 2.5);
        assert_eq!(u.frame, 7);
        assert_eq!(u.mouse, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn hover_tracks_position_with_zero_click() {
        let mut t = MouseTracker::new();
        assert_eq!(t.update(&frame(Some((10.0, 30.0)), false)), [10.0, 70.0, 0.0, 0.0]);
    }

    #[test]
    fn press_freezes_click_position_while_held() {
        let mut t = MouseTracker::new();
        t.update(&frame(Some((10.0, 10.0)), false));
        assert_eq!(t.update(&frame(Some((20.0, 10.0)), true)), [20.0, 90.0, 20.0, 90.0]);
        assert_eq!(t.update(&frame(Some((50.0, 40.0)), true)), [50.0, 60.0, 20.0, 90.0]);
        assert_eq!(t.update(&frame(Some((55.0, 40.0)), false)), [55.0, 60.0, 0.0, 0.0]);
    }

    #[test]
    fn leaving_the_window_keeps_last_position() {
        let mut t = MouseTracker::new();
        t.update(&frame(Some((30.0, 20.0)), false));
        assert_eq!(t.update(&frame(None, false)), [30.0, 80.0, 0.0, 0.0]);

        // Dragging outside keeps the press anchor.
        t.update(&frame(Some((5.0, 5.0)), true));
        assert_eq!(t.update(&frame(None, true)), [5.0, 95.0, 5.0, 95.0]);
    }

    #[test]
    fn released_cursor_outside_the_window_is_ignored() {
        let mut t = MouseTracker::new();
        t.update(&frame(Some((40.0, 30.0)), false));

        assert_eq!(t.update(&frame(Some((250.0, 130.0)), false)), [40.0, 70.0, 0.0, 0.0]);
        assert_eq!(t.update(&frame(Some((0.0, 50.0)), false)), [40.0, 70.0, 0.0, 0.0]);
        assert_eq!(t.update(&frame(Some((120.0, 100.0)), false)), [40.0, 70.0, 0.0, 0.0]);
    }

    #[test]
    fn drag_past_the_edge_is_followed_until_release() {
        let mut t = MouseTracker::new();
        t.update(&frame(Some((150.0, 50.0)), true));

        // Pointer capture keeps reporting positions outside the window.
        assert_eq!(t.update(&frame(Some((250.0, 130.0)), true)), [250.0, -30.0, 150.0, 50.0]);
        assert_eq!(t.update(&frame(Some((260.0, 130.0)), false)), [250.0, -30.0, 0.0, 0.0]);
    }
}
