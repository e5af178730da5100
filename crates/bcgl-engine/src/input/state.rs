use super::types::{Event, EventType, Key, MouseButton};

/// Number of tracked mouse buttons.
pub const MAX_MOUSE_BUTTONS: usize = 8;

/// Number of tracked touch slots.
pub const MAX_TOUCHES: usize = 10;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TouchPoint {
    pub down: bool,
    pub x: i32,
    pub y: i32,
}

/// Polled input state for the window.
///
/// Updated from pulled [`Event`]s via [`apply_event`](Self::apply_event).
/// Wheel and mouse deltas are per-frame values cleared by
/// [`reset_frame`](Self::reset_frame).
#[derive(Debug, Clone)]
pub struct InputState {
    mouse_x: i32,
    mouse_y: i32,
    mouse_dx: i32,
    mouse_dy: i32,
    wheel: i32,
    buttons: [bool; MAX_MOUSE_BUTTONS],
    keys: [bool; Key::COUNT],
    touches: [TouchPoint; MAX_TOUCHES],

    pub width: i32,
    pub height: i32,
    pub focused: bool,
    pub iconified: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            mouse_x: 0,
            mouse_y: 0,
            mouse_dx: 0,
            mouse_dy: 0,
            wheel: 0,
            buttons: [false; MAX_MOUSE_BUTTONS],
            keys: [false; Key::COUNT],
            touches: [TouchPoint::default(); MAX_TOUCHES],
            width: 0,
            height: 0,
            focused: true,
            iconified: false,
        }
    }
}

impl InputState {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn apply_event(&mut self, ev: &Event) {
        match ev.kind {
            EventType::MouseMove => {
                self.mouse_dx = ev.x - self.mouse_x;
                self.mouse_dy = ev.y - self.mouse_y;
                self.mouse_x = ev.x;
                self.mouse_y = ev.y;
            }
            EventType::MousePress | EventType::MouseRelease => {
                if let Some(b) = slot(&mut self.buttons, ev.id) {
                    *b = ev.kind == EventType::MousePress;
                }
            }
            EventType::MouseWheel => {
                self.wheel = ev.y;
            }
            EventType::KeyPress | EventType::KeyRelease => {
                if let Some(k) = slot(&mut self.keys, ev.id) {
                    *k = ev.kind == EventType::KeyPress;
                }
            }
            EventType::WindowSize => {
                self.width = ev.x;
                self.height = ev.y;
            }
            EventType::WindowFocus => {
                self.focused = ev.id != 0;
                if !self.focused {
                    // Releases may never arrive once focus is gone.
                    self.keys = [false; Key::COUNT];
                    self.buttons = [false; MAX_MOUSE_BUTTONS];
                }
            }
            EventType::WindowIconify => {
                self.iconified = ev.id != 0;
            }
            EventType::TouchDown => {
                if let Some(t) = slot(&mut self.touches, ev.id) {
                    *t = TouchPoint { down: true, x: ev.x, y: ev.y };
                }
            }
            EventType::TouchUp => {
                if let Some(t) = slot(&mut self.touches, ev.id) {
                    t.down = false;
                }
            }
            EventType::TouchMove => {
                if let Some(t) = slot(&mut self.touches, ev.id) {
                    t.x = ev.x;
                    t.y = ev.y;
                }
            }
            EventType::KeyRepeat
            | EventType::KeyChar
            | EventType::TextInput
            | EventType::TextCancel => {}
        }
    }

    /// Clears wheel and mouse deltas. Called once per frame.
    pub fn reset_frame(&mut self) {
        self.wheel = 0;
        self.mouse_dx = 0;
        self.mouse_dy = 0;
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys[key.code() as usize]
    }

    #[inline]
    pub fn mouse_x(&self) -> i32 {
        self.mouse_x
    }

    #[inline]
    pub fn mouse_y(&self) -> i32 {
        self.mouse_y
    }

    #[inline]
    pub fn mouse_delta_x(&self) -> i32 {
        self.mouse_dx
    }

    #[inline]
    pub fn mouse_delta_y(&self) -> i32 {
        self.mouse_dy
    }

    #[inline]
    pub fn mouse_wheel(&self) -> i32 {
        self.wheel
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.buttons[button.id() as usize]
    }

    pub fn touch(&self, id: usize) -> Option<TouchPoint> {
        self.touches.get(id).copied()
    }

    pub fn is_touch_down(&self, id: usize) -> bool {
        self.touch(id).is_some_and(|t| t.down)
    }

    pub fn touch_x(&self, id: usize) -> i32 {
        self.touch(id).map_or(0, |t| t.x)
    }

    pub fn touch_y(&self, id: usize) -> i32 {
        self.touch(id).map_or(0, |t| t.y)
    }
}

fn slot<T>(table: &mut [T], id: i32) -> Option<&mut T> {
    let i = usize::try_from(id).ok()?;
    let len = table.len();
    let entry = table.get_mut(i);
    if entry.is_none() {
        log::debug!("input id {id} outside table of {len}");
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventType, id: i32, x: i32, y: i32) -> Event {
        Event::new(kind, id, x, y)
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    #[test]
    fn mouse_move_tracks_delta_until_reset() {
        let mut s = InputState::new(640, 480);
        s.apply_event(&ev(EventType::MouseMove, 0, 10, 20));
        s.apply_event(&ev(EventType::MouseMove, 0, 15, 18));
        assert_eq!((s.mouse_x(), s.mouse_y()), (15, 18));
        assert_eq!((s.mouse_delta_x(), s.mouse_delta_y()), (5, -2));

        s.reset_frame();
        assert_eq!((s.mouse_delta_x(), s.mouse_delta_y()), (0, 0));
        assert_eq!(s.mouse_x(), 15);
    }

    #[test]
    fn buttons_and_wheel() {
        let mut s = InputState::default();
        s.apply_event(&ev(EventType::MousePress, MouseButton::Right.id(), 0, 0));
        s.apply_event(&ev(EventType::MouseWheel, 0, 0, -3));
        assert!(s.is_mouse_down(MouseButton::Right));
        assert!(!s.is_mouse_down(MouseButton::Left));
        assert_eq!(s.mouse_wheel(), -3);

        s.apply_event(&ev(EventType::MouseRelease, MouseButton::Right.id(), 0, 0));
        s.reset_frame();
        assert!(!s.is_mouse_down(MouseButton::Right));
        assert_eq!(s.mouse_wheel(), 0);
    }

    // ── keys & window ─────────────────────────────────────────────────────

    #[test]
    fn key_table_and_focus_loss() {
        let mut s = InputState::default();
        s.apply_event(&ev(EventType::KeyPress, Key::W.code(), 0, 0));
        assert!(s.is_key_down(Key::W));

        s.apply_event(&ev(EventType::WindowFocus, 0, 0, 0));
        assert!(!s.focused);
        assert!(!s.is_key_down(Key::W));
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let mut s = InputState::default();
        s.apply_event(&ev(EventType::KeyPress, -1, 0, 0));
        s.apply_event(&ev(EventType::KeyPress, Key::COUNT as i32, 0, 0));
        s.apply_event(&ev(EventType::MousePress, 99, 0, 0));
        s.apply_event(&ev(EventType::TouchDown, MAX_TOUCHES as i32, 1, 1));
        assert!(s.touch(MAX_TOUCHES).is_none());
    }

    #[test]
    fn window_size_updates_dimensions() {
        let mut s = InputState::new(1, 1);
        s.apply_event(&ev(EventType::WindowSize, 0, 800, 600));
        assert_eq!((s.width, s.height), (800, 600));
    }

    // ── touch ─────────────────────────────────────────────────────────────

    #[test]
    fn touch_slots() {
        let mut s = InputState::default();
        s.apply_event(&ev(EventType::TouchDown, 3, 5, 6));
        s.apply_event(&ev(EventType::TouchMove, 3, 7, 8));
        assert!(s.is_touch_down(3));
        assert_eq!((s.touch_x(3), s.touch_y(3)), (7, 8));

        s.apply_event(&ev(EventType::TouchUp, 3, 7, 8));
        assert!(!s.is_touch_down(3));
    }
}
