use std::fmt;

/// Kind of an [`Event`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventType {
    KeyPress,
    KeyRelease,
    KeyRepeat,
    /// Committed character; `id` is the Unicode scalar value.
    KeyChar,
    MousePress,
    MouseRelease,
    MouseMove,
    MouseWheel,
    WindowSize,
    WindowFocus,
    WindowIconify,
    TouchDown,
    TouchUp,
    TouchMove,
    TextInput,
    TextCancel,
}

/// Platform-agnostic input event.
///
/// Field meaning depends on `kind`:
/// - key events: `id` is a [`Key`] code
/// - mouse press/release: `id` is a [`MouseButton`] index, `x`/`y` the pointer
/// - mouse move: `x`/`y` in physical pixels, top-left origin
/// - mouse wheel: `x`/`y` in lines
/// - window size: `x`/`y` are the new width and height
/// - window focus / iconify: `id` is `1` or `0`
/// - touch events: `id` is the finger slot
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Event {
    pub kind: EventType,
    pub id: i32,
    pub x: i32,
    pub y: i32,
}

impl Event {
    #[inline]
    pub const fn new(kind: EventType, id: i32, x: i32, y: i32) -> Self {
        Self { kind, id, x, y }
    }

    /// Key code for key events.
    pub fn key(&self) -> Option<Key> {
        match self.kind {
            EventType::KeyPress | EventType::KeyRelease | EventType::KeyRepeat => {
                Key::from_code(self.id)
            }
            _ => None,
        }
    }

    /// Character for `KeyChar` events.
    pub fn char(&self) -> Option<char> {
        match self.kind {
            EventType::KeyChar => u32::try_from(self.id).ok().and_then(char::from_u32),
            _ => None,
        }
    }
}

/// Mouse button index carried in `Event::id`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum MouseButton {
    Left = 0,
    Right = 1,
    Middle = 2,
}

impl MouseButton {
    #[inline]
    pub const fn id(self) -> i32 {
        self as i32
    }
}

macro_rules! keys {
    ($($name:ident),* $(,)?) => {
        /// Keyboard key codes, dense from `0` to [`Key::COUNT`].
        ///
        /// Codes follow US layout physical positions.
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(i32)]
        pub enum Key {
            $($name,)*
        }

        impl Key {
            const ALL: &'static [Key] = &[$(Key::$name,)*];

            /// Number of key codes; valid codes are `0..COUNT`.
            pub const COUNT: usize = Self::ALL.len();

            pub fn from_code(code: i32) -> Option<Key> {
                usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
            }

            #[inline]
            pub const fn code(self) -> i32 {
                self as i32
            }
        }
    };
}

keys! {
    Space, Apostrophe, Comma, Minus, Period, Slash,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Semicolon, Equal,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    LeftBracket, Backslash, RightBracket, GraveAccent, World1, World2,
    Escape, Enter, Tab, Backspace, Insert, Delete,
    Right, Left, Down, Up, PageUp, PageDown, Home, End,
    CapsLock, ScrollLock, NumLock, PrintScreen, Pause,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12, F13,
    F14, F15, F16, F17, F18, F19, F20, F21, F22, F23, F24, F25,
    Kp0, Kp1, Kp2, Kp3, Kp4, Kp5, Kp6, Kp7, Kp8, Kp9,
    KpDecimal, KpDivide, KpMultiply, KpSubtract, KpAdd, KpEnter, KpEqual,
    LeftShift, LeftControl, LeftAlt, LeftSuper,
    RightShift, RightControl, RightAlt, RightSuper,
    Menu, Back, MediaPlayPause,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_are_dense() {
        for i in 0..Key::COUNT {
            let key = Key::from_code(i as i32).unwrap();
            assert_eq!(key.code(), i as i32);
        }
        assert_eq!(Key::from_code(Key::COUNT as i32), None);
        assert_eq!(Key::from_code(-1), None);
    }

    #[test]
    fn event_accessors_check_kind() {
        let press = Event::new(EventType::KeyPress, Key::Escape.code(), 0, 0);
        assert_eq!(press.key(), Some(Key::Escape));
        assert_eq!(press.char(), None);

        let ch = Event::new(EventType::KeyChar, 'é' as i32, 0, 0);
        assert_eq!(ch.char(), Some('é'));
        assert_eq!(ch.key(), None);
    }
}
