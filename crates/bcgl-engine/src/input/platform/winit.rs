use winit::dpi::PhysicalPosition;
use winit::event::{
    ElementState, Ime, MouseButton as WinitMouseButton, MouseScrollDelta, Touch, TouchPhase,
    WindowEvent,
};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::input::{Event, EventType, Key, MAX_TOUCHES, MouseButton};

/// Pixels per wheel line for high-precision scroll devices.
const PIXELS_PER_LINE: f64 = 40.0;

/// Stateful translator from winit `WindowEvent`s to engine [`Event`]s.
///
/// Tracks the cursor (winit 0.30 does not report it with button events) and
/// maps touch ids onto the fixed touch slots.
#[derive(Debug, Default)]
pub struct WinitTranslator {
    cursor: (i32, i32),
    fingers: [Option<u64>; MAX_TOUCHES],
}

impl WinitTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates `event`, calling `emit` for each resulting engine event.
    ///
    /// Coordinates are physical pixels with a top-left origin.
    pub fn translate(&mut self, event: &WindowEvent, mut emit: impl FnMut(Event)) {
        match event {
            WindowEvent::Resized(size) => {
                emit(Event::new(
                    EventType::WindowSize,
                    0,
                    size.width as i32,
                    size.height as i32,
                ));
            }

            WindowEvent::Focused(f) => emit(Event::new(EventType::WindowFocus, *f as i32, 0, 0)),

            WindowEvent::Occluded(o) => {
                emit(Event::new(EventType::WindowIconify, *o as i32, 0, 0))
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = to_i32(*position);
                emit(Event::new(EventType::MouseMove, 0, self.cursor.0, self.cursor.1));
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_mouse_button(*button) else {
                    return;
                };
                let kind = match state {
                    ElementState::Pressed => EventType::MousePress,
                    ElementState::Released => EventType::MouseRelease,
                };
                emit(Event::new(kind, button.id(), self.cursor.0, self.cursor.1));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x.round() as i32, y.round() as i32),
                    MouseScrollDelta::PixelDelta(p) => (
                        (p.x / PIXELS_PER_LINE).round() as i32,
                        (p.y / PIXELS_PER_LINE).round() as i32,
                    ),
                };
                if x != 0 || y != 0 {
                    emit(Event::new(EventType::MouseWheel, 0, x, y));
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = map_key(event.physical_key) {
                    let kind = match (event.state, event.repeat) {
                        (ElementState::Pressed, false) => EventType::KeyPress,
                        (ElementState::Pressed, true) => EventType::KeyRepeat,
                        (ElementState::Released, _) => EventType::KeyRelease,
                    };
                    emit(Event::new(kind, key.code(), 0, 0));
                }

                if event.state == ElementState::Pressed {
                    if let Some(text) = &event.text {
                        text.chars()
                            .filter(|c| !c.is_control())
                            .for_each(|c| emit(Event::new(EventType::KeyChar, c as i32, 0, 0)));
                    }
                }
            }

            WindowEvent::Ime(ime) => match ime {
                Ime::Commit(text) => {
                    for c in text.chars() {
                        emit(Event::new(EventType::KeyChar, c as i32, 0, 0));
                    }
                }
                Ime::Enabled => emit(Event::new(EventType::TextInput, 0, 0, 0)),
                Ime::Disabled => emit(Event::new(EventType::TextCancel, 0, 0, 0)),
                Ime::Preedit(..) => {}
            },

            WindowEvent::Touch(touch) => self.translate_touch(touch, emit),

            _ => {}
        }
    }

    fn translate_touch(&mut self, touch: &Touch, mut emit: impl FnMut(Event)) {
        let (x, y) = to_i32(touch.location);

        let slot = match touch.phase {
            TouchPhase::Started => {
                let Some(free) = self.fingers.iter().position(Option::is_none) else {
                    log::warn!("touch ignored, all {MAX_TOUCHES} slots in use");
                    return;
                };
                self.fingers[free] = Some(touch.id);
                free
            }
            _ => {
                let Some(slot) = self.fingers.iter().position(|f| *f == Some(touch.id)) else {
                    return;
                };
                slot
            }
        };

        let kind = match touch.phase {
            TouchPhase::Started => EventType::TouchDown,
            TouchPhase::Moved => EventType::TouchMove,
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.fingers[slot] = None;
                EventType::TouchUp
            }
        };
        emit(Event::new(kind, slot as i32, x, y));
    }
}

fn to_i32(pos: PhysicalPosition<f64>) -> (i32, i32) {
    (pos.x.round() as i32, pos.y.round() as i32)
}

fn map_mouse_button(b: WinitMouseButton) -> Option<MouseButton> {
    match b {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Right => Some(MouseButton::Right),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

fn map_key(pk: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = pk else {
        return None;
    };

    let key = match code {
        KeyCode::Space => Key::Space,
        KeyCode::Quote => Key::Apostrophe,
        KeyCode::Comma => Key::Comma,
        KeyCode::Minus => Key::Minus,
        KeyCode::Period => Key::Period,
        KeyCode::Slash => Key::Slash,

        KeyCode::Digit0 => Key::Num0,
        KeyCode::Digit1 => Key::Num1,
        KeyCode::Digit2 => Key::Num2,
        KeyCode::Digit3 => Key::Num3,
        KeyCode::Digit4 => Key::Num4,
        KeyCode::Digit5 => Key::Num5,
        KeyCode::Digit6 => Key::Num6,
        KeyCode::Digit7 => Key::Num7,
        KeyCode::Digit8 => Key::Num8,
        KeyCode::Digit9 => Key::Num9,

        KeyCode::Semicolon => Key::Semicolon,
        KeyCode::Equal => Key::Equal,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::BracketLeft => Key::LeftBracket,
        KeyCode::Backslash => Key::Backslash,
        KeyCode::BracketRight => Key::RightBracket,
        KeyCode::Backquote => Key::GraveAccent,
        KeyCode::IntlBackslash => Key::World1,
        KeyCode::IntlRo => Key::World2,

        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::CapsLock => Key::CapsLock,
        KeyCode::ScrollLock => Key::ScrollLock,
        KeyCode::NumLock => Key::NumLock,
        KeyCode::PrintScreen => Key::PrintScreen,
        KeyCode::Pause => Key::Pause,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,
        KeyCode::F13 => Key::F13,
        KeyCode::F14 => Key::F14,
        KeyCode::F15 => Key::F15,
        KeyCode::F16 => Key::F16,
        KeyCode::F17 => Key::F17,
        KeyCode::F18 => Key::F18,
        KeyCode::F19 => Key::F19,
        KeyCode::F20 => Key::F20,
        KeyCode::F21 => Key::F21,
        KeyCode::F22 => Key::F22,
        KeyCode::F23 => Key::F23,
        KeyCode::F24 => Key::F24,
        KeyCode::F25 => Key::F25,

        KeyCode::Numpad0 => Key::Kp0,
        KeyCode::Numpad1 => Key::Kp1,
        KeyCode::Numpad2 => Key::Kp2,
        KeyCode::Numpad3 => Key::Kp3,
        KeyCode::Numpad4 => Key::Kp4,
        KeyCode::Numpad5 => Key::Kp5,
        KeyCode::Numpad6 => Key::Kp6,
        KeyCode::Numpad7 => Key::Kp7,
        KeyCode::Numpad8 => Key::Kp8,
        KeyCode::Numpad9 => Key::Kp9,
        KeyCode::NumpadDecimal => Key::KpDecimal,
        KeyCode::NumpadDivide => Key::KpDivide,
        KeyCode::NumpadMultiply => Key::KpMultiply,
        KeyCode::NumpadSubtract => Key::KpSubtract,
        KeyCode::NumpadAdd => Key::KpAdd,
        KeyCode::NumpadEnter => Key::KpEnter,
        KeyCode::NumpadEqual => Key::KpEqual,

        KeyCode::ShiftLeft => Key::LeftShift,
        KeyCode::ControlLeft => Key::LeftControl,
        KeyCode::AltLeft => Key::LeftAlt,
        KeyCode::SuperLeft => Key::LeftSuper,
        KeyCode::ShiftRight => Key::RightShift,
        KeyCode::ControlRight => Key::RightControl,
        KeyCode::AltRight => Key::RightAlt,
        KeyCode::SuperRight => Key::RightSuper,
        KeyCode::ContextMenu => Key::Menu,

        KeyCode::BrowserBack => Key::Back,
        KeyCode::MediaPlayPause => Key::MediaPlayPause,

        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_letters_and_modifiers() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)), Some(Key::Q));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ShiftRight)), Some(Key::RightShift));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Fn)), None);
    }

    #[test]
    fn only_three_mouse_buttons_are_tracked() {
        assert_eq!(map_mouse_button(WinitMouseButton::Middle), Some(MouseButton::Middle));
        assert_eq!(map_mouse_button(WinitMouseButton::Back), None);
    }
}
