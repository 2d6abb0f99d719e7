use std::fmt;

/// Physical keyboard key.
///
/// Platform backends map their scancodes onto these variants. Keys without a
/// variant are reported as `Unknown` with the backend's raw code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyCode {
    Space,
    Apostrophe,
    Comma,
    Minus,
    Period,
    Slash,
    Semicolon,
    Equal,
    LeftBracket,
    Backslash,
    RightBracket,
    GraveAccent,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Escape,
    Enter,
    Tab,
    Backspace,
    Insert,
    Delete,
    Right,
    Left,
    Down,
    Up,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Kp0, Kp1, Kp2, Kp3, Kp4,
    Kp5, Kp6, Kp7, Kp8, Kp9,
    KpDecimal,
    KpDivide,
    KpMultiply,
    KpSubtract,
    KpAdd,
    KpEnter,

    LeftShift,
    LeftControl,
    LeftAlt,
    LeftSuper,
    RightShift,
    RightControl,
    RightAlt,
    RightSuper,
    Menu,

    Unknown(u32),
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Mouse button index.
///
/// Buttons are numbered 0 to 7. The first three have the usual names.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const BUTTON_0: Self = Self(0);
    pub const BUTTON_1: Self = Self(1);
    pub const BUTTON_2: Self = Self(2);
    pub const BUTTON_3: Self = Self(3);
    pub const BUTTON_4: Self = Self(4);
    pub const BUTTON_5: Self = Self(5);
    pub const BUTTON_6: Self = Self(6);
    pub const BUTTON_7: Self = Self(7);

    pub const LEFT: Self = Self::BUTTON_0;
    pub const RIGHT: Self = Self::BUTTON_1;
    pub const MIDDLE: Self = Self::BUTTON_2;
    pub const LAST: Self = Self::BUTTON_7;

    /// Returns `None` for indices past [`MouseButton::LAST`].
    pub const fn new(index: u8) -> Option<Self> {
        if index <= Self::LAST.0 { Some(Self(index)) } else { None }
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::LEFT => f.write_str("Left"),
            Self::RIGHT => f.write_str("Right"),
            Self::MIDDLE => f.write_str("Middle"),
            Self(n) => write!(f, "Button{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_buttons_alias_indices() {
        assert_eq!(MouseButton::LEFT.index(), 0);
        assert_eq!(MouseButton::RIGHT.index(), 1);
        assert_eq!(MouseButton::MIDDLE.index(), 2);
    }

    #[test]
    fn out_of_range_button_is_rejected() {
        assert_eq!(MouseButton::new(7), Some(MouseButton::BUTTON_7));
        assert_eq!(MouseButton::new(8), None);
    }

    #[test]
    fn display_uses_names_then_indices() {
        assert_eq!(MouseButton::LEFT.to_string(), "Left");
        assert_eq!(MouseButton::BUTTON_5.to_string(), "Button5");
        assert_eq!(KeyCode::W.to_string(), "W");
    }
}
