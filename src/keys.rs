//! Virtual-key codes and key decoding helpers

use crossterm::event::KeyCode;

use crate::core::device::Result;

pub const VK_BACK: u16 = 0x08;
pub const VK_TAB: u16 = 0x09;
pub const VK_RETURN: u16 = 0x0D;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;
pub const VK_PAUSE: u16 = 0x13;
pub const VK_CAPITAL: u16 = 0x14;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_SPACE: u16 = 0x20;
pub const VK_PRIOR: u16 = 0x21;
pub const VK_NEXT: u16 = 0x22;
pub const VK_END: u16 = 0x23;
pub const VK_HOME: u16 = 0x24;
pub const VK_LEFT: u16 = 0x25;
pub const VK_UP: u16 = 0x26;
pub const VK_RIGHT: u16 = 0x27;
pub const VK_DOWN: u16 = 0x28;
pub const VK_INSERT: u16 = 0x2D;
pub const VK_DELETE: u16 = 0x2E;
pub const VK_F1: u16 = 0x70;
pub const VK_F24: u16 = 0x87;

/// Runtime reader prefixes announcing an extended key
pub const EXTENDED_PREFIX_NUL: i32 = 0x00;
pub const EXTENDED_PREFIX_E0: i32 = 0xE0;

/// Added to the second unit of an extended key
pub const EXTENDED_KEY_BIAS: i32 = 0x100;

/// Combine runtime reader units into one key value.
///
/// `next` is only called when `first` is an extended-key prefix.
pub fn decode_runtime_key<F>(first: i32, next: F) -> Result<i32>
where
    F: FnOnce() -> Result<i32>,
{
    if first == EXTENDED_PREFIX_NUL || first == EXTENDED_PREFIX_E0 {
        Ok(next()? + EXTENDED_KEY_BIAS)
    } else {
        Ok(first)
    }
}

/// Whether a decoded runtime key came from an extended key
pub fn is_extended(key: i32) -> bool {
    key >= EXTENDED_KEY_BIAS
}

/// Asynchronous key state as reported by the console
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState(pub i16);

impl KeyState {
    /// High bit: the key is down right now
    pub fn is_down(self) -> bool {
        self.0 < 0
    }

    /// Low bit: pressed since the previous query for this key
    pub fn was_pressed(self) -> bool {
        self.0 & 0x0001 != 0
    }

    pub fn raw(self) -> i16 {
        self.0
    }
}

/// Map a virtual-key code to a crossterm key code
pub fn key_code_for(virtual_key: u16) -> Option<KeyCode> {
    let code = match virtual_key {
        VK_BACK => KeyCode::Backspace,
        VK_TAB => KeyCode::Tab,
        VK_RETURN => KeyCode::Enter,
        VK_PAUSE => KeyCode::Pause,
        VK_CAPITAL => KeyCode::CapsLock,
        VK_ESCAPE => KeyCode::Esc,
        VK_SPACE => KeyCode::Char(' '),
        VK_PRIOR => KeyCode::PageUp,
        VK_NEXT => KeyCode::PageDown,
        VK_END => KeyCode::End,
        VK_HOME => KeyCode::Home,
        VK_LEFT => KeyCode::Left,
        VK_UP => KeyCode::Up,
        VK_RIGHT => KeyCode::Right,
        VK_DOWN => KeyCode::Down,
        VK_INSERT => KeyCode::Insert,
        VK_DELETE => KeyCode::Delete,
        // Digits and letters share their ASCII values
        0x30..=0x39 => KeyCode::Char(virtual_key as u8 as char),
        0x41..=0x5A => KeyCode::Char((virtual_key as u8 as char).to_ascii_lowercase()),
        VK_F1..=VK_F24 => KeyCode::F((virtual_key - VK_F1 + 1) as u8),
        _ => return None,
    };
    Some(code)
}

/// Human-readable key name for a virtual-key code
pub fn key_name(virtual_key: u16) -> String {
    match key_code_for(virtual_key) {
        Some(KeyCode::Char(' ')) => "Space".to_string(),
        Some(KeyCode::Char(c)) => c.to_ascii_uppercase().to_string(),
        Some(KeyCode::F(n)) => format!("F{}", n),
        Some(code) => format!("{:?}", code),
        None => match virtual_key {
            VK_SHIFT => "Shift".to_string(),
            VK_CONTROL => "Ctrl".to_string(),
            VK_MENU => "Alt".to_string(),
            _ => format!("VK 0x{:02X}", virtual_key),
        },
    }
}
