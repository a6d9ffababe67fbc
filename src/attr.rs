//! Text attribute encoding.
//!
//! A console attribute is a 16-bit value. The low nibble holds the foreground
//! color, the next nibble the background color:
//!
//! ```text
//! bit:  7   6   5   4   3   2   1   0
//!       BI  BR  BG  BB  FI  FR  FG  FB
//! ```
//!
//! The sixteen named colors are laid out so that a color's position in
//! [`ColorName::ALL`] is exactly its nibble value.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::core::device::{ColorPosition, ConsoleError, Result};

pub const FOREGROUND_BLUE: u16 = 0x0001;
pub const FOREGROUND_GREEN: u16 = 0x0002;
pub const FOREGROUND_RED: u16 = 0x0004;
pub const FOREGROUND_INTENSITY: u16 = 0x0008;
pub const BACKGROUND_BLUE: u16 = 0x0010;
pub const BACKGROUND_GREEN: u16 = 0x0020;
pub const BACKGROUND_RED: u16 = 0x0040;
pub const BACKGROUND_INTENSITY: u16 = 0x0080;

const NIBBLE: u16 = 0x000F;
const BACKGROUND_SHIFT: u16 = 4;

/// Packed console text attribute
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attribute(pub u16);

impl Attribute {
    /// Light gray on black, the attribute a fresh console starts with
    pub const DEFAULT: Attribute = Attribute(FOREGROUND_RED | FOREGROUND_GREEN | FOREGROUND_BLUE);

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Foreground nibble (bits 0-3)
    pub const fn foreground(self) -> u8 {
        (self.0 & NIBBLE) as u8
    }

    /// Background nibble (bits 4-7)
    pub const fn background(self) -> u8 {
        ((self.0 >> BACKGROUND_SHIFT) & NIBBLE) as u8
    }

    pub fn foreground_color(self) -> ColorName {
        ColorName::from_nibble(self.foreground())
    }

    pub fn background_color(self) -> ColorName {
        ColorName::from_nibble(self.background())
    }

    /// Bits above the two color nibbles (grid lines, reverse video, ...)
    pub const fn flags(self) -> u16 {
        self.0 & !(NIBBLE | (NIBBLE << BACKGROUND_SHIFT))
    }

    /// Same attribute with the foreground replaced
    pub const fn with_foreground(self, color: ColorName) -> Attribute {
        Attribute((self.0 & !NIBBLE) | color.foreground_bits())
    }

    /// Same attribute with the background replaced
    pub const fn with_background(self, color: ColorName) -> Attribute {
        Attribute((self.0 & !(NIBBLE << BACKGROUND_SHIFT)) | color.background_bits())
    }
}

impl BitOr for Attribute {
    type Output = Attribute;

    fn bitor(self, rhs: Self) -> Self::Output {
        Attribute(self.0 | rhs.0)
    }
}

impl BitOrAssign for Attribute {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// The sixteen console colors, in nibble order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorName {
    Black,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Brown,
    LightGray,
    DarkGray,
    LightBlue,
    LightGreen,
    LightCyan,
    LightRed,
    LightMagenta,
    Yellow,
    White,
}

impl ColorName {
    pub const ALL: [ColorName; 16] = [
        ColorName::Black,
        ColorName::Blue,
        ColorName::Green,
        ColorName::Cyan,
        ColorName::Red,
        ColorName::Magenta,
        ColorName::Brown,
        ColorName::LightGray,
        ColorName::DarkGray,
        ColorName::LightBlue,
        ColorName::LightGreen,
        ColorName::LightCyan,
        ColorName::LightRed,
        ColorName::LightMagenta,
        ColorName::Yellow,
        ColorName::White,
    ];

    /// Identifier accepted by [`encode`]
    pub const fn name(self) -> &'static str {
        match self {
            ColorName::Black => "black",
            ColorName::Blue => "blue",
            ColorName::Green => "green",
            ColorName::Cyan => "cyan",
            ColorName::Red => "red",
            ColorName::Magenta => "magenta",
            ColorName::Brown => "brown",
            ColorName::LightGray => "lightgray",
            ColorName::DarkGray => "darkgray",
            ColorName::LightBlue => "lightblue",
            ColorName::LightGreen => "lightgreen",
            ColorName::LightCyan => "lightcyan",
            ColorName::LightRed => "lightred",
            ColorName::LightMagenta => "lightmagenta",
            ColorName::Yellow => "yellow",
            ColorName::White => "white",
        }
    }

    /// 4-bit color value (red/green/blue/intensity)
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Only the low four bits of `nibble` are used
    pub fn from_nibble(nibble: u8) -> ColorName {
        Self::ALL[(nibble & 0x0F) as usize]
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(name: &str) -> Option<ColorName> {
        Self::ALL.iter().copied().find(|color| color.name() == name)
    }

    pub const fn foreground_bits(self) -> u16 {
        self.nibble() as u16
    }

    pub const fn background_bits(self) -> u16 {
        (self.nibble() as u16) << BACKGROUND_SHIFT
    }

    /// Convert to the closest crossterm color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        use crossterm::style::Color;

        match self {
            ColorName::Black => Color::Black,
            ColorName::Blue => Color::DarkBlue,
            ColorName::Green => Color::DarkGreen,
            ColorName::Cyan => Color::DarkCyan,
            ColorName::Red => Color::DarkRed,
            ColorName::Magenta => Color::DarkMagenta,
            ColorName::Brown => Color::DarkYellow,
            ColorName::LightGray => Color::Grey,
            ColorName::DarkGray => Color::DarkGrey,
            ColorName::LightBlue => Color::Blue,
            ColorName::LightGreen => Color::Green,
            ColorName::LightCyan => Color::Cyan,
            ColorName::LightRed => Color::Red,
            ColorName::LightMagenta => Color::Magenta,
            ColorName::Yellow => Color::Yellow,
            ColorName::White => Color::White,
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ColorName::lookup(s).ok_or_else(|| format!("unknown color \"{}\"", s))
    }
}

/// Encode a foreground/background name pair into a packed attribute.
///
/// Both names are validated before anything is assembled, so a bad name never
/// yields a half-built value. The result starts from zero on every call.
pub fn encode(foreground: &str, background: &str) -> Result<Attribute> {
    let fg = ColorName::lookup(foreground).ok_or_else(|| ConsoleError::InvalidColorName {
        position: ColorPosition::Foreground,
        name: foreground.to_string(),
    })?;
    let bg = ColorName::lookup(background).ok_or_else(|| ConsoleError::InvalidColorName {
        position: ColorPosition::Background,
        name: background.to_string(),
    })?;

    Ok(encode_colors(fg, bg))
}

/// Typed variant of [`encode`]
pub fn encode_colors(foreground: ColorName, background: ColorName) -> Attribute {
    let mut attr = Attribute(0);
    attr |= Attribute(foreground.foreground_bits());
    attr |= Attribute(background.background_bits());
    attr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_order() {
        let names: Vec<&str> = ColorName::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "black", "blue", "green", "cyan", "red", "magenta", "brown", "lightgray",
                "darkgray", "lightblue", "lightgreen", "lightcyan", "lightred", "lightmagenta",
                "yellow", "white",
            ]
        );

        for (i, color) in ColorName::ALL.iter().enumerate() {
            assert_eq!(color.nibble() as usize, i);
            assert_eq!(ColorName::from_nibble(i as u8), *color);
        }
    }

    #[test]
    fn test_named_bits_match_win32_layout() {
        assert_eq!(ColorName::Blue.foreground_bits(), FOREGROUND_BLUE);
        assert_eq!(ColorName::Green.foreground_bits(), FOREGROUND_GREEN);
        assert_eq!(ColorName::Red.foreground_bits(), FOREGROUND_RED);
        assert_eq!(ColorName::DarkGray.foreground_bits(), FOREGROUND_INTENSITY);
        assert_eq!(
            ColorName::Yellow.foreground_bits(),
            FOREGROUND_RED | FOREGROUND_GREEN | FOREGROUND_INTENSITY
        );
        assert_eq!(
            ColorName::LightMagenta.background_bits(),
            BACKGROUND_RED | BACKGROUND_BLUE | BACKGROUND_INTENSITY
        );
        assert_eq!(
            ColorName::White.background_bits(),
            BACKGROUND_RED | BACKGROUND_GREEN | BACKGROUND_BLUE | BACKGROUND_INTENSITY
        );
    }

    #[test]
    fn test_encode_all_pairs() {
        for fg in ColorName::ALL {
            for bg in ColorName::ALL {
                let attr = encode(fg.name(), bg.name()).unwrap();
                assert_eq!(attr.bits(), fg.foreground_bits() | bg.background_bits());
                assert_eq!(attr.foreground_color(), fg);
                assert_eq!(attr.background_color(), bg);
                assert_eq!(attr.flags(), 0);
                // Deterministic
                assert_eq!(encode(fg.name(), bg.name()).unwrap(), attr);
            }
        }
    }

    #[test]
    fn test_encode_examples() {
        assert_eq!(encode("yellow", "blue").unwrap(), Attribute(0x1E));
        assert_eq!(encode("black", "black").unwrap(), Attribute(0x00));
        assert_eq!(encode("white", "white").unwrap(), Attribute(0xFF));
        assert_eq!(encode("lightgray", "black").unwrap(), Attribute::DEFAULT);
    }

    #[test]
    fn test_encode_invalid_foreground() {
        match encode("purple", "black") {
            Err(ConsoleError::InvalidColorName { position, name }) => {
                assert_eq!(position, ColorPosition::Foreground);
                assert_eq!(name, "purple");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_encode_invalid_background() {
        match encode("white", "Black") {
            Err(ConsoleError::InvalidColorName { position, name }) => {
                assert_eq!(position, ColorPosition::Background);
                assert_eq!(name, "Black");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_foreground_checked_first() {
        // Both invalid: the foreground is reported
        match encode("", "nope") {
            Err(ConsoleError::InvalidColorName { position, .. }) => {
                assert_eq!(position, ColorPosition::Foreground);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(ColorName::lookup("cyan"), Some(ColorName::Cyan));
        assert_eq!(ColorName::lookup("Cyan"), None);
        assert_eq!(ColorName::lookup("light gray"), None);
        assert!("LIGHTRED".parse::<ColorName>().is_err());
        assert_eq!("lightred".parse::<ColorName>(), Ok(ColorName::LightRed));
    }

    #[test]
    fn test_attribute_flags_preserved() {
        let attr = Attribute(0x4000) | encode_colors(ColorName::Red, ColorName::Green);
        assert_eq!(attr.flags(), 0x4000);
        assert_eq!(attr.foreground_color(), ColorName::Red);
        assert_eq!(attr.background_color(), ColorName::Green);
        assert_eq!(attr.to_string(), "0x4024");
    }

    #[test]
    fn test_replace_one_color() {
        let attr = Attribute(0x8000) | encode_colors(ColorName::Yellow, ColorName::Blue);

        let fg = attr.with_foreground(ColorName::White);
        assert_eq!(fg.bits(), 0x801F);
        assert_eq!(fg.background_color(), ColorName::Blue);

        let bg = attr.with_background(ColorName::Red);
        assert_eq!(bg.bits(), 0x804E);
        assert_eq!(bg.foreground_color(), ColorName::Yellow);

        assert_eq!(Attribute::DEFAULT.with_foreground(ColorName::Black), Attribute(0x00));
    }
}
