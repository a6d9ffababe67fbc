//! Screen output: clearing, text and attributes

use tracing::debug;

use crate::attr::{self, Attribute, ColorName};
use crate::core::device::{ConsoleDevice, Coord, Result};

/// Longest text a single `write_text` call sends
pub const WRITE_CAPACITY: usize = 65534;

const SPACE: u16 = b' ' as u16;
const CRLF: [u16; 2] = [0x0D, 0x0A];

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

/// Borrowed view of a console's output side
pub struct Screen<'c, D: ConsoleDevice> {
    device: &'c D,
}

impl<'c, D: ConsoleDevice> Screen<'c, D> {
    pub fn new(device: &'c D) -> Self {
        Self { device }
    }

    /// Blank the whole buffer with the current attribute and home the cursor.
    ///
    /// The attribute is read again after the character fill so both fills
    /// use whatever attribute is current at that point.
    pub fn clear(&self) -> Result<()> {
        let info = self.device.screen_buffer_info()?;
        let cells = info.cell_count();

        self.device.fill_output_character(SPACE, cells, Coord::ORIGIN)?;
        let attribute = self.device.screen_buffer_info()?.attribute;
        self.device.fill_output_attribute(attribute, cells, Coord::ORIGIN)?;
        self.device.set_cursor_position(Coord::ORIGIN)?;

        debug!("Cleared {}x{} buffer with {}", info.width, info.height, attribute);
        Ok(())
    }

    /// Make `attr` the attribute for subsequent output and clears.
    /// The console keeps it after this process exits.
    pub fn apply_attribute(&self, attr: Attribute) -> Result<()> {
        self.device.set_text_attribute(attr)
    }

    /// Encode a color pair by name and apply it. Nothing reaches the
    /// device when either name is unknown.
    pub fn set_colors(&self, foreground: &str, background: &str) -> Result<Attribute> {
        let attr = attr::encode(foreground, background)?;
        self.apply_attribute(attr)?;
        Ok(attr)
    }

    pub fn set_color_names(&self, foreground: ColorName, background: ColorName) -> Result<Attribute> {
        let attr = attr::encode_colors(foreground, background);
        self.apply_attribute(attr)?;
        Ok(attr)
    }

    /// Write one character at the cursor
    pub fn write_char(&self, ch: char) -> Result<()> {
        let mut buf = [0u16; 2];
        self.device.write_console(ch.encode_utf16(&mut buf))?;
        Ok(())
    }

    /// Write `text` at the cursor, cut to [`WRITE_CAPACITY`] units, followed
    /// by CRLF when `newline` is set. A surrogate pair straddling the limit
    /// is dropped whole. Returns the number of text units written.
    pub fn write_text(&self, text: &str, newline: bool) -> Result<usize> {
        let mut units: Vec<u16> = text.encode_utf16().take(WRITE_CAPACITY).collect();
        if units.len() == WRITE_CAPACITY && units.last().map_or(false, |u| is_high_surrogate(*u)) {
            units.pop();
        }
        if !units.is_empty() {
            self.device.write_console(&units)?;
        }
        if newline {
            self.device.write_console(&CRLF)?;
        }
        Ok(units.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::core::device::ConsoleError;
    use crate::core::virtual_console::VirtualConsole;

    #[test]
    fn test_clear_fills_buffer_and_homes_cursor() {
        let console = Console::with_device(VirtualConsole::new(10, 4));
        console.screen().write_text("garbage everywhere here", true).unwrap();
        let attr = console.screen().set_colors("yellow", "blue").unwrap();
        console.device().clear_calls();

        console.screen().clear().unwrap();

        assert_eq!(
            console.device().calls(),
            vec![
                "GetConsoleScreenBufferInfo",
                "FillConsoleOutputCharacter",
                "GetConsoleScreenBufferInfo",
                "FillConsoleOutputAttribute",
                "SetConsoleCursorPosition",
            ]
        );
        for y in 0..4 {
            assert_eq!(console.device().row_text(y), " ".repeat(10));
            assert!(console.device().row_cells(y).iter().all(|c| c.attr == attr));
        }
        assert_eq!(console.geometry().unwrap().cursor, Coord::ORIGIN);
    }

    #[test]
    fn test_clear_then_home_reports_origin() {
        let console = Console::with_device(VirtualConsole::default());
        console.goto(40, 120).unwrap();
        console.screen().clear().unwrap();
        console.goto(0, 0).unwrap();

        let info = console.geometry().unwrap();
        assert_eq!(info.cursor.x, 0);
        assert_eq!(info.cursor.y, 0);
    }

    #[test]
    fn test_write_text_truncates() {
        let console = Console::with_device(VirtualConsole::new(200, 10));
        let text = "x".repeat(100_000);

        let written = console.screen().write_text(&text, true).unwrap();
        assert_eq!(written, WRITE_CAPACITY);

        let output = console.device().output();
        assert_eq!(output.len(), WRITE_CAPACITY + 2);
        assert_eq!(&output[WRITE_CAPACITY..], &CRLF);
    }

    #[test]
    fn test_write_text_keeps_surrogate_pairs_whole() {
        let console = Console::with_device(VirtualConsole::new(200, 10));
        let text = format!("{}\u{1F600}", "x".repeat(WRITE_CAPACITY - 1));

        let written = console.screen().write_text(&text, false).unwrap();
        assert_eq!(written, WRITE_CAPACITY - 1);

        let output = console.device().output();
        assert_eq!(output.len(), WRITE_CAPACITY - 1);
        assert_eq!(output.last(), Some(&(b'x' as u16)));

        // A pair that fits entirely is kept
        let console = Console::with_device(VirtualConsole::new(200, 10));
        let text = format!("{}\u{1F600}", "x".repeat(WRITE_CAPACITY - 2));
        assert_eq!(console.screen().write_text(&text, false).unwrap(), WRITE_CAPACITY);
        assert_eq!(&console.device().output()[WRITE_CAPACITY - 2..], &[0xD83D, 0xDE00]);
    }

    #[test]
    fn test_write_text_without_newline() {
        let console = Console::with_device(VirtualConsole::new(20, 5));
        console.screen().write_text("abc", false).unwrap();
        assert_eq!(console.device().output_string(), "abc");
        assert_eq!(console.cursor_x().unwrap(), 3);

        console.screen().write_text("", true).unwrap();
        assert_eq!(console.device().output_string(), "abc\r\n");
        assert_eq!(console.cursor_y().unwrap(), 1);
    }

    #[test]
    fn test_write_char_uses_current_attribute() {
        let console = Console::with_device(VirtualConsole::new(20, 5));
        let attr = console.screen().set_colors("lightred", "black").unwrap();
        console.goto(5, 2).unwrap();
        console.screen().write_char('Q').unwrap();

        let cell = console.device().cell(5, 2).unwrap();
        assert_eq!(cell.display_char(), 'Q');
        assert_eq!(cell.attr, attr);
        assert_eq!(console.cursor_x().unwrap(), 6);
    }

    #[test]
    fn test_invalid_color_has_no_side_effect() {
        let console = Console::with_device(VirtualConsole::new(20, 5));
        let before = console.geometry().unwrap().attribute;
        console.device().clear_calls();

        let result = console.screen().set_colors("white", "chartreuse");
        assert!(matches!(result, Err(ConsoleError::InvalidColorName { .. })));
        assert!(console.device().calls().is_empty());
        assert_eq!(console.geometry().unwrap().attribute, before);
    }

    #[test]
    fn test_attribute_is_not_accumulated() {
        let console = Console::with_device(VirtualConsole::new(20, 5));
        console.screen().set_colors("white", "white").unwrap();
        let attr = console.screen().set_colors("blue", "black").unwrap();
        assert_eq!(attr, Attribute(0x01));
        assert_eq!(console.geometry().unwrap().attribute, Attribute(0x01));

        let attr = console
            .screen()
            .set_color_names(ColorName::Black, ColorName::Cyan)
            .unwrap();
        assert_eq!(attr, Attribute(0x30));
    }
}
