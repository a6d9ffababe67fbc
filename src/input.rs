//! Keyboard input protocols
//!
//! Four ways of reading the keyboard, each with its own contract:
//!
//! | Operation | Source | Mode | Blocks |
//! |-----------|--------|------|--------|
//! | `read_key_raw` | character stream | raw | yes |
//! | `read_line` | character stream | line (± echo) | yes |
//! | `read_extended_key` | input records | raw | yes |
//! | `read_runtime_key` | runtime reader | untouched | yes |
//! | `poll_pending` | input records (peek) | untouched | no |
//! | `key_state` | async key table | untouched | no |
//!
//! There is no timeout on the blocking reads. Poll with `poll_pending` before
//! committing to a read when a deadline matters. Only one blocking read may be
//! in flight per process: concurrent readers race on the shared input mode.

use tracing::debug;

use crate::core::device::{ConsoleDevice, Result};
use crate::keys::{decode_runtime_key, KeyState};
use crate::mode::{with_mode, InputMode};

/// Characters a single line read can return
pub const LINE_CAPACITY: usize = 4095;

const CR: u16 = 0x0D;
const LF: u16 = 0x0A;

/// Drop up to two trailing line-terminator units (CR or LF).
///
/// An empty slice is returned unchanged.
pub fn trim_line_terminator(units: &[u16]) -> &[u16] {
    let mut len = units.len();
    for _ in 0..2 {
        if len > 0 && matches!(units[len - 1], CR | LF) {
            len -= 1;
        }
    }
    &units[..len]
}

/// Borrowed view of a console's input side
pub struct InputReader<'c, D: ConsoleDevice> {
    device: &'c D,
}

impl<'c, D: ConsoleDevice> InputReader<'c, D> {
    pub fn new(device: &'c D) -> Self {
        Self { device }
    }

    /// Wait for one keypress and return its character.
    ///
    /// With `echo` the character is written back at the cursor. `None` when
    /// the console delivered no character.
    pub fn read_key_raw(&self, echo: bool) -> Result<Option<char>> {
        let mut buf = [0u16; 1];
        let count = with_mode(self.device, InputMode::Raw, |d| d.read_console(&mut buf))?;
        if count == 0 {
            return Ok(None);
        }

        if echo {
            self.device.write_console(&buf)?;
        }

        let ch = char::decode_utf16(buf)
            .next()
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER));
        Ok(ch)
    }

    /// Read one line with the terminator removed.
    ///
    /// At most [`LINE_CAPACITY`] characters are taken from the console; the
    /// rest of a longer line stays queued for the next read.
    pub fn read_line(&self, echo: bool) -> Result<String> {
        let mut buf = vec![0u16; LINE_CAPACITY];
        let count = with_mode(self.device, InputMode::line(echo), |d| d.read_console(&mut buf))?;
        let count = count.min(LINE_CAPACITY);

        let line = trim_line_terminator(&buf[..count]);
        debug!("Line read: {} units, {} after trim", count, line.len());
        Ok(String::from_utf16_lossy(line))
    }

    /// Whether at least one input event is queued. Never blocks, never
    /// consumes.
    pub fn poll_pending(&self) -> Result<bool> {
        Ok(self.device.peek_input_count()? > 0)
    }

    /// Wait for a key press and return its virtual-key code.
    ///
    /// Mouse, focus, resize and menu events are consumed and dropped, and so
    /// are key releases.
    pub fn read_extended_key(&self) -> Result<u16> {
        with_mode(self.device, InputMode::Raw, |d| loop {
            if let Some(record) = d.read_input_record()? {
                if let Some(key) = record.key_press() {
                    return Ok(key.virtual_key_code);
                }
            }
        })
    }

    /// Read one key through the runtime's buffered reader.
    ///
    /// Extended keys arrive as a `0x00`/`0xE0` prefix plus a code; they are
    /// returned as `0x100 + code`, plain keys as-is.
    pub fn read_runtime_key(&self) -> Result<i32> {
        let first = self.device.read_runtime_unit()?;
        decode_runtime_key(first, || self.device.read_runtime_unit())
    }

    /// Asynchronous physical state of `virtual_key`
    pub fn key_state(&self, virtual_key: i32) -> KeyState {
        KeyState(self.device.async_key_state(virtual_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::core::device::{ConsoleError, Coord, InputModeFlags, InputRecord, KeyRecord};
    use crate::core::virtual_console::{VirtualConsole, DEFAULT_INPUT_MODE};
    use crate::keys::{VK_ESCAPE, VK_LEFT, VK_SHIFT};

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_trim_line_terminator() {
        assert_eq!(trim_line_terminator(&units("hello\r\n")), units("hello").as_slice());
        assert_eq!(trim_line_terminator(&units("hello\n")), units("hello").as_slice());
        assert_eq!(trim_line_terminator(&units("hello\r")), units("hello").as_slice());
        assert_eq!(trim_line_terminator(&units("hello")), units("hello").as_slice());
        // At most two units
        assert_eq!(trim_line_terminator(&units("a\r\n\r\n")), units("a\r\n").as_slice());
        assert_eq!(trim_line_terminator(&units("\r\n")), &[] as &[u16]);
        assert_eq!(trim_line_terminator(&units("\n")), &[] as &[u16]);
        assert_eq!(trim_line_terminator(&[]), &[] as &[u16]);
    }

    #[test]
    fn test_read_line_strips_terminator() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().type_text("hello\r\n");
        assert_eq!(console.input().read_line(false).unwrap(), "hello");

        console.device().type_text("hello\n");
        assert_eq!(console.input().read_line(false).unwrap(), "hello");
    }

    #[test]
    fn test_read_line_empty_read() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        assert_eq!(console.input().read_line(true).unwrap(), "");
        assert_eq!(console.device().current_input_mode(), DEFAULT_INPUT_MODE);
    }

    #[test]
    fn test_read_line_modes() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().type_text("quiet\r\nloud\r\n");

        assert_eq!(console.input().read_line(false).unwrap(), "quiet");
        assert_eq!(console.input().read_line(true).unwrap(), "loud");

        assert_eq!(
            console.device().mode_history(),
            vec![
                InputMode::LineOnly.flags(),
                DEFAULT_INPUT_MODE,
                InputMode::LineEcho.flags(),
                DEFAULT_INPUT_MODE,
            ]
        );
        // Only the echoed line reached the screen
        assert_eq!(console.device().output_string(), "loud\r\n");
    }

    #[test]
    fn test_read_line_capacity() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        let long = "x".repeat(5000);
        console.device().type_text(&format!("{}\r\n", long));

        let first = console.input().read_line(false).unwrap();
        assert_eq!(first.len(), LINE_CAPACITY);
        // Remainder waits for the next read
        let rest = console.input().read_line(false).unwrap();
        assert_eq!(rest.len(), 5000 - LINE_CAPACITY);
    }

    #[test]
    fn test_read_line_failure_restores_mode() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().fail_reads(true);
        let result = console.input().read_line(true);
        assert!(matches!(result, Err(ConsoleError::Device { operation: "ReadConsole", .. })));
        assert_eq!(console.device().current_input_mode(), DEFAULT_INPUT_MODE);
    }

    #[test]
    fn test_read_key_raw() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().type_text("ab");

        assert_eq!(console.input().read_key_raw(false).unwrap(), Some('a'));
        assert!(console.device().output().is_empty());

        assert_eq!(console.input().read_key_raw(true).unwrap(), Some('b'));
        assert_eq!(console.device().output_string(), "b");
        assert_eq!(console.device().cell(0, 0).unwrap().ch, 'b' as u16);

        assert_eq!(
            console.device().mode_history(),
            vec![
                InputModeFlags::empty(),
                DEFAULT_INPUT_MODE,
                InputModeFlags::empty(),
                DEFAULT_INPUT_MODE,
            ]
        );
    }

    #[test]
    fn test_read_key_raw_nothing_read() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        assert_eq!(console.input().read_key_raw(true).unwrap(), None);
        assert!(console.device().output().is_empty());
    }

    #[test]
    fn test_read_key_raw_failure_restores_mode() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().type_text("z");
        console.device().fail_reads(true);
        assert!(console.input().read_key_raw(true).is_err());
        assert_eq!(console.device().current_input_mode(), DEFAULT_INPUT_MODE);
        assert!(console.device().output().is_empty());
    }

    #[test]
    fn test_poll_pending() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        assert!(!console.input().poll_pending().unwrap());

        console.device().push_record(InputRecord::Mouse);
        assert!(console.input().poll_pending().unwrap());
        // Peeking does not consume
        assert!(console.input().poll_pending().unwrap());
        assert!(!console.device().calls().contains(&"SetConsoleMode"));
    }

    #[test]
    fn test_read_extended_key_skips_non_presses() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        let device = console.device();
        device.push_record(InputRecord::Mouse);
        device.push_record(InputRecord::Key(KeyRecord::released(VK_SHIFT)));
        device.push_record(InputRecord::Focus(true));
        device.push_record(InputRecord::WindowBufferSize(Coord::new(100, 40)));
        device.push_keystroke(VK_LEFT);
        device.push_keystroke(VK_ESCAPE);

        assert_eq!(console.input().read_extended_key().unwrap(), VK_LEFT);
        // The VK_LEFT release is still queued ahead of Escape
        assert_eq!(console.input().read_extended_key().unwrap(), VK_ESCAPE);
        assert_eq!(device.current_input_mode(), DEFAULT_INPUT_MODE);
    }

    #[test]
    fn test_read_extended_key_failure_restores_mode() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().push_record(InputRecord::Mouse);
        // Queue runs dry before any key press
        assert!(console.input().read_extended_key().is_err());
        assert_eq!(console.device().current_input_mode(), DEFAULT_INPUT_MODE);
        assert_eq!(
            console.device().mode_history(),
            vec![InputModeFlags::empty(), DEFAULT_INPUT_MODE]
        );
    }

    #[test]
    fn test_read_runtime_key() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().push_runtime_units(&[0xE0, 0x48, 0x00, 0x3B, 0x61]);

        assert_eq!(console.input().read_runtime_key().unwrap(), 0x148);
        assert_eq!(console.input().read_runtime_key().unwrap(), 0x13B);
        assert_eq!(console.input().read_runtime_key().unwrap(), 0x61);
        // Runtime reader never touches the console mode
        assert!(console.device().mode_history().is_empty());
    }

    #[test]
    fn test_key_state() {
        let console = Console::with_device(VirtualConsole::new(80, 25));
        console.device().press_key(VK_SHIFT as i32);

        let state = console.input().key_state(VK_SHIFT as i32);
        assert!(state.is_down());
        assert!(state.was_pressed());

        let state = console.input().key_state(VK_SHIFT as i32);
        assert!(state.is_down());
        assert!(!state.was_pressed());

        assert!(!console.input().key_state(VK_ESCAPE as i32).is_down());
    }
}
