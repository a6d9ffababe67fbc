//! Console device abstraction
//!
//! `ConsoleDevice` is the seam between the console logic in this crate and the
//! operating system. Each method corresponds to one primitive console call, so
//! the higher layers (mode switching, line trimming, event filtering, clearing)
//! are written once and run unchanged against the Win32 console or the
//! in-memory [`VirtualConsole`](super::virtual_console::VirtualConsole).

use std::fmt;
use std::io;

use bitflags::bitflags;
use thiserror::Error;

use crate::attr::Attribute;

/// Which half of a color pair was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorPosition {
    Foreground,
    Background,
}

impl fmt::Display for ColorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorPosition::Foreground => f.write_str("foreground"),
            ColorPosition::Background => f.write_str("background"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Can't get standard input or output handle")]
    NoConsole,

    #[error("Bad {position} color \"{name}\"")]
    InvalidColorName {
        position: ColorPosition,
        name: String,
    },

    #[error("Wrong # args: should be \"{command} {usage}\"")]
    ArgumentArity {
        command: &'static str,
        usage: &'static str,
    },

    #[error("Expected {expected} but got \"{argument}\"")]
    ArgumentType {
        argument: String,
        expected: &'static str,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{operation} failed: {source}")]
    Device {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl ConsoleError {
    pub fn device(operation: &'static str, source: io::Error) -> Self {
        ConsoleError::Device { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Position in the screen buffer (not the visible window)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    pub const ORIGIN: Coord = Coord { x: 0, y: 0 };

    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Visible window, in buffer coordinates (inclusive edges)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowRect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

impl WindowRect {
    pub fn width(&self) -> i16 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i16 {
        self.bottom - self.top + 1
    }
}

/// Screen buffer snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferInfo {
    /// Buffer width in cells
    pub width: i16,
    /// Buffer height in cells (includes scroll-back)
    pub height: i16,
    pub cursor: Coord,
    pub attribute: Attribute,
    pub window: WindowRect,
}

impl BufferInfo {
    /// Number of cells in the whole buffer
    pub fn cell_count(&self) -> u32 {
        let width = self.width.max(0) as u32;
        let height = self.height.max(0) as u32;
        width * height
    }
}

bitflags! {
    /// Console input mode bits
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct InputModeFlags: u32 {
        const PROCESSED_INPUT = 0x0001;
        const LINE_INPUT = 0x0002;
        const ECHO_INPUT = 0x0004;
        const WINDOW_INPUT = 0x0008;
        const MOUSE_INPUT = 0x0010;
        const INSERT_MODE = 0x0020;
        const QUICK_EDIT_MODE = 0x0040;
        const EXTENDED_FLAGS = 0x0080;
        const AUTO_POSITION = 0x0100;
        const VIRTUAL_TERMINAL_INPUT = 0x0200;
    }
}

/// Keyboard event from the input record stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyRecord {
    pub key_down: bool,
    pub repeat_count: u16,
    pub virtual_key_code: u16,
    pub virtual_scan_code: u16,
    pub unicode_char: u16,
    pub control_key_state: u32,
}

impl KeyRecord {
    pub fn pressed(virtual_key_code: u16) -> Self {
        Self {
            key_down: true,
            repeat_count: 1,
            virtual_key_code,
            ..Default::default()
        }
    }

    pub fn released(virtual_key_code: u16) -> Self {
        Self {
            key_down: false,
            repeat_count: 1,
            virtual_key_code,
            ..Default::default()
        }
    }
}

/// One entry of the console input queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputRecord {
    Key(KeyRecord),
    Mouse,
    WindowBufferSize(Coord),
    Menu,
    Focus(bool),
    /// Event type this crate does not decode
    Other(u16),
}

impl InputRecord {
    /// The event types `read_extended_key` accepts
    pub fn key_press(&self) -> Option<&KeyRecord> {
        match self {
            InputRecord::Key(key) if key.key_down => Some(key),
            _ => None,
        }
    }
}

/// Primitive console operations.
///
/// Character counts and buffers are in UTF-16 code units, matching the wide
/// console API. Implementations take `&self`: the console is a process-wide
/// shared object and every call goes straight to it.
pub trait ConsoleDevice {
    fn screen_buffer_info(&self) -> Result<BufferInfo>;

    fn set_cursor_position(&self, at: Coord) -> Result<()>;

    fn set_text_attribute(&self, attr: Attribute) -> Result<()>;

    /// Write `ch` into `len` consecutive cells starting at `origin`.
    /// Returns the number of cells written.
    fn fill_output_character(&self, ch: u16, len: u32, origin: Coord) -> Result<u32>;

    fn fill_output_attribute(&self, attr: Attribute, len: u32, origin: Coord) -> Result<u32>;

    /// Write at the cursor, advancing it. Returns units written.
    fn write_console(&self, units: &[u16]) -> Result<u32>;

    fn input_mode(&self) -> Result<InputModeFlags>;

    /// Only [`ModeGuard`](crate::mode::ModeGuard) calls this.
    fn set_input_mode(&self, mode: InputModeFlags) -> Result<()>;

    /// Blocking character read honoring the current input mode.
    /// Returns the number of units placed in `buf`.
    fn read_console(&self, buf: &mut [u16]) -> Result<usize>;

    /// Blocking read of a single input record. `None` when the device
    /// reported zero records.
    fn read_input_record(&self) -> Result<Option<InputRecord>>;

    /// 1 if any input record is queued, else 0. Nothing is consumed.
    fn peek_input_count(&self) -> Result<usize>;

    /// Asynchronous key state (high bit down, low bit pressed since last query)
    fn async_key_state(&self, virtual_key: i32) -> i16;

    /// One unit from the runtime's buffered, echo-less keyboard reader
    fn read_runtime_unit(&self) -> Result<i32>;
}
