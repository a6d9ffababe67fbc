//! Console handle
//!
//! `Console` owns a console device and exposes the geometry and cursor
//! operations directly. Input and output operations live on the borrowed
//! [`InputReader`] and [`Screen`] views.
//!
//! Geometry is never cached: the buffer can be resized by the user or another
//! process between any two calls, so every query goes to the device.

use std::sync::OnceLock;

use crate::core::device::{BufferInfo, ConsoleDevice, Coord, Result};
use crate::input::InputReader;
use crate::screen::Screen;

#[cfg(windows)]
pub use crate::core::win32::Win32Console as PlatformConsole;

#[cfg(not(windows))]
pub use self::unsupported::NoPlatformConsole as PlatformConsole;

static PLATFORM: OnceLock<Console<PlatformConsole>> = OnceLock::new();

/// Acquire the process console.
///
/// The handle is created once and lives until the process exits; later calls
/// return the same instance. Fails with `NoConsole` when the process has no
/// standard input or output handle. Redirected handles are accepted; calls
/// that need a real console then fail with `ConsoleError::Device`.
pub fn initialize() -> Result<&'static Console<PlatformConsole>> {
    if let Some(console) = PLATFORM.get() {
        return Ok(console);
    }
    let device = acquire_platform()?;
    Ok(PLATFORM.get_or_init(|| Console::with_device(device)))
}

#[cfg(windows)]
fn acquire_platform() -> Result<PlatformConsole> {
    PlatformConsole::acquire()
}

#[cfg(not(windows))]
fn acquire_platform() -> Result<PlatformConsole> {
    Err(crate::core::device::ConsoleError::NoConsole)
}

/// Library name and version
pub fn about() -> String {
    format!("wincon {}", env!("CARGO_PKG_VERSION"))
}

/// Console handle over a device
pub struct Console<D: ConsoleDevice> {
    device: D,
}

impl<D: ConsoleDevice> Console<D> {
    pub fn with_device(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Fresh snapshot of the screen buffer
    pub fn geometry(&self) -> Result<BufferInfo> {
        self.device.screen_buffer_info()
    }

    /// Move the cursor to a buffer position. No bounds checking is done here;
    /// the device decides what an out-of-range position means.
    pub fn set_cursor(&self, at: Coord) -> Result<()> {
        self.device.set_cursor_position(at)
    }

    pub fn goto(&self, x: i16, y: i16) -> Result<()> {
        self.set_cursor(Coord::new(x, y))
    }

    /// Cursor column in the buffer
    pub fn cursor_x(&self) -> Result<i16> {
        Ok(self.geometry()?.cursor.x)
    }

    /// Cursor row in the buffer (not the window)
    pub fn cursor_y(&self) -> Result<i16> {
        Ok(self.geometry()?.cursor.y)
    }

    pub fn buffer_width(&self) -> Result<i16> {
        Ok(self.geometry()?.width)
    }

    pub fn buffer_height(&self) -> Result<i16> {
        Ok(self.geometry()?.height)
    }

    pub fn input(&self) -> InputReader<'_, D> {
        InputReader::new(&self.device)
    }

    pub fn screen(&self) -> Screen<'_, D> {
        Screen::new(&self.device)
    }
}

#[cfg(not(windows))]
mod unsupported {
    use crate::attr::Attribute;
    use crate::core::device::{
        BufferInfo, ConsoleDevice, Coord, InputModeFlags, InputRecord, Result,
    };

    /// There is no console API to talk to on this platform
    #[derive(Debug)]
    pub enum NoPlatformConsole {}

    impl ConsoleDevice for NoPlatformConsole {
        fn screen_buffer_info(&self) -> Result<BufferInfo> {
            match *self {}
        }

        fn set_cursor_position(&self, _at: Coord) -> Result<()> {
            match *self {}
        }

        fn set_text_attribute(&self, _attr: Attribute) -> Result<()> {
            match *self {}
        }

        fn fill_output_character(&self, _ch: u16, _len: u32, _origin: Coord) -> Result<u32> {
            match *self {}
        }

        fn fill_output_attribute(&self, _attr: Attribute, _len: u32, _origin: Coord) -> Result<u32> {
            match *self {}
        }

        fn write_console(&self, _units: &[u16]) -> Result<u32> {
            match *self {}
        }

        fn input_mode(&self) -> Result<InputModeFlags> {
            match *self {}
        }

        fn set_input_mode(&self, _mode: InputModeFlags) -> Result<()> {
            match *self {}
        }

        fn read_console(&self, _buf: &mut [u16]) -> Result<usize> {
            match *self {}
        }

        fn read_input_record(&self) -> Result<Option<InputRecord>> {
            match *self {}
        }

        fn peek_input_count(&self) -> Result<usize> {
            match *self {}
        }

        fn async_key_state(&self, _virtual_key: i32) -> i16 {
            match *self {}
        }

        fn read_runtime_unit(&self) -> Result<i32> {
            match *self {}
        }
    }
}
