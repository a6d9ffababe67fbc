//! Win32 console device
//!
//! Thin wrapper around the standard input/output console handles. Every method
//! maps to exactly one console API call.

use std::ffi::c_int;
use std::io;

use tracing::{debug, info};
use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Console::{
    FillConsoleOutputAttribute, FillConsoleOutputCharacterW, GetConsoleMode,
    GetConsoleScreenBufferInfo, GetStdHandle, PeekConsoleInputW, ReadConsoleInputW, ReadConsoleW,
    SetConsoleCursorPosition, SetConsoleMode, SetConsoleTextAttribute, WriteConsoleW,
    CONSOLE_CHARACTER_ATTRIBUTES, CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO, COORD, INPUT_RECORD,
    STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

use super::device::{
    BufferInfo, ConsoleDevice, ConsoleError, Coord, InputModeFlags, InputRecord, KeyRecord,
    Result, WindowRect,
};
use crate::attr::Attribute;

// INPUT_RECORD event types
const KEY_EVENT: u16 = 0x0001;
const MOUSE_EVENT: u16 = 0x0002;
const WINDOW_BUFFER_SIZE_EVENT: u16 = 0x0004;
const MENU_EVENT: u16 = 0x0008;
const FOCUS_EVENT: u16 = 0x0010;

extern "C" {
    // CRT keyboard reader: unbuffered, no echo, extended keys as two units
    fn _getch() -> c_int;
}

fn os_error(operation: &'static str, e: windows::core::Error) -> ConsoleError {
    ConsoleError::device(operation, io::Error::from_raw_os_error(e.code().0))
}

fn to_coord(at: Coord) -> COORD {
    COORD { X: at.x, Y: at.y }
}

fn from_coord(c: COORD) -> Coord {
    Coord::new(c.X, c.Y)
}

/// The process's own console
pub struct Win32Console {
    input: HANDLE,
    output: HANDLE,
}

// Safety: the standard handles are process-wide and the console API
// serializes access to them.
unsafe impl Send for Win32Console {}
unsafe impl Sync for Win32Console {}

impl Win32Console {
    /// Acquire the standard input and output console handles.
    ///
    /// Only a missing handle is an error here. A redirected handle is kept,
    /// and the calls that need a console fail on it individually.
    pub fn acquire() -> Result<Self> {
        let (input, output) = unsafe {
            let input = GetStdHandle(STD_INPUT_HANDLE).map_err(|_| ConsoleError::NoConsole)?;
            let output = GetStdHandle(STD_OUTPUT_HANDLE).map_err(|_| ConsoleError::NoConsole)?;
            (input, output)
        };

        // Detached processes get null handles
        if is_missing(input) || is_missing(output) {
            debug!("Standard handles unavailable");
            return Err(ConsoleError::NoConsole);
        }

        info!("Console handles acquired");
        Ok(Self { input, output })
    }
}

fn is_missing(handle: HANDLE) -> bool {
    handle.is_invalid() || handle.0.is_null()
}

impl ConsoleDevice for Win32Console {
    fn screen_buffer_info(&self) -> Result<BufferInfo> {
        let mut csbi = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe {
            GetConsoleScreenBufferInfo(self.output, &mut csbi)
                .map_err(|e| os_error("GetConsoleScreenBufferInfo", e))?;
        }

        Ok(BufferInfo {
            width: csbi.dwSize.X,
            height: csbi.dwSize.Y,
            cursor: from_coord(csbi.dwCursorPosition),
            attribute: Attribute(csbi.wAttributes.0),
            window: WindowRect {
                left: csbi.srWindow.Left,
                top: csbi.srWindow.Top,
                right: csbi.srWindow.Right,
                bottom: csbi.srWindow.Bottom,
            },
        })
    }

    fn set_cursor_position(&self, at: Coord) -> Result<()> {
        unsafe {
            SetConsoleCursorPosition(self.output, to_coord(at))
                .map_err(|e| os_error("SetConsoleCursorPosition", e))
        }
    }

    fn set_text_attribute(&self, attr: Attribute) -> Result<()> {
        unsafe {
            SetConsoleTextAttribute(self.output, CONSOLE_CHARACTER_ATTRIBUTES(attr.bits()))
                .map_err(|e| os_error("SetConsoleTextAttribute", e))
        }
    }

    fn fill_output_character(&self, ch: u16, len: u32, origin: Coord) -> Result<u32> {
        let mut written: u32 = 0;
        unsafe {
            FillConsoleOutputCharacterW(self.output, ch, len, to_coord(origin), &mut written)
                .map_err(|e| os_error("FillConsoleOutputCharacter", e))?;
        }
        Ok(written)
    }

    fn fill_output_attribute(&self, attr: Attribute, len: u32, origin: Coord) -> Result<u32> {
        let mut written: u32 = 0;
        unsafe {
            FillConsoleOutputAttribute(self.output, attr.bits(), len, to_coord(origin), &mut written)
                .map_err(|e| os_error("FillConsoleOutputAttribute", e))?;
        }
        Ok(written)
    }

    fn write_console(&self, units: &[u16]) -> Result<u32> {
        let mut written: u32 = 0;
        unsafe {
            WriteConsoleW(self.output, units, Some(&mut written), None)
                .map_err(|e| os_error("WriteConsole", e))?;
        }
        Ok(written)
    }

    fn input_mode(&self) -> Result<InputModeFlags> {
        let mut mode = CONSOLE_MODE(0);
        unsafe {
            GetConsoleMode(self.input, &mut mode).map_err(|e| os_error("GetConsoleMode", e))?;
        }
        Ok(InputModeFlags::from_bits_retain(mode.0))
    }

    fn set_input_mode(&self, mode: InputModeFlags) -> Result<()> {
        unsafe {
            SetConsoleMode(self.input, CONSOLE_MODE(mode.bits()))
                .map_err(|e| os_error("SetConsoleMode", e))
        }
    }

    fn read_console(&self, buf: &mut [u16]) -> Result<usize> {
        let mut read: u32 = 0;
        unsafe {
            ReadConsoleW(
                self.input,
                buf.as_mut_ptr() as *mut _,
                buf.len() as u32,
                &mut read,
                None,
            )
            .map_err(|e| os_error("ReadConsole", e))?;
        }
        Ok(read as usize)
    }

    fn read_input_record(&self) -> Result<Option<InputRecord>> {
        let mut records = [INPUT_RECORD::default()];
        let mut read: u32 = 0;
        unsafe {
            ReadConsoleInputW(self.input, &mut records, &mut read)
                .map_err(|e| os_error("ReadConsoleInput", e))?;
        }
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(decode_record(&records[0])))
    }

    fn peek_input_count(&self) -> Result<usize> {
        let mut records = [INPUT_RECORD::default()];
        let mut read: u32 = 0;
        unsafe {
            PeekConsoleInputW(self.input, &mut records, &mut read)
                .map_err(|e| os_error("PeekConsoleInput", e))?;
        }
        Ok(read as usize)
    }

    fn async_key_state(&self, virtual_key: i32) -> i16 {
        unsafe { GetAsyncKeyState(virtual_key) }
    }

    fn read_runtime_unit(&self) -> Result<i32> {
        Ok(unsafe { _getch() })
    }
}

fn decode_record(record: &INPUT_RECORD) -> InputRecord {
    unsafe {
        match record.EventType {
            KEY_EVENT => {
                let key = record.Event.KeyEvent;
                InputRecord::Key(KeyRecord {
                    key_down: key.bKeyDown.as_bool(),
                    repeat_count: key.wRepeatCount,
                    virtual_key_code: key.wVirtualKeyCode,
                    virtual_scan_code: key.wVirtualScanCode,
                    unicode_char: key.uChar.UnicodeChar,
                    control_key_state: key.dwControlKeyState,
                })
            }
            MOUSE_EVENT => InputRecord::Mouse,
            WINDOW_BUFFER_SIZE_EVENT => {
                InputRecord::WindowBufferSize(from_coord(record.Event.WindowBufferSizeEvent.dwSize))
            }
            MENU_EVENT => InputRecord::Menu,
            FOCUS_EVENT => InputRecord::Focus(record.Event.FocusEvent.bSetFocus.as_bool()),
            other => InputRecord::Other(other),
        }
    }
}
