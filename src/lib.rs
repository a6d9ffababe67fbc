//! wincon - console control for Windows
//!
//! Cursor positioning, screen buffer geometry, text colors, raw and
//! line-buffered keyboard input over the process console.
//!
//! # Overview
//!
//! | Module | Provides |
//! |--------|----------|
//! | `attr` | color names and packed attribute encoding |
//! | `console` | the console handle, geometry and cursor |
//! | `mode` | scoped input mode switching (`ModeGuard`) |
//! | `input` | key, line, extended-key and runtime-key reads |
//! | `screen` | clear, text output, attribute application |
//! | `keys` | virtual-key codes and key state helpers |
//! | `core` | device trait, Win32 device, in-memory device |
//!
//! # Quick Start
//!
//! ```no_run
//! let console = wincon::initialize()?;
//! console.screen().set_colors("yellow", "blue")?;
//! console.screen().clear()?;
//! console.goto(10, 5)?;
//! console.screen().write_text("Press a key", false)?;
//! let key = console.input().read_key_raw(false)?;
//! # Ok::<(), wincon::ConsoleError>(())
//! ```
//!
//! # Coordinates
//!
//! Cursor coordinates are relative to the screen *buffer*, including
//! scroll-back, not to the visible window. `BufferInfo::window` gives the
//! window's position inside the buffer.
//!
//! # Threads
//!
//! The console and its input mode are process-wide. Blocking reads have no
//! timeout and must not run concurrently; keep input on one thread.

pub mod attr;
pub mod command;
pub mod config;
pub mod console;
pub mod core;
pub mod input;
pub mod keys;
pub mod mode;
pub mod screen;

pub use attr::{encode, Attribute, ColorName};
pub use console::{about, initialize, Console, PlatformConsole};
pub use crate::core::device::{
    BufferInfo, ColorPosition, ConsoleDevice, ConsoleError, Coord, InputModeFlags, InputRecord,
    KeyRecord, Result, WindowRect,
};
pub use crate::core::virtual_console::VirtualConsole;
pub use input::InputReader;
pub use keys::KeyState;
pub use mode::{with_mode, InputMode, ModeGuard};
pub use screen::Screen;
