//! Console device layer.
//!
//! - **device**: the `ConsoleDevice` trait, geometry/input types and errors
//! - **win32**: the process console through the Win32 console API
//! - **virtual_console**: an in-memory console with scripted input
//!
//! # Architecture
//!
//! ```text
//! Console<D: ConsoleDevice>
//! ├── Win32Console    (GetStdHandle input + output)
//! └── VirtualConsole  (cells, cursor, mode, input queues)
//! ```

pub mod device;
pub mod virtual_console;
#[cfg(windows)]
pub mod win32;
