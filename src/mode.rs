//! Scoped input mode switching
//!
//! The console input mode is shared by everything attached to the console,
//! including the host program's own line-buffered prompt. A read that leaves
//! the console in raw mode breaks every later reader, so the mode is only ever
//! changed through [`ModeGuard`], which puts the captured mode back when it
//! goes out of scope, whether the guarded work succeeded, failed or panicked.

use std::fmt;

use tracing::{debug, warn};

use crate::core::device::{ConsoleDevice, InputModeFlags, Result};

/// Input modes used by the read operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// No echo, no line buffering, no processed input
    Raw,
    /// Buffered until Enter, not echoed
    LineOnly,
    /// Buffered until Enter, echoed
    LineEcho,
}

impl InputMode {
    pub fn flags(self) -> InputModeFlags {
        match self {
            InputMode::Raw => InputModeFlags::empty(),
            InputMode::LineOnly => InputModeFlags::LINE_INPUT | InputModeFlags::PROCESSED_INPUT,
            InputMode::LineEcho => {
                InputModeFlags::ECHO_INPUT
                    | InputModeFlags::LINE_INPUT
                    | InputModeFlags::PROCESSED_INPUT
            }
        }
    }

    pub fn line(echo: bool) -> Self {
        if echo {
            InputMode::LineEcho
        } else {
            InputMode::LineOnly
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Raw => f.write_str("raw"),
            InputMode::LineOnly => f.write_str("line"),
            InputMode::LineEcho => f.write_str("line+echo"),
        }
    }
}

/// Restores the captured input mode when dropped
pub struct ModeGuard<'a, D: ConsoleDevice + ?Sized> {
    device: &'a D,
    saved: InputModeFlags,
    restored: bool,
}

impl<'a, D: ConsoleDevice + ?Sized> ModeGuard<'a, D> {
    /// Capture the current mode and switch to `mode`.
    ///
    /// If the switch itself fails nothing has changed and no guard is returned.
    pub fn enter(device: &'a D, mode: InputMode) -> Result<Self> {
        let saved = device.input_mode()?;
        device.set_input_mode(mode.flags())?;
        debug!("Input mode 0x{:04X} -> {}", saved.bits(), mode);
        Ok(Self {
            device,
            saved,
            restored: false,
        })
    }

    /// The mode that will be restored
    pub fn saved(&self) -> InputModeFlags {
        self.saved
    }

    /// Restore now and report the outcome
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.device.set_input_mode(self.saved)
    }
}

impl<D: ConsoleDevice + ?Sized> Drop for ModeGuard<'_, D> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.device.set_input_mode(self.saved) {
            warn!("Failed to restore input mode 0x{:04X}: {}", self.saved.bits(), e);
        }
    }
}

/// Run `body` with the input mode set to `mode`, then restore the prior mode.
///
/// A failing body wins over a failing restore: its error is returned and the
/// restore error is only logged.
pub fn with_mode<D, T, F>(device: &D, mode: InputMode, body: F) -> Result<T>
where
    D: ConsoleDevice + ?Sized,
    F: FnOnce(&D) -> Result<T>,
{
    let guard = ModeGuard::enter(device, mode)?;
    match body(device) {
        Ok(value) => {
            guard.restore()?;
            Ok(value)
        }
        Err(e) => {
            // Guard drop restores and logs
            drop(guard);
            Err(e)
        }
    }
}
