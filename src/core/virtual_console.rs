//! In-memory console device
//!
//! `VirtualConsole` models a single screen buffer with a cursor, a current
//! attribute, an input mode and the three input sources a real console has
//! (typed characters, the input record queue and the runtime key reader).
//! Reads never block: an exhausted queue is reported the way a closed console
//! would report it, which lets blocking protocols be driven to completion in
//! tests and in the off-Windows demo.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;

use super::device::{
    BufferInfo, ConsoleDevice, ConsoleError, Coord, InputModeFlags, InputRecord, KeyRecord,
    Result, WindowRect,
};
use crate::attr::Attribute;

const SPACE: u16 = b' ' as u16;
const KEY_DOWN_BIT: i16 = i16::MIN; // 0x8000
const PRESSED_BIT: i16 = 0x0001;

/// Mode a freshly opened console starts in
pub const DEFAULT_INPUT_MODE: InputModeFlags = InputModeFlags::from_bits_retain(0x01F7);

/// A screen cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: u16,
    pub attr: Attribute,
}

impl Cell {
    pub fn display_char(&self) -> char {
        char::from_u32(self.ch as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

struct VirtualState {
    width: i16,
    height: i16,
    cells: Vec<Cell>,
    cursor: Coord,
    attribute: Attribute,
    window_rows: i16,
    mode: InputModeFlags,
    mode_history: Vec<InputModeFlags>,
    typed: VecDeque<u16>,
    records: VecDeque<InputRecord>,
    runtime: VecDeque<i32>,
    key_states: HashMap<i32, i16>,
    output: Vec<u16>,
    calls: Vec<&'static str>,
    fail_reads: bool,
}

impl VirtualState {
    fn index(&self, at: Coord) -> Option<usize> {
        if at.x < 0 || at.y < 0 || at.x >= self.width || at.y >= self.height {
            return None;
        }
        Some(at.y as usize * self.width as usize + at.x as usize)
    }

    fn scroll_up(&mut self) {
        let width = self.width as usize;
        self.cells.drain(..width);
        let blank = Cell { ch: SPACE, attr: self.attribute };
        self.cells.extend(std::iter::repeat(blank).take(width));
    }

    fn line_feed(&mut self) {
        self.cursor.x = 0;
        if self.cursor.y + 1 >= self.height {
            self.scroll_up();
        } else {
            self.cursor.y += 1;
        }
    }

    /// Processed output: CR, LF and backspace move the cursor
    fn put_units(&mut self, units: &[u16]) {
        for &unit in units {
            self.output.push(unit);
            match unit {
                0x0D => self.cursor.x = 0,
                0x0A => self.line_feed(),
                0x08 => self.cursor.x = (self.cursor.x - 1).max(0),
                _ => {
                    if let Some(idx) = self.index(self.cursor) {
                        self.cells[idx] = Cell { ch: unit, attr: self.attribute };
                    }
                    self.cursor.x += 1;
                    if self.cursor.x >= self.width {
                        self.line_feed();
                    }
                }
            }
        }
    }

    fn window(&self) -> WindowRect {
        WindowRect {
            left: 0,
            top: 0,
            right: self.width - 1,
            bottom: self.window_rows.min(self.height) - 1,
        }
    }

    fn read_failure(&self, operation: &'static str) -> Option<ConsoleError> {
        if self.fail_reads {
            Some(ConsoleError::device(
                operation,
                io::Error::new(io::ErrorKind::Other, "injected read failure"),
            ))
        } else {
            None
        }
    }
}

fn exhausted(operation: &'static str) -> ConsoleError {
    ConsoleError::device(
        operation,
        io::Error::new(io::ErrorKind::UnexpectedEof, "input queue exhausted"),
    )
}

/// In-memory console
pub struct VirtualConsole {
    state: RefCell<VirtualState>,
}

impl Default for VirtualConsole {
    fn default() -> Self {
        Self::new(80, 300)
    }
}

impl VirtualConsole {
    /// Create a console whose buffer is `width` x `height` cells, with a
    /// 25-row visible window at the top of the buffer
    pub fn new(width: i16, height: i16) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let attribute = Attribute::DEFAULT;
        Self {
            state: RefCell::new(VirtualState {
                width,
                height,
                cells: vec![Cell { ch: SPACE, attr: attribute }; width as usize * height as usize],
                cursor: Coord::ORIGIN,
                attribute,
                window_rows: 25,
                mode: DEFAULT_INPUT_MODE,
                mode_history: Vec::new(),
                typed: VecDeque::new(),
                records: VecDeque::new(),
                runtime: VecDeque::new(),
                key_states: HashMap::new(),
                output: Vec::new(),
                calls: Vec::new(),
                fail_reads: false,
            }),
        }
    }

    /// Queue characters for `read_console`
    pub fn type_text(&self, text: &str) {
        self.state.borrow_mut().typed.extend(text.encode_utf16());
    }

    pub fn type_units(&self, units: &[u16]) {
        self.state.borrow_mut().typed.extend(units.iter().copied());
    }

    /// Queue an input record for `read_input_record` / `peek_input_count`
    pub fn push_record(&self, record: InputRecord) {
        self.state.borrow_mut().records.push_back(record);
    }

    /// Queue a press followed by a release of `virtual_key`
    pub fn push_keystroke(&self, virtual_key: u16) {
        let mut state = self.state.borrow_mut();
        state.records.push_back(InputRecord::Key(KeyRecord::pressed(virtual_key)));
        state.records.push_back(InputRecord::Key(KeyRecord::released(virtual_key)));
    }

    /// Queue units for the runtime key reader
    pub fn push_runtime_units(&self, units: &[i32]) {
        self.state.borrow_mut().runtime.extend(units.iter().copied());
    }

    /// Hold `virtual_key` down
    pub fn press_key(&self, virtual_key: i32) {
        let mut state = self.state.borrow_mut();
        let entry = state.key_states.entry(virtual_key).or_insert(0);
        *entry |= KEY_DOWN_BIT | PRESSED_BIT;
    }

    /// Let go of `virtual_key`; the "pressed since last query" bit survives
    pub fn release_key(&self, virtual_key: i32) {
        let mut state = self.state.borrow_mut();
        let entry = state.key_states.entry(virtual_key).or_insert(0);
        *entry &= !KEY_DOWN_BIT;
    }

    /// Make every subsequent read fail
    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// Change the input mode without going through the device log
    pub fn force_input_mode(&self, mode: InputModeFlags) {
        self.state.borrow_mut().mode = mode;
    }

    pub fn current_input_mode(&self) -> InputModeFlags {
        self.state.borrow().mode
    }

    /// Every mode passed to `set_input_mode`, oldest first
    pub fn mode_history(&self) -> Vec<InputModeFlags> {
        self.state.borrow().mode_history.clone()
    }

    /// Names of the device operations performed, oldest first
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Everything written to the output, including echo
    pub fn output(&self) -> Vec<u16> {
        self.state.borrow().output.clone()
    }

    pub fn output_string(&self) -> String {
        String::from_utf16_lossy(&self.state.borrow().output)
    }

    pub fn pending_typed(&self) -> usize {
        self.state.borrow().typed.len()
    }

    pub fn size(&self) -> (i16, i16) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    pub fn cell(&self, x: i16, y: i16) -> Option<Cell> {
        let state = self.state.borrow();
        state.index(Coord::new(x, y)).map(|idx| state.cells[idx])
    }

    /// Row `y` as text, trailing spaces included
    pub fn row_text(&self, y: i16) -> String {
        let state = self.state.borrow();
        if y < 0 || y >= state.height {
            return String::new();
        }
        let start = y as usize * state.width as usize;
        let row = &state.cells[start..start + state.width as usize];
        row.iter().map(Cell::display_char).collect()
    }

    /// Copy of row `y`
    pub fn row_cells(&self, y: i16) -> Vec<Cell> {
        let state = self.state.borrow();
        if y < 0 || y >= state.height {
            return Vec::new();
        }
        let start = y as usize * state.width as usize;
        state.cells[start..start + state.width as usize].to_vec()
    }

    /// Resize the buffer, as another process or the user could at any time
    pub fn resize(&self, width: i16, height: i16) {
        let mut state = self.state.borrow_mut();
        let width = width.max(1);
        let height = height.max(1);
        let blank = Cell { ch: SPACE, attr: state.attribute };
        let mut cells = vec![blank; width as usize * height as usize];
        for y in 0..height.min(state.height) {
            for x in 0..width.min(state.width) {
                let from = y as usize * state.width as usize + x as usize;
                cells[y as usize * width as usize + x as usize] = state.cells[from];
            }
        }
        state.cells = cells;
        state.width = width;
        state.height = height;
        state.cursor.x = state.cursor.x.min(width - 1);
        state.cursor.y = state.cursor.y.min(height - 1);
    }
}

impl ConsoleDevice for VirtualConsole {
    fn screen_buffer_info(&self) -> Result<BufferInfo> {
        let mut state = self.state.borrow_mut();
        state.calls.push("GetConsoleScreenBufferInfo");
        Ok(BufferInfo {
            width: state.width,
            height: state.height,
            cursor: state.cursor,
            attribute: state.attribute,
            window: state.window(),
        })
    }

    fn set_cursor_position(&self, at: Coord) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push("SetConsoleCursorPosition");
        // Out-of-range positions leave the cursor where it is
        if state.index(at).is_some() {
            state.cursor = at;
        }
        Ok(())
    }

    fn set_text_attribute(&self, attr: Attribute) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push("SetConsoleTextAttribute");
        state.attribute = attr;
        Ok(())
    }

    fn fill_output_character(&self, ch: u16, len: u32, origin: Coord) -> Result<u32> {
        let mut state = self.state.borrow_mut();
        state.calls.push("FillConsoleOutputCharacter");
        let Some(start) = state.index(origin) else {
            return Ok(0);
        };
        let end = (start + len as usize).min(state.cells.len());
        for cell in &mut state.cells[start..end] {
            cell.ch = ch;
        }
        Ok((end - start) as u32)
    }

    fn fill_output_attribute(&self, attr: Attribute, len: u32, origin: Coord) -> Result<u32> {
        let mut state = self.state.borrow_mut();
        state.calls.push("FillConsoleOutputAttribute");
        let Some(start) = state.index(origin) else {
            return Ok(0);
        };
        let end = (start + len as usize).min(state.cells.len());
        for cell in &mut state.cells[start..end] {
            cell.attr = attr;
        }
        Ok((end - start) as u32)
    }

    fn write_console(&self, units: &[u16]) -> Result<u32> {
        let mut state = self.state.borrow_mut();
        state.calls.push("WriteConsole");
        state.put_units(units);
        Ok(units.len() as u32)
    }

    fn input_mode(&self) -> Result<InputModeFlags> {
        let mut state = self.state.borrow_mut();
        state.calls.push("GetConsoleMode");
        Ok(state.mode)
    }

    fn set_input_mode(&self, mode: InputModeFlags) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push("SetConsoleMode");
        state.mode = mode;
        state.mode_history.push(mode);
        Ok(())
    }

    fn read_console(&self, buf: &mut [u16]) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        state.calls.push("ReadConsole");
        if let Some(err) = state.read_failure("ReadConsole") {
            return Err(err);
        }

        let available = if state.mode.contains(InputModeFlags::LINE_INPUT) {
            match state.typed.iter().position(|&u| u == 0x0A) {
                Some(lf) => lf + 1,
                None => state.typed.len(),
            }
        } else {
            state.typed.len()
        };

        let count = available.min(buf.len());
        for slot in buf.iter_mut().take(count) {
            // count <= typed.len()
            *slot = state.typed.pop_front().unwrap_or(0);
        }

        let echo = InputModeFlags::LINE_INPUT | InputModeFlags::ECHO_INPUT;
        if state.mode.contains(echo) {
            let echoed = buf[..count].to_vec();
            state.put_units(&echoed);
        }
        Ok(count)
    }

    fn read_input_record(&self) -> Result<Option<InputRecord>> {
        let mut state = self.state.borrow_mut();
        state.calls.push("ReadConsoleInput");
        if let Some(err) = state.read_failure("ReadConsoleInput") {
            return Err(err);
        }
        match state.records.pop_front() {
            Some(record) => Ok(Some(record)),
            None => Err(exhausted("ReadConsoleInput")),
        }
    }

    fn peek_input_count(&self) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        state.calls.push("PeekConsoleInput");
        Ok(state.records.len().min(1))
    }

    fn async_key_state(&self, virtual_key: i32) -> i16 {
        let mut state = self.state.borrow_mut();
        state.calls.push("GetAsyncKeyState");
        match state.key_states.get_mut(&virtual_key) {
            Some(bits) => {
                let current = *bits;
                *bits &= !PRESSED_BIT;
                current
            }
            None => 0,
        }
    }

    fn read_runtime_unit(&self) -> Result<i32> {
        let mut state = self.state.borrow_mut();
        state.calls.push("_getch");
        if let Some(err) = state.read_failure("_getch") {
            return Err(err);
        }
        state.runtime.pop_front().ok_or_else(|| exhausted("_getch"))
    }
}
