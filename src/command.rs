//! Command-line surface of the console operations
//!
//! Each command is one word followed by its arguments, e.g. `gotoxy 10 5` or
//! `textattr yellow blue`. Arguments are checked completely before a command
//! touches the console.

use std::str::FromStr;

use crate::console::{about, Console};
use crate::core::device::{ConsoleDevice, ConsoleError, Coord, Result};
use crate::keys::key_name;

/// A parsed console command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    About,
    Clear,
    GotoXY(Coord),
    WhereX,
    WhereY,
    BufferWidth,
    BufferHeight,
    Info,
    TextAttr { foreground: String, background: String },
    Puts { text: String, newline: bool },
    Putch(char),
    Getch,
    Getche,
    Gets,
    Getse,
    Kbhit,
    GetchEx,
    GetKeyState(i32),
    Getch2,
}

/// Command words with their argument synopsis, for help output
pub const COMMANDS: &[(&str, &str)] = &[
    ("about", ""),
    ("clrscr", ""),
    ("gotoxy", "x y"),
    ("wherex", ""),
    ("wherey", ""),
    ("bufferwidth", ""),
    ("bufferheight", ""),
    ("info", ""),
    ("textattr", "foreground background"),
    ("cputs", "?-nonewline? string"),
    ("putch", "char"),
    ("getch", ""),
    ("getche", ""),
    ("cgets", ""),
    ("cgetse", ""),
    ("kbhit", ""),
    ("getchex", ""),
    ("getkeystate", "id"),
    ("getch2", ""),
];

fn parse_number<T: FromStr>(argument: &str) -> Result<T> {
    argument.parse::<T>().map_err(|_| ConsoleError::ArgumentType {
        argument: argument.to_string(),
        expected: "integer",
    })
}

fn require(args: &[String], count: usize, command: &'static str, usage: &'static str) -> Result<()> {
    if args.len() < count {
        return Err(ConsoleError::ArgumentArity { command, usage });
    }
    Ok(())
}

impl Command {
    /// Parse a command word and its arguments
    pub fn parse(word: &str, args: &[String]) -> Result<Command> {
        let command = match word {
            "about" => Command::About,
            "clrscr" => Command::Clear,
            "gotoxy" => {
                require(args, 2, "gotoxy", "x y")?;
                let x = parse_number::<i16>(&args[0])?;
                let y = parse_number::<i16>(&args[1])?;
                Command::GotoXY(Coord::new(x, y))
            }
            "wherex" => Command::WhereX,
            "wherey" => Command::WhereY,
            "bufferwidth" => Command::BufferWidth,
            "bufferheight" => Command::BufferHeight,
            "info" => Command::Info,
            "textattr" => {
                require(args, 2, "textattr", "foreground background")?;
                Command::TextAttr {
                    foreground: args[0].clone(),
                    background: args[1].clone(),
                }
            }
            "cputs" => {
                require(args, 1, "cputs", "?-nonewline? string")?;
                if args.len() > 1 {
                    if args[0] != "-nonewline" {
                        return Err(ConsoleError::ArgumentArity {
                            command: "cputs",
                            usage: "?-nonewline? string",
                        });
                    }
                    Command::Puts { text: args[1].clone(), newline: false }
                } else {
                    Command::Puts { text: args[0].clone(), newline: true }
                }
            }
            "putch" => {
                require(args, 1, "putch", "char")?;
                let ch = args[0].chars().next().ok_or_else(|| ConsoleError::ArgumentType {
                    argument: args[0].clone(),
                    expected: "character",
                })?;
                Command::Putch(ch)
            }
            "getch" => Command::Getch,
            "getche" => Command::Getche,
            "cgets" => Command::Gets,
            "cgetse" => Command::Getse,
            "kbhit" => Command::Kbhit,
            "getchex" => Command::GetchEx,
            "getkeystate" => {
                require(args, 1, "getkeystate", "id")?;
                Command::GetKeyState(parse_number::<i32>(&args[0])?)
            }
            "getch2" => Command::Getch2,
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// Run against `console`, returning the text result if the command has one
    pub fn run<D: ConsoleDevice>(&self, console: &Console<D>) -> Result<Option<String>> {
        let input = console.input();
        let screen = console.screen();

        let result = match self {
            Command::About => Some(about()),
            Command::Clear => {
                screen.clear()?;
                None
            }
            Command::GotoXY(at) => {
                console.set_cursor(*at)?;
                None
            }
            Command::WhereX => Some(console.cursor_x()?.to_string()),
            Command::WhereY => Some(console.cursor_y()?.to_string()),
            Command::BufferWidth => Some(console.buffer_width()?.to_string()),
            Command::BufferHeight => Some(console.buffer_height()?.to_string()),
            Command::Info => {
                let info = console.geometry()?;
                Some(format!(
                    "buffer {}x{} cursor {},{} window {},{}-{},{} attribute {}",
                    info.width,
                    info.height,
                    info.cursor.x,
                    info.cursor.y,
                    info.window.left,
                    info.window.top,
                    info.window.right,
                    info.window.bottom,
                    info.attribute
                ))
            }
            Command::TextAttr { foreground, background } => {
                screen.set_colors(foreground, background)?;
                None
            }
            Command::Puts { text, newline } => {
                screen.write_text(text, *newline)?;
                None
            }
            Command::Putch(ch) => {
                screen.write_char(*ch)?;
                None
            }
            Command::Getch => input.read_key_raw(false)?.map(String::from),
            Command::Getche => input.read_key_raw(true)?.map(String::from),
            Command::Gets => Some(input.read_line(false)?),
            Command::Getse => Some(input.read_line(true)?),
            Command::Kbhit => {
                let pending = input.poll_pending()?;
                Some(u8::from(pending).to_string())
            }
            Command::GetchEx => {
                let code = input.read_extended_key()?;
                Some(format!("{} ({})", code, key_name(code)))
            }
            Command::GetKeyState(id) => Some(input.key_state(*id).raw().to_string()),
            Command::Getch2 => Some(input.read_runtime_key()?.to_string()),
        };
        Ok(result)
    }
}
