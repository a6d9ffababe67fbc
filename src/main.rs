//! wincon - console control from the command line
//!
//! Runs one console command against the current console window and prints
//! its result, e.g.
//!
//! ```text
//! wincon clrscr
//! wincon textattr yellow blue
//! wincon gotoxy 10 5
//! wincon getchex
//! ```

use std::env;

use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use wincon::command::{Command, COMMANDS};
use wincon::config::Config;
use wincon::{Console, ConsoleDevice, ConsoleError};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the command line asked for
enum Invocation {
    Help,
    Version,
    Run {
        word: String,
        args: Vec<String>,
        /// Apply the configured colors first
        apply_colors: bool,
    },
}

fn print_version() {
    eprintln!("wincon {}", VERSION);
}

fn print_help() {
    eprintln!("wincon {} - Windows console control", VERSION);
    eprintln!();
    eprintln!("Usage: wincon [OPTIONS] <COMMAND> [ARGS...]");
    eprintln!();
    eprintln!("Commands:");
    for (word, usage) in COMMANDS {
        eprintln!("  {:<14}{}", word, usage);
    }
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --colors          Apply configured colors before the command");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Colors: black, blue, green, cyan, red, magenta, brown, lightgray,");
    eprintln!("        darkgray, lightblue, lightgreen, lightcyan, lightred,");
    eprintln!("        lightmagenta, yellow, white");
    eprintln!();
    eprintln!("Configuration: ~/.wincon/config.toml");
}

fn parse_args() -> Result<Invocation, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut apply_colors = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-v" | "--version" => return Ok(Invocation::Version),
            "-c" | "--colors" => apply_colors = true,
            word => {
                return Ok(Invocation::Run {
                    word: word.to_string(),
                    args: args[i + 1..].to_vec(),
                    apply_colors,
                });
            }
        }
        i += 1;
    }

    Err("Missing command".to_string())
}

/// Log to ~/.wincon/wincon.log so console output stays clean
fn init_logging(config: &Config) {
    if !config.log.enabled {
        return;
    }

    let log_path = Config::config_dir()
        .map(|dir| dir.join("wincon.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("wincon.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(config.log.level())
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let invocation = match parse_args() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let (word, args, apply_colors) = match invocation {
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Version => {
            print_version();
            return Ok(());
        }
        Invocation::Run { word, args, apply_colors } => (word, args, apply_colors),
    };

    let config = Config::load();
    init_logging(&config);
    info!("wincon {} running '{}'", VERSION, word);

    // Arguments are checked before the console is touched
    let command = match Command::parse(&word, &args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match wincon::initialize() {
        Ok(console) => run_command(console, &config, &command, apply_colors),
        Err(e) => no_console(e, &config, &command, apply_colors),
    }
}

#[cfg(windows)]
fn no_console(e: ConsoleError, _config: &Config, _command: &Command, _apply_colors: bool) -> anyhow::Result<()> {
    error!("Console initialization failed: {}", e);
    Err(e.into())
}

#[cfg(not(windows))]
fn no_console(e: ConsoleError, config: &Config, command: &Command, apply_colors: bool) -> anyhow::Result<()> {
    info!("No console available: {}", e);
    eprintln!("wincon needs a Windows console; running in demo mode...");
    demo::run_demo(config, command, apply_colors)
}

fn run_command<D: ConsoleDevice>(
    console: &Console<D>,
    config: &Config,
    command: &Command,
    apply_colors: bool,
) -> anyhow::Result<()> {
    if apply_colors {
        let attr = config.attribute()?;
        console.screen().apply_attribute(attr)?;
        info!("Applied configured attribute {}", attr);
    }

    match command.run(console) {
        Ok(Some(result)) => {
            println!("{}", result);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(not(windows))]
mod demo {
    use std::io::{self, Write};

    use crossterm::queue;
    use crossterm::style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor};

    use wincon::command::Command;
    use wincon::config::Config;
    use wincon::{ColorName, Console, VirtualConsole};

    use super::run_command;

    /// Run the command against an in-memory console and render what it left
    /// on screen
    pub fn run_demo(config: &Config, command: &Command, apply_colors: bool) -> anyhow::Result<()> {
        let console = Console::with_device(VirtualConsole::new(60, 12));
        let device = console.device();

        // Scripted input for the reading commands
        device.type_text("x");
        device.type_text("hello from the demo\r\n");
        device.push_keystroke(wincon::keys::VK_UP);
        device.push_runtime_units(&[0xE0, 0x48]);

        console.screen().set_colors("white", "blue")?;
        console.screen().clear()?;
        console.goto(2, 1)?;
        console.screen().write_text(&wincon::about(), false)?;
        for (i, color) in ColorName::ALL.iter().enumerate() {
            console.goto(2 + (i as i16 % 8) * 7, 3 + i as i16 / 8)?;
            console.screen().set_color_names(*color, ColorName::Black)?;
            console.screen().write_text(&color.name()[..color.name().len().min(6)], false)?;
        }
        console.screen().set_colors("lightgray", "black")?;
        console.goto(0, 6)?;

        run_command(&console, config, command, apply_colors)?;

        render_virtual(device)?;
        Ok(())
    }

    fn render_virtual(device: &VirtualConsole) -> io::Result<()> {
        let mut stdout = io::stdout();
        let (_, height) = device.size();

        for y in 0..height {
            for cell in device.row_cells(y) {
                queue!(
                    stdout,
                    SetForegroundColor(cell.attr.foreground_color().to_crossterm()),
                    SetBackgroundColor(cell.attr.background_color().to_crossterm()),
                    Print(cell.display_char())
                )?;
            }
            queue!(stdout, ResetColor, Print("\r\n"))?;
        }
        stdout.flush()
    }
}
