/// Terminal commands: help, quit and manual window override
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::tasks::Shutdown;

const HELP: &str = "--Help message--
Valid commands are:
\t'help' 'h' '?'\t\t- Shows Help message
\t'open' 'f'\t\t- Holds the window open
\t'close' 'r'\t\t- Holds the window closed
\t'auto'\t\t\t- Returns the window to automatic control
\t'q' 'quit' 'exit'\t- Exits this program by stopping all processes and actuators";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOverride {
    Auto,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Window(WindowOverride),
    Unknown,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let command = match line.trim() {
        "" => return None,
        "help" | "h" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "open" | "f" => Command::Window(WindowOverride::Open),
        "close" | "r" => Command::Window(WindowOverride::Closed),
        "auto" => Command::Window(WindowOverride::Auto),
        _ => Command::Unknown,
    };
    Some(command)
}

/// Manual override shared between the terminal and the control loop
#[derive(Debug, Clone)]
pub struct ManualControl {
    window: Arc<Mutex<WindowOverride>>,
}

impl ManualControl {
    pub fn new() -> Self {
        ManualControl {
            window: Arc::new(Mutex::new(WindowOverride::Auto)),
        }
    }

    pub fn window(&self) -> WindowOverride {
        *self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_window(&self, mode: WindowOverride) {
        *self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = mode;
    }
}

impl Default for ManualControl {
    fn default() -> Self {
        Self::new()
    }
}

fn term_write(text: &str) {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "\n{}\n> ", text);
    let _ = stdout.flush();
}

/// Forward stdin lines from a dedicated thread, since a blocking read cannot be cancelled
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read terminal input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Apply one command; returns false once the program should stop
pub fn handle_command(command: Command, manual: &ManualControl, shutdown: &Shutdown) -> bool {
    match command {
        Command::Help => term_write(HELP),
        Command::Quit => {
            term_write("Program shutting down on next iteration...");
            shutdown.trigger();
            return false;
        }
        Command::Window(mode) => {
            manual.set_window(mode);
            info!("Window override set to {:?}", mode);
            term_write(&format!("Window control: {:?}", mode));
        }
        Command::Unknown => term_write("Command not recognized!"),
    }
    true
}

pub async fn run(mut lines: mpsc::Receiver<String>, manual: ManualControl, shutdown: Shutdown) {
    term_write(HELP);
    let mut stop = shutdown.clone();

    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = stop.triggered() => break,
        };

        let Some(line) = line else {
            // stdin closed (e.g. running as a service); keep running without commands
            stop.triggered().await;
            break;
        };

        if let Some(command) = parse_command(&line) {
            if !handle_command(command, &manual, &shutdown) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands_and_aliases() {
        assert_eq!(parse_command("h"), Some(Command::Help));
        assert_eq!(parse_command(" ? "), Some(Command::Help));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
        assert_eq!(parse_command("f"), Some(Command::Window(WindowOverride::Open)));
        assert_eq!(parse_command("close"), Some(Command::Window(WindowOverride::Closed)));
        assert_eq!(parse_command("auto"), Some(Command::Window(WindowOverride::Auto)));
        assert_eq!(parse_command("dance"), Some(Command::Unknown));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn quit_triggers_shutdown() {
        let manual = ManualControl::new();
        let shutdown = Shutdown::new();
        assert!(handle_command(Command::Help, &manual, &shutdown));
        assert!(!shutdown.is_triggered());
        assert!(!handle_command(Command::Quit, &manual, &shutdown));
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn run_applies_override_then_quits() {
        let (tx, rx) = mpsc::channel(4);
        let manual = ManualControl::new();
        let shutdown = Shutdown::new();

        tx.send("open".to_string()).await.unwrap();
        tx.send("q".to_string()).await.unwrap();
        run(rx, manual.clone(), shutdown.clone()).await;

        assert_eq!(manual.window(), WindowOverride::Open);
        assert!(shutdown.is_triggered());
    }
}
