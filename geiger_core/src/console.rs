//! Line-oriented command console.
//!
//! Each line is one token. Any number of readers may feed the same
//! channel; the runner applies commands between periods.
use std::io::BufRead;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::flags::Flag;

pub const HELP: &str = "commands: debug | network | file | display (toggle), \
status, history, temperature, restart, rearm, help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle(Flag),
    Status,
    History,
    Temperature,
    Restart,
    Rearm,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let token = line.trim();
        if token.is_empty() {
            return None;
        }
        if let Some(flag) = Flag::parse(token) {
            return Some(Command::Toggle(flag));
        }
        let cmd = match token.to_ascii_lowercase().as_str() {
            "status" | "s" => Command::Status,
            "history" | "h" => Command::History,
            "temperature" | "temp" | "t" => Command::Temperature,
            "restart" | "reset" => Command::Restart,
            "rearm" => Command::Rearm,
            "help" | "?" => Command::Help,
            _ => Command::Unknown(token.to_string()),
        };
        Some(cmd)
    }
}

/// Spawn a thread that parses lines from `reader` into `tx` until EOF,
/// a read error, or the receiving side hanging up.
pub fn spawn_line_reader<R>(
    name: &str,
    reader: R,
    tx: Sender<Command>,
) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    let label = name.to_string();
    std::thread::Builder::new()
        .name(format!("console-{name}"))
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::warn!(stream = %label, error = %e, "console read failed");
                        break;
                    }
                };
                let Some(cmd) = Command::parse(&line) else {
                    continue;
                };
                tracing::debug!(stream = %label, ?cmd, "console command");
                if tx.send(cmd).is_err() {
                    break;
                }
            }
            tracing::trace!(stream = %label, "console reader exiting");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case("debug", Some(Command::Toggle(Flag::Debug)))]
    #[case("  network\r", Some(Command::Toggle(Flag::Network)))]
    #[case("FILE", Some(Command::Toggle(Flag::FileLogging)))]
    #[case("display", Some(Command::Toggle(Flag::Display)))]
    #[case("status", Some(Command::Status))]
    #[case("history", Some(Command::History))]
    #[case("restart", Some(Command::Restart))]
    #[case("rearm", Some(Command::Rearm))]
    #[case("?", Some(Command::Help))]
    #[case("temp", Some(Command::Temperature))]
    #[case("Temperature", Some(Command::Temperature))]
    #[case("gamma", Some(Command::Unknown("gamma".into())))]
    #[case("   ", None)]
    fn parses_tokens(#[case] line: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::parse(line), expected);
    }

    #[test]
    fn two_streams_feed_one_channel() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let a = spawn_line_reader("a", Cursor::new("status\n\nnetwork\n"), tx.clone()).unwrap();
        let b = spawn_line_reader("b", Cursor::new("history\n"), tx).unwrap();
        a.join().unwrap();
        b.join().unwrap();
        let got: Vec<Command> = rx.iter().collect();
        assert_eq!(got.len(), 3);
        assert!(got.contains(&Command::Toggle(Flag::Network)));
        assert!(got.contains(&Command::History));
    }
}
