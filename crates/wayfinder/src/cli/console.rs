//! Line commands typed while a session is running.

use std::str::FromStr;

use thiserror::Error;

/// A command read from the interactive console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Pause guidance.
    Pause,
    /// Resume guidance.
    Resume,
    /// End the session.
    Stop,
    /// Re-check traffic.
    Recalculate,
    /// Set voice on or off, or flip it when no argument was given.
    Voice(Option<bool>),
    /// Print the session status.
    Status,
    /// Print the command list.
    Help,
}

/// A console line that did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command '{0}' (try 'help')")]
pub struct UnknownCommand(pub String);

impl FromStr for ConsoleCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace().map(str::to_ascii_lowercase);
        let head = words.next().unwrap_or_default();
        let arg = words.next();

        let cmd = match (head.as_str(), arg.as_deref()) {
            ("pause" | "p", None) => Self::Pause,
            ("resume" | "r", None) => Self::Resume,
            ("stop" | "quit" | "q", None) => Self::Stop,
            ("recalc" | "recalculate", None) => Self::Recalculate,
            ("voice" | "v", None) => Self::Voice(None),
            ("voice" | "v", Some("on")) => Self::Voice(Some(true)),
            ("voice" | "v", Some("off")) => Self::Voice(Some(false)),
            ("status" | "s", None) => Self::Status,
            ("help" | "?", None) => Self::Help,
            _ => return Err(UnknownCommand(line.trim().to_string())),
        };
        Ok(cmd)
    }
}

/// One-line summary of the console commands.
pub const CONSOLE_HELP: &str =
    "commands: pause | resume | stop | recalc | voice [on|off] | status | help";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("pause".parse(), Ok(ConsoleCommand::Pause));
        assert_eq!(" Resume ".parse(), Ok(ConsoleCommand::Resume));
        assert_eq!("q".parse(), Ok(ConsoleCommand::Stop));
        assert_eq!("recalc".parse(), Ok(ConsoleCommand::Recalculate));
        assert_eq!("status".parse(), Ok(ConsoleCommand::Status));
    }

    #[test]
    fn test_parse_voice() {
        assert_eq!("voice".parse(), Ok(ConsoleCommand::Voice(None)));
        assert_eq!("voice on".parse(), Ok(ConsoleCommand::Voice(Some(true))));
        assert_eq!("VOICE OFF".parse(), Ok(ConsoleCommand::Voice(Some(false))));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "fly away".parse::<ConsoleCommand>().unwrap_err();
        assert_eq!(err, UnknownCommand("fly away".to_string()));
        assert_eq!(err.to_string(), "unknown command 'fly away' (try 'help')");

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());

        assert!("voice maybe".parse::<ConsoleCommand>().is_err());
        assert!("pause now".parse::<ConsoleCommand>().is_err());
        assert!("".parse::<ConsoleCommand>().is_err());
    }
}
