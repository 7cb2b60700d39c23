use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::attachment::ImageAttachment;
use crate::settings::Settings;
use crate::transcript::Transcript;

/// Everything one conversation owns. Passed explicitly to each operation.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub settings: Settings,
    pub transcript: Transcript,
    /// Attached image waiting for the next question; consumed by it.
    pub pending_image: Option<ImageAttachment>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            transcript: Transcript::new(),
            pending_image: None,
        }
    }
}

/// A line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    /// Send suggestion N (0-based) from `/prompts`.
    Pick(usize),
    History,
    /// Delete the turn at this 0-based position of the most-recent-first listing.
    Delete(usize),
    Image(PathBuf),
    Set { key: String, value: String },
    Profile,
    Prompts,
    Tips,
    Help,
    Quit,
    Empty,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command /{0} (try /help)")]
    Unknown(String),
    #[error("/{command} needs {what}")]
    MissingArgument { command: &'static str, what: &'static str },
    #[error("'{0}' is not a position from the list (numbers start at 1)")]
    BadPosition(String),
}

/// Parse one input line. Anything not starting with `/` is a question.
/// Positions are typed 1-based, as listed.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Ask(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((n, a)) => (n, a.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "history" | "h" => Ok(Command::History),
        "delete" | "del" => position(arg, "delete").map(Command::Delete),
        "pick" => position(arg, "pick").map(Command::Pick),
        "image" | "img" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument { command: "image", what: "a file path" })
            } else {
                Ok(Command::Image(PathBuf::from(arg)))
            }
        }
        "set" => match arg.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok(Command::Set {
                key: k.trim().to_string(),
                value: v.trim().to_string(),
            }),
            _ => Err(CommandError::MissingArgument { command: "set", what: "KEY=VALUE" }),
        },
        "profile" => Ok(Command::Profile),
        "prompts" => Ok(Command::Prompts),
        "tips" => Ok(Command::Tips),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn position(arg: &str, command: &'static str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument { command, what: "a position" });
    }
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadPosition(arg.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(parse_command("  how much urea?  "), Ok(Command::Ask("how much urea?".into())));
        assert_eq!(parse_command("   "), Ok(Command::Empty));
    }

    #[test]
    fn delete_positions_are_one_based() {
        assert_eq!(parse_command("/delete 1"), Ok(Command::Delete(0)));
        assert_eq!(parse_command("/del 3"), Ok(Command::Delete(2)));
        assert_eq!(parse_command("/delete 0"), Err(CommandError::BadPosition("0".into())));
        assert_eq!(parse_command("/delete x"), Err(CommandError::BadPosition("x".into())));
        assert!(matches!(parse_command("/delete"), Err(CommandError::MissingArgument { .. })));
    }

    #[test]
    fn set_splits_on_first_equals() {
        assert_eq!(
            parse_command("/set water = Poor (Rainfed)"),
            Ok(Command::Set { key: "water".into(), value: "Poor (Rainfed)".into() })
        );
        assert_eq!(
            parse_command("/set api_key=abc=="),
            Ok(Command::Set { key: "api_key".into(), value: "abc==".into() })
        );
        assert!(parse_command("/set nothing").is_err());
        assert!(parse_command("/set =x").is_err());
    }

    #[test]
    fn image_takes_the_rest_of_the_line() {
        assert_eq!(
            parse_command("/image photos/my leaf.png"),
            Ok(Command::Image(PathBuf::from("photos/my leaf.png")))
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(parse_command("/dance"), Err(CommandError::Unknown("dance".into())));
        assert_eq!(parse_command("/QUIT"), Ok(Command::Quit));
    }

    #[test]
    fn new_session_is_empty() {
        let s = Session::new(Settings::default());
        assert!(s.transcript.is_empty());
        assert!(s.pending_image.is_none());
    }
}
