//! Interactive console commands.
//!
//! Each line typed at the prompt parses into one [`ConsoleCommand`], which
//! maps onto exactly one session operation.

use crate::request::{Flag, UnknownFlag};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  flags                     show request flags
  toggle <flag>             flip a flag
  set <flag> on|off         set a flag
  file <path>               use an image file
  webcam                    open the camera
  capture                   take a photo with the open camera
  cancel                    close the camera without a photo
  check                     perform the liveness check
  show                      show the current screen
  reset                     clear image, flags, camera and result
  help                      show this help
  quit                      exit
Flags: quality, attribute, validate-quality, validate-attribute, validate-nface";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `help`
    Help,
    /// `flags`
    Flags,
    /// `toggle <flag>`
    Toggle(Flag),
    /// `set <flag> on|off`
    Set(Flag, bool),
    /// `file <path>`
    File(PathBuf),
    /// `webcam`
    Webcam,
    /// `capture`
    Capture,
    /// `cancel`
    Cancel,
    /// `check`
    Check,
    /// `show`
    Show,
    /// `reset`
    Reset,
    /// `quit`
    Quit,
}

/// Errors from parsing a console line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// First word is not a command.
    #[error("unknown command `{0}` (type `help`)")]
    UnknownCommand(String),
    /// A command was given without its argument.
    #[error("`{command}` needs {what}")]
    MissingArgument {
        /// Command as typed.
        command: &'static str,
        /// What was expected.
        what: &'static str,
    },
    /// `set` value is not on/off.
    #[error("expected on/off, got `{0}`")]
    InvalidSwitch(String),
    /// Flag name not recognised.
    #[error(transparent)]
    UnknownFlag(#[from] UnknownFlag),
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(ConsoleError::Empty),
            "help" | "?" => ConsoleCommand::Help,
            "flags" => ConsoleCommand::Flags,
            "toggle" => ConsoleCommand::Toggle(required(rest, "toggle", "a flag name")?.parse()?),
            "set" => {
                let mut parts = rest.split_whitespace();
                let flag = parts.next().ok_or(ConsoleError::MissingArgument {
                    command: "set",
                    what: "a flag name",
                })?;
                let value = parts.next().ok_or(ConsoleError::MissingArgument {
                    command: "set",
                    what: "on or off",
                })?;
                ConsoleCommand::Set(flag.parse()?, parse_switch(value)?)
            }
            "file" | "upload" => {
                ConsoleCommand::File(PathBuf::from(required(rest, "file", "a path")?))
            }
            "webcam" | "camera" => ConsoleCommand::Webcam,
            "capture" | "snap" => ConsoleCommand::Capture,
            "cancel" | "close" => ConsoleCommand::Cancel,
            "check" | "submit" => ConsoleCommand::Check,
            "show" => ConsoleCommand::Show,
            "reset" => ConsoleCommand::Reset,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

fn parse_switch(value: &str) -> Result<bool, ConsoleError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ConsoleError::InvalidSwitch(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!("check".parse(), Ok(ConsoleCommand::Check));
        assert_eq!("  Reset ".parse(), Ok(ConsoleCommand::Reset));
        assert_eq!("snap".parse(), Ok(ConsoleCommand::Capture));
    }

    #[test]
    fn test_flag_commands() {
        assert_eq!(
            "toggle validate-nface".parse(),
            Ok(ConsoleCommand::Toggle(Flag::ValidateNFace))
        );
        assert_eq!(
            "set quality off".parse(),
            Ok(ConsoleCommand::Set(Flag::UseQuality, false))
        );
        assert_eq!(
            "set quality maybe".parse::<ConsoleCommand>(),
            Err(ConsoleError::InvalidSwitch("maybe".into()))
        );
        assert!(matches!(
            "toggle sharpness".parse::<ConsoleCommand>(),
            Err(ConsoleError::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_file_path_keeps_spaces() {
        assert_eq!(
            "file /tmp/my face.jpg".parse(),
            Ok(ConsoleCommand::File(PathBuf::from("/tmp/my face.jpg")))
        );
    }

    #[test]
    fn test_missing_arguments() {
        assert!(matches!(
            "file".parse::<ConsoleCommand>(),
            Err(ConsoleError::MissingArgument { command: "file", .. })
        ));
        assert!(matches!(
            "set quality".parse::<ConsoleCommand>(),
            Err(ConsoleError::MissingArgument { command: "set", .. })
        ));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!("   ".parse::<ConsoleCommand>(), Err(ConsoleError::Empty));
        assert_eq!(
            "dance".parse::<ConsoleCommand>(),
            Err(ConsoleError::UnknownCommand("dance".into()))
        );
    }
}
