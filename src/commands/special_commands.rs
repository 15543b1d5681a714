//! Special commands parser for interactive chat mode
//!
//! This module parses special commands entered during a tutoring session.
//! Special commands allow users to:
//! - Set the topic for following questions
//! - Start a new conversation
//! - Export the transcript as text or PDF
//! - List the transcript, suggestions, and session status
//! - Exit the session
//!
//! Commands are prefixed with `/`; the command word is case-insensitive,
//! arguments keep their case.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportFormat;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// A ready-made topic and question offered to new users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub topic: &'static str,
    pub question: &'static str,
}

/// Quick-start suggestions, numbered from 1 in `/suggest`
pub const SUGGESTIONS: [Suggestion; 3] = [
    Suggestion {
        topic: "Python",
        question: "How do list comprehensions work?",
    },
    Suggestion {
        topic: "Math",
        question: "What is the chain rule in calculus?",
    },
    Suggestion {
        topic: "History",
        question: "What caused the fall of Rome?",
    },
];

/// Special commands that can be executed during interactive chat
///
/// These commands change session state or show information instead of
/// being sent to the tutor as a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Set the topic used for following questions
    SetTopic(String),

    /// Clear the conversation and start over
    NewConversation,

    /// Export the transcript, optionally into a specific directory
    Export {
        format: ExportFormat,
        dir: Option<PathBuf>,
    },

    /// Print the current transcript
    ShowHistory,

    /// List suggestions, or prefill the draft with suggestion `n` (1-based)
    Suggest(Option<usize>),

    /// Display topic, transcript size, and any pending error
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input is a question for the current topic.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] for an unrecognised `/` command,
/// [`CommandError::MissingArgument`] when a required argument is absent, and
/// [`CommandError::UnsupportedArgument`] for an invalid argument.
///
/// # Examples
///
/// ```
/// use study_tutor::commands::special_commands::{parse_special_command, SpecialCommand};
/// use study_tutor::export::ExportFormat;
///
/// let cmd = parse_special_command("/topic Linear Algebra").unwrap();
/// assert_eq!(cmd, SpecialCommand::SetTopic("Linear Algebra".to_string()));
///
/// let cmd = parse_special_command("/export pdf").unwrap();
/// assert_eq!(cmd, SpecialCommand::Export { format: ExportFormat::Pdf, dir: None });
///
/// let cmd = parse_special_command("what is a vector space?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return match lower.as_str() {
            "exit" | "quit" => Ok(SpecialCommand::Exit),
            _ => Ok(SpecialCommand::None),
        };
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/topic" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/topic".to_string(),
                    usage: "/topic <text>".to_string(),
                })
            } else {
                Ok(SpecialCommand::SetTopic(rest.to_string()))
            }
        }

        "/new" | "/clear" => no_argument("/new", rest, SpecialCommand::NewConversation),

        "/export" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            let format = match args.next().filter(|s| !s.is_empty()) {
                Some(format) => format.parse::<ExportFormat>().map_err(|_| {
                    CommandError::UnsupportedArgument {
                        command: "/export".to_string(),
                        arg: format.to_string(),
                    }
                })?,
                None => {
                    return Err(CommandError::MissingArgument {
                        command: "/export".to_string(),
                        usage: "/export <text|pdf> [dir]".to_string(),
                    })
                }
            };
            let dir = args
                .next()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from);
            Ok(SpecialCommand::Export { format, dir })
        }

        "/history" => no_argument("/history", rest, SpecialCommand::ShowHistory),

        "/suggest" => {
            if rest.is_empty() {
                return Ok(SpecialCommand::Suggest(None));
            }
            match rest.parse::<usize>() {
                Ok(n) if (1..=SUGGESTIONS.len()).contains(&n) => Ok(SpecialCommand::Suggest(Some(n))),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/suggest".to_string(),
                    arg: rest.to_string(),
                }),
            }
        }

        "/status" => no_argument("/status", rest, SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(word)),
    }
}

fn no_argument(
    command: &str,
    rest: &str,
    parsed: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: rest.to_string(),
        })
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

ASKING:
  <text>              - Ask a question on the current topic
  /topic <text>       - Set the topic for following questions
  /suggest            - List quick-start suggestions
  /suggest <n>        - Prefill topic and question from suggestion n

CONVERSATION:
  /history            - Show the current transcript
  /new                - Start a new conversation (clears the transcript)
  /clear              - Same as /new

EXPORT:
  /export text [dir]  - Save the transcript as plain text
  /export pdf [dir]   - Save the transcript as a paginated PDF

SESSION:
  /status             - Show topic, transcript size, and last error
  /help               - Show this help message
  /?                  - Same as /help
  /exit               - Exit interactive mode
  exit, quit          - Same as /exit

NOTES:
  - Command names are case-insensitive
  - Export is only available once the transcript has at least one exchange
  - Without a directory, exports go to export.output_dir from the config
"#
    );
}

/// Display the numbered suggestion list
pub fn print_suggestions() {
    use colored::Colorize;

    println!("\nTry one of these:");
    for (idx, suggestion) in SUGGESTIONS.iter().enumerate() {
        println!(
            "  {}  {} - {}",
            format!("{}.", idx + 1).cyan(),
            suggestion.topic.bold(),
            suggestion.question
        );
    }
    println!("\nUse {} to pick one.\n", "/suggest <n>".cyan());
}
