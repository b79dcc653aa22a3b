//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the model.

/// The character that introduces a command.
pub const COMMAND_PREFIX: char = '/';

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Save the conversation; `None` picks a timestamped file name.
    Save(Option<String>),

    /// Replace the conversation with one loaded from a file.
    Load(String),

    /// Display size, turn count and estimated tokens.
    Stats,

    /// Change the model.
    Model(String),

    /// Reset the conversation to the original system prompt.
    Forget,

    /// Replace the conversation with a model-written summary.
    Summarize,

    /// Replace (or insert) the leading system message.
    System(String),

    /// Enter autonomous mode, optionally steering it with a direction.
    Auto(Option<String>),

    /// Leave autonomous mode.
    AutoOff,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Bye,

    /// A command name that is not recognized.
    Unknown(String),

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Splits a command line into its name and raw argument.
///
/// The name is everything after the prefix up to the first whitespace.  The argument is the
/// rest of the line, trimmed, and `None` when empty.
pub fn split_command(input: &str) -> Option<(&str, Option<&str>)> {
    let rest = input.trim().strip_prefix(COMMAND_PREFIX)?;
    let (name, argument) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], Some(rest[idx..].trim())),
        None => (rest, None),
    };
    Some((name, argument.filter(|s| !s.is_empty())))
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use duologue::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/bye"), Some(ChatCommand::Bye));
/// assert!(parse_command("/model llama3.2").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let (name, argument) = split_command(input)?;
    let command = name.to_lowercase();

    let result = match command.as_str() {
        "save" => ChatCommand::Save(argument.map(str::to_string)),
        "load" => match argument {
            Some(path) => ChatCommand::Load(path.to_string()),
            None => ChatCommand::Invalid("/load requires a file name".to_string()),
        },
        "stats" => ChatCommand::Stats,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "forget" => ChatCommand::Forget,
        "summarize" => ChatCommand::Summarize,
        "system" => match argument {
            Some(prompt) => ChatCommand::System(prompt.to_string()),
            None => ChatCommand::Invalid("/system requires a prompt".to_string()),
        },
        "auto" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("off") => ChatCommand::AutoOff,
            other => ChatCommand::Auto(other.map(str::to_string)),
        },
        "help" | "?" => ChatCommand::Help,
        "bye" | "quit" | "exit" => ChatCommand::Bye,
        _ => ChatCommand::Unknown(name.to_string()),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /save [file]           Save the conversation (default: timestamped file)
  /load <file>           Replace the conversation with one saved earlier
  /stats                 Show size, turn count and estimated tokens
  /model <name>          Change the model (e.g., /model llama3.2)
  /forget                Start over with the original system prompt
  /summarize             Replace the conversation with a summary
  /system <prompt>       Replace the system prompt
  /auto [direction]      Let the model talk to itself (optionally steered)
  /auto off              Leave autonomous mode
  /help                  Show this help message
  /bye                   Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bye_commands() {
        assert_eq!(parse_command("/bye"), Some(ChatCommand::Bye));
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Bye));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Bye));
        assert_eq!(parse_command("  /bye  "), Some(ChatCommand::Bye));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(parse_command("/FORGET"), Some(ChatCommand::Forget));
        assert_eq!(parse_command("/Stats"), Some(ChatCommand::Stats));
    }

    #[test]
    fn parse_save() {
        assert_eq!(parse_command("/save"), Some(ChatCommand::Save(None)));
        assert_eq!(
            parse_command("/save chat.json"),
            Some(ChatCommand::Save(Some("chat.json".to_string())))
        );
    }

    #[test]
    fn parse_load() {
        assert_eq!(
            parse_command("/load my chat.json"),
            Some(ChatCommand::Load("my chat.json".to_string()))
        );
        assert!(matches!(
            parse_command("/load"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model   mistral:7b  "),
            Some(ChatCommand::Model("mistral:7b".to_string()))
        );
        assert_eq!(
            parse_command("/model    "),
            Some(ChatCommand::Invalid(
                "/model requires a model name".to_string()
            ))
        );
    }

    #[test]
    fn parse_system_keeps_spaces() {
        assert_eq!(
            parse_command("/system You are a pirate.  Talk like one."),
            Some(ChatCommand::System(
                "You are a pirate.  Talk like one.".to_string()
            ))
        );
        assert!(matches!(
            parse_command("/system"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_auto() {
        assert_eq!(parse_command("/auto"), Some(ChatCommand::Auto(None)));
        assert_eq!(parse_command("/auto off"), Some(ChatCommand::AutoOff));
        assert_eq!(
            parse_command("/auto Let's discuss X"),
            Some(ChatCommand::Auto(Some("Let's discuss X".to_string())))
        );
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            parse_command("/frobnicate now"),
            Some(ChatCommand::Unknown("frobnicate".to_string()))
        );
        assert_eq!(parse_command("/"), Some(ChatCommand::Unknown(String::new())));
    }

    #[test]
    fn split_on_first_whitespace() {
        assert_eq!(split_command("/load a b"), Some(("load", Some("a b"))));
        assert_eq!(split_command("/load\ta"), Some(("load", Some("a"))));
        assert_eq!(split_command("/stats"), Some(("stats", None)));
        assert_eq!(split_command("stats"), None);
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_every_command() {
        let help = help_text();
        for command in [
            "/save", "/load", "/stats", "/model", "/forget", "/summarize", "/system", "/auto",
            "/help", "/bye",
        ] {
            assert!(help.contains(command), "{command}");
        }
    }
}
