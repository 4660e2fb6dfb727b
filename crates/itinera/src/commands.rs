//! REPL command parsing.

use std::path::PathBuf;

use thiserror::Error;

/// A line typed at the prompt.
///
/// Indices given to `/load` and `/quick` are 1-based on the command line
/// and stored 0-based here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the trip form.
    Plan,
    /// Clear the conversation.
    Clear,
    /// Save the current itinerary.
    Save,
    /// List saved itineraries.
    Saved,
    /// Load a saved itinerary.
    Load(usize),
    /// Export the conversation, optionally to the given path.
    Export(Option<PathBuf>),
    /// Show session statistics.
    Stats,
    /// List quick actions, or run one.
    Quick(Option<usize>),
    /// Rate the latest reply.
    Feedback(Feedback),
    /// Show the command list.
    Help,
    /// Leave the program.
    Quit,
    /// Ask a follow-up question.
    Ask(String),
    /// A blank line.
    Empty,
}

/// A rating of the latest reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// The reply was helpful.
    Helpful,
    /// The reply was not helpful.
    NotHelpful,
}

/// A line could not be parsed as a command.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command name is not known.
    #[error("unknown command `/{0}`, type /help for the list")]
    UnknownCommand(String),
    /// The command requires an argument.
    #[error("`/{0}` needs a number, e.g. `/{0} 1`")]
    MissingArgument(&'static str),
    /// The argument is not a positive number.
    #[error("{0:?} is not a valid number")]
    InvalidNumber(String),
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            if line.is_empty() {
                return Ok(Command::Empty);
            }
            return Ok(Command::Ask(line.to_owned()));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (command, None),
        };
        let arg = arg.filter(|arg| !arg.is_empty());

        match name.to_ascii_lowercase().as_str() {
            "plan" | "new" => Ok(Command::Plan),
            "clear" => Ok(Command::Clear),
            "save" => Ok(Command::Save),
            "saved" | "list" => Ok(Command::Saved),
            "load" => {
                let arg = arg.ok_or(CommandError::MissingArgument("load"))?;
                Ok(Command::Load(parse_index(arg)?))
            }
            "export" => Ok(Command::Export(arg.map(PathBuf::from))),
            "stats" => Ok(Command::Stats),
            "quick" => Ok(Command::Quick(arg.map(parse_index).transpose()?)),
            "helpful" | "good" => Ok(Command::Feedback(Feedback::Helpful)),
            "unhelpful" | "bad" => {
                Ok(Command::Feedback(Feedback::NotHelpful))
            }
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => Err(CommandError::UnknownCommand(name.to_owned())),
        }
    }
}

fn parse_index(arg: &str) -> Result<usize, CommandError> {
    arg.parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .ok_or_else(|| CommandError::InvalidNumber(arg.to_owned()))
}
