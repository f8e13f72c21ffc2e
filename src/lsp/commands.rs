//! `workspace/executeCommand` handlers exposing the tracker to clients.
//!
//! The execution engine's host reports submissions and restarts through
//! these commands; result consumers read snapshots the same way.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::ExecuteCommandParams;

use crate::document::normalize_key;
use crate::tracker::{CellTracker, DocumentSource, Submission};

pub const SUBMIT_FRAGMENT: &str = "celltrack.submitFragment";
pub const RESET_ALL: &str = "celltrack.resetAll";
pub const SNAPSHOT: &str = "celltrack.snapshot";
pub const REVISION: &str = "celltrack.revision";

/// Command names advertised in the server capabilities.
pub fn command_names() -> Vec<String> {
    [SUBMIT_FRAGMENT, RESET_ALL, SNAPSHOT, REVISION]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// A parsed tracker command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(Submission),
    Reset,
    Snapshot,
    Revision { file: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("{0} expects one argument object")]
    MissingArgument(&'static str),
    #[error("invalid arguments for {command}: {source}")]
    InvalidArgument {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<CommandError> for jsonrpc::Error {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Unknown(_) => {
                let mut error = jsonrpc::Error::method_not_found();
                error.message = err.to_string().into();
                error
            }
            _ => jsonrpc::Error::invalid_params(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RevisionArgs {
    file: String,
}

fn single_argument<T: for<'de> Deserialize<'de>>(
    command: &'static str,
    arguments: Vec<Value>,
) -> Result<T, CommandError> {
    let value = arguments
        .into_iter()
        .next()
        .ok_or(CommandError::MissingArgument(command))?;
    serde_json::from_value(value)
        .map_err(|source| CommandError::InvalidArgument { command, source })
}

/// Parse command parameters into a `Command`.
pub fn parse_command(params: ExecuteCommandParams) -> Result<Command, CommandError> {
    match params.command.as_str() {
        SUBMIT_FRAGMENT => {
            let mut submission: Submission = single_argument(SUBMIT_FRAGMENT, params.arguments)?;
            submission.file = normalize_key(&submission.file);
            Ok(Command::Submit(submission))
        }
        RESET_ALL => Ok(Command::Reset),
        SNAPSHOT => Ok(Command::Snapshot),
        REVISION => {
            let args: RevisionArgs = single_argument(REVISION, params.arguments)?;
            Ok(Command::Revision {
                file: normalize_key(&args.file),
            })
        }
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Run a command against the tracker, returning the command's result.
pub fn run_command<S: DocumentSource>(
    tracker: &mut CellTracker<S>,
    command: Command,
) -> Option<Value> {
    match command {
        Command::Submit(submission) => {
            tracker.submit(submission);
            None
        }
        Command::Reset => {
            tracker.reset_all();
            None
        }
        Command::Snapshot => serde_json::to_value(tracker.snapshot()).ok(),
        Command::Revision { file } => Some(Value::from(tracker.revision(&file))),
    }
}
