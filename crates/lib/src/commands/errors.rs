//! Error types for the command surface.

use thiserror::Error;

/// Errors returned to a client by [`Keyspace::execute`](super::Keyspace::execute).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was given the wrong number of arguments
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: String },

    /// The command name is not recognised
    #[error("unknown command '{name}'")]
    UnknownCommand { name: String },

    /// The key holds no document
    #[error("no such key '{key}'")]
    NoSuchKey { key: String },

    /// An argument could not be interpreted
    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Some changes of an APPLY batch were rejected; the rest were kept
    #[error("{rejected} of {total} changes rejected: {first}")]
    ApplyRejected {
        rejected: usize,
        total: usize,
        first: String,
    },

    /// The host failed to carry out a side effect
    #[error("host error: {reason}")]
    Host { reason: String },

    /// The document engine refused the operation
    #[error(transparent)]
    Engine(#[from] crate::Error),
}

impl CommandError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Check if the client sent a malformed request
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CommandError::WrongArity { .. }
                | CommandError::UnknownCommand { .. }
                | CommandError::InvalidArgument { .. }
        )
    }

    /// The engine error behind this failure, if any
    pub fn engine_error(&self) -> Option<&crate::Error> {
        match self {
            CommandError::Engine(err) => Some(err),
            _ => None,
        }
    }
}
