//! CLI error types.

use claw_ctl_proto::{ErrorCode, ProtoError};
use thiserror::Error;

use crate::router::RouteError;
use crate::spec_parser::SpecError;

/// Errors a single command (or the line it came from) can fail with.
///
/// None of these stop the interpreter; the dispatcher reports them and sets
/// the session's sticky failure flag.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input line has more words than the tokenizer accepts.
    #[error("can not process over {limit} words")]
    TooManyWords {
        /// Word limit in effect.
        limit: usize,
    },

    /// No command in the table matches the first word.
    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),

    /// Fewer words than the command needs.
    #[error("too few arguments for keyword:{0}")]
    TooFewArguments(String),

    /// More words than the command takes; the command still runs.
    #[error("too many arguments for keyword:{0}")]
    TooManyArguments(String),

    /// `show` was given an entity it does not know.
    #[error("invalid entity:{entity} for keyword:{keyword}")]
    InvalidEntity {
        /// The unrecognized entity word.
        entity: String,
        /// The command word as typed.
        keyword: String,
    },

    /// A keyword/value in a specification could not be parsed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// An update specification names no entity.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// `delete` named something other than a partition.
    #[error("invalid deletion entity: {0}")]
    InvalidDeletion(String),

    /// A specification fragment or argument was not acceptable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The controller rejected the request.
    #[error("{context} error: {code}")]
    Controller {
        /// What was being attempted, e.g. `update_node`.
        context: String,
        /// Code returned by the controller.
        code: ErrorCode,
        /// Extra detail from the controller, may be empty.
        message: String,
    },

    /// Controller connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Controller did not answer in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Controller sent something unexpected.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Line editor failure.
    #[error("readline error: {0}")]
    Readline(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether this error came from talking to the controller.
    ///
    /// Quiet mode suppresses these; usage errors are always shown.
    #[must_use]
    pub const fn is_controller_failure(&self) -> bool {
        matches!(
            self,
            Self::Controller { .. } | Self::Connection(_) | Self::Timeout(_) | Self::Protocol(_)
        )
    }
}

impl From<ProtoError> for CliError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Validation(msg) => Self::InvalidInput(msg),
            other => Self::Protocol(other.to_string()),
        }
    }
}
