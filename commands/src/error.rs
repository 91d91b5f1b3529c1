use thiserror::Error;

/// Errors raised inside the completion engine.
///
/// These never reach the line editor: completers log them and fall back to
/// an empty or stale suggestion list.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The typed tokens do not resolve to any command
    #[error("no command matches `{0}`")]
    TreeMismatch(String),

    /// A remote fetch failed or came back empty
    #[error("fetch for `{path}` failed: {source}")]
    FetchFailure {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Flag tokens could not be parsed while probing the command
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors from separating flags and positionals in typed tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A dash token that names no flag of the command, local or inherited.
    /// Hidden flags still count as known.
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    /// A bool flag given an inline value that is not a bool
    #[error("invalid value `{value}` for flag --{flag}")]
    InvalidBool { flag: String, value: String },
}

/// Rejection from a positional-argument validator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("accepts no arguments, received {0}")]
    NoArgs(usize),

    #[error("accepts {expected} arg(s), received {received}")]
    Exact { expected: usize, received: usize },

    #[error("requires at least {min} arg(s), received {received}")]
    TooFew { min: usize, received: usize },

    #[error("accepts at most {max} arg(s), received {received}")]
    TooMany { max: usize, received: usize },

    #[error("{0}")]
    Custom(String),
}
