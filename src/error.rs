//! Typed errors shared across the lexer and spawner.

use thiserror::Error;

/// Validation failure from the lexer / redirection splitter.
///
/// Every variant maps, at the controller, to the same user-visible
/// behavior: print a newline and return to the prompt without side effects.
/// The variant itself is only useful for logging and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("line exceeds {limit} characters")]
    LineTooLong { limit: usize },
    #[error("token exceeds {limit} characters")]
    TokenTooLong { limit: usize },
    #[error("empty input line")]
    EmptyLine,
    #[error("more than one '|' in a line")]
    MultiplePipes,
    #[error("stage has no program name")]
    EmptyStage,
    #[error("redirection operator '{operator}' has no target")]
    DanglingRedirection { operator: &'static str },
}

/// Failure launching a pipeline.
///
/// `Fork` and `Pipe` are fatal to the shell — they mean the kernel refused
/// the resources a fork/pipe needs, which a single-process shell has no
/// way to recover from. `Exec` is fatal only to the attempted launch: it
/// means the named program could not be found or run, which `std::process`
/// reports back through `spawn()` instead of leaving a child to fail on
/// its own `execvp`, so it never reaches the job table.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("fork failed: {0}")]
    Fork(#[source] std::io::Error),
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] std::io::Error),
    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl SpawnError {
    /// Whether this failure should take down the whole shell rather than
    /// just abandon the one pipeline being launched.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpawnError::Fork(_) | SpawnError::Pipe(_))
    }
}
