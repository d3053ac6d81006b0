use crate::lexer::LexingError;
use std::io;
use thiserror::Error;

/// Errors preventing a line from being turned into a pipeline.
///
/// A parse error is fatal for the whole line: nothing gets executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Lexing(#[from] LexingError),

    /// The line holds no command at all.
    #[error("parse error: empty pipeline")]
    EmptyPipeline,

    /// A `|` with no command on one of its sides. Holds the stage index.
    #[error("parse error: missing command around '|' at stage {0}")]
    EmptyStage(usize),
}

/// Stage-local failures. These never abort a pipeline; they are rendered into
/// the stage's error text.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A named resource could not be opened; the resource is skipped.
    #[error("Got error on opening file '{name}'")]
    Resource {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A resource opened fine but reading it failed (e.g. a directory).
    #[error("Got error on reading file '{name}'")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("trying to execute non-existing command: \"{name}\" with args {args:?}")]
    CommandNotFound { name: String, args: Vec<String> },

    /// Malformed options; holds the help text to show.
    #[error("{0}")]
    Usage(String),

    /// Directory change or listing failure.
    #[error("{0:#}")]
    Environment(anyhow::Error),
}

impl ShellError {
    /// Render the error as one newline-terminated piece of error text.
    pub fn to_error_text(&self) -> String {
        let mut text = self.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }
}
