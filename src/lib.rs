//! A small pipeline interpreter.
//!
//! A line of text is parsed into stages joined by `|` ([`parse`]), each stage's
//! arguments get `$x` / `${name}` references substituted from an
//! [`Environment`], and the stages run left to right over in-memory
//! [`Stream`]s ([`execute_pipeline`]). Built-in commands are `echo`, `pwd`,
//! `exit`, `cat`, `wc`, `grep`, `cd` and `ls`.
//!
//! Failures inside a stage never abort the pipeline: they are collected as
//! error text next to the final output. Only a [`ParseError`] prevents
//! execution.
//!
//! [`Interpreter`] wraps all of this into a line-oriented front end that also
//! handles `NAME=value` assignments.

mod builtin;
pub mod command;
pub mod env;
pub mod error;
mod interpreter;
mod lexer;
pub mod parser;
pub mod resource;
pub mod stream;
pub mod subst;

#[cfg(test)]
mod test_utils;

pub use builtin::{Counts, GrepOptions};
pub use command::{Call, CommandKind, Execution, Output};
pub use env::Environment;
pub use error::{ParseError, ShellError};
pub use interpreter::{execute_pipeline, Interpreter, Status};
pub use lexer::LexingError;
pub use parser::{parse, parse_line, Line, Pipeline};
pub use stream::{StdinSource, Stream};
pub use subst::substitute;
