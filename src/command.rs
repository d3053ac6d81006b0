use crate::builtin::{Cat, Cd, Echo, Exit, Grep, Ls, Pwd, Wc};
use crate::env::Environment;
use crate::error::ShellError;
use crate::stream::{StdinSource, Stream};
use crate::subst::substitute;
use log::debug;
use std::fmt;

/// What a stage hands to the next one.
#[derive(Debug)]
pub enum Output {
    /// Data for the next stage, possibly empty.
    Data(Stream),
    /// No input available for the next stage.
    Absent,
    /// Stop the pipeline here and end the session.
    Terminate,
}

impl Output {
    pub fn is_terminate(&self) -> bool {
        matches!(self, Output::Terminate)
    }

    /// The output text, or `None` when there is no data.
    pub fn text(&self) -> Option<String> {
        match self {
            Output::Data(stream) => Some(stream.to_string_lossy()),
            Output::Absent | Output::Terminate => None,
        }
    }
}

/// Result of running one stage, or a whole pipeline: output plus the error
/// text accumulated along the way.
#[derive(Debug)]
pub struct Execution {
    pub output: Output,
    pub error: String,
}

impl Execution {
    pub fn data(stream: impl Into<Stream>, error: impl Into<String>) -> Self {
        Self {
            output: Output::Data(stream.into()),
            error: error.into(),
        }
    }

    pub fn absent(error: impl Into<String>) -> Self {
        Self {
            output: Output::Absent,
            error: error.into(),
        }
    }

    pub fn terminate() -> Self {
        Self {
            output: Output::Terminate,
            error: String::new(),
        }
    }
}

/// Collaborators a stage may use while it runs.
///
/// The environment is shared read-only. The interactive source is the only
/// thing a stage may change (read from it, or close it).
pub struct Context<'a> {
    pub env: &'a Environment,
    pub stdin: &'a mut StdinSource,
}

/// Built-in commands known to the shell at compile time.
pub(crate) trait BuiltinCommand {
    /// Canonical name of the command, e.g. "echo" or "cd".
    const NAME: &'static str;

    /// Executes the command on fully substituted arguments.
    ///
    /// Failures are reported through [`Execution::error`], never by panicking
    /// or aborting the pipeline.
    fn execute(args: &[String], input: Option<Stream>, ctx: &mut Context<'_>) -> Execution;
}

/// The behaviour a command name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Echo,
    Pwd,
    Exit,
    Cat,
    Wc,
    Grep,
    Cd,
    Ls,
    /// Any name missing from the registry. Fails when executed.
    Unregistered,
}

const REGISTRY: [(&str, CommandKind); 8] = [
    (Echo::NAME, CommandKind::Echo),
    (Pwd::NAME, CommandKind::Pwd),
    (Exit::NAME, CommandKind::Exit),
    (Cat::NAME, CommandKind::Cat),
    (Wc::NAME, CommandKind::Wc),
    (Grep::NAME, CommandKind::Grep),
    (Cd::NAME, CommandKind::Cd),
    (Ls::NAME, CommandKind::Ls),
];

impl CommandKind {
    /// Resolve a command name; unknown names map to [`CommandKind::Unregistered`].
    pub fn lookup(name: &str) -> Self {
        REGISTRY
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, kind)| *kind)
            .unwrap_or(CommandKind::Unregistered)
    }

    /// Names of every registered command.
    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(name, _)| *name)
    }
}

/// One stage of a pipeline: a command name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    kind: CommandKind,
    name: String,
    args: Vec<String>,
}

impl Call {
    /// Build a call, resolving `name` through the registry.
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        let name = name.into();
        Self {
            kind: CommandKind::lookup(&name),
            name,
            args,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// A copy of this call with every argument substituted against `env`.
    pub fn substitute(&self, env: &Environment) -> Call {
        Call {
            kind: self.kind,
            name: self.name.clone(),
            args: self.args.iter().map(|arg| substitute(arg, env)).collect(),
        }
    }

    /// Run the command. Arguments are used as they are, call
    /// [`Call::substitute`] first.
    pub fn execute(&self, input: Option<Stream>, ctx: &mut Context<'_>) -> Execution {
        debug!("executing {} (input: {})", self, input.is_some());
        let args = self.args.as_slice();
        match self.kind {
            CommandKind::Echo => Echo::execute(args, input, ctx),
            CommandKind::Pwd => Pwd::execute(args, input, ctx),
            CommandKind::Exit => Exit::execute(args, input, ctx),
            CommandKind::Cat => Cat::execute(args, input, ctx),
            CommandKind::Wc => Wc::execute(args, input, ctx),
            CommandKind::Grep => Grep::execute(args, input, ctx),
            CommandKind::Cd => Cd::execute(args, input, ctx),
            CommandKind::Ls => Ls::execute(args, input, ctx),
            CommandKind::Unregistered => {
                // nothing to hand on: the next stage sees no input at all
                let err = ShellError::CommandNotFound {
                    name: self.name.clone(),
                    args: self.args.clone(),
                };
                Execution::absent(err.to_error_text())
            }
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call: {} {:?}", self.name, self.args)
    }
}
