use crate::command::{Context, Execution, Output};
use crate::env::Environment;
use crate::error::ParseError;
use crate::parser::{self, Line, Pipeline};
use crate::stream::{StdinSource, Stream};
use anyhow::Context as _;
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{BufRead, Write};

/// Run every stage of `pipeline` left to right.
///
/// Each stage's arguments are substituted against `env` just before it runs,
/// and its output becomes the next stage's input. Error text from all stages is
/// concatenated. A [`Output::Terminate`] stops the pipeline at once.
pub fn execute_pipeline(
    pipeline: &Pipeline,
    env: &Environment,
    stdin: &mut StdinSource,
) -> Execution {
    let mut ctx = Context { env, stdin };
    let mut input: Option<Stream> = None;
    let mut errors = String::new();

    for (stage, call) in pipeline.calls().iter().enumerate() {
        let call = call.substitute(ctx.env);
        let Execution { output, error } = call.execute(input.take(), &mut ctx);
        append_error(&mut errors, &error);

        match output {
            Output::Data(mut stream) => {
                stream.rewind();
                input = Some(stream);
            }
            Output::Absent => input = None,
            Output::Terminate => {
                debug!("stage {} ({}) ended the session", stage, call.name());
                return Execution {
                    output: Output::Terminate,
                    error: errors,
                };
            }
        }
    }

    Execution {
        output: input.map_or(Output::Absent, Output::Data),
        error: errors,
    }
}

fn append_error(errors: &mut String, error: &str) {
    if error.is_empty() {
        return;
    }
    if !errors.is_empty() && !errors.ends_with('\n') {
        errors.push('\n');
    }
    errors.push_str(error);
}

/// Whether the session should keep reading lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Continue,
    Exit,
}

/// Line-oriented front end around the pipeline executor.
///
/// The interpreter owns the [`Environment`] and is the only place that changes
/// it, through `NAME=value` lines evaluated between pipelines.
///
/// Example
/// ```
/// use pipe_shell::{Environment, Interpreter, StdinSource};
/// let mut sh = Interpreter::new(Environment::new(), StdinSource::closed());
/// sh.eval("n=5").unwrap();
/// let result = sh.eval("echo ${n}").unwrap();
/// assert_eq!(result.output.text().as_deref(), Some("5"));
/// ```
pub struct Interpreter {
    env: Environment,
    stdin: StdinSource,
}

impl Interpreter {
    pub fn new(env: Environment, stdin: StdinSource) -> Self {
        Self { env, stdin }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Evaluate one line: apply an assignment or run a pipeline.
    pub fn eval(&mut self, line: &str) -> Result<Execution, ParseError> {
        match parser::parse_line(line)? {
            Line::Assignment { name, value } => {
                debug!("set {} = {:?}", name, value);
                self.env.set_var(name, value);
                Ok(Execution::absent(""))
            }
            Line::Pipeline(pipeline) => Ok(execute_pipeline(&pipeline, &self.env, &mut self.stdin)),
        }
    }

    /// Evaluate one line and render the result: output to `stdout` (newline
    /// terminated), errors to `stderr`. Blank lines and `#` comments are skipped.
    pub fn run_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<Status> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(Status::Continue);
        }

        let Execution { output, error } = match self.eval(line) {
            Ok(execution) => execution,
            Err(e) => {
                writeln!(stderr, "{}", e)?;
                return Ok(Status::Continue);
            }
        };

        if let Output::Data(stream) = &output {
            if !stream.is_empty() {
                stdout.write_all(stream.as_bytes())?;
                if !stream.as_bytes().ends_with(b"\n") {
                    writeln!(stdout)?;
                }
            }
        }
        if !error.is_empty() {
            stderr.write_all(error.as_bytes())?;
            if !error.ends_with('\n') {
                writeln!(stderr)?;
            }
        }
        stdout.flush()?;

        Ok(if output.is_terminate() {
            Status::Exit
        } else {
            Status::Continue
        })
    }

    /// Evaluate lines from `script` until it ends or a line ends the session.
    pub fn run_script(
        &mut self,
        script: impl BufRead,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> anyhow::Result<Status> {
        for (number, line) in script.lines().enumerate() {
            let line = line.with_context(|| format!("can't read script line {}", number + 1))?;
            if self.run_line(&line, stdout, stderr)? == Status::Exit {
                return Ok(Status::Exit);
            }
        }
        Ok(Status::Continue)
    }

    /// Interactive Read-Eval-Print Loop.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        // Stolen from basic example in: https://github.com/kkawakam/rustyline
        let mut rl = DefaultEditor::new()?;
        let mut stdout = std::io::stdout();
        let mut stderr = std::io::stderr();

        loop {
            match rl.readline("$ ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if self.run_line(&line, &mut stdout, &mut stderr)? == Status::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        info!("session ended");
        Ok(())
    }
}
