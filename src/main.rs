use anyhow::Context;
use argh::FromArgs;
use log::LevelFilter;
use pipe_shell::{Environment, Interpreter, StdinSource};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(FromArgs)]
/// Small interactive pipeline interpreter.
struct Options {
    #[argh(option, short = 'c')]
    /// evaluate one line and exit
    command: Option<String>,

    #[argh(switch)]
    /// log debug information to stderr
    verbose: bool,

    #[argh(switch)]
    /// start with no variables instead of a copy of the process environment
    no_inherit_env: bool,

    #[argh(positional)]
    /// script to evaluate line by line
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let options: Options = argh::from_env();

    let default_level = if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let env = if options.no_inherit_env {
        Environment::new()
    } else {
        Environment::from_process()
    };
    let mut sh = Interpreter::new(env, StdinSource::inherited());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    if let Some(line) = options.command {
        sh.run_line(&line, &mut stdout, &mut stderr)?;
    } else if let Some(path) = options.script {
        let file = File::open(&path)
            .with_context(|| format!("can't open script {}", path.display()))?;
        sh.run_script(BufReader::new(file), &mut stdout, &mut stderr)?;
    } else {
        sh.repl()?;
    }
    Ok(())
}
