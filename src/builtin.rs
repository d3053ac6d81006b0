use crate::command::{BuiltinCommand, Context, Execution};
use crate::error::ShellError;
use crate::resource::{self, OpenResource};
use crate::stream::Stream;
use anyhow::{Context as _, Result};
use argh::{EarlyExit, FromArgs};
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::env;
use std::fmt;
use std::fs;
use std::ops::AddAssign;

/// Label `wc` uses when it counts the interactive input.
const INTERACTIVE_LABEL: &str = "stdout";

fn push_error(errors: &mut String, err: &ShellError) {
    warn!("{}", err);
    errors.push_str(&err.to_error_text());
}

/// Print the arguments glued together, without separators.
pub struct Echo;

impl BuiltinCommand for Echo {
    const NAME: &'static str = "echo";

    fn execute(args: &[String], _input: Option<Stream>, _ctx: &mut Context<'_>) -> Execution {
        Execution::data(args.concat(), "")
    }
}

/// Print the current working directory.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    const NAME: &'static str = "pwd";

    fn execute(_args: &[String], _input: Option<Stream>, _ctx: &mut Context<'_>) -> Execution {
        match env::current_dir().context("pwd: can't read current directory") {
            Ok(dir) => Execution::data(dir.to_string_lossy().into_owned(), ""),
            Err(e) => Execution::data(Stream::new(), ShellError::Environment(e).to_error_text()),
        }
    }
}

/// Close the interactive input and end the session.
pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";

    fn execute(_args: &[String], _input: Option<Stream>, ctx: &mut Context<'_>) -> Execution {
        ctx.stdin.close();
        Execution::terminate()
    }
}

/// Read every source of a stream-consuming command, in order.
///
/// `each` gets the opened source; returning an error records it and moves on.
/// Returns how many sources were processed successfully.
fn for_each_resource(
    args: &[String],
    input: Option<Stream>,
    errors: &mut String,
    mut each: impl FnMut(&mut OpenResource) -> std::result::Result<(), ShellError>,
) -> usize {
    let mut processed = 0;
    for opened in resource::open_all(resource::collect(args, input)) {
        match opened.and_then(|mut source| each(&mut source)) {
            Ok(()) => processed += 1,
            Err(e) => push_error(errors, &e),
        }
    }
    processed
}

/// Read the interactive source as a fallback when nothing else was read.
fn read_interactive(ctx: &mut Context<'_>, errors: &mut String) -> Option<String> {
    match ctx.stdin.read_to_string() {
        Ok(text) => Some(text),
        Err(source) => {
            push_error(
                errors,
                &ShellError::Read {
                    name: INTERACTIVE_LABEL.to_string(),
                    source,
                },
            );
            None
        }
    }
}

/// Concatenate files (and piped input) verbatim.
pub struct Cat;

impl BuiltinCommand for Cat {
    const NAME: &'static str = "cat";

    fn execute(args: &[String], input: Option<Stream>, ctx: &mut Context<'_>) -> Execution {
        let mut out = Vec::new();
        let mut errors = String::new();

        let processed = for_each_resource(args, input, &mut errors, |source| {
            out.extend_from_slice(&source.read_bytes()?);
            Ok(())
        });

        if processed == 0 && errors.is_empty() {
            if let Some(text) = read_interactive(ctx, &mut errors) {
                out.extend_from_slice(text.as_bytes());
            }
        }

        Execution::data(out, errors)
    }
}

/// Line, word and byte counts of a text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub lines: usize,
    pub words: usize,
    pub bytes: usize,
}

impl Counts {
    /// Count newline-delimited lines, whitespace-delimited words, and UTF-8
    /// bytes with one newline per line.
    pub fn of(text: &str) -> Self {
        text.split_terminator('\n')
            .fold(Counts::default(), |mut acc, line| {
                acc.lines += 1;
                acc.words += line.split_whitespace().count();
                acc.bytes += line.len() + 1;
                acc
            })
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.lines += rhs.lines;
        self.words += rhs.words;
        self.bytes += rhs.bytes;
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lines, self.words, self.bytes)
    }
}

/// Count lines, words and bytes per source, followed by a total.
pub struct Wc;

impl BuiltinCommand for Wc {
    const NAME: &'static str = "wc";

    fn execute(args: &[String], input: Option<Stream>, ctx: &mut Context<'_>) -> Execution {
        let mut out = String::new();
        let mut errors = String::new();
        let mut total = Counts::default();

        let mut report = |label: &str, counts: Counts| {
            out.push_str(&format!("{} : {}\n", label, counts));
            total += counts;
        };

        let processed = for_each_resource(args, input, &mut errors, |source| {
            let counts = Counts::of(&source.read_text()?);
            report(source.label(), counts);
            Ok(())
        });

        if processed == 0 && errors.is_empty() {
            if let Some(text) = read_interactive(ctx, &mut errors) {
                report(INTERACTIVE_LABEL, Counts::of(&text));
            }
        }

        out.push_str(&format!("total : {}", total));
        Execution::data(out, errors)
    }
}

#[derive(FromArgs, Debug, PartialEq)]
/// Print lines fully matching a pattern.
pub struct GrepOptions {
    #[argh(positional)]
    /// regular expression a whole line (or word, with -w) must match
    pub pattern: String,

    #[argh(positional)]
    /// files to search. If none provided, reads piped input.
    pub files: Vec<String>,

    #[argh(option, short = 'A')]
    /// number of lines to print starting at each match (default 1)
    pub after_context: Option<usize>,

    #[argh(switch, short = 'w')]
    /// match against each space or tab separated word instead of the whole line
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,
}

impl GrepOptions {
    /// Parse raw arguments; on failure returns the text to show the user.
    pub fn parse(args: &[String]) -> std::result::Result<Self, String> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        GrepOptions::from_args(&[Grep::NAME], &args).map_err(|EarlyExit { output, status }| {
            if status.is_ok() {
                // --help was requested explicitly
                output
            } else {
                format!("{}\n{}", output.trim_end(), Self::usage())
            }
        })
    }

    /// Generated help text.
    pub fn usage() -> String {
        match GrepOptions::from_args(&[Grep::NAME], &["--help"]) {
            Err(EarlyExit { output, .. }) => output,
            Ok(_) => String::new(),
        }
    }

    /// Lines printed per match, counting the matching line itself.
    fn window(&self) -> usize {
        self.after_context.filter(|&a| a > 0).unwrap_or(1)
    }
}

struct LineMatcher {
    regex: Regex,
    whole_word: bool,
}

impl LineMatcher {
    fn new(options: &GrepOptions) -> Result<Self> {
        let anchored = format!("^(?:{})$", options.pattern);
        let regex = RegexBuilder::new(&anchored)
            .case_insensitive(options.ignore_case)
            .build()
            .with_context(|| format!("grep: invalid pattern {:?}", options.pattern))?;
        Ok(Self {
            regex,
            whole_word: options.word_regexp,
        })
    }

    fn is_match(&self, line: &str) -> bool {
        if self.whole_word {
            line.split([' ', '\t']).any(|word| self.regex.is_match(word))
        } else {
            self.regex.is_match(line)
        }
    }

    /// Append matching lines and their trailing window to `out`.
    ///
    /// Every match restarts the window, whether or not it was already open.
    fn search(&self, text: &str, window: usize, out: &mut String) {
        let mut remaining = 0;
        for line in text.split_terminator('\n') {
            let line = line.trim_end();
            if self.is_match(line) {
                remaining = window;
            }
            if remaining > 0 {
                out.push_str(line);
                out.push('\n');
                remaining -= 1;
            }
        }
    }
}

/// Search sources for lines matching a pattern.
pub struct Grep;

impl BuiltinCommand for Grep {
    const NAME: &'static str = "grep";

    fn execute(args: &[String], input: Option<Stream>, _ctx: &mut Context<'_>) -> Execution {
        let options = match GrepOptions::parse(args) {
            Ok(options) => options,
            Err(help) => return Execution::absent(ShellError::Usage(help).to_error_text()),
        };
        debug!("grep options: {:?}", options);

        let has_input = input.as_ref().is_some_and(|s| !s.is_empty());
        if options.files.is_empty() && !has_input {
            return Execution::absent(ShellError::Usage(GrepOptions::usage()).to_error_text());
        }

        let matcher = match LineMatcher::new(&options) {
            Ok(matcher) => matcher,
            Err(e) => {
                let help = format!("{:#}\n{}", e, GrepOptions::usage());
                return Execution::absent(ShellError::Usage(help).to_error_text());
            }
        };

        let window = options.window();
        let mut out = String::new();
        let mut errors = String::new();
        for_each_resource(&options.files, input, &mut errors, |source| {
            matcher.search(&source.read_text()?, window, &mut out);
            Ok(())
        });

        Execution::data(out, errors)
    }
}

/// Change the working directory.
pub struct Cd;

fn change_dir(target: &str) -> Result<()> {
    env::set_current_dir(target).with_context(|| format!("cd: can't chdir to {:?}", target))
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";

    fn execute(args: &[String], input: Option<Stream>, _ctx: &mut Context<'_>) -> Execution {
        let target = match (args.first(), input) {
            (Some(_), Some(piped)) => piped.to_string_lossy().trim().to_string(),
            (Some(arg), None) => arg.clone(),
            (None, _) => return Execution::absent(""),
        };

        match change_dir(&target) {
            Ok(()) => Execution::absent(""),
            Err(e) => {
                let err = ShellError::Environment(e);
                warn!("{}", err);
                Execution::absent(err.to_error_text())
            }
        }
    }
}

/// List the entries of a directory.
pub struct Ls;

fn list_dir(path: &str) -> Result<Vec<String>> {
    let mut names = fs::read_dir(path)
        .with_context(|| format!("ls: can't open {:?}", path))?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<String>>>()
        .with_context(|| format!("ls: can't read {:?}", path))?;
    names.sort();
    Ok(names)
}

impl BuiltinCommand for Ls {
    const NAME: &'static str = "ls";

    fn execute(args: &[String], input: Option<Stream>, _ctx: &mut Context<'_>) -> Execution {
        let path = match (args.first(), input) {
            (Some(arg), _) => arg.clone(),
            (None, Some(piped)) => piped.to_string_lossy().trim().to_string(),
            (None, None) => ".".to_string(),
        };

        match list_dir(&path) {
            Ok(names) => Execution::data(names.join(" "), ""),
            Err(e) => {
                let err = ShellError::Environment(e);
                warn!("{}", err);
                Execution::data(Stream::new(), err.to_error_text())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::stream::StdinSource;
    use crate::test_utils::lock_current_dir;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    /// Run a builtin with `typed` as the interactive input.
    fn run<T: BuiltinCommand>(args: &[&str], input: Option<&str>, typed: &str) -> Execution {
        let env = Environment::new();
        let mut stdin = StdinSource::new(Cursor::new(typed.as_bytes().to_vec()));
        let mut ctx = Context {
            env: &env,
            stdin: &mut stdin,
        };
        T::execute(&strings(args), input.map(Stream::from), &mut ctx)
    }

    fn text(execution: &Execution) -> String {
        execution.output.text().unwrap_or_default()
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).expect("create tmp file");
        write!(f, "{}", content).expect("write");
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_echo_concatenates_without_separator() {
        let res = run::<Echo>(&["a", "b"], Some("ignored"), "");
        assert_eq!(text(&res), "ab");
        assert!(res.error.is_empty());
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = env::current_dir().unwrap();

        let res = run::<Pwd>(&["ignored"], None, "");

        assert_eq!(text(&res), cur.to_string_lossy());
        assert!(res.error.is_empty());
    }

    #[test]
    fn test_exit_closes_interactive_input() {
        let env = Environment::new();
        let mut stdin = StdinSource::new(Cursor::new(b"pending".to_vec()));
        let mut ctx = Context {
            env: &env,
            stdin: &mut stdin,
        };

        let res = Exit::execute(&[], None, &mut ctx);

        assert!(res.output.is_terminate());
        assert!(stdin.is_closed());
    }

    #[test]
    fn test_cat_reads_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = write_file(&dir, "cat.txt", "hello\nworld\n");

        let res = run::<Cat>(&[&file], None, "typed");

        assert_eq!(text(&res), "hello\nworld\n");
        assert!(res.error.is_empty());
        Ok(())
    }

    #[test]
    fn test_cat_skips_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let present = write_file(&dir, "present.txt", "second\n");
        let missing = dir.path().join("missing.txt").to_string_lossy().to_string();

        let res = run::<Cat>(&[&missing, &present], None, "typed");

        assert_eq!(text(&res), "second\n");
        assert_eq!(res.error.matches("Got error on opening file").count(), 1);
        assert!(res.error.contains("missing.txt"));
        Ok(())
    }

    #[test]
    fn test_cat_only_missing_file_does_not_read_interactive() {
        let res = run::<Cat>(&["/definitely/not/here.txt"], None, "typed");
        assert_eq!(text(&res), "");
        assert!(!res.error.is_empty());
    }

    #[test]
    fn test_cat_files_before_pipe() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = write_file(&dir, "first.txt", "file;");

        let res = run::<Cat>(&[&file], Some("pipe"), "typed");

        assert_eq!(text(&res), "file;pipe");
        Ok(())
    }

    #[test]
    fn test_cat_falls_back_to_interactive() {
        assert_eq!(text(&run::<Cat>(&[], None, "from stdin\n")), "from stdin\n");
        assert_eq!(text(&run::<Cat>(&[], Some(""), "typed")), "typed");
        assert_eq!(text(&run::<Cat>(&[], Some("piped"), "typed")), "piped");
    }

    #[test]
    fn test_counts_of_text() {
        let counts = Counts::of("a b\nc\n");
        assert_eq!(
            counts,
            Counts {
                lines: 2,
                words: 3,
                bytes: "a b\nc\n".len()
            }
        );
        assert_eq!(Counts::of(""), Counts::default());
        assert_eq!(Counts::of("héllo").bytes, "héllo\n".len());
    }

    #[test]
    fn test_wc_counts_pipe_and_total() {
        let res = run::<Wc>(&[], Some("a b\nc\n"), "");
        assert_eq!(text(&res), "pipe : 2 3 6\ntotal : 2 3 6");
        assert!(res.error.is_empty());
    }

    #[test]
    fn test_wc_multiple_files_and_running_total() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let first = write_file(&dir, "one.txt", "one two\nthree\n");
        let second = write_file(&dir, "two.txt", "c\n");

        let res = run::<Wc>(&[&first, &second], None, "");

        let expected = format!(
            "{} : 2 3 14\n{} : 1 1 2\ntotal : 3 4 16",
            first, second
        );
        assert_eq!(text(&res), expected);
        Ok(())
    }

    #[test]
    fn test_wc_falls_back_to_interactive_as_stdout() {
        let res = run::<Wc>(&[], None, "a b c\n");
        assert_eq!(text(&res), "stdout : 1 3 6\ntotal : 1 3 6");
    }

    #[test]
    fn test_wc_missing_file_reports_error_and_zero_total() {
        let res = run::<Wc>(&["/definitely/not/here.txt"], None, "typed");
        assert_eq!(text(&res), "total : 0 0 0");
        assert!(res.error.contains("/definitely/not/here.txt"));
    }

    #[test]
    fn test_grep_full_line_match_default_window() {
        let res = run::<Grep>(&["^a.*"], Some("abc\nxyz\n"), "");
        assert_eq!(text(&res), "abc\n");
        assert!(res.error.is_empty());
    }

    #[test]
    fn test_grep_substring_is_not_a_match() {
        let res = run::<Grep>(&["pipe"], Some("Line with pipe\npipe\n"), "");
        assert_eq!(text(&res), "pipe\n");
    }

    #[test]
    fn test_grep_window_restarts_on_each_match() {
        let input = "m\nx\nm\ny\nz\nw\n";
        let res = run::<Grep>(&["-A", "3", "m"], Some(input), "");
        assert_eq!(text(&res), "m\nx\nm\ny\nz\n");
    }

    #[test]
    fn test_grep_ignore_case() {
        let res = run::<Grep>(&["-i", "target"], Some("Target\nTaRgEt\nNo match\n"), "");
        assert_eq!(text(&res), "Target\nTaRgEt\n");
    }

    #[test]
    fn test_grep_whole_word() {
        let input = "say hello there\nhelloworld\n";
        let res = run::<Grep>(&["-w", "hello"], Some(input), "");
        assert_eq!(text(&res), "say hello there\n");
    }

    #[test]
    fn test_grep_reads_files_then_pipe() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = write_file(&dir, "data.txt", "keep\ndrop\n");

        let res = run::<Grep>(&["keep", file.as_str()], Some("keep\n"), "");

        assert_eq!(text(&res), "keep\nkeep\n");
        Ok(())
    }

    #[test]
    fn test_grep_usage_errors_have_absent_output() {
        let no_input = run::<Grep>(&["pattern"], None, "");
        assert!(no_input.output.text().is_none());
        assert!(no_input.error.contains("Usage"));

        let bad_flag = run::<Grep>(&["--bogus", "p"], Some("p\n"), "");
        assert!(bad_flag.output.text().is_none());
        assert!(!bad_flag.error.is_empty());

        let bad_regex = run::<Grep>(&["(unclosed"], Some("x\n"), "");
        assert!(bad_regex.output.text().is_none());
        assert!(bad_regex.error.contains("invalid pattern"));
    }

    #[test]
    fn test_grep_options_parse() {
        let options = GrepOptions::parse(&strings(&["-A", "2", "-i", "x", "f1", "f2"])).unwrap();
        assert_eq!(
            options,
            GrepOptions {
                pattern: "x".to_string(),
                files: strings(&["f1", "f2"]),
                after_context: Some(2),
                word_regexp: false,
                ignore_case: true,
            }
        );
        assert_eq!(options.window(), 2);
        assert!(GrepOptions::parse(&[]).is_err());
    }

    fn canonical_cwd() -> PathBuf {
        fs::canonicalize(env::current_dir().unwrap()).unwrap()
    }

    #[test]
    fn test_cd_to_argument_and_from_pipe() -> anyhow::Result<()> {
        let _lock = lock_current_dir();
        let orig = env::current_dir()?;
        let first = tempfile::tempdir()?;
        let second = tempfile::tempdir()?;
        let first_path = first.path().to_string_lossy().to_string();
        let second_path = format!("{}\n", second.path().to_string_lossy());

        let res = run::<Cd>(&[&first_path], None, "");
        assert!(res.error.is_empty());
        assert_eq!(canonical_cwd(), fs::canonicalize(first.path())?);

        // piped text wins over the argument when both are present
        let res = run::<Cd>(&["ignored"], Some(second_path.as_str()), "");
        assert!(res.error.is_empty());
        assert_eq!(canonical_cwd(), fs::canonicalize(second.path())?);

        env::set_current_dir(orig)?;
        Ok(())
    }

    #[test]
    fn test_cd_without_arguments_is_noop() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();

        let res = run::<Cd>(&[], Some("/"), "");

        assert!(res.output.text().is_none());
        assert!(res.error.is_empty());
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();

        let name = format!("nonexistent_dir_for_cd_test_{}", std::process::id());
        let res = run::<Cd>(&[&name], None, "");

        assert!(res.error.contains(&name));
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_ls_lists_sorted_entries() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_file(&dir, "b.txt", "");
        write_file(&dir, "a.txt", "");
        let path = dir.path().to_string_lossy().to_string();

        assert_eq!(text(&run::<Ls>(&[&path], None, "")), "a.txt b.txt");
        assert_eq!(text(&run::<Ls>(&[], Some(path.as_str()), "")), "a.txt b.txt");
        Ok(())
    }

    #[test]
    fn test_ls_without_arguments_lists_current_dir() -> anyhow::Result<()> {
        let _lock = lock_current_dir();
        let orig = env::current_dir()?;
        let dir = tempfile::tempdir()?;
        write_file(&dir, "z.txt", "");
        write_file(&dir, "m.txt", "");
        fs::create_dir(dir.path().join("sub"))?;

        env::set_current_dir(dir.path())?;
        let res = run::<Ls>(&[], None, "");
        env::set_current_dir(orig)?;

        assert_eq!(text(&res), "m.txt sub z.txt");
        assert!(res.error.is_empty());
        Ok(())
    }

    #[test]
    fn test_cat_directory_reports_read_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().to_string_lossy().to_string();

        let res = run::<Cat>(&[&path], None, "typed");

        assert_eq!(text(&res), "");
        assert!(res.error.contains("Got error on reading file"));
        Ok(())
    }

    #[test]
    fn test_ls_missing_directory_records_error() {
        let res = run::<Ls>(&["/definitely/not/a/dir"], None, "");
        assert_eq!(text(&res), "");
        assert!(res.error.contains("ls:"));
    }
}
