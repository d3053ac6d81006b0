//! Variable substitution for command arguments.
//!
//! Two forms are recognised:
//! - `${NAME}`: the text between the braces is the variable name;
//! - `$X`: exactly one character after `$` is the variable name, so `$abc`
//!   expands `a` and keeps `bc` literally.
//!
//! Missing variables expand to the empty string. Each form is re-applied until
//! the text stops changing, braced form first. The two passes repeat until a
//! whole round changes nothing, so a value that itself contains `$` syntax of
//! either form gets expanded as well.

use crate::env::Environment;
use log::trace;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static BRACED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(.*?)\}").expect("braced substitution pattern is valid")
});

static BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^{])").expect("bare substitution pattern is valid"));

/// Expand every `${NAME}` and then every `$X` in `text` using `env`.
pub fn substitute(text: &str, env: &Environment) -> String {
    let mut current = text.to_owned();
    loop {
        let braced = expand_to_fixed_point(current.clone(), &BRACED, env);
        let next = expand_to_fixed_point(braced, &BARE, env);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn expand_to_fixed_point(mut current: String, pattern: &Regex, env: &Environment) -> String {
    loop {
        let next = pattern.replace_all(&current, |caps: &Captures| {
            env.get_var(&caps[1]).unwrap_or_default().to_owned()
        });
        match next {
            Cow::Borrowed(_) => return current,
            Cow::Owned(next) if next == current => return current,
            Cow::Owned(next) => {
                trace!("substitution round: {:?} -> {:?}", current, next);
                current = next;
            }
        }
    }
}
