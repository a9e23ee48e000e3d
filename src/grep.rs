//! Regular-expression stages over lines of text.
//!
//! Patterns are compiled when the stage is built. A pattern that does not
//! compile still yields a stage, which fails with
//! [`PipelineError::Pattern`] as soon as it runs.

use crate::error::{PipelineError, Result};
use crate::stage::{filter_fn, Arg, Filter};
use regex::Regex;

/// Emit every line that matches `pattern`
pub fn grep(pattern: &str) -> impl Filter<String> {
    matching("grep", pattern, true)
}

/// Emit every line that does not match `pattern`
pub fn grep_not(pattern: &str) -> impl Filter<String> {
    matching("grep_not", pattern, false)
}

/// Replace every match of `pattern` in each line with `replacement`.
///
/// `replacement` may refer to capture groups as `$1`, `$2` or `${name}`.
pub fn substitute(pattern: &str, replacement: &str) -> impl Filter<String> {
    let compiled = Regex::new(pattern);
    let replacement = replacement.to_string();
    filter_fn(move |arg: Arg<String>| {
        let re = compiled_or_err(&compiled)?;
        for line in arg.iter() {
            arg.emit(re.replace_all(&line, replacement.as_str()).into_owned())?;
        }
        Ok(())
    })
    .named("substitute")
}

fn matching(name: &'static str, pattern: &str, keep_matches: bool) -> impl Filter<String> {
    let compiled = Regex::new(pattern);
    filter_fn(move |arg: Arg<String>| {
        let re = compiled_or_err(&compiled)?;
        for line in arg.iter() {
            if re.is_match(&line) == keep_matches {
                arg.emit(line)?;
            }
        }
        Ok(())
    })
    .named(name)
}

fn compiled_or_err(compiled: &std::result::Result<Regex, regex::Error>) -> Result<&Regex> {
    compiled
        .as_ref()
        .map_err(|e| PipelineError::Pattern(e.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::items;
    use crate::pipeline::PipelineBuilder;

    fn apply(filter: impl Filter<String> + 'static, input: &[&str]) -> Result<Vec<String>> {
        PipelineBuilder::new()
            .add_stage(items(input.iter().map(|s| s.to_string()).collect()))
            .add_stage(filter)
            .build()?
            .collect()
    }

    #[test]
    fn test_grep() {
        let out = apply(grep("^b"), &["apple", "banana", "blueberry", "cherry"]).unwrap();
        assert_eq!(out, vec!["banana", "blueberry"]);
    }

    #[test]
    fn test_grep_not() {
        let out = apply(grep_not("an"), &["apple", "banana", "mango", "kiwi"]).unwrap();
        assert_eq!(out, vec!["apple", "kiwi"]);
    }

    #[test]
    fn test_substitute_with_groups() {
        let out = apply(substitute(r"(\w+)@(\w+)", "$2 at $1"), &["bob@home", "none"]).unwrap();
        assert_eq!(out, vec!["home at bob", "none"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = apply(grep("(unclosed"), &["x"]).unwrap_err();
        assert!(matches!(err, PipelineError::Pattern(_)));
        let err = apply(substitute("[", "y"), &["x"]).unwrap_err();
        assert!(matches!(err, PipelineError::Pattern(_)));
    }
}
