//! Recursive dispatch protocol.
//!
//! A root invocation hands the crawl tool a command that re-invokes this
//! program once per discovered project. Everything here is pure so the
//! protocol can be checked without spawning anything.

use crate::core::context::InvocationContext;

/// Synthetic crawl target when no project was named.
pub const CURRENT_DIR_TARGET: &str = ".";
/// Synthetic crawl target when `test/` holds nested suites.
pub const NESTED_TESTS_TARGET: &str = "test";

/// Protocol flag marking a re-invoked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildFlag {
    Child,
    TestChild,
}

impl ChildFlag {
    pub fn for_nested(nested_folders_are_tests: bool) -> Self {
        if nested_folders_are_tests {
            ChildFlag::TestChild
        } else {
            ChildFlag::Child
        }
    }

    pub fn as_arg(self) -> &'static str {
        match self {
            ChildFlag::Child => "--child",
            ChildFlag::TestChild => "--test-child",
        }
    }
}

/// Targets the crawl visits, in order. Never empty.
pub fn crawl_targets(projects: &[String], nested_folders_are_tests: bool) -> Vec<String> {
    if !projects.is_empty() {
        return projects.to_vec();
    }
    let target = if nested_folders_are_tests {
        NESTED_TESTS_TARGET
    } else {
        CURRENT_DIR_TARGET
    };
    vec![target.to_string()]
}

/// Child flag handed to every target of a crawl.
///
/// Only the synthetic nested `test` target dispatches suites directly. Named
/// projects always get `--child` so each one re-probes its own directory.
pub fn crawl_flag(projects: &[String], nested_folders_are_tests: bool) -> ChildFlag {
    ChildFlag::for_nested(projects.is_empty() && nested_folders_are_tests)
}

/// Arguments for the next-level invocation of this program.
///
/// Carries the child flag plus action, tool, testcase and verbosity.
/// Project paths are never forwarded: the crawl runs each child inside its
/// project.
pub fn reinvocation_args(ctx: &InvocationContext, flag: ChildFlag) -> Vec<String> {
    let mut args = vec![flag.as_arg().to_string()];
    if let Some(action) = ctx.action.flag() {
        args.push(action.to_string());
    }
    if let Some(tool) = &ctx.tool {
        args.push("--tool".to_string());
        args.push(tool.clone());
    }
    if let Some(testcase) = &ctx.testcase {
        args.push("--testcase".to_string());
        args.push(testcase.clone());
    }
    if ctx.verbose {
        args.push("--verbose".to_string());
    }
    args
}

/// Join words into one command string for the crawl tool's template argument.
///
/// Words containing anything outside a conservative safe set are single-quoted.
pub fn shell_join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| shell_quote(word.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
