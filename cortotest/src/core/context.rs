//! Invocation context: the structured, immutable view of one invocation.
//!
//! The binary parses flags into a [`RawInvocation`]; [`resolve`] validates it
//! and produces the [`InvocationContext`] every other component consumes.

use std::collections::BTreeMap;

use tracing::warn;

use crate::core::types::Action;
use crate::error::{OrchestratorError, Result};

/// Instrumentation wrapper picked up by nested invocations and test libraries.
pub const TOOL_ENV: &str = "CORTO_TEST_TOOL";
/// Set alongside [`TOOL_ENV`].
pub const CI_ENV: &str = "CI";
/// Tells the test framework to log which test ran, when filtering by id.
pub const TEST_BY_ID_ENV: &str = "CORTO_TEST_BY_ID";
pub const VERBOSITY_ENV: &str = "CORTO_VERBOSITY";
/// Absolute path of the config file shared by nested invocations.
pub const CONFIG_ENV: &str = "CORTO_TEST_CONFIG";

/// Flags as tokenized from the command line, before validation.
///
/// Repeatable options keep every occurrence; the first one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInvocation {
    pub projects: Vec<String>,
    pub build: bool,
    pub rebuild: bool,
    pub clean: bool,
    pub tool: Vec<String>,
    pub testcase: Vec<String>,
    pub child: bool,
    pub test_child: bool,
    pub verbose: bool,
}

/// Resolved invocation. Immutable for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub action: Action,
    /// Projects named on the command line; empty means the current directory.
    pub projects: Vec<String>,
    pub testcase: Option<String>,
    pub tool: Option<String>,
    pub is_child: bool,
    pub is_test_child: bool,
    pub verbose: bool,
}

/// Validate raw flags into an [`InvocationContext`].
pub fn resolve(raw: RawInvocation) -> Result<InvocationContext> {
    let modes = [raw.build, raw.rebuild, raw.clean]
        .iter()
        .filter(|flag| **flag)
        .count();
    let action = Action::from_flags(raw.build, raw.rebuild, raw.clean);
    if modes > 1 {
        warn!(?action, "several of --build/--rebuild/--clean given");
    }

    let testcase = first_value("--testcase", raw.testcase)?;
    let tool = first_value("--tool", raw.tool)?;

    if let Some(empty) = raw.projects.iter().find(|p| p.trim().is_empty()) {
        return Err(OrchestratorError::Argument(format!(
            "project path must not be empty (got '{empty}')"
        )));
    }

    Ok(InvocationContext {
        action,
        projects: raw.projects,
        testcase,
        tool,
        is_child: raw.child,
        is_test_child: raw.test_child,
        verbose: raw.verbose,
    })
}

fn first_value(flag: &str, values: Vec<String>) -> Result<Option<String>> {
    if values.len() > 1 {
        warn!(flag, ignored = values.len() - 1, "duplicate values ignored");
    }
    match values.into_iter().next() {
        Some(value) if value.trim().is_empty() => Err(OrchestratorError::Argument(format!(
            "{flag} requires a non-empty value"
        ))),
        other => Ok(other),
    }
}

impl InvocationContext {
    /// Environment every spawned process receives.
    pub fn environment(&self) -> Environment {
        let mut env = Environment::default();
        if let Some(tool) = &self.tool {
            env.set(TOOL_ENV, tool);
            env.set(CI_ENV, "TRUE");
        }
        if self.verbose {
            env.set(VERBOSITY_ENV, "TRACE");
        }
        env
    }
}

/// Ordered environment overrides applied to each spawned process.
///
/// Overwrite-only: keys are never removed once set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawInvocation {
        RawInvocation::default()
    }

    #[test]
    fn defaults_resolve_to_test_on_current_dir() {
        let ctx = resolve(raw()).expect("resolve");
        assert_eq!(ctx.action, Action::Test);
        assert!(ctx.projects.is_empty());
        assert_eq!(ctx.testcase, None);
        assert!(!ctx.is_child && !ctx.is_test_child);
    }

    #[test]
    fn duplicate_testcase_keeps_first_and_build_wins() {
        let ctx = resolve(RawInvocation {
            build: true,
            testcase: vec!["foo".to_string(), "bar".to_string()],
            ..raw()
        })
        .expect("resolve");
        assert_eq!(ctx.action, Action::Build);
        assert_eq!(ctx.testcase.as_deref(), Some("foo"));
    }

    #[test]
    fn empty_testcase_is_argument_error() {
        let err = resolve(RawInvocation {
            testcase: vec![String::new()],
            ..raw()
        })
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::Argument(_)));
    }

    #[test]
    fn empty_project_is_argument_error() {
        let err = resolve(RawInvocation {
            projects: vec!["a".to_string(), " ".to_string()],
            ..raw()
        })
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::Argument(_)));
    }

    #[test]
    fn tool_exports_tool_and_ci() {
        let ctx = resolve(RawInvocation {
            tool: vec!["valgrind".to_string()],
            ..raw()
        })
        .expect("resolve");
        let env = ctx.environment();
        assert_eq!(env.get(TOOL_ENV), Some("valgrind"));
        assert_eq!(env.get(CI_ENV), Some("TRUE"));
        assert_eq!(env.get(TEST_BY_ID_ENV), None);
    }

    #[test]
    fn plain_invocation_exports_nothing() {
        let ctx = resolve(raw()).expect("resolve");
        assert_eq!(ctx.environment().iter().count(), 0);
    }

    #[test]
    fn verbose_exports_trace_verbosity() {
        let ctx = resolve(RawInvocation {
            verbose: true,
            ..raw()
        })
        .expect("resolve");
        assert_eq!(ctx.environment().get(VERBOSITY_ENV), Some("TRACE"));
    }
}
