//! Shared deterministic types for the orchestrator core.
//!
//! These types define stable contracts between the resolver, the classifier
//! and the executors. They do not depend on external state or I/O.

use std::fmt;

/// What the user asked this invocation to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Build every suite, then run it.
    #[default]
    Test,
    Build,
    Rebuild,
    Clean,
}

impl Action {
    /// Resolve the action from the three mode flags.
    ///
    /// Precedence is `Rebuild > Build > Clean > Test`: when several flags are
    /// given the strongest one applies.
    pub fn from_flags(build: bool, rebuild: bool, clean: bool) -> Self {
        if rebuild {
            Action::Rebuild
        } else if build {
            Action::Build
        } else if clean {
            Action::Clean
        } else {
            Action::Test
        }
    }

    /// Sub-action word handed to the build tool. Tests are always built first.
    pub fn build_subaction(self) -> BuildAction {
        match self {
            Action::Test | Action::Build => BuildAction::Build,
            Action::Rebuild => BuildAction::Rebuild,
            Action::Clean => BuildAction::Clean,
        }
    }

    pub fn runs_tests(self) -> bool {
        self == Action::Test
    }

    /// Command-line flag that selects this action, if any.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Action::Test => None,
            Action::Build => Some("--build"),
            Action::Rebuild => Some("--rebuild"),
            Action::Clean => Some("--clean"),
        }
    }
}

/// Sub-action word understood by the external build tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    Build,
    Rebuild,
    Clean,
}

impl BuildAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildAction::Build => "build",
            BuildAction::Rebuild => "rebuild",
            BuildAction::Clean => "clean",
        }
    }
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role played by the current process. Exactly one is active per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Crawl the targets and re-invoke this program for each project found.
    Root,
    /// Dispatched for one project: build and run its `test` directory.
    Child,
    /// Dispatched for a test suite: build and run the current directory.
    TestChild,
}

/// Outcome of supervising one child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessVerdict {
    /// The process was terminated by a signal rather than exiting on its own.
    pub signaled: bool,
    /// Exit code, or `128 + signal` when `signaled`.
    pub exit_code: i32,
}

impl ProcessVerdict {
    pub const CLEAN: ProcessVerdict = ProcessVerdict {
        signaled: false,
        exit_code: 0,
    };

    pub fn exited(exit_code: i32) -> Self {
        Self {
            signaled: false,
            exit_code,
        }
    }

    pub fn killed(signal: i32) -> Self {
        Self {
            signaled: true,
            exit_code: 128 + signal,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.signaled && self.exit_code == 0
    }
}

impl fmt::Display for ProcessVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signaled {
            write!(f, "killed by signal {}", self.exit_code - 128)
        } else {
            write!(f, "exit code {}", self.exit_code)
        }
    }
}

/// Accumulated result of a crawl over one or more targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    pub action: Action,
    /// Number of targets that were actually spawned.
    pub attempted: usize,
    /// First target whose crawl produced a non-clean verdict.
    pub failed: Option<String>,
}

impl AggregateResult {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// What the suite executor did for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteOutcome {
    /// Target directory does not exist; nothing to do.
    Skipped,
    /// Build sub-action ran cleanly; tests were not requested.
    Built,
    /// Suite was built and its tests passed.
    Tested,
}
