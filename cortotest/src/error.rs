//! Failure taxonomy for one orchestrator invocation.
//!
//! None of these are retried. Any of them aborts the remaining work at the
//! level where it occurred and turns into a non-zero exit.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{BuildAction, ProcessVerdict};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Malformed command-line input.
    #[error("invalid arguments: {0}")]
    Argument(String),

    /// A child process could not be started or waited on.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The build tool returned a non-clean verdict.
    #[error("{subaction} failed in {} ({verdict})", .dir.display())]
    BuildFailure {
        subaction: BuildAction,
        dir: PathBuf,
        verdict: ProcessVerdict,
    },

    /// The compiled test library could not be loaded or its tests failed.
    #[error("test suite {} failed: {reason}", .library.display())]
    TestExecution { library: PathBuf, reason: String },

    /// A target path cannot be entered.
    #[error("can't change to directory '{}': {reason}", .path.display())]
    Directory { path: PathBuf, reason: String },
}

pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;
