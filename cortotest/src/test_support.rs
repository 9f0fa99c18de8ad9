//! Test-only helpers: scripted collaborators and filesystem fixtures.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::types::ProcessVerdict;
use crate::error::OrchestratorError;
use crate::invocation::Settings;
use crate::io::config::CortoTestConfig;
use crate::io::loader::{SuiteLoader, SuiteRequest, library_path};
use crate::io::probe::{PROJECT_DESCRIPTOR, TEST_DIR};
use crate::io::process::{SpawnSpec, Spawner};
use crate::io::report::Reporter;

type Scripted = crate::error::Result<ProcessVerdict>;

fn exhausted(program: &str) -> OrchestratorError {
    OrchestratorError::Spawn {
        program: program.to_string(),
        source: io::Error::other("no scripted verdict left"),
    }
}

/// Spawner that records every spec and replays queued verdicts in order.
#[derive(Default)]
pub struct ScriptedSpawner {
    queue: RefCell<VecDeque<Scripted>>,
    calls: RefCell<Vec<SpawnSpec>>,
}

impl ScriptedSpawner {
    pub fn new(verdicts: Vec<Scripted>) -> Self {
        Self {
            queue: RefCell::new(verdicts.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SpawnSpec> {
        self.calls.borrow().clone()
    }
}

impl Spawner for ScriptedSpawner {
    fn run(&self, spec: &SpawnSpec) -> crate::error::Result<ProcessVerdict> {
        self.calls.borrow_mut().push(spec.clone());
        self.queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted(&spec.program)))
    }
}

/// Suite loader that records requests and replays queued verdicts.
#[derive(Default)]
pub struct ScriptedLoader {
    queue: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<SuiteRequest>>,
}

impl ScriptedLoader {
    pub fn new(verdicts: Vec<Scripted>) -> Self {
        Self {
            queue: RefCell::new(verdicts.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SuiteRequest> {
        self.requests.borrow().clone()
    }
}

impl SuiteLoader for ScriptedLoader {
    fn run_suite(&self, request: &SuiteRequest) -> crate::error::Result<ProcessVerdict> {
        self.requests.borrow_mut().push(request.clone());
        self.queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("loader")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    TestsFailed(String),
    AllGreen,
}

/// Reporter that records banners instead of printing them.
#[derive(Default)]
pub struct RecordingReporter {
    banners: RefCell<Vec<Banner>>,
}

impl RecordingReporter {
    pub fn banners(&self) -> Vec<Banner> {
        self.banners.borrow().clone()
    }
}

impl Reporter for RecordingReporter {
    fn tests_failed(&self, target: &str) {
        self.banners
            .borrow_mut()
            .push(Banner::TestsFailed(target.to_string()));
    }

    fn all_green(&self) {
        self.banners.borrow_mut().push(Banner::AllGreen);
    }
}

/// Default settings re-invoking a program called `cortotest`.
pub fn settings() -> Settings {
    Settings {
        config: CortoTestConfig::default(),
        config_path: None,
        self_command: vec!["cortotest".to_string()],
    }
}

/// Temporary directory laid out like a corto project or suite.
pub struct SuiteFixture {
    dir: TempDir,
}

impl SuiteFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create tempdir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create an empty compiled library where the suite executor expects it.
    pub fn with_library(&self, library_dir: &str) -> Result<PathBuf> {
        create_library(self.path(), library_dir)
    }

    /// Create `test/` holding one suite (with a descriptor).
    pub fn with_single_suite(&self) -> Result<PathBuf> {
        let test_dir = self.path().join(TEST_DIR);
        fs::create_dir_all(&test_dir).context("create test dir")?;
        fs::write(
            test_dir.join(PROJECT_DESCRIPTOR),
            r#"{"id": "project/test", "type": "package"}"#,
        )
        .context("write descriptor")?;
        Ok(test_dir)
    }

    /// Create `test/<name>/` suites without a descriptor in `test/` itself.
    pub fn with_nested_suites(&self, names: &[&str]) -> Result<Vec<PathBuf>> {
        let mut suites = Vec::new();
        for name in names {
            let suite = self.path().join(TEST_DIR).join(name);
            fs::create_dir_all(&suite)
                .with_context(|| format!("create suite {}", suite.display()))?;
            fs::write(
                suite.join(PROJECT_DESCRIPTOR),
                format!(r#"{{"id": "project/test/{name}"}}"#),
            )
            .context("write descriptor")?;
            suites.push(suite);
        }
        Ok(suites)
    }
}

/// Create an empty library file for the suite at `suite_dir`.
pub fn create_library(suite_dir: &Path, library_dir: &str) -> Result<PathBuf> {
    let library = library_path(suite_dir, library_dir).context("resolve library path")?;
    if let Some(parent) = library.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&library, b"").with_context(|| format!("write {}", library.display()))?;
    Ok(library)
}
