//! Test-library loader abstraction.
//!
//! The [`SuiteLoader`] trait decouples suite execution from the mechanics of
//! loading compiled test code. The stock implementation hands the library to
//! an external loader command; tests use scripted loaders.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::core::context::Environment;
use crate::core::types::ProcessVerdict;
use crate::error::{OrchestratorError, Result};
use crate::io::probe::PROJECT_DESCRIPTOR;
use crate::io::process::{SpawnSpec, Spawner};

/// Parameters for one suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRequest {
    /// Suite directory; the loader runs here.
    pub workdir: PathBuf,
    /// Compiled test library.
    pub library: PathBuf,
    /// Run only this test when set.
    pub filter: Option<String>,
    pub env: Environment,
}

pub trait SuiteLoader {
    /// Load the library and run its tests. Load failures are errors; a run
    /// that completes, passing or not, is a verdict.
    fn run_suite(&self, request: &SuiteRequest) -> Result<ProcessVerdict>;
}

/// Loader that spawns an external command with `[library, filter?]`.
pub struct CommandSuiteLoader<'a, S> {
    command: &'a [String],
    spawner: &'a S,
}

impl<'a, S: Spawner> CommandSuiteLoader<'a, S> {
    pub fn new(command: &'a [String], spawner: &'a S) -> Self {
        Self { command, spawner }
    }
}

impl<S: Spawner> SuiteLoader for CommandSuiteLoader<'_, S> {
    #[instrument(skip_all, fields(library = %request.library.display()))]
    fn run_suite(&self, request: &SuiteRequest) -> Result<ProcessVerdict> {
        let mut extra = vec![request.library.display().to_string()];
        extra.extend(request.filter.clone());
        let spec = SpawnSpec::from_command(
            self.command,
            extra,
            &request.workdir,
            request.env.clone(),
        );
        info!(filter = ?request.filter, "running test suite");
        // A loader that cannot start means the suite could not be loaded.
        self.spawner.run(&spec).map_err(|err| match err {
            OrchestratorError::Spawn { .. } => OrchestratorError::TestExecution {
                library: request.library.clone(),
                reason: err.to_string(),
            },
            other => other,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectDescriptor {
    id: Option<String>,
}

/// Path of the compiled test library for `suite_dir`.
///
/// The library is named after the last segment of the descriptor's `id`,
/// falling back to the directory name.
pub fn library_path(suite_dir: &Path, library_dir: &str) -> Result<PathBuf> {
    let descriptor_path = suite_dir.join(PROJECT_DESCRIPTOR);
    let id = if descriptor_path.is_file() {
        read_descriptor(&descriptor_path)?.id
    } else {
        None
    };
    let name = id
        .as_deref()
        .and_then(|id| id.rsplit('/').find(|segment| !segment.is_empty()))
        .map(str::to_string)
        .or_else(|| {
            suite_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "test".to_string());

    let file = format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        name,
        std::env::consts::DLL_SUFFIX
    );
    let library = suite_dir.join(library_dir).join(file);
    debug!(library = %library.display(), "resolved test library");
    Ok(library)
}

fn read_descriptor(path: &Path) -> Result<ProjectDescriptor> {
    let load_error = |reason: String| OrchestratorError::TestExecution {
        library: path.to_path_buf(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|e| load_error(format!("read descriptor: {e}")))?;
    serde_json::from_str(&raw).map_err(|e| load_error(format!("parse descriptor: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedSpawner;
    use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};

    fn request(filter: Option<&str>) -> SuiteRequest {
        SuiteRequest {
            workdir: PathBuf::from("suite"),
            library: PathBuf::from("suite/bin/libtest.so"),
            filter: filter.map(str::to_string),
            env: Environment::default(),
        }
    }

    #[test]
    fn library_named_after_descriptor_id() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            temp.path().join(PROJECT_DESCRIPTOR),
            r#"{"id": "corto/lang/test", "type": "package"}"#,
        )
        .expect("write");
        let library = library_path(temp.path(), "bin").expect("library");
        assert_eq!(
            library,
            temp.path()
                .join("bin")
                .join(format!("{DLL_PREFIX}test{DLL_SUFFIX}"))
        );
    }

    #[test]
    fn library_falls_back_to_directory_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        let suite = temp.path().join("collections");
        fs::create_dir(&suite).expect("mkdir");
        let library = library_path(&suite, "bin").expect("library");
        assert!(
            library.ends_with(format!("bin/{DLL_PREFIX}collections{DLL_SUFFIX}")),
            "{}",
            library.display()
        );
    }

    #[test]
    fn loader_gets_library_then_filter() {
        let spawner = ScriptedSpawner::new(vec![Ok(ProcessVerdict::CLEAN)]);
        let command = vec!["corto".to_string(), "run".to_string()];
        let loader = CommandSuiteLoader::new(&command, &spawner);
        let verdict = loader.run_suite(&request(Some("list/append"))).expect("run");
        assert!(verdict.is_clean());
        let calls = spawner.calls();
        assert_eq!(calls[0].program, "corto");
        assert_eq!(calls[0].args, vec!["run", "suite/bin/libtest.so", "list/append"]);
    }

    #[test]
    fn unstartable_loader_is_test_execution_failure() {
        let spawner = ScriptedSpawner::new(vec![Err(OrchestratorError::Spawn {
            program: "corto".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })]);
        let command = vec!["corto".to_string(), "run".to_string()];
        let loader = CommandSuiteLoader::new(&command, &spawner);
        let err = loader.run_suite(&request(None)).unwrap_err();
        match err {
            OrchestratorError::TestExecution { library, reason } => {
                assert_eq!(library, PathBuf::from("suite/bin/libtest.so"));
                assert!(reason.contains("corto"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn broken_descriptor_is_test_execution_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(PROJECT_DESCRIPTOR), "{ not json").expect("write");
        let err = library_path(temp.path(), "bin").unwrap_err();
        assert!(matches!(err, OrchestratorError::TestExecution { .. }));
    }
}
