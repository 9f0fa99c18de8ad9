//! Filesystem probes and target directory resolution.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::classifier::Probes;
use crate::error::{OrchestratorError, Result};

/// Directory holding a project's tests.
pub const TEST_DIR: &str = "test";
/// Project descriptor marking a directory as a single suite.
pub const PROJECT_DESCRIPTOR: &str = "project.json";

/// Probe `workdir` for `test/` and `test/project.json`.
pub fn probe(workdir: &Path) -> Probes {
    let test_dir = workdir.join(TEST_DIR);
    let probes = Probes {
        test_dir: test_dir.is_dir(),
        test_descriptor: test_dir.join(PROJECT_DESCRIPTOR).is_file(),
    };
    debug!(workdir = %workdir.display(), ?probes, "probed directory");
    probes
}

/// Resolve `target` relative to `base` into a directory that can be entered.
///
/// Returns `Ok(None)` when nothing exists at that path. A path that exists but
/// is not a readable directory is a [`OrchestratorError::Directory`].
pub fn enterable_dir(base: &Path, target: &str) -> Result<Option<PathBuf>> {
    let path = base.join(target);
    let metadata = match fs::metadata(&path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(directory_error(target, e.to_string())),
    };
    if !metadata.is_dir() {
        return Err(directory_error(target, "not a directory".to_string()));
    }
    fs::read_dir(&path).map_err(|e| directory_error(target, e.to_string()))?;
    Ok(Some(path))
}

fn directory_error(target: &str, reason: String) -> OrchestratorError {
    OrchestratorError::Directory {
        path: PathBuf::from(target),
        reason,
    }
}
