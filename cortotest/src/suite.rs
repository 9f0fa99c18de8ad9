//! Suite executor: build one suite directory and, for `test`, run it.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::core::context::InvocationContext;
use crate::core::types::SuiteOutcome;
use crate::error::{OrchestratorError, Result};
use crate::invocation::Settings;
use crate::io::loader::{SuiteLoader, SuiteRequest, library_path};
use crate::io::probe::enterable_dir;
use crate::io::process::{SpawnSpec, Spawner};

/// Build (and for `Action::Test`, run) the suite at `workdir/target`.
///
/// `target = None` means `workdir` itself. A target that does not exist is a
/// no-op success: a project without tests is not an error.
#[instrument(skip_all, fields(workdir = %workdir.display(), action = ?ctx.action))]
pub fn run_suite<S: Spawner, L: SuiteLoader>(
    ctx: &InvocationContext,
    workdir: &Path,
    target: Option<&str>,
    settings: &Settings,
    spawner: &S,
    loader: &L,
) -> Result<SuiteOutcome> {
    let suite_dir = match target {
        None => workdir.to_path_buf(),
        Some(target) => match enterable_dir(workdir, target)? {
            Some(dir) => dir,
            None => {
                debug!(dir = target, "no such directory, nothing to do");
                return Ok(SuiteOutcome::Skipped);
            }
        },
    };

    let env = settings.environment(ctx);
    let subaction = ctx.action.build_subaction();
    let build = SpawnSpec::from_command(
        &settings.config.build.command,
        [subaction.as_str().to_string()],
        &suite_dir,
        env.clone(),
    );
    info!(%subaction, dir = %suite_dir.display(), "building suite");
    let verdict = spawner.run(&build)?;
    if !verdict.is_clean() {
        warn!(%subaction, %verdict, "build failed");
        return Err(OrchestratorError::BuildFailure {
            subaction,
            dir: suite_dir,
            verdict,
        });
    }

    if !ctx.action.runs_tests() {
        return Ok(SuiteOutcome::Built);
    }

    let library = library_path(&suite_dir, &settings.config.loader.library_dir)?;
    if !library.is_file() {
        return Err(OrchestratorError::TestExecution {
            library,
            reason: "library not found".to_string(),
        });
    }
    let request = SuiteRequest {
        workdir: suite_dir,
        library,
        filter: ctx.testcase.clone(),
        env,
    };
    let verdict = loader.run_suite(&request)?;
    if !verdict.is_clean() {
        warn!(%verdict, "test suite failed");
        return Err(OrchestratorError::TestExecution {
            library: request.library,
            reason: verdict.to_string(),
        });
    }
    Ok(SuiteOutcome::Tested)
}
