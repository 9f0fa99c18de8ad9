//! Crawl dispatcher: hand each target to the crawl tool, which re-invokes this
//! program once per project it discovers.
//!
//! Targets are visited sequentially and the loop stops at the first non-clean
//! verdict; later targets are never attempted.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::core::context::InvocationContext;
use crate::core::dispatch::{ChildFlag, crawl_flag, crawl_targets, reinvocation_args, shell_join};
use crate::core::types::AggregateResult;
use crate::error::{OrchestratorError, Result};
use crate::invocation::Settings;
use crate::io::probe::enterable_dir;
use crate::io::process::{SpawnSpec, Spawner};
use crate::io::report::Reporter;

/// Command template the crawl tool runs in every discovered project.
pub fn crawl_template(self_command: &[String], ctx: &InvocationContext, flag: ChildFlag) -> String {
    let mut words = self_command.to_vec();
    words.extend(reinvocation_args(ctx, flag));
    shell_join(&words)
}

#[instrument(skip_all, fields(workdir = %workdir.display(), nested = nested, action = ?ctx.action))]
pub fn run_crawl<S: Spawner, R: Reporter>(
    ctx: &InvocationContext,
    workdir: &Path,
    nested: bool,
    settings: &Settings,
    spawner: &S,
    reporter: &R,
) -> Result<AggregateResult> {
    let targets = crawl_targets(&ctx.projects, nested);
    let flag = crawl_flag(&ctx.projects, nested);
    let template = crawl_template(&settings.self_command, ctx, flag);
    let env = settings.environment(ctx);
    debug!(%template, targets = targets.len(), "starting crawl");

    let mut result = AggregateResult {
        action: ctx.action,
        attempted: 0,
        failed: None,
    };
    for target in targets {
        if enterable_dir(workdir, &target)?.is_none() {
            return Err(OrchestratorError::Directory {
                path: target.into(),
                reason: "no such directory".to_string(),
            });
        }

        let spec = SpawnSpec::from_command(
            &settings.config.crawl.command,
            [target.clone(), template.clone()],
            workdir,
            env.clone(),
        );
        info!(project = %target, "crawling");
        result.attempted += 1;
        let verdict = spawner.run(&spec)?;
        if !verdict.is_clean() {
            warn!(project = %target, %verdict, "crawl failed, skipping remaining targets");
            if verdict.signaled && ctx.action.runs_tests() {
                reporter.tests_failed(&target);
            }
            result.failed = Some(target);
            return Ok(result);
        }
    }

    if ctx.action.runs_tests() {
        reporter.all_green();
    }
    Ok(result)
}
