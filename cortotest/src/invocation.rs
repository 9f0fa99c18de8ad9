//! One orchestrator invocation: classify the role, then crawl or run a suite.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::core::classifier::classify_role;
use crate::core::context::{CONFIG_ENV, Environment, InvocationContext, TEST_BY_ID_ENV};
use crate::core::types::{AggregateResult, Role, SuiteOutcome};
use crate::crawl::run_crawl;
use crate::error::Result;
use crate::io::config::CortoTestConfig;
use crate::io::loader::SuiteLoader;
use crate::io::probe::{TEST_DIR, probe};
use crate::io::process::Spawner;
use crate::io::report::Reporter;
use crate::suite::run_suite;

/// Resolved settings shared by every component of an invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: CortoTestConfig,
    /// Config file in effect; exported to children so they load the same one.
    pub config_path: Option<PathBuf>,
    /// Program and leading arguments that re-invoke this orchestrator.
    pub self_command: Vec<String>,
}

impl Settings {
    /// Environment handed to every spawned process.
    pub fn environment(&self, ctx: &InvocationContext) -> Environment {
        let mut env = ctx.environment();
        if ctx.testcase.is_some() {
            env.set(TEST_BY_ID_ENV, "TRUE");
        }
        if let Some(path) = &self.config_path {
            env.set(CONFIG_ENV, path.display().to_string());
        }
        env
    }
}

/// Collaborators an invocation drives.
pub struct Deps<'a, S, L, R> {
    pub spawner: &'a S,
    pub loader: &'a L,
    pub reporter: &'a R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Crawl(AggregateResult),
    Suite(SuiteOutcome),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Crawl(result) => result.is_success(),
            Outcome::Suite(_) => true,
        }
    }
}

/// Run the invocation described by `ctx`, started in `workdir`.
#[instrument(skip_all, fields(workdir = %workdir.display()))]
pub fn run_invocation<S, L, R>(
    ctx: &InvocationContext,
    workdir: &Path,
    settings: &Settings,
    deps: &Deps<'_, S, L, R>,
) -> Result<Outcome>
where
    S: Spawner,
    L: SuiteLoader,
    R: Reporter,
{
    let nested = probe(workdir).nested_folders_are_tests();
    let role = classify_role(ctx.is_child, ctx.is_test_child, nested);
    info!(?role, nested, action = ?ctx.action, "classified invocation");

    match role {
        Role::Root => {
            run_crawl(ctx, workdir, nested, settings, deps.spawner, deps.reporter)
                .map(Outcome::Crawl)
        }
        Role::Child => run_suite(
            ctx,
            workdir,
            Some(TEST_DIR),
            settings,
            deps.spawner,
            deps.loader,
        )
        .map(Outcome::Suite),
        Role::TestChild => {
            run_suite(ctx, workdir, None, settings, deps.spawner, deps.loader)
                .map(Outcome::Suite)
        }
    }
}
