//! Recursive test runner for corto projects.
//!
//! Run in a workspace, a project, or a test directory: `cortotest` figures out
//! which one it is in, builds every suite it finds and runs their tests.
//! Returns a non-zero exit code if anything fails.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use cortotest::core::context::{CONFIG_ENV, RawInvocation, resolve};
use cortotest::error::OrchestratorError;
use cortotest::exit_codes;
use cortotest::invocation::{Deps, Settings, run_invocation};
use cortotest::io::config::discover_config;
use cortotest::io::loader::CommandSuiteLoader;
use cortotest::io::process::SystemSpawner;
use cortotest::io::report::ConsoleReporter;
use cortotest::logging;

#[derive(Parser, Debug)]
#[command(
    name = "cortotest",
    version,
    about = "Build and run corto test suites, recursing into every project"
)]
struct Cli {
    /// Projects to test. Defaults to the current directory.
    projects: Vec<String>,

    /// Just build tests, do not run them.
    #[arg(long)]
    build: bool,

    /// Just rebuild tests, do not run them.
    #[arg(long)]
    rebuild: bool,

    /// Just clean tests, do not run them.
    #[arg(long)]
    clean: bool,

    /// Run tests under an instrumentation wrapper (e.g. valgrind).
    #[arg(long, value_name = "NAME")]
    tool: Vec<String>,

    /// Run only the named test.
    #[arg(long, short = 't', value_name = "ID")]
    testcase: Vec<String>,

    /// Dispatched by a parent crawl for one project.
    #[arg(long, hide = true)]
    child: bool,

    /// Dispatched by a parent crawl for one test suite.
    #[arg(long = "test-child", hide = true)]
    test_child: bool,

    /// Verbose output. Sets CORTO_VERBOSITY to TRACE for children.
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn into_raw(self) -> RawInvocation {
        RawInvocation {
            projects: self.projects,
            build: self.build,
            rebuild: self.rebuild,
            clean: self.clean,
            tool: self.tool,
            testcase: self.testcase,
            child: self.child,
            test_child: self.test_child,
            verbose: self.verbose,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("cortotest: {:#}", err);
            exit_codes::FAILURE
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print().context("print help")?;
                return Ok(exit_codes::OK);
            }
            _ => {
                return Err(OrchestratorError::Argument(err.to_string().trim_end().to_string()).into());
            }
        },
    };
    logging::init(cli.verbose);

    let ctx = resolve(cli.into_raw())?;
    let workdir = std::env::current_dir().context("read current directory")?;
    let explicit_config = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let loaded = discover_config(&workdir, explicit_config.as_deref())?;

    let self_command = if loaded.config.self_command.is_empty() {
        let exe = std::env::current_exe().context("locate own executable")?;
        vec![exe.display().to_string()]
    } else {
        loaded.config.self_command.clone()
    };
    let settings = Settings {
        config: loaded.config,
        config_path: loaded.path,
        self_command,
    };
    debug!(?ctx, ?settings, "resolved invocation");

    let spawner = SystemSpawner::new(settings.config.timeout());
    let loader = CommandSuiteLoader::new(&settings.config.loader.command, &spawner);
    let deps = Deps {
        spawner: &spawner,
        loader: &loader,
        reporter: &ConsoleReporter,
    };
    let outcome = run_invocation(&ctx, &workdir, &settings, &deps)?;
    Ok(if outcome.is_success() {
        exit_codes::OK
    } else {
        exit_codes::FAILURE
    })
}
