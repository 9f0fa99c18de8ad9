//! Process supervision: spawn one external command, block until it exits and
//! classify the outcome into a [`ProcessVerdict`].
//!
//! Children inherit stdio so build and test output reaches the user as it is
//! produced. Exactly one child is in flight at a time.
//!
//! With a timeout configured on unix, each child leads its own process group
//! and a timed-out child is killed together with everything it started.

use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::context::Environment;
use crate::core::types::ProcessVerdict;
use crate::error::{OrchestratorError, Result};

/// Everything needed to start one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child. The orchestrator never changes its own.
    pub workdir: PathBuf,
    pub env: Environment,
}

impl SpawnSpec {
    /// Build a spec from a configured command prefix plus extra arguments.
    ///
    /// `command` must be non-empty (enforced by config validation).
    pub fn from_command(
        command: &[String],
        extra: impl IntoIterator<Item = String>,
        workdir: impl Into<PathBuf>,
        env: Environment,
    ) -> Self {
        let (program, leading) = match command.split_first() {
            Some((program, leading)) => (program.clone(), leading.to_vec()),
            None => (String::new(), Vec::new()),
        };
        let mut args = leading;
        args.extend(extra);
        Self {
            program,
            args,
            workdir: workdir.into(),
            env,
        }
    }

    /// Human-readable command line, for logs.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Abstraction over process spawning so orchestration can be tested without
/// real children.
pub trait Spawner {
    /// Run the command to completion. Spawn failures are errors; any exit,
    /// clean or not, is a verdict.
    fn run(&self, spec: &SpawnSpec) -> Result<ProcessVerdict>;
}

/// Spawner backed by `std::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemSpawner {
    /// Kill the child after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl SystemSpawner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Spawner for SystemSpawner {
    #[instrument(skip_all, fields(program = %spec.program, workdir = %spec.workdir.display()))]
    fn run(&self, spec: &SpawnSpec) -> Result<ProcessVerdict> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&spec.workdir);
        for (key, value) in spec.env.iter() {
            cmd.env(key, value);
        }
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        debug!(command = %spec.display(), "spawning child process");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "failed to spawn command");
                return Err(spawn_error(spec, e));
            }
        };

        let status = match self.timeout {
            None => child.wait().map_err(|e| spawn_error(spec, e))?,
            Some(timeout) => match child.wait_timeout(timeout).map_err(|e| spawn_error(spec, e))? {
                Some(status) => status,
                None => {
                    warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
                    kill_process_tree(&mut child).map_err(|e| spawn_error(spec, e))?;
                    child.wait().map_err(|e| spawn_error(spec, e))?
                }
            },
        };

        let verdict = verdict_from_status(status);
        debug!(%verdict, "command finished");
        Ok(verdict)
    }
}

/// Kill `child` and, on unix, the process group it leads.
fn kill_process_tree(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        match i32::try_from(child.id()) {
            Ok(pid) => match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                Ok(()) => return Ok(()),
                Err(errno) => warn!(%errno, "failed to kill process group, killing child only"),
            },
            Err(_) => warn!(pid = child.id(), "pid out of range, killing child only"),
        }
    }
    child.kill()
}

fn spawn_error(spec: &SpawnSpec, source: io::Error) -> OrchestratorError {
    OrchestratorError::Spawn {
        program: spec.program.clone(),
        source,
    }
}

/// Classify an OS exit status.
pub fn verdict_from_status(status: ExitStatus) -> ProcessVerdict {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ProcessVerdict::killed(signal);
        }
    }
    // No code and no signal only happens on exotic platforms; treat as failure.
    ProcessVerdict::exited(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_command_splits_program_and_appends_args() {
        let spec = SpawnSpec::from_command(
            &["bake".to_string(), "foreach".to_string()],
            ["test".to_string(), "cmd".to_string()],
            "/tmp",
            Environment::default(),
        );
        assert_eq!(spec.program, "bake");
        assert_eq!(spec.args, vec!["foreach", "test", "cmd"]);
        assert_eq!(spec.display(), "bake foreach test cmd");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::process::ExitStatusExt;

        fn sh(script: &str, workdir: &std::path::Path) -> SpawnSpec {
            SpawnSpec::from_command(
                &["sh".to_string(), "-c".to_string()],
                [script.to_string()],
                workdir,
                Environment::default(),
            )
        }

        #[test]
        fn raw_status_classification() {
            assert_eq!(
                verdict_from_status(ExitStatus::from_raw(0)),
                ProcessVerdict::CLEAN
            );
            // Wait status encodes the exit code in the high byte.
            assert_eq!(
                verdict_from_status(ExitStatus::from_raw(3 << 8)),
                ProcessVerdict::exited(3)
            );
            assert_eq!(
                verdict_from_status(ExitStatus::from_raw(9)),
                ProcessVerdict::killed(9)
            );
        }

        #[test]
        fn voluntary_exit_is_not_signaled() {
            let temp = tempfile::tempdir().expect("tempdir");
            let verdict = SystemSpawner::default()
                .run(&sh("exit 4", temp.path()))
                .expect("run");
            assert_eq!(verdict, ProcessVerdict::exited(4));
        }

        #[test]
        fn self_kill_is_signaled() {
            let temp = tempfile::tempdir().expect("tempdir");
            let verdict = SystemSpawner::default()
                .run(&sh("kill -9 $$", temp.path()))
                .expect("run");
            assert!(verdict.signaled);
            assert!(!verdict.is_clean());
        }

        #[test]
        fn env_and_workdir_are_applied() {
            let temp = tempfile::tempdir().expect("tempdir");
            let mut spec = sh(
                "test \"$CORTO_TEST_TOOL\" = valgrind && test -f marker",
                temp.path(),
            );
            spec.env.set("CORTO_TEST_TOOL", "valgrind");
            std::fs::write(temp.path().join("marker"), "").expect("marker");
            let verdict = SystemSpawner::default().run(&spec).expect("run");
            assert!(verdict.is_clean());
        }

        #[test]
        fn timeout_kills_child() {
            let temp = tempfile::tempdir().expect("tempdir");
            let spawner = SystemSpawner::new(Some(std::time::Duration::from_millis(200)));
            let verdict = spawner.run(&sh("sleep 10", temp.path())).expect("run");
            assert!(verdict.signaled);
        }

        #[test]
        fn timeout_kills_grandchildren_too() {
            let temp = tempfile::tempdir().expect("tempdir");
            let spawner = SystemSpawner::new(Some(std::time::Duration::from_millis(200)));
            let verdict = spawner
                .run(&sh("(sleep 1; touch marker); true", temp.path()))
                .expect("run");
            assert!(verdict.signaled);

            std::thread::sleep(std::time::Duration::from_millis(1500));
            assert!(
                !temp.path().join("marker").exists(),
                "background job outlived the timed-out command"
            );
        }

        #[test]
        fn missing_program_is_spawn_error() {
            let temp = tempfile::tempdir().expect("tempdir");
            let spec = SpawnSpec::from_command(
                &["cortotest-definitely-not-a-program".to_string()],
                Vec::new(),
                temp.path(),
                Environment::default(),
            );
            let err = SystemSpawner::default().run(&spec).unwrap_err();
            assert!(matches!(err, OrchestratorError::Spawn { .. }));
        }
    }
}
