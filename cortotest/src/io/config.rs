//! Orchestrator configuration stored in `cortotest.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

/// Default config file name, looked up in the starting directory.
pub const CONFIG_FILE_NAME: &str = "cortotest.toml";

/// Orchestrator configuration (TOML).
///
/// Missing fields default to the stock corto tool chain.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CortoTestConfig {
    /// Per-child wall-clock limit in seconds. `0` waits forever.
    pub timeout_secs: u64,

    /// Program and leading arguments used to re-invoke this orchestrator.
    /// Empty means the running executable.
    pub self_command: Vec<String>,

    pub build: CommandConfig,
    pub crawl: CommandConfig,
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommandConfig {
    /// Program followed by fixed leading arguments.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Test-library loader (e.g. `["corto","run"]`).
    pub command: Vec<String>,
    /// Directory, relative to the suite, holding the compiled test library.
    pub library_dir: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            command: vec!["corto".to_string(), "run".to_string()],
            library_dir: "bin".to_string(),
        }
    }
}

impl Default for CortoTestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            self_command: Vec::new(),
            build: CommandConfig {
                command: vec!["bake".to_string()],
            },
            crawl: CommandConfig {
                command: vec!["bake".to_string(), "foreach".to_string()],
            },
            loader: LoaderConfig::default(),
        }
    }
}

impl CortoTestConfig {
    pub fn validate(&self) -> Result<()> {
        check_command("build.command", &self.build.command)?;
        check_command("crawl.command", &self.crawl.command)?;
        check_command("loader.command", &self.loader.command)?;
        if !self.self_command.is_empty() {
            check_command("self_command", &self.self_command)?;
        }
        if self.loader.library_dir.trim().is_empty() {
            return Err(anyhow!("loader.library_dir must not be empty"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn check_command(name: &str, command: &[String]) -> Result<()> {
    if command.is_empty() || command[0].trim().is_empty() {
        return Err(anyhow!("{name} must be a non-empty array"));
    }
    Ok(())
}

/// Config together with the file it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: CortoTestConfig,
    pub path: Option<PathBuf>,
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CortoTestConfig::default()`.
pub fn load_config(path: &Path) -> Result<CortoTestConfig> {
    if !path.exists() {
        let cfg = CortoTestConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CortoTestConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Locate and load the config for an invocation started in `workdir`.
///
/// An explicit path (from the parent's environment) must exist; otherwise
/// `workdir/cortotest.toml` is used when present.
pub fn discover_config(workdir: &Path, explicit: Option<&Path>) -> Result<LoadedConfig> {
    let candidate = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow!("config file {} does not exist", path.display()));
            }
            path.to_path_buf()
        }
        None => workdir.join(CONFIG_FILE_NAME),
    };
    if !candidate.exists() {
        debug!("no config file, using defaults");
        return Ok(LoadedConfig {
            config: load_config(&candidate)?,
            path: None,
        });
    }
    let path = fs::canonicalize(&candidate)
        .with_context(|| format!("resolve {}", candidate.display()))?;
    debug!(path = %path.display(), "loading config");
    Ok(LoadedConfig {
        config: load_config(&path)?,
        path: Some(path),
    })
}
