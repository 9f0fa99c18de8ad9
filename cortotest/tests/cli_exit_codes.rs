//! CLI tests for the `cortotest` binary.
//!
//! Spawns the real binary with a config that swaps the corto tool chain for
//! shell builtins, so the full re-invocation chain runs without bake or corto
//! installed.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use cortotest::core::context::CONFIG_ENV;
use cortotest::test_support::{SuiteFixture, create_library};

/// Crawl tool stand-in: `sh -c <script> <target> <template>` enters the target
/// and runs the template once, like a crawl that finds a single project.
const CRAWL: &str = r#"["sh", "-c", "cd \"$0\" && eval \"$1\""]"#;

fn write_config(dir: &Path, build: &str, crawl: &str) -> std::path::PathBuf {
    let path = dir.join("cortotest.toml");
    fs::write(
        &path,
        format!(
            "[build]\ncommand = {build}\n\n[crawl]\ncommand = {crawl}\n\n[loader]\ncommand = [\"true\"]\n"
        ),
    )
    .expect("write config");
    path
}

fn cortotest(workdir: &Path, config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cortotest"))
        .current_dir(workdir)
        .env(CONFIG_ENV, config)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run cortotest")
}

#[test]
fn test_child_build_succeeds() {
    let fixture = SuiteFixture::new().expect("fixture");
    let config = write_config(fixture.path(), r#"["true"]"#, CRAWL);

    let output = cortotest(fixture.path(), &config, &["--test-child", "--build"]);

    assert!(output.status.success(), "{output:?}");
}

#[test]
fn test_child_build_failure_exits_nonzero() {
    let fixture = SuiteFixture::new().expect("fixture");
    let config = write_config(fixture.path(), r#"["false"]"#, CRAWL);

    let output = cortotest(fixture.path(), &config, &["--test-child", "--build"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("build failed"), "{stderr}");
}

#[test]
fn root_recurses_into_project_and_reports_green() {
    let fixture = SuiteFixture::new().expect("fixture");
    let test_dir = fixture.with_single_suite().expect("suite");
    create_library(&test_dir, "bin").expect("library");
    let config = write_config(fixture.path(), r#"["true"]"#, CRAWL);

    let output = cortotest(fixture.path(), &config, &[]);

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("all green").count(), 1, "{stdout}");
}

#[test]
fn root_clean_failure_is_silent_but_nonzero() {
    let fixture = SuiteFixture::new().expect("fixture");
    fixture.with_single_suite().expect("suite");
    let config = write_config(fixture.path(), r#"["false"]"#, CRAWL);

    let output = cortotest(fixture.path(), &config, &["--clean"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("all green"), "{stdout}");
    assert!(!stderr.contains("Aww"), "{stderr}");
}

#[test]
fn crawl_killed_by_signal_reports_failed_tests() {
    let fixture = SuiteFixture::new().expect("fixture");
    let config = write_config(
        fixture.path(),
        r#"["true"]"#,
        r#"["sh", "-c", "kill -9 $$"]"#,
    );

    let output = cortotest(fixture.path(), &config, &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Aww, tests failed."), "{stderr}");
}

#[test]
fn unknown_flag_is_argument_error() {
    let fixture = SuiteFixture::new().expect("fixture");
    let config = write_config(fixture.path(), r#"["true"]"#, CRAWL);

    let output = cortotest(fixture.path(), &config, &["--no-such-flag"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid arguments"), "{stderr}");
}
