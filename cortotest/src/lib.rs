//! Recursive test-suite orchestrator for corto projects.
//!
//! Started in a directory, an invocation decides whether it is the root of a
//! crawl, a child dispatched for one project, or a test child dispatched for
//! one suite, and then either re-invokes itself across projects or builds and
//! runs a single suite. The architecture mirrors that split:
//!
//! - **[`core`]**: Pure, deterministic logic (context resolution, role
//!   classification, the re-invocation protocol). No I/O.
//! - **[`io`]**: Side-effecting adapters (config, filesystem probes, process
//!   supervision, test-library loading, banners), behind traits where tests
//!   need to substitute them.
//!
//! Orchestration modules ([`invocation`], [`crawl`], [`suite`]) coordinate
//! core logic with I/O.

pub mod core;
pub mod crawl;
pub mod error;
pub mod exit_codes;
pub mod invocation;
pub mod io;
pub mod logging;
pub mod suite;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
