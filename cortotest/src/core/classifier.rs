//! Deterministic classification of the role an invocation plays.

use crate::core::types::Role;

/// Results of the two filesystem probes taken in the current directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Probes {
    /// `./test` exists and is a directory.
    pub test_dir: bool,
    /// `./test/project.json` exists.
    pub test_descriptor: bool,
}

impl Probes {
    /// `test/` holds several independent suites rather than being one suite.
    pub fn nested_folders_are_tests(&self) -> bool {
        self.test_dir && !self.test_descriptor
    }
}

/// Decide the active role from the protocol flags and the probe result.
///
/// - `TestChild` if dispatched directly for a suite.
/// - `Root` if started by a user, or if a child discovers nested test folders.
/// - `Child` otherwise.
pub fn classify_role(is_child: bool, is_test_child: bool, nested_folders_are_tests: bool) -> Role {
    if is_test_child {
        Role::TestChild
    } else if !is_child || nested_folders_are_tests {
        Role::Root
    } else {
        Role::Child
    }
}
