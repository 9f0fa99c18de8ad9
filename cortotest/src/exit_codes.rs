//! Stable exit codes for the `cortotest` binary.

/// Every targeted suite built (and, for `test`, passed).
pub const OK: i32 = 0;
/// Any failure: bad arguments, spawn, build, test, or directory errors.
pub const FAILURE: i32 = -1;
