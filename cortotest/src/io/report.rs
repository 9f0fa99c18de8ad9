//! User-facing banners.
//!
//! Banners are product output and are printed regardless of `RUST_LOG`;
//! diagnostics go through `tracing` instead.

const GREEN: &str = "\x1b[1;32m";
const NORMAL: &str = "\x1b[0;49m";

pub trait Reporter {
    /// A crawl of `target` was killed by a signal while running tests.
    fn tests_failed(&self, target: &str);
    /// Every target of a test crawl came back clean.
    fn all_green(&self);
}

/// Reporter writing to the terminal.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn tests_failed(&self, target: &str) {
        eprintln!("Aww, tests failed. ({target})");
    }

    fn all_green(&self) {
        println!("{GREEN}Yay, all green :-){NORMAL}");
    }
}
