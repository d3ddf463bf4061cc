#![deny(missing_docs)]
//! Shared logging utilities for the compactor workspace.
//!
//! This crate provides the `compactor_*` logging macros used across the
//! codebase and a minimal test initializer for the global logger.
//!
//! Records logged on a thread that has a poll tick set are prefixed with
//! `[poll N]`, so a log file shows which progress poll a line belongs to.

use std::cell::Cell;
use std::fmt;

thread_local! {
    /// Thread-local storage for the number of poll ticks dispatched so far.
    static POLL_TICK: Cell<u64> = const { Cell::new(0) };
}

/// Sets the poll tick count for the current thread.
/// The control loop updates it after every dispatched message.
pub fn set_poll_tick(tick: u64) {
    POLL_TICK.with(|v| v.set(tick));
}

/// Retrieves the poll tick count for the current thread.
/// Returns 0 if no tick has been dispatched on this thread.
pub fn get_poll_tick() -> u64 {
    POLL_TICK.with(|v| v.get())
}

/// Log record prefix for a poll tick; empty before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPrefix(pub u64);

impl TickPrefix {
    /// Prefix for the current thread's poll tick.
    pub fn current() -> Self {
        Self(get_poll_tick())
    }
}

impl fmt::Display for TickPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            Ok(())
        } else {
            write!(f, "[poll {}] ", self.0)
        }
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! compactor_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::TickPrefix::current(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! compactor_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::TickPrefix::current(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! compactor_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::TickPrefix::current(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! compactor_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::TickPrefix::current(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! compactor_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::TickPrefix::current(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
