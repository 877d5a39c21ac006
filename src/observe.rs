//! Optional terminal logging for long-running numerical loops.
//!
//! Compiled only with the `obs_slog` feature. Call sites create a logger per
//! run when the caller asked for verbose output; dropping the logger flushes
//! the asynchronous drain, so every record of a run is written before the
//! run returns.
#[cfg(feature = "obs_slog")]
use slog::{Drain, Logger, o};

/// Build a non-blocking terminal logger tagged with `component`.
#[cfg(feature = "obs_slog")]
pub fn term_logger(component: &'static str) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("crate" => "rust_ipm", "component" => component))
}
