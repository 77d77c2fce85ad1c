//! Logging helpers shared by every crate.
//!
//! Everything goes through `tracing`; the terminal formatter in the CLI decides
//! how a given target is rendered.

/// Target used for events that mark a completed piece of work.
pub const SUCCESS_TARGET: &str = "fleetr::success";

/// Logs a success event at INFO level under [`SUCCESS_TARGET`].
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        ::tracing::info!(target: $crate::log::SUCCESS_TARGET, $($arg)+)
    };
}
