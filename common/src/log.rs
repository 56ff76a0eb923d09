//! Thin wrappers around `tracing` so every crate logs through the same targets.
//!
//! The CLI formatter renders `success!` events with their own symbol by
//! matching on [`SUCCESS_TARGET`].

pub const SUCCESS_TARGET: &str = "neti::success";

#[doc(hidden)]
pub use tracing as __tracing;

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log::__tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::log::__tracing::info!(target: "neti::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log::__tracing::error!($($arg)*)
    };
}
