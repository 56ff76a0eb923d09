//! Shared model and helpers for the `neti` workspace.
//!
//! * [`network`]: address enumeration, host records and MAC helpers.
//! * [`config`]: scan settings produced by the CLI.
//! * [`vendors`]: OUI vendor lookup.
//! * [`log`]: logging macros used across the workspace.

pub mod config;
pub mod log;
pub mod network;
pub mod vendors;
