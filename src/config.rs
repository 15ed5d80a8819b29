//! Configuration helpers for the command-line interface.

pub mod duration;

pub use duration::parse_interval;
