//! Testing utilities for the MySQL backend
//!
//! This module provides Docker container management for MySQL testing.

pub mod container;

pub use container::MySQLContainer;
