//! Cellar - declarative package builder
//!
//! This library provides the core functionality for building and installing
//! packages from declarative TOML descriptors: resolve dependencies, fetch
//! and verify sources, run build steps in isolated working directories, and
//! publish artifacts atomically into a prefix.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (descriptors, resolution, build execution)
//! - [`infra`] - Infrastructure layer (network, filesystem)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
