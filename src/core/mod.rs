//! Core business logic
//!
//! Descriptors, dependency resolution, fetching, build execution, and
//! installation. Network and process side effects go through [`crate::infra`]
//! or tokio; everything here is driven by the CLI layer.

pub mod context;
pub mod descriptor;
pub mod executor;
pub mod fetch;
pub mod install;
pub mod installer;
pub mod platform;
pub mod pool;
pub mod resolver;
pub mod state;
pub mod template;
