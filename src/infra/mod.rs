//! Infrastructure layer
//!
//! Network and filesystem plumbing with no package-level policy.

pub mod download;
