//! Core building blocks shared by every llmrelay crate.
//!
//! - [`config`]: typed configuration, JSON loader, env var overrides
//! - [`utils`]: data directory and path helpers

pub mod config;
pub mod utils;
