//! Fixture-driven verification of external linters and fixers.
//!
//! A test root holds a tree of `save.toml` files. Each node's config is merged
//! with its ancestors, validated, and turned into plugins that run the
//! configured tool over the fixtures next to it and judge the output.
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod process;
pub mod report;
pub mod results;
pub mod util;
pub mod warning;
