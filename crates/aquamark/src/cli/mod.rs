//! CLI command implementations.

pub mod config;
pub mod export;
pub mod fonts;
pub mod template;
