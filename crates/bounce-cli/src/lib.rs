//! CLI library components for the bounce-back analysis tool.

pub mod config;
pub mod logging;
