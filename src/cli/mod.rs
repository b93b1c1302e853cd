//! CLI command handlers

pub mod commands;

pub use commands::{active, duties, group, heads, schedule, watch};
