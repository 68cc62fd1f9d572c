//! Command-line interface for skymark.

pub mod args;
pub mod commands;
