//! LSP protocol surface of the tracker.
//!
//! This module provides the `workspace/executeCommand` commands through which
//! execution hosts submit fragments, signal restarts and read snapshots.

pub mod commands;

pub use commands::{command_names, parse_command, run_command, Command, CommandError};
