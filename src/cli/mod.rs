//! Command-line interface module
//!
//! This module provides the CLI for smgen:
//!
//! - `smgen generate` - Write the diagram, C files and documentation
//! - `smgen check` - Parse a description and report soft problems
//! - `smgen init` - Create a manifest and an example description

mod commands;

pub use commands::{run, Cli, CliError, Commands};
