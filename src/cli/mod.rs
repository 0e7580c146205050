//! CLI module for squema
//!
//! Provides command-line interface for:
//! - describe: Print the field tables of a schema document
//! - render: Build an instance from JSON values and print its forms

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{describe, load_registry, render, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json, read_text, write_response};
