//! Command-line interface
//!
//! This module contains the CLI commands, argument parsing and the
//! interactive sessions behind `simulate` and `mine`.

pub mod commands;
pub mod session;

pub use commands::{Command, Opt};
pub use session::{run_mining, run_simulation, EXIT_SENTINEL};
