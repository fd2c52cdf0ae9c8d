//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes argument parsing, the application state the shell loop drives, and
//! the terminal prompts for command lines and upload paths.

mod commands;
mod prompt;

pub use commands::*;
pub use prompt::*;
