use crate::commands::PathPrompt;
use crate::error::{AppError, Result};
use dialoguer::{theme::ColorfulTheme, Input};

const UPLOAD_PROMPT: &str = "Enter path of the file(s) to upload (comma-separated)";

/// Asks for upload paths on the terminal.
pub struct DialoguerPrompt;

impl PathPrompt for DialoguerPrompt {
    fn read_paths(&self) -> Result<String> {
        let paths: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(UPLOAD_PROMPT)
            .allow_empty(true)
            .interact_text()?;
        Ok(paths)
    }
}

/// Reads one shell line and splits it into tokens, honouring quotes.
pub fn prompt_command(profile: &str) -> Result<Vec<String>> {
    let line: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("({})", profile))
        .allow_empty(true)
        .interact_text()?;
    tokenize(&line)
}

/// Splits a command line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    shlex::split(line).ok_or_else(|| AppError::Cli("Unbalanced quotes in input".to_string()))
}
