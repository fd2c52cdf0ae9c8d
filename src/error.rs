//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// The typed tokens did not resolve to any registered command or API.
    #[error("unknown command or API requested: {0}")]
    UnknownCommand(String),

    /// Required `name=value` arguments were not supplied.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingRequiredArgs(Vec<String>),

    /// The upload-credential response was malformed or incomplete.
    #[error("Invalid upload parameters: {0}")]
    InvalidUploadParams(String),

    /// One or more user supplied paths do not exist.
    #[error("File(s) do not exist or are not accessible: {}", .0.join(", "))]
    MissingFiles(Vec<String>),

    /// The path list was empty once blanks were dropped.
    #[error("No valid files to upload.")]
    NoValidFiles,

    /// The upload endpoint answered with something other than 200/201.
    #[error("upload failed ({status}): {body}")]
    UploadFailed { status: u16, body: String },

    /// Transport level failure from `reqwest`.
    #[error("HTTP Error: {0}")]
    Http(Arc<reqwest::Error>),

    /// Failure reported by the API invoker.
    #[error("API Error: {0}")]
    Api(String),

    /// The operation was cancelled by the caller.
    #[error("context canceled")]
    Cancelled,

    /// Error during JSON parsing (`serde_json`). Wrapped in Arc as serde_json::Error is not Clone.
    #[error("JSON Parsing Error: {0}")]
    JsonParse(Arc<serde_json::Error>),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error specific to CLI logic or argument handling.
    #[error("{0}")]
    Cli(String),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

impl AppError {
    /// Errors the dispatch loop swallows without printing anything.
    pub fn is_silent(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }

    /// Classifies an error message coming from an external API client.
    ///
    /// Go-style clients report cancellation as text ending in `context canceled`.
    pub fn from_api_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim_end().ends_with("context canceled") {
            AppError::Cancelled
        } else {
            AppError::Api(message)
        }
    }
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}
