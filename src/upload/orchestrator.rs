//! Validates a user supplied path list and uploads each file in turn.

use super::client::UploadClient;
use super::progress::progress_label;
use crate::error::{AppError, Result};
use crate::models::UploadParams;
use crate::ui::SpinnerController;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const UPLOADING_MESSAGE: &str = "Uploading files, please wait...";

/// One validated file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub path: PathBuf,
    /// 1-based position in the batch.
    pub index: usize,
    pub count: usize,
}

impl UploadTask {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of one prompt-and-upload cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The user entered nothing.
    Skipped,
    Finished { total: usize, failed: usize },
}

impl UploadOutcome {
    /// Closing line shown to the user, if any.
    pub fn summary(&self) -> Option<String> {
        match self {
            UploadOutcome::Skipped => None,
            UploadOutcome::Finished { failed: 0, .. } => {
                Some("All files uploaded successfully.".to_string())
            },
            UploadOutcome::Finished { total, failed } => Some(format!(
                "{} of {} files failed to upload.",
                failed, total
            )),
        }
    }
}

/// Splits a comma separated path list and checks every path exists.
///
/// Blank entries are ignored. If any path is missing the whole set is rejected
/// with every bad path listed. Only "not found" counts as missing; a path that
/// cannot be inspected for another reason is kept and fails at upload time.
pub fn validate_paths(input: &str) -> Result<Vec<UploadTask>> {
    let mut missing = Vec::new();
    let mut valid = Vec::new();
    for raw in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match std::fs::metadata(raw) {
            Err(e) if e.kind() == ErrorKind::NotFound => missing.push(raw.to_string()),
            _ => valid.push(PathBuf::from(raw)),
        }
    }

    if !missing.is_empty() {
        return Err(AppError::MissingFiles(missing));
    }
    if valid.is_empty() {
        return Err(AppError::NoValidFiles);
    }

    let count = valid.len();
    Ok(valid
        .into_iter()
        .enumerate()
        .map(|(i, path)| UploadTask {
            path,
            index: i + 1,
            count,
        })
        .collect())
}

/// Drives a batch upload: validation, one spinner for the batch, strictly
/// sequential transfers, and a closing summary.
pub struct UploadOrchestrator<'a> {
    client: &'a UploadClient,
    spinners: &'a SpinnerController,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(client: &'a UploadClient, spinners: &'a SpinnerController) -> Self {
        Self { client, spinners }
    }

    /// Uploads every path in `input` using the already validated `params`.
    ///
    /// A failure on one file is reported and counted; the batch moves on. A
    /// cancellation abandons the current file and stops the batch.
    pub async fn run(
        &self,
        api: &str,
        params: &UploadParams,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        if input.trim().is_empty() {
            return Ok(UploadOutcome::Skipped);
        }

        let tasks = validate_paths(input)?;
        let names: Vec<String> = tasks.iter().map(|t| t.path.display().to_string()).collect();
        println!("Uploading files for {}: {}", api, names.join(", "));
        info!("Uploading {} file(s) for {}", tasks.len(), api);

        let spinner = self.spinners.start(UPLOADING_MESSAGE)?;
        let mut failed = 0;
        let mut cancelled = false;

        for task in &tasks {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let file_name = task.file_name();
            spinner.set_label(progress_label(task.index, task.count, &file_name, 0));
            let sink_handle = spinner.clone();
            let (index, count) = (task.index, task.count);
            let sink_name = file_name.clone();
            let sink = Box::new(move |percent: u8| {
                sink_handle.set_label(progress_label(index, count, &sink_name, percent));
            });

            match self.client.upload_file(params, &task.path, sink, cancel).await {
                Ok(()) => {
                    self.spinners.suspend(|| {
                        println!("Upload successful for: {}", task.path.display())
                    });
                },
                Err(AppError::Cancelled) => {
                    cancelled = true;
                    break;
                },
                Err(e) => {
                    warn!("Upload {}/{} of {} failed: {}", index, count, file_name, e);
                    failed += 1;
                    self.spinners.suspend(|| {
                        println!(
                            "Error uploading [{}/{}] {}: {}",
                            index,
                            count,
                            task.path.display(),
                            e
                        )
                    });
                },
            }
        }

        self.spinners.stop(&spinner);
        if cancelled {
            info!("Upload batch for {} cancelled", api);
            return Err(AppError::Cancelled);
        }

        let outcome = UploadOutcome::Finished {
            total: tasks.len(),
            failed,
        };
        if let Some(summary) = outcome.summary() {
            println!("{}", summary);
        }
        Ok(outcome)
    }
}
