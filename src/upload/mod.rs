//! Direct-to-storage file uploads driven by `getUploadParamsFor*` responses.
//!
//! Includes:
//! - `orchestrator`: path validation and the sequential batch loop.
//! - `client`: the HTTP POST of one file.
//! - `multipart`: spooling a file into a sized multipart form.
//! - `progress`: byte accounting and the progress label.

mod client;
mod multipart;
mod orchestrator;
mod progress;

pub use client::*;
pub use multipart::*;
pub use orchestrator::*;
pub use progress::*;
