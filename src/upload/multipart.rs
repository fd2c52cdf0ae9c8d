//! Spooled `multipart/form-data` bodies.
//!
//! The file is copied to an anonymous scratch file first so its size is fixed and
//! known before the request starts. `reqwest`'s multipart form then frames that
//! scratch copy as a sized part, which lets it declare an exact `Content-Length`
//! instead of falling back to chunked transfer.

use super::progress::{ProgressReader, ProgressSink};
use crate::error::Result;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Form field name of the file part.
pub const FILE_FIELD: &str = "file";

const FILE_MIME: &str = "application/octet-stream";

/// A scratch copy of an upload source, rewound to its start.
#[derive(Debug)]
pub struct SpooledFile {
    pub file: File,
    pub len: u64,
    pub file_name: String,
}

impl SpooledFile {
    /// Builds the single-part form, streaming the scratch copy through a
    /// [`ProgressReader`] that reports to `sink`.
    pub fn into_form(self, sink: ProgressSink) -> Result<Form> {
        let stream = ReaderStream::new(ProgressReader::new(self.file, self.len, sink));
        let part = Part::stream_with_length(Body::wrap_stream(stream), self.len)
            .file_name(self.file_name)
            .mime_str(FILE_MIME)?;
        Ok(Form::new().part(FILE_FIELD, part))
    }
}

/// Copies `path` into scratch storage and measures it.
pub async fn spool_file(path: &Path) -> Result<SpooledFile> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let mut source = File::open(path).await?;
    let mut scratch = File::from_std(tempfile::tempfile()?);
    tokio::io::copy(&mut source, &mut scratch).await?;
    scratch.flush().await?;

    let len = scratch.seek(SeekFrom::End(0)).await?;
    scratch.seek(SeekFrom::Start(0)).await?;
    debug!("Spooled {} ({} bytes)", path.display(), len);

    Ok(SpooledFile {
        file: scratch,
        len,
        file_name,
    })
}
