//! Sends one spooled multipart body to a signed upload URL.

use super::multipart::spool_file;
use super::progress::ProgressSink;
use crate::error::{AppError, Result};
use crate::models::UploadParams;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Uploads may legitimately run for hours; this only guards against a hung peer.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// HTTP client for direct-to-storage uploads.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
}

impl UploadClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// POSTs `path` as a multipart body to `params.post_url`.
    ///
    /// The file is spooled first so the form's `Content-Length` is exact, then
    /// streamed through a progress reader that feeds `sink`. Only 200 and 201
    /// count as success.
    pub async fn upload_file(
        &self,
        params: &UploadParams,
        path: &Path,
        sink: ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let spooled = spool_file(path).await?;
        debug!(
            "POST {} ({} byte file) for {}",
            params.post_url,
            spooled.len,
            path.display()
        );
        let request = self
            .client
            .post(&params.post_url)
            .header("x-signature", &params.signature)
            .header("x-expires", &params.expires)
            .header("x-metadata", &params.metadata)
            .multipart(spooled.into_form(sink)?);

        let response = tokio::select! {
            result = request.send() => result?,
            _ = cancel.cancelled() => {
                info!("Upload of {} cancelled", path.display());
                return Err(AppError::Cancelled);
            },
        };

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(
            "Upload of {} failed with status {}: {}",
            path.display(),
            status,
            body
        );
        Err(AppError::UploadFailed {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn params(url: String) -> UploadParams {
        UploadParams {
            post_url: url,
            signature: "sig==".into(),
            expires: "2026-10-19T10:00:00Z".into(),
            metadata: "meta==".into(),
        }
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_sends_signed_headers_and_fixed_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "template.ova", b"ova-content");

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload/1")
            .match_header("x-signature", "sig==")
            .match_header("x-expires", "2026-10-19T10:00:00Z")
            .match_header("x-metadata", "meta==")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=[0-9a-f-]+$".into()),
            )
            .match_header("transfer-encoding", Matcher::Missing)
            .match_body(Matcher::Regex(
                "^--[0-9a-f-]+\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"template.ova\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n\
                 ova-content\r\n--[0-9a-f-]+--\r\n$"
                    .into(),
            ))
            .match_request(|request| {
                // The declared length must cover the whole framed body.
                let declared = request
                    .header("content-length")
                    .first()
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<usize>().ok());
                let actual = request.body().map(|b| b.len()).ok();
                declared.is_some() && declared == actual
            })
            .with_status(201)
            .create_async()
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let client = UploadClient::new().unwrap();
        client
            .upload_file(
                &params(format!("{}/upload/1", server.url())),
                &path,
                Box::new(move |p| sink_seen.lock().unwrap().push(p)),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(seen.lock().unwrap().last().copied(), Some(100));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "vol.qcow2", b"qcow");

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/upload")
            .with_status(403)
            .with_body("signature expired")
            .create_async()
            .await;

        let client = UploadClient::new().unwrap();
        let result = client
            .upload_file(
                &params(format!("{}/upload", server.url())),
                &path,
                Box::new(|_| {}),
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(AppError::UploadFailed { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "signature expired");
            },
            other => panic!("Expected UploadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.iso", b"a");

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let client = UploadClient::new().unwrap();
        let result = client
            .upload_file(
                &params(format!("{}/upload", server.url())),
                &path,
                Box::new(|_| {}),
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(AppError::Cancelled)));
        mock.assert_async().await;
    }
}
