//! The boundary through which resolved API commands are executed.

use crate::error::AppError;
use crate::models::Response;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A failed invocation, optionally with whatever response body was produced.
#[derive(Debug, Clone)]
pub struct InvokeError {
    pub error: AppError,
    pub partial: Option<Response>,
}

impl InvokeError {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    pub fn with_partial(error: AppError, partial: Response) -> Self {
        Self {
            error,
            partial: Some(partial),
        }
    }
}

impl From<AppError> for InvokeError {
    fn from(error: AppError) -> Self {
        Self::new(error)
    }
}

/// Executes a named API with `key=value` arguments.
#[async_trait]
pub trait ApiInvoker: Send + Sync {
    async fn invoke(
        &self,
        api: &str,
        args: &[String],
        is_async: bool,
        cancel: &CancellationToken,
    ) -> Result<Response, InvokeError>;
}
