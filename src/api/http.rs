//! Provides a plain HTTP implementation of [`ApiInvoker`].
//!
//! Requests are sent as `GET <url>?command=<api>&response=json&<args>`. Signing is
//! left to the management server's gateway; an API key is attached when configured.

use super::invoker::{ApiInvoker, InvokeError};
use crate::error::AppError;
use crate::models::Response;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Asynchronous client for the management API.
pub struct HttpApiInvoker {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpApiInvoker {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key,
        }
    }

    fn query(&self, api: &str, args: &[String]) -> Vec<(String, String)> {
        let mut query = vec![
            ("command".to_string(), api.to_string()),
            ("response".to_string(), "json".to_string()),
        ];
        for arg in args {
            match arg.split_once('=') {
                Some((key, value)) => query.push((key.to_string(), value.to_string())),
                None => warn!("Ignoring argument without '=': {}", arg),
            }
        }
        if let Some(key) = &self.api_key {
            query.push(("apikey".to_string(), key.clone()));
        }
        query
    }
}

/// Strips the `<api>response` envelope if present.
fn unwrap_envelope(api: &str, value: Value) -> Response {
    let envelope = format!("{}response", api.to_lowercase());
    match value {
        Value::Object(mut map) => match map.remove(&envelope) {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                map.insert(envelope, other);
                map
            },
            None => map,
        },
        other => {
            let mut map = Response::new();
            map.insert("result".to_string(), other);
            map
        },
    }
}

#[async_trait]
impl ApiInvoker for HttpApiInvoker {
    async fn invoke(
        &self,
        api: &str,
        args: &[String],
        is_async: bool,
        cancel: &CancellationToken,
    ) -> Result<Response, InvokeError> {
        info!("Calling API {} (async: {})", api, is_async);

        let request = self.client.get(&self.url).query(&self.query(api, args)).send();
        let response = tokio::select! {
            result = request => result.map_err(|e| {
                error!("Error calling {}: {}", api, e);
                InvokeError::new(e.into())
            })?,
            _ = cancel.cancelled() => return Err(InvokeError::new(AppError::Cancelled)),
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InvokeError::new(e.into()))?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            error!("Error parsing response of {}: {}", api, e);
            InvokeError::new(e.into())
        })?;
        let result = unwrap_envelope(api, value);

        if !status.is_success() {
            let message = result
                .get("errortext")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| status.to_string());
            error!("API {} failed with status {}: {}", api, status, message);
            return Err(InvokeError::with_partial(
                AppError::from_api_message(message),
                result,
            ));
        }

        debug!("API {} returned {} top-level keys", api, result.len());
        Ok(result)
    }
}
