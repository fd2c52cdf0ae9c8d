//! Defines the API response shape and the upload credentials carried by
//! `getUploadParamsFor*` responses.

use crate::error::{AppError, Result};
use serde_json::{Map, Value};

/// A decoded API response: string keys mapped to arbitrary JSON values.
pub type Response = Map<String, Value>;

/// Key under which upload-eligible APIs return their credentials.
pub const UPLOAD_PARAMS_KEY: &str = "getuploadparams";

/// Signed parameters for a direct-to-storage upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub post_url: String,
    pub signature: String,
    pub expires: String,
    pub metadata: String,
}

impl UploadParams {
    /// Required fields, in the order they are checked.
    pub const REQUIRED_KEYS: [&'static str; 4] = ["postURL", "metadata", "signature", "expires"];

    /// Decodes the nested credential map out of a response.
    ///
    /// Fails with `InvalidUploadParams` if the nested value is missing, is not an
    /// object, or lacks any of the required keys.
    pub fn from_response(response: &Response) -> Result<Self> {
        let params = match response.get(UPLOAD_PARAMS_KEY) {
            Some(Value::Object(map)) => map,
            Some(_) | None => {
                return Err(AppError::InvalidUploadParams(format!(
                    "Invalid response format for {}.",
                    UPLOAD_PARAMS_KEY
                )))
            },
        };

        for key in Self::REQUIRED_KEYS {
            if !params.contains_key(key) {
                return Err(AppError::InvalidUploadParams(format!(
                    "Missing required key '{}' in {} response.",
                    key, UPLOAD_PARAMS_KEY
                )));
            }
        }

        Ok(Self {
            post_url: field_text(params, "postURL"),
            signature: field_text(params, "signature"),
            expires: field_text(params, "expires"),
            metadata: field_text(params, "metadata"),
        })
    }
}

/// Header-safe text for a credential field; scalars are rendered, strings kept verbatim.
fn field_text(params: &Map<String, Value>, key: &str) -> String {
    match params.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> Response {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_decodes_complete_params() {
        let resp = response(json!({
            "getuploadparams": {
                "postURL": "https://ssvm.example/upload/abc",
                "signature": "sig==",
                "expires": "2026-10-19T10:00:00Z",
                "metadata": "meta==",
                "id": "42"
            }
        }));

        let params = UploadParams::from_response(&resp).unwrap();
        assert_eq!(params.post_url, "https://ssvm.example/upload/abc");
        assert_eq!(params.signature, "sig==");
        assert_eq!(params.expires, "2026-10-19T10:00:00Z");
        assert_eq!(params.metadata, "meta==");
    }

    #[test]
    fn test_rejects_non_object_params() {
        let resp = response(json!({ "getuploadparams": "nope" }));
        assert!(matches!(
            UploadParams::from_response(&resp),
            Err(AppError::InvalidUploadParams(_))
        ));
    }

    #[test]
    fn test_rejects_missing_params_key() {
        let resp = response(json!({ "count": 1 }));
        assert!(matches!(
            UploadParams::from_response(&resp),
            Err(AppError::InvalidUploadParams(_))
        ));
    }

    #[test]
    fn test_reports_first_missing_field() {
        let resp = response(json!({
            "getuploadparams": { "postURL": "http://x", "metadata": "m", "expires": "e" }
        }));
        match UploadParams::from_response(&resp) {
            Err(AppError::InvalidUploadParams(msg)) => assert!(msg.contains("'signature'")),
            other => panic!("Expected InvalidUploadParams, got {:?}", other),
        }
    }

    #[test]
    fn test_non_string_fields_are_rendered() {
        let resp = response(json!({
            "getuploadparams": { "postURL": "http://x", "metadata": "m", "signature": "s", "expires": 1700000000 }
        }));
        let params = UploadParams::from_response(&resp).unwrap();
        assert_eq!(params.expires, "1700000000");
    }
}
