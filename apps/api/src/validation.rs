//! Request validation: everything checked about an inbound analysis request
//! before the model is touched.

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderMap, StatusCode};
use serde_json::Value;
use tracing::warn;

use crate::encoding::EncodedPayload;
use crate::errors::AppError;

/// Maximum length of `fileData`, in base64 characters (10 MiB).
pub const MAX_FILE_DATA_LEN: usize = 10 * 1024 * 1024;

/// Identifier used when no forwarding header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub const INVALID_FILE_DATA: &str = "Missing or invalid \"fileData\" (base64 string required)";
pub const INVALID_MIME_TYPE: &str = "Missing or invalid \"mimeType\"";
pub const FILE_TOO_LARGE: &str = "File is too large. Maximum size is 10MB.";

const DEFAULT_FILE_NAME: &str = "cv.pdf";

/// A validated analysis request.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub payload: EncodedPayload,
    pub file_name: String,
}

/// Client identity for rate limiting: first `x-forwarded-for` hop, then `x-real-ip`.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Returns the request's `Origin` if it is present and not in the allow-list.
pub fn disallowed_origin<'a>(headers: &'a HeaderMap, allowed: &[String]) -> Option<&'a str> {
    let origin = headers.get(header::ORIGIN)?.to_str().ok()?;
    if allowed.iter().any(|a| a == origin) {
        None
    } else {
        Some(origin)
    }
}

/// Maps a body that could not be buffered onto the endpoint's own 400 errors.
/// Bodies over the transport limit get the same message as an oversized `fileData`.
pub fn body_rejection(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(FILE_TOO_LARGE.to_string())
    } else {
        warn!("Failed to read request body: {}", rejection.body_text());
        AppError::Validation(INVALID_FILE_DATA.to_string())
    }
}

/// Parses and validates the JSON body `{fileData, mimeType, fileName?}`.
pub fn parse_request(body: &[u8]) -> Result<AnalyzeRequest, AppError> {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let file_data = non_empty_str(&value, "fileData")
        .ok_or_else(|| AppError::Validation(INVALID_FILE_DATA.to_string()))?;

    let mime_type = non_empty_str(&value, "mimeType")
        .ok_or_else(|| AppError::Validation(INVALID_MIME_TYPE.to_string()))?;

    if file_data.len() > MAX_FILE_DATA_LEN {
        return Err(AppError::Validation(FILE_TOO_LARGE.to_string()));
    }

    let file_name = non_empty_str(&value, "fileName").unwrap_or(DEFAULT_FILE_NAME);

    Ok(AnalyzeRequest {
        payload: EncodedPayload::new(file_data, mime_type).with_file_name(file_name),
        file_name: file_name.to_string(),
    })
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
