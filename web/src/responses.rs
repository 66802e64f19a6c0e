//! Response envelope and payload shapes.
//!
//! Every endpoint answers with the same `{status, message, data, errors}`
//! envelope so clients always receive a consistent structure; `null` fields
//! are omitted from the JSON. Batch cancellation has its own top-level
//! shape with itemized success/failure data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Wire format for every timestamp this API emits or accepts.
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp the way the wire contract expects.
#[must_use]
pub fn format_wire_datetime(instant: DateTime<Utc>) -> String {
    instant.format(WIRE_DATETIME_FORMAT).to_string()
}

/// Field name → error messages, for validation failures.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Generic API response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// `"success"` or `"error"`.
    pub status: &'static str,
    /// Human-readable result message.
    pub message: String,
    /// Payload on success; omitted otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Field errors on validation failure; omitted otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    /// Successful response with payload.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self { status: "success", message: message.into(), data: Some(data), errors: None }
    }

    /// Error response with a message only.
    pub fn error(message: impl Into<String>) -> Self {
        Self { status: "error", message: message.into(), data: None, errors: None }
    }

    /// Validation-failure response carrying field errors.
    #[must_use]
    pub fn validation_error(errors: FieldErrors) -> Self {
        Self { status: "error", message: "驗證失敗".to_string(), data: None, errors: Some(errors) }
    }
}

/// Payload of both issuance endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct InsertData {
    /// Surrogate id of the (created or topped-up) activity.
    pub activity_id: i64,
    /// Number of serials persisted by this call.
    pub total_generated: u32,
}

/// Payload of the redeem endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemData {
    /// The normalized code that was redeemed.
    pub serial_content: String,
    /// Redemption instant, wire-formatted.
    pub redeemed_at: String,
}

/// Comma-joined code list inside the cancel response.
#[derive(Debug, Clone, Serialize)]
pub struct CancelData {
    /// `"A0000001,B0000002"` on the success side; failure entries carry
    /// their reason inline: `"A0000001 (此序號不存在)"`.
    pub serial_content: String,
}

/// Top-level response of the batch-cancel endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    /// Always `"success"`: per-code conflicts are itemized, not an error.
    pub status: &'static str,
    /// Overall summary message.
    pub message: String,
    /// Batch stamp, wire-formatted.
    pub cancel_at: String,
    /// Codes that were cancelled.
    pub success_data: CancelData,
    /// Codes that could not be cancelled, with reasons.
    pub fail_data: CancelData,
}
