//! Request shapes and field-level validation.
//!
//! Field names are the wire contract; dates arrive as
//! `yyyy-MM-dd HH:mm:ss` strings. Validation mirrors the engine's limits
//! (quota 1–100 per batch, at most 1000 codes per cancellation) and runs
//! before any engine call, answering 422 with an `errors` map keyed by
//! field name.

use crate::responses::FieldErrors;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Per-batch issuance bounds.
const QUOTA_MIN: u32 = 1;
const QUOTA_MAX: u32 = 100;
/// Maximum number of codes per cancellation request.
const CANCEL_BATCH_MAX: usize = 1000;

/// `POST /api/serials_insert`: create an activity and mint its initial
/// batch.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertRequest {
    /// Display name.
    pub activity_name: String,
    /// Caller-supplied external key, globally unique.
    pub activity_unique_id: String,
    /// Window start, `yyyy-MM-dd HH:mm:ss`.
    #[serde(with = "wire_datetime")]
    pub start_date: DateTime<Utc>,
    /// Window end, `yyyy-MM-dd HH:mm:ss`.
    #[serde(with = "wire_datetime")]
    pub end_date: DateTime<Utc>,
    /// Number of serials to mint (1–100).
    pub quota: u32,
}

impl InsertRequest {
    /// Field-level validation; returns every violation keyed by field.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_non_blank(&mut errors, "activity_name", &self.activity_name, "活動名稱 欄位為必填。");
        require_non_blank(
            &mut errors,
            "activity_unique_id",
            &self.activity_unique_id,
            "活動唯一 ID 欄位為必填。",
        );
        check_quota(&mut errors, self.quota);
        errors
    }
}

/// `POST /api/serials_additional_insert`: top up an existing activity.
#[derive(Debug, Clone, Deserialize)]
pub struct AdditionalInsertRequest {
    /// External key of the activity to top up.
    pub activity_unique_id: String,
    /// Replacement window start.
    #[serde(with = "wire_datetime")]
    pub start_date: DateTime<Utc>,
    /// Replacement window end.
    #[serde(with = "wire_datetime")]
    pub end_date: DateTime<Utc>,
    /// Number of additional serials to mint (1–100).
    pub quota: u32,
    /// Required issuance note, stamped on every serial of the batch.
    pub note: String,
}

impl AdditionalInsertRequest {
    /// Field-level validation; returns every violation keyed by field.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_non_blank(
            &mut errors,
            "activity_unique_id",
            &self.activity_unique_id,
            "活動唯一 ID 欄位為必填。",
        );
        check_quota(&mut errors, self.quota);
        require_non_blank(&mut errors, "note", &self.note, "備註 欄位為必填。");
        errors
    }
}

/// `POST /api/serials_redeem`: consume one serial.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemRequest {
    /// The 8-character code to redeem.
    pub content: String,
}

impl RedeemRequest {
    /// Field-level validation; returns every violation keyed by field.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_non_blank(&mut errors, "content", &self.content, "序號內容 欄位為必填。");
        errors
    }
}

/// `POST /api/serials_cancel`: cancel a batch of serials.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    /// Codes to cancel (1–1000 entries).
    pub content: Vec<String>,
    /// Required cancellation reason, written to every cancelled serial.
    pub note: String,
}

impl CancelRequest {
    /// Field-level validation; returns every violation keyed by field.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.content.is_empty() {
            errors.entry("content".to_string()).or_default().push("序號內容 欄位為必填。".to_string());
        } else if self.content.len() > CANCEL_BATCH_MAX {
            errors
                .entry("content".to_string())
                .or_default()
                .push("序號內容 一次最多只能處理 1000 筆。".to_string());
        }
        require_non_blank(&mut errors, "note", &self.note, "備註 欄位為必填。");
        errors
    }
}

fn require_non_blank(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.entry(field.to_string()).or_default().push(message.to_string());
    }
}

fn check_quota(errors: &mut FieldErrors, quota: u32) {
    if quota < QUOTA_MIN {
        errors.entry("quota".to_string()).or_default().push("產生數量 不能小於 1。".to_string());
    } else if quota > QUOTA_MAX {
        errors.entry("quota".to_string()).or_default().push("產生數量 不能大於 100。".to_string());
    }
}

/// Serde adapter for `yyyy-MM-dd HH:mm:ss` timestamps.
pub mod wire_datetime {
    use crate::responses::WIRE_DATETIME_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize a timestamp in wire format.
    ///
    /// # Errors
    ///
    /// Never fails for valid timestamps.
    pub fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&instant.format(WIRE_DATETIME_FORMAT).to_string())
    }

    /// Deserialize a wire-formatted timestamp.
    ///
    /// # Errors
    ///
    /// Fails if the string does not match `yyyy-MM-dd HH:mm:ss`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, WIRE_DATETIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
