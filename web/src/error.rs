//! Error types for web handlers.
//!
//! This module bridges domain errors and HTTP responses: validation
//! failures become 422 with an `errors` map, lifecycle conflicts become
//! 400 with a user-facing message, and everything else is a 500 with
//! the detail kept out of the body.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serialkit_core::SerialError;

use crate::responses::{ApiResponse, FieldErrors};

/// User-facing message for unexpected failures.
const MSG_INTERNAL: &str = "系統發生非預期錯誤，請稍後再試。";
/// User-facing message for malformed request bodies.
const MSG_BAD_JSON: &str = "JSON 格式錯誤，請檢查請求內容。";

/// Application error type for web handlers.
///
/// Wraps domain errors and implements Axum's `IntoResponse` so handlers
/// can return `Result<_, AppError>` and use `?` throughout.
#[derive(Debug)]
pub enum AppError {
    /// 422 with per-field messages.
    Validation(FieldErrors),
    /// 400 with a single business-rule message.
    Conflict(String),
    /// 500; the detail goes to the log, not the client.
    Internal(anyhow::Error),
}

impl AppError {
    /// Shortcut for a single-field validation failure.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Self::Validation(errors)
    }
}

impl From<SerialError> for AppError {
    fn from(err: SerialError) -> Self {
        match err {
            SerialError::DuplicateActivity { .. } => Self::field(
                "activity_unique_id",
                "活動唯一 ID 已存在，請勿重複新增。",
            ),
            SerialError::ActivityNotFound { .. } => Self::field(
                "activity_unique_id",
                "所選擇的 活動唯一 ID 無效（該活動不存在）。",
            ),
            SerialError::WindowEndBeforeStart => {
                Self::field("end_date", "結束日期 必須晚於或等於 開始日期。")
            }
            SerialError::WindowEndInPast => Self::field(
                "end_date",
                "結束日期 不能早於當前時間，否則序號將立即過期。",
            ),
            SerialError::InvalidFormat { violations } => {
                let mut errors = FieldErrors::new();
                for v in violations {
                    errors.insert(
                        format!("content.{}", v.index),
                        vec![format!("序號項目 [{}] 必須是 8 個字元。", v.value)],
                    );
                }
                Self::Validation(errors)
            }
            SerialError::SerialNotFound => Self::Conflict("此序號不存在".to_string()),
            SerialError::AlreadyRedeemed => {
                Self::Conflict("此序號已經被核銷使用".to_string())
            }
            SerialError::AlreadyCancelled => {
                Self::Conflict("此序號已被註銷，無法核銷".to_string())
            }
            SerialError::NotYetValid => Self::Conflict("此序號尚未生效".to_string()),
            SerialError::Expired => Self::Conflict("此序號已過期".to_string()),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(detail = %rejection, "rejected request body");
        Self::field("body", MSG_BAD_JSON)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::<()>::validation_error(errors)),
            )
                .into_response(),
            Self::Conflict(message) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(message)),
            )
                .into_response(),
            Self::Internal(source) => {
                tracing::error!(error = %source, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<()>::error(MSG_INTERNAL)),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn duplicate_activity_maps_to_a_field_error() {
        let err = AppError::from(SerialError::DuplicateActivity {
            unique_id: "SUMMER".to_string(),
        });
        match err {
            AppError::Validation(errors) => {
                assert_eq!(
                    errors["activity_unique_id"],
                    vec!["活動唯一 ID 已存在，請勿重複新增。"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn format_violations_are_keyed_by_position() {
        let err = AppError::from(SerialError::InvalidFormat {
            violations: vec![serialkit_core::FormatViolation {
                index: 2,
                value: "SHORT".to_string(),
            }],
        });
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors["content.2"], vec!["序號項目 [SHORT] 必須是 8 個字元。"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn lifecycle_conflicts_map_to_business_errors() {
        match AppError::from(SerialError::Expired) {
            AppError::Conflict(message) => assert_eq!(message, "此序號已過期"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
