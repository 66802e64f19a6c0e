//! HTTP request handlers.
//!
//! Each handler parses and validates the request, delegates to the
//! matching engine, and maps the result onto the wire envelope. Domain
//! errors convert through [`AppError`](crate::error::AppError).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use rand::Rng;
use serialkit_core::{
    AddQuota, CancelOutcome, Clock, CreateActivity, SerialCode, Store, ValidityWindow,
};

use crate::error::AppError;
use crate::requests::{AdditionalInsertRequest, CancelRequest, InsertRequest, RedeemRequest};
use crate::responses::{
    ApiResponse, CancelData, CancelResponse, InsertData, RedeemData, format_wire_datetime,
};
use crate::state::AppState;

type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// `POST /api/serials_insert`: create an activity and mint its first
/// batch of serials.
pub async fn serials_insert<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    body: JsonBody<InsertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InsertData>>), AppError>
where
    S: Store,
    C: Clock,
    R: Rng + Send,
{
    let Json(request) = body?;
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let receipt = state
        .activities
        .create_activity(CreateActivity {
            name: request.activity_name,
            unique_id: request.activity_unique_id,
            window: ValidityWindow { start: request.start_date, end: request.end_date },
            quota: request.quota,
        })
        .await?;

    tracing::info!(
        activity_id = receipt.activity_id.0,
        generated = receipt.generated,
        "activity created"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "活動與序號已成功產生",
            InsertData {
                activity_id: receipt.activity_id.0,
                total_generated: receipt.generated,
            },
        )),
    ))
}

/// `POST /api/serials_additional_insert`: top up an existing activity
/// with a further batch, replacing its validity window.
pub async fn serials_additional_insert<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    body: JsonBody<AdditionalInsertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InsertData>>), AppError>
where
    S: Store,
    C: Clock,
    R: Rng + Send,
{
    let Json(request) = body?;
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let receipt = state
        .activities
        .add_quota(AddQuota {
            unique_id: request.activity_unique_id,
            window: ValidityWindow { start: request.start_date, end: request.end_date },
            quota: request.quota,
            note: request.note,
        })
        .await?;

    tracing::info!(
        activity_id = receipt.activity_id.0,
        generated = receipt.generated,
        "quota added"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "序號已成功產生",
            InsertData {
                activity_id: receipt.activity_id.0,
                total_generated: receipt.generated,
            },
        )),
    ))
}

/// `POST /api/serials_redeem`: consume one serial exactly once.
pub async fn serials_redeem<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    body: JsonBody<RedeemRequest>,
) -> Result<Json<ApiResponse<RedeemData>>, AppError>
where
    S: Store,
    C: Clock,
    R: Rng + Send,
{
    let Json(request) = body?;
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let redemption = state.lifecycle.redeem(&request.content).await?;

    tracing::info!(code = %redemption.code, "serial redeemed");
    Ok(Json(ApiResponse::success(
        "核銷成功",
        RedeemData {
            serial_content: redemption.code.to_string(),
            redeemed_at: format_wire_datetime(redemption.redeemed_at),
        },
    )))
}

/// `POST /api/serials_cancel`: cancel a batch of serials, itemizing
/// per-code successes and failures.
pub async fn serials_cancel<S, C, R>(
    State(state): State<AppState<S, C, R>>,
    body: JsonBody<CancelRequest>,
) -> Result<Json<CancelResponse>, AppError>
where
    S: Store,
    C: Clock,
    R: Rng + Send,
{
    let Json(request) = body?;
    let errors = request.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let outcome = state
        .lifecycle
        .cancel_batch(&request.content, &request.note)
        .await?;

    tracing::info!(
        cancelled = outcome.cancelled.len(),
        failed = outcome.failed.len(),
        "cancel batch processed"
    );
    Ok(Json(render_cancel(&outcome)))
}

fn render_cancel(outcome: &CancelOutcome) -> CancelResponse {
    let success = outcome
        .cancelled
        .iter()
        .map(SerialCode::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let fail = outcome
        .failed
        .iter()
        .map(|f| format!("{} ({})", f.code, f.reason))
        .collect::<Vec<_>>()
        .join(",");
    CancelResponse {
        status: "success",
        message: outcome.summary().to_string(),
        cancel_at: format_wire_datetime(outcome.cancelled_at),
        success_data: CancelData { serial_content: success },
        fail_data: CancelData { serial_content: fail },
    }
}
