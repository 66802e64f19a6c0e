//! Axum HTTP boundary for the serial redemption service.
//!
//! Exposes four POST endpoints over the engines in `serialkit-core`:
//!
//! - `/api/serials_insert` creates an activity and mints its first batch
//! - `/api/serials_additional_insert` tops up an existing activity
//! - `/api/serials_redeem` consumes one serial exactly once
//! - `/api/serials_cancel` cancels a batch, itemizing per-code results
//!
//! Every endpoint answers with the `{status, message, data, errors}`
//! envelope; validation failures are 422 with field errors, lifecycle
//! conflicts are 400, unexpected failures are 500 with the detail logged
//! rather than exposed.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod requests;
pub mod responses;
pub mod router;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
