//! Redeem and batch-cancel state transitions.
//!
//! State machine per serial: `Unused --redeem--> Redeemed` and
//! `Unused --cancel--> Cancelled`. No transition leaves `Redeemed` or
//! `Cancelled`. Every transition runs lock → guard → mutate → commit inside
//! one transaction, so no caller can observe an intermediate state.

use crate::clock::Clock;
use crate::error::{FormatViolation, Result, SerialError};
use crate::state::{CODE_LEN, SerialCode, SerialStatus};
use crate::store::{Store, StoreTx};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Per-code failure reason: no serial carries the code.
pub const REASON_NOT_FOUND: &str = "此序號不存在";
/// Per-code failure reason: cancelling twice.
pub const REASON_ALREADY_CANCELLED: &str = "此序號已被註銷，請勿重複註銷";
/// Per-code failure reason: the code was already consumed.
pub const REASON_ALREADY_REDEEMED: &str = "此序號已被核銷，無法再註銷";

/// Batch summary: every requested code was cancelled.
pub const MSG_ALL_CANCELLED: &str = "全部註銷成功";
/// Batch summary: no requested code could be cancelled.
pub const MSG_ALL_FAILED: &str = "全部註銷失敗";
/// Batch summary: some codes cancelled, some failed.
pub const MSG_PARTIAL: &str = "部分註銷成功";

/// Successful redemption of one serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// The normalized code that was redeemed.
    pub code: SerialCode,
    /// Instant the transition was stamped.
    pub redeemed_at: DateTime<Utc>,
}

/// One code that could not be cancelled, with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelFailure {
    /// The normalized code.
    pub code: SerialCode,
    /// Why it was skipped.
    pub reason: &'static str,
}

/// Itemized result of a batch cancellation.
///
/// Batch cancellation is best-effort: per-code conflicts never abort the
/// call, they are reported here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Codes transitioned to `Cancelled`, in first-seen request order.
    pub cancelled: Vec<SerialCode>,
    /// Codes that could not be cancelled, in first-seen request order.
    pub failed: Vec<CancelFailure>,
    /// Instant the batch was stamped.
    pub cancelled_at: DateTime<Utc>,
}

impl CancelOutcome {
    /// Overall human-readable summary of the batch.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        if self.failed.is_empty() {
            MSG_ALL_CANCELLED
        } else if self.cancelled.is_empty() {
            MSG_ALL_FAILED
        } else {
            MSG_PARTIAL
        }
    }
}

/// Guarded state transitions over serial records.
#[derive(Debug, Clone)]
pub struct LifecycleEngine<S, C> {
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> LifecycleEngine<S, C> {
    /// Create a lifecycle engine over the given store and clock.
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Redeem one serial, consuming it exactly once.
    ///
    /// The matching row is locked before the guards run, so of two
    /// concurrent redeems of the same code exactly one succeeds; the other
    /// blocks on the lock and then observes `AlreadyRedeemed`. A failed
    /// attempt rolls back and leaves the serial untouched.
    ///
    /// # Errors
    ///
    /// - [`SerialError::SerialNotFound`] if no serial carries the code.
    /// - [`SerialError::AlreadyRedeemed`] / [`SerialError::AlreadyCancelled`]
    ///   for absorbing states.
    /// - [`SerialError::NotYetValid`] before the window start,
    ///   [`SerialError::Expired`] at or past the window end.
    /// - [`SerialError::Storage`] if persistence fails.
    pub async fn redeem(&self, raw_code: &str) -> Result<Redemption> {
        let code = SerialCode::normalized(raw_code);

        let mut tx = self.store.begin().await?;
        let mut serial = tx
            .find_serial_for_update(&code)
            .await?
            .ok_or(SerialError::SerialNotFound)?;

        // Guards are evaluated under the row lock, in fixed order.
        match serial.status {
            SerialStatus::Redeemed => return Err(SerialError::AlreadyRedeemed),
            SerialStatus::Cancelled => return Err(SerialError::AlreadyCancelled),
            SerialStatus::Unused => {}
        }

        let now = self.clock.now();
        if now < serial.window.start {
            return Err(SerialError::NotYetValid);
        }
        if now >= serial.window.end {
            return Err(SerialError::Expired);
        }

        serial.status = SerialStatus::Redeemed;
        serial.updated_at = now;
        tx.update_serial(&serial).await?;
        tx.commit().await?;

        info!(%code, "serial redeemed");
        Ok(Redemption { code, redeemed_at: now })
    }

    /// Cancel a batch of serials, itemizing per-code results.
    ///
    /// Input codes are validated for length before any locking; a single
    /// malformed entry rejects the whole request. Valid input is
    /// normalized, deduplicated preserving first-seen order, and locked in
    /// one bulk statement; each code is then dispositioned independently
    /// and every eligible row is cancelled in one bulk write.
    ///
    /// # Errors
    ///
    /// - [`SerialError::InvalidFormat`] with one entry per offending index
    ///   if any input is not exactly 8 characters after trimming.
    /// - [`SerialError::Storage`] if the bulk lookup or write fails.
    pub async fn cancel_batch(&self, raw_codes: &[String], note: &str) -> Result<CancelOutcome> {
        let violations: Vec<FormatViolation> = raw_codes
            .iter()
            .enumerate()
            .filter(|(_, raw)| raw.trim().chars().count() != CODE_LEN)
            .map(|(index, raw)| FormatViolation { index, value: raw.clone() })
            .collect();
        if !violations.is_empty() {
            return Err(SerialError::InvalidFormat { violations });
        }

        let mut requested: Vec<SerialCode> = Vec::with_capacity(raw_codes.len());
        let mut unique: HashSet<SerialCode> = HashSet::with_capacity(raw_codes.len());
        for raw in raw_codes {
            let code = SerialCode::normalized(raw);
            if unique.insert(code.clone()) {
                requested.push(code);
            }
        }

        let mut tx = self.store.begin().await?;
        let locked = tx.find_serials_for_update(&requested).await?;
        let by_code: HashMap<&SerialCode, SerialStatus> =
            locked.iter().map(|serial| (&serial.code, serial.status)).collect();

        let now = self.clock.now();
        let mut cancelled: Vec<SerialCode> = Vec::new();
        let mut failed: Vec<CancelFailure> = Vec::new();

        for code in &requested {
            match by_code.get(code) {
                None => failed.push(CancelFailure { code: code.clone(), reason: REASON_NOT_FOUND }),
                Some(SerialStatus::Cancelled) => failed.push(CancelFailure {
                    code: code.clone(),
                    reason: REASON_ALREADY_CANCELLED,
                }),
                Some(SerialStatus::Redeemed) => failed.push(CancelFailure {
                    code: code.clone(),
                    reason: REASON_ALREADY_REDEEMED,
                }),
                Some(SerialStatus::Unused) => cancelled.push(code.clone()),
            }
        }

        if !cancelled.is_empty() {
            tx.mark_cancelled(&cancelled, note, now).await?;
        }
        tx.commit().await?;

        debug!(
            requested = requested.len(),
            cancelled = cancelled.len(),
            failed = failed.len(),
            "batch cancellation finished"
        );
        Ok(CancelOutcome { cancelled, failed, cancelled_at: now })
    }
}
