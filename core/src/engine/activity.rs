//! Activity creation and incremental quota top-ups.

use crate::clock::Clock;
use crate::engine::allocation::AllocationEngine;
use crate::error::{Result, SerialError};
use crate::state::{ActivityId, NewActivity, ValidityWindow};
use crate::store::{Store, StoreTx};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

/// Parameters for creating an activity with its initial issuance batch.
#[derive(Debug, Clone)]
pub struct CreateActivity {
    /// Display name.
    pub name: String,
    /// Caller-supplied external key, globally unique.
    pub unique_id: String,
    /// Validity window for the activity and its initial batch.
    pub window: ValidityWindow,
    /// Number of serials to mint.
    pub quota: u32,
}

/// Parameters for topping up an existing activity.
#[derive(Debug, Clone)]
pub struct AddQuota {
    /// External key of the activity to top up.
    pub unique_id: String,
    /// Replacement validity window. Overwrites the activity's current
    /// window; serials from earlier batches keep their snapshots.
    pub window: ValidityWindow,
    /// Number of additional serials to mint.
    pub quota: u32,
    /// Issuance note stamped on every serial of this batch.
    pub note: String,
}

/// Result of an issuance: which activity, and how many codes were minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceReceipt {
    /// The owning activity.
    pub activity_id: ActivityId,
    /// Serials persisted by this call. Equals the requested quota.
    pub generated: u32,
}

/// Creates activities and applies quota top-ups, delegating code minting to
/// the [`AllocationEngine`]. The activity mutation and the serial inserts
/// of one call always commit as a single atomic unit.
#[derive(Debug)]
pub struct ActivityEngine<S, C, R> {
    store: S,
    clock: C,
    allocator: AllocationEngine<R>,
}

impl<S: Store, C: Clock, R: Rng + Send> ActivityEngine<S, C, R> {
    /// Create an activity engine over the given store, clock, and entropy
    /// source.
    pub const fn new(store: S, clock: C, rng: R) -> Self {
        Self { store, clock, allocator: AllocationEngine::new(rng) }
    }

    /// Create a new activity and mint its initial batch of serials.
    ///
    /// # Errors
    ///
    /// - [`SerialError::DuplicateActivity`] if the external id exists;
    ///   nothing is persisted.
    /// - [`SerialError::WindowEndBeforeStart`] /
    ///   [`SerialError::WindowEndInPast`] for an invalid window.
    /// - Allocation or storage errors roll the whole unit back.
    pub async fn create_activity(&self, req: CreateActivity) -> Result<IssuanceReceipt> {
        let now = self.clock.now();
        validate_window(req.window, now)?;

        let mut tx = self.store.begin().await?;
        if tx.activity_exists(&req.unique_id).await? {
            return Err(SerialError::DuplicateActivity { unique_id: req.unique_id });
        }

        let activity = tx
            .insert_activity(NewActivity {
                unique_id: req.unique_id,
                name: req.name,
                window: req.window,
                quota: req.quota,
                created_at: now,
            })
            .await?;

        let generated = self
            .allocator
            .allocate(&mut tx, activity.id, req.window, req.quota, None, now)
            .await?;
        tx.commit().await?;

        info!(activity_id = %activity.id, unique_id = %activity.unique_id, generated, "activity created");
        Ok(IssuanceReceipt { activity_id: activity.id, generated })
    }

    /// Add `quota` serials to an existing activity.
    ///
    /// The activity's validity window is replaced (not merged) and its
    /// cumulative quota incremented; the new serials carry the note and the
    /// *new* window. Serials from earlier batches are untouched.
    ///
    /// # Errors
    ///
    /// - [`SerialError::ActivityNotFound`] if the external id is unknown.
    /// - [`SerialError::WindowEndBeforeStart`] /
    ///   [`SerialError::WindowEndInPast`] for an invalid window.
    /// - Allocation or storage errors roll the whole unit back.
    pub async fn add_quota(&self, req: AddQuota) -> Result<IssuanceReceipt> {
        let now = self.clock.now();
        validate_window(req.window, now)?;

        let mut tx = self.store.begin().await?;
        let mut activity = tx
            .find_activity_for_update(&req.unique_id)
            .await?
            .ok_or(SerialError::ActivityNotFound { unique_id: req.unique_id })?;

        activity.window = req.window;
        activity.quota += req.quota;
        activity.updated_at = now;
        tx.update_activity(&activity).await?;

        let generated = self
            .allocator
            .allocate(&mut tx, activity.id, req.window, req.quota, Some(&req.note), now)
            .await?;
        tx.commit().await?;

        info!(
            activity_id = %activity.id,
            unique_id = %activity.unique_id,
            total_quota = activity.quota,
            generated,
            "quota added"
        );
        Ok(IssuanceReceipt { activity_id: activity.id, generated })
    }
}

/// End must not precede start, and must not already be in the past;
/// otherwise every serial of the batch would be born expired.
fn validate_window(window: ValidityWindow, now: DateTime<Utc>) -> Result<()> {
    if window.end < window.start {
        return Err(SerialError::WindowEndBeforeStart);
    }
    if window.end < now {
        return Err(SerialError::WindowEndInPast);
    }
    Ok(())
}
