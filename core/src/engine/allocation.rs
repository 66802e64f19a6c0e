//! Batch serial allocation.

use crate::codegen::CodeGenerator;
use crate::error::Result;
use crate::state::{ActivityId, NewSerial, ValidityWindow};
use crate::store::StoreTx;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

/// Mints unique codes for an activity and persists them in one bulk write.
///
/// Allocation runs inside the caller's transaction so the serial inserts
/// commit (or roll back) together with whatever activity mutation triggered
/// them. On success it always persists exactly the requested count: a
/// short batch is not a valid outcome; failure to reach the count is an
/// error that rolls the whole unit back.
#[derive(Debug)]
pub struct AllocationEngine<R> {
    generator: CodeGenerator<R>,
}

impl<R: Rng + Send> AllocationEngine<R> {
    /// Create an allocation engine over the given entropy source.
    pub const fn new(rng: R) -> Self {
        Self { generator: CodeGenerator::new(rng) }
    }

    /// Allocate `quota` serials for `activity_id` within `tx`.
    ///
    /// Every serial is created `Unused`, carrying the given window snapshot
    /// and optional note. Returns the persisted count, which equals `quota`.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::CodespaceExhausted`] if the generator's draw
    /// budget runs out, or a storage error if the bulk insert fails (for
    /// example the code-uniqueness backstop constraint).
    ///
    /// [`SerialError::CodespaceExhausted`]: crate::error::SerialError::CodespaceExhausted
    pub async fn allocate<T: StoreTx>(
        &self,
        tx: &mut T,
        activity_id: ActivityId,
        window: ValidityWindow,
        quota: u32,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u32> {
        let codes = {
            let checker = &mut *tx;
            self.generator
                .generate(quota, |candidates| checker.existing_codes(candidates))
                .await?
        };

        let serials: Vec<NewSerial> = codes
            .into_iter()
            .map(|code| NewSerial {
                activity_id,
                code,
                note: note.map(str::to_owned),
                window,
                created_at: now,
            })
            .collect();

        let inserted = tx.insert_serials(serials).await?;
        info!(%activity_id, quota, inserted, "allocated serials");
        Ok(inserted)
    }
}
