//! Persistence boundary for activities and serials.
//!
//! The engines never talk to a database directly; they drive a
//! [`StoreTx`] obtained from [`Store::begin`]. A transaction is the unit of
//! atomicity and of mutual exclusion: `*_for_update` lookups take exclusive
//! row locks that are held until [`StoreTx::commit`] or until the
//! transaction is dropped (implicit rollback). Locks are therefore scoped to
//! one engine call and never held across a round-trip to a caller.
//!
//! The code column must additionally carry a storage-level uniqueness
//! constraint. The generator's existence check is advisory; the constraint
//! is the correctness guarantee of last resort, and a write violating it
//! must fail the transaction as a [`SerialError::Storage`] error rather
//! than retry silently.

use crate::error::Result;
use crate::state::{Activity, NewActivity, NewSerial, Serial, SerialCode};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;

/// Handle to the shared relational store.
///
/// Cheap to clone (implementations wrap a connection pool or an
/// `Arc`-shared map) so each request task can carry its own handle.
pub trait Store: Clone + Send + Sync + 'static {
    /// Transaction type produced by [`Store::begin`].
    type Tx: StoreTx;

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Storage`] if a connection cannot be acquired.
    ///
    /// [`SerialError::Storage`]: crate::error::SerialError::Storage
    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;
}

/// One transaction against the store.
///
/// Dropping a transaction without calling [`StoreTx::commit`] rolls it
/// back; every row lock it held is released either way.
pub trait StoreTx: Send {
    /// Whether an activity with this external unique id exists.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn activity_exists(&mut self, unique_id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Insert a new activity and return the persisted record.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails, including a unique-constraint
    /// violation on the external id.
    fn insert_activity(
        &mut self,
        activity: NewActivity,
    ) -> impl Future<Output = Result<Activity>> + Send;

    /// Look up an activity by external unique id under an exclusive row
    /// lock, blocking concurrent mutation of the same activity.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_activity_for_update(
        &mut self,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Activity>>> + Send;

    /// Persist a mutated activity (window and quota).
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn update_activity(&mut self, activity: &Activity) -> impl Future<Output = Result<()>> + Send;

    /// Which of the candidate codes are already persisted; the code
    /// generator's bulk existence check.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn existing_codes(
        &mut self,
        candidates: Vec<SerialCode>,
    ) -> impl Future<Output = Result<HashSet<SerialCode>>> + Send;

    /// Bulk-insert freshly allocated serials; returns the inserted count.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails, including a code-uniqueness
    /// violation (the storage backstop behind the generator's check).
    fn insert_serials(&mut self, serials: Vec<NewSerial>)
    -> impl Future<Output = Result<u32>> + Send;

    /// Look up a serial by code under an exclusive row lock. Blocks until
    /// any conflicting transaction holding the same row commits or rolls
    /// back.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_serial_for_update(
        &mut self,
        code: &SerialCode,
    ) -> impl Future<Output = Result<Option<Serial>>> + Send;

    /// Lock every matching serial in one statement. Locking the whole
    /// target set together avoids incremental lock-ordering hazards
    /// between concurrent overlapping batches. Codes with no matching row
    /// are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_serials_for_update(
        &mut self,
        codes: &[SerialCode],
    ) -> impl Future<Output = Result<Vec<Serial>>> + Send;

    /// Persist a mutated serial (status, note, update stamp).
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn update_serial(&mut self, serial: &Serial) -> impl Future<Output = Result<()>> + Send;

    /// Transition every listed code to `Cancelled` with the given note and
    /// update stamp, as one bulk write. The caller has already locked the
    /// rows and filtered the list down to eligible codes.
    ///
    /// # Errors
    ///
    /// Returns error if the update fails.
    fn mark_cancelled(
        &mut self,
        codes: &[SerialCode],
        note: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Commit the transaction, releasing all row locks.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; the transaction is rolled back.
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
}
