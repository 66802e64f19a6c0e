//! In-memory store for tests.

use crate::error::{Result, SerialError};
use crate::state::{
    Activity, ActivityId, NewActivity, NewSerial, Serial, SerialCode, SerialId, SerialStatus,
};
use crate::store::{Store, StoreTx};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_activity_id: i64,
    next_serial_id: i64,
    activities: HashMap<ActivityId, Activity>,
    activity_ids: HashMap<String, ActivityId>,
    serials: HashMap<SerialCode, Serial>,
}

/// In-memory [`Store`] implementation.
///
/// A transaction owns the store's single mutex for its whole lifetime, so
/// concurrent transactions are fully serialized, a deliberately coarse
/// stand-in for row locking that preserves the blocking and re-evaluation
/// behavior the engines rely on.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: fetch a serial by raw code, if present.
    pub async fn serial(&self, raw_code: &str) -> Option<Serial> {
        let code = SerialCode::normalized(raw_code);
        self.inner.lock().await.serials.get(&code).cloned()
    }

    /// Test helper: fetch an activity by external unique id, if present.
    pub async fn activity(&self, unique_id: &str) -> Option<Activity> {
        let state = self.inner.lock().await;
        let id = state.activity_ids.get(unique_id)?;
        state.activities.get(id).cloned()
    }

    /// Test helper: all serials owned by an activity.
    pub async fn serials_for_activity(&self, activity_id: ActivityId) -> Vec<Serial> {
        self.inner
            .lock()
            .await
            .serials
            .values()
            .filter(|serial| serial.activity_id == activity_id)
            .cloned()
            .collect()
    }

    /// Test helper: total number of persisted serials.
    pub async fn serial_count(&self) -> usize {
        self.inner.lock().await.serials.len()
    }

    /// Test helper: total number of persisted activities.
    pub async fn activity_count(&self) -> usize {
        self.inner.lock().await.activities.len()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let snapshot = guard.clone();
        Ok(MemoryTx { guard, snapshot: Some(snapshot) })
    }
}

/// Transaction over a [`MemoryStore`].
///
/// Mutations apply directly to the shared state; a snapshot taken at
/// `begin` is restored on drop unless [`StoreTx::commit`] ran first.
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        // Uncommitted transaction: roll back to the snapshot.
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

impl StoreTx for MemoryTx {
    async fn activity_exists(&mut self, unique_id: &str) -> Result<bool> {
        Ok(self.guard.activity_ids.contains_key(unique_id))
    }

    async fn insert_activity(&mut self, activity: NewActivity) -> Result<Activity> {
        if self.guard.activity_ids.contains_key(&activity.unique_id) {
            return Err(SerialError::Storage(format!(
                "unique constraint violation: activity_unique_id {}",
                activity.unique_id
            )));
        }
        self.guard.next_activity_id += 1;
        let id = ActivityId(self.guard.next_activity_id);
        let record = Activity {
            id,
            unique_id: activity.unique_id.clone(),
            name: activity.name,
            window: activity.window,
            quota: activity.quota,
            created_at: activity.created_at,
            updated_at: activity.created_at,
        };
        self.guard.activity_ids.insert(activity.unique_id, id);
        self.guard.activities.insert(id, record.clone());
        Ok(record)
    }

    async fn find_activity_for_update(&mut self, unique_id: &str) -> Result<Option<Activity>> {
        let Some(id) = self.guard.activity_ids.get(unique_id) else {
            return Ok(None);
        };
        Ok(self.guard.activities.get(id).cloned())
    }

    async fn update_activity(&mut self, activity: &Activity) -> Result<()> {
        match self.guard.activities.get_mut(&activity.id) {
            Some(stored) => {
                *stored = activity.clone();
                Ok(())
            }
            None => Err(SerialError::Storage(format!("no activity with id {}", activity.id))),
        }
    }

    async fn existing_codes(&mut self, candidates: Vec<SerialCode>) -> Result<HashSet<SerialCode>> {
        Ok(candidates
            .into_iter()
            .filter(|code| self.guard.serials.contains_key(code))
            .collect())
    }

    async fn insert_serials(&mut self, serials: Vec<NewSerial>) -> Result<u32> {
        // Uniqueness backstop, same role as the database constraint.
        for serial in &serials {
            if self.guard.serials.contains_key(&serial.code) {
                return Err(SerialError::Storage(format!(
                    "unique constraint violation: serial code {}",
                    serial.code
                )));
            }
        }
        let inserted = u32::try_from(serials.len()).map_err(|_| SerialError::Internal)?;
        for serial in serials {
            self.guard.next_serial_id += 1;
            let record = Serial {
                id: SerialId(self.guard.next_serial_id),
                activity_id: serial.activity_id,
                code: serial.code.clone(),
                status: SerialStatus::Unused,
                note: serial.note,
                window: serial.window,
                created_at: serial.created_at,
                updated_at: serial.created_at,
            };
            self.guard.serials.insert(serial.code, record);
        }
        Ok(inserted)
    }

    async fn find_serial_for_update(&mut self, code: &SerialCode) -> Result<Option<Serial>> {
        Ok(self.guard.serials.get(code).cloned())
    }

    async fn find_serials_for_update(&mut self, codes: &[SerialCode]) -> Result<Vec<Serial>> {
        Ok(codes.iter().filter_map(|code| self.guard.serials.get(code).cloned()).collect())
    }

    async fn update_serial(&mut self, serial: &Serial) -> Result<()> {
        match self.guard.serials.get_mut(&serial.code) {
            Some(stored) => {
                *stored = serial.clone();
                Ok(())
            }
            None => Err(SerialError::Storage(format!("no serial with code {}", serial.code))),
        }
    }

    async fn mark_cancelled(
        &mut self,
        codes: &[SerialCode],
        note: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        for code in codes {
            let Some(stored) = self.guard.serials.get_mut(code) else {
                return Err(SerialError::Storage(format!("no serial with code {code}")));
            };
            stored.status = SerialStatus::Cancelled;
            stored.note = Some(note.to_owned());
            stored.updated_at = at;
        }
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        self.snapshot = None;
        Ok(())
    }
}
