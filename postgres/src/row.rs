//! Row shapes and their conversions into domain types.

use chrono::{DateTime, Utc};
use serialkit_core::error::SerialError;
use serialkit_core::state::{
    Activity, ActivityId, Serial, SerialCode, SerialId, SerialStatus, ValidityWindow,
};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct ActivityRow {
    pub id: i64,
    pub activity_unique_id: String,
    pub activity_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub quota: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = SerialError;

    fn try_from(row: ActivityRow) -> Result<Self, SerialError> {
        let quota = u32::try_from(row.quota)
            .map_err(|_| SerialError::Storage(format!("activity {} has invalid quota {}", row.id, row.quota)))?;
        Ok(Self {
            id: ActivityId(row.id),
            unique_id: row.activity_unique_id,
            name: row.activity_name,
            window: ValidityWindow::new(row.start_date, row.end_date),
            quota,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SerialRow {
    pub id: i64,
    pub serial_activity_id: i64,
    pub content: String,
    pub status: i16,
    pub note: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SerialRow> for Serial {
    type Error = SerialError;

    fn try_from(row: SerialRow) -> Result<Self, SerialError> {
        let status = SerialStatus::from_i16(row.status).ok_or_else(|| {
            SerialError::Storage(format!("serial {} has unknown status {}", row.id, row.status))
        })?;
        Ok(Self {
            id: SerialId(row.id),
            activity_id: ActivityId(row.serial_activity_id),
            code: SerialCode::normalized(&row.content),
            status,
            note: row.note,
            window: ValidityWindow::new(row.start_date, row.end_date),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
