//! PostgreSQL implementation of the serialkit store boundary.
//!
//! Row locks are taken with `SELECT ... FOR UPDATE`; batch operations lock
//! and write their whole target set in single statements. Every engine call
//! runs inside one [`sqlx::Transaction`], which rolls back automatically if
//! dropped uncommitted.
//!
//! # Example
//!
//! ```no_run
//! use serialkit_postgres::PgStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PgStore::connect("postgresql://localhost/serialkit").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod row;

use row::{ActivityRow, SerialRow};
use serialkit_core::error::{Result, SerialError};
use serialkit_core::state::{Activity, NewActivity, NewSerial, Serial, SerialCode, SerialStatus};
use serialkit_core::store::{Store, StoreTx};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashSet;
use tracing::debug;

/// PostgreSQL error code for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Translate a sqlx error into the domain's storage error, surfacing
/// unique-constraint violations distinctly. The application-level existence
/// check is advisory; a violating write is a correctness event, not
/// something to retry past silently.
fn storage_error(action: &str, error: &sqlx::Error) -> SerialError {
    let unique = error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if unique {
        SerialError::Storage(format!("unique constraint violation while trying to {action}: {error}"))
    } else {
        SerialError::Storage(format!("failed to {action}: {error}"))
    }
}

/// PostgreSQL-backed [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the given database URL with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Storage`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .connect(url)
            .await
            .map_err(|e| storage_error("connect", &e))?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Storage`] if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SerialError::Storage(format!("migration failed: {e}")))?;
        Ok(())
    }
}

impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        let tx = self.pool.begin().await.map_err(|e| storage_error("begin transaction", &e))?;
        Ok(PgTx { tx })
    }
}

/// One transaction against PostgreSQL. Dropped uncommitted, it rolls back
/// and releases every row lock it held.
#[derive(Debug)]
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl StoreTx for PgTx {
    async fn activity_exists(&mut self, unique_id: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM serial_activity WHERE activity_unique_id = $1)",
        )
        .bind(unique_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| storage_error("check activity existence", &e))
    }

    async fn insert_activity(&mut self, activity: NewActivity) -> Result<Activity> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r"
            INSERT INTO serial_activity
                (activity_unique_id, activity_name, start_date, end_date, quota, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, activity_unique_id, activity_name, start_date, end_date,
                      quota, created_at, updated_at
            ",
        )
        .bind(&activity.unique_id)
        .bind(&activity.name)
        .bind(activity.window.start)
        .bind(activity.window.end)
        .bind(i64::from(activity.quota))
        .bind(activity.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| storage_error("insert activity", &e))?;

        row.try_into()
    }

    async fn find_activity_for_update(&mut self, unique_id: &str) -> Result<Option<Activity>> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT id, activity_unique_id, activity_name, start_date, end_date,
                   quota, created_at, updated_at
            FROM serial_activity
            WHERE activity_unique_id = $1
            FOR UPDATE
            ",
        )
        .bind(unique_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| storage_error("lock activity", &e))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_activity(&mut self, activity: &Activity) -> Result<()> {
        sqlx::query(
            r"
            UPDATE serial_activity
            SET start_date = $1, end_date = $2, quota = $3, updated_at = $4
            WHERE id = $5
            ",
        )
        .bind(activity.window.start)
        .bind(activity.window.end)
        .bind(i64::from(activity.quota))
        .bind(activity.updated_at)
        .bind(activity.id.0)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("update activity", &e))?;
        Ok(())
    }

    async fn existing_codes(&mut self, candidates: Vec<SerialCode>) -> Result<HashSet<SerialCode>> {
        let contents: Vec<String> = candidates.into_iter().map(SerialCode::into_string).collect();
        let found: Vec<String> =
            sqlx::query_scalar("SELECT content FROM serial_detail WHERE content = ANY($1)")
                .bind(&contents)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(|e| storage_error("check existing codes", &e))?;

        debug!(candidates = contents.len(), existing = found.len(), "existence check");
        Ok(found.iter().map(|content| SerialCode::normalized(content)).collect())
    }

    async fn insert_serials(&mut self, serials: Vec<NewSerial>) -> Result<u32> {
        if serials.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO serial_detail \
             (serial_activity_id, content, status, note, start_date, end_date, created_at, updated_at) ",
        );
        builder.push_values(serials, |mut values, serial| {
            values
                .push_bind(serial.activity_id.0)
                .push_bind(serial.code.into_string())
                .push_bind(SerialStatus::Unused.as_i16())
                .push_bind(serial.note)
                .push_bind(serial.window.start)
                .push_bind(serial.window.end)
                .push_bind(serial.created_at)
                .push_bind(serial.created_at);
        });

        let result = builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| storage_error("insert serials", &e))?;

        u32::try_from(result.rows_affected()).map_err(|_| SerialError::Internal)
    }

    async fn find_serial_for_update(&mut self, code: &SerialCode) -> Result<Option<Serial>> {
        let row = sqlx::query_as::<_, SerialRow>(
            r"
            SELECT id, serial_activity_id, content, status, note,
                   start_date, end_date, created_at, updated_at
            FROM serial_detail
            WHERE content = $1
            FOR UPDATE
            ",
        )
        .bind(code.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| storage_error("lock serial", &e))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_serials_for_update(&mut self, codes: &[SerialCode]) -> Result<Vec<Serial>> {
        let contents: Vec<&str> = codes.iter().map(SerialCode::as_str).collect();
        let rows = sqlx::query_as::<_, SerialRow>(
            r"
            SELECT id, serial_activity_id, content, status, note,
                   start_date, end_date, created_at, updated_at
            FROM serial_detail
            WHERE content = ANY($1)
            FOR UPDATE
            ",
        )
        .bind(&contents)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| storage_error("lock serial batch", &e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_serial(&mut self, serial: &Serial) -> Result<()> {
        sqlx::query(
            r"
            UPDATE serial_detail
            SET status = $1, note = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(serial.status.as_i16())
        .bind(&serial.note)
        .bind(serial.updated_at)
        .bind(serial.id.0)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("update serial", &e))?;
        Ok(())
    }

    async fn mark_cancelled(
        &mut self,
        codes: &[SerialCode],
        note: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let contents: Vec<&str> = codes.iter().map(SerialCode::as_str).collect();
        sqlx::query(
            r"
            UPDATE serial_detail
            SET status = $1, note = $2, updated_at = $3
            WHERE content = ANY($4)
            ",
        )
        .bind(SerialStatus::Cancelled.as_i16())
        .bind(note)
        .bind(at)
        .bind(&contents)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("cancel serial batch", &e))?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(|e| storage_error("commit transaction", &e))
    }
}
