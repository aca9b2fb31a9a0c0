//! Postgres-backed roll store.
//!
//! Rows live in a single `rolls` table. Soft deletes run in a transaction that
//! locks the row, applies the domain transition and writes it back, so the
//! "removed at most once" rule holds under concurrent requests.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (check violation `23514`) | `Domain(Validation)` |
//! | Anything else | `Storage` |

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use rollstock_core::{DomainError, RollId};
use rollstock_inventory::{NewRoll, Range, Roll, RollFilter, StatsWindow};

use super::{RollStore, StoreError};

const ROLL_COLUMNS: &str = "id, length, weight, added_date, removed_date";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS rolls (
    id BIGSERIAL PRIMARY KEY,
    length DOUBLE PRECISION NOT NULL CHECK (length > 0),
    weight DOUBLE PRECISION NOT NULL CHECK (weight > 0),
    added_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    removed_date TIMESTAMPTZ NULL,
    CONSTRAINT rolls_removed_after_added CHECK (removed_date IS NULL OR removed_date >= added_date)
)
"#;

const CREATE_ADDED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS rolls_added_date_idx ON rolls (added_date)";

#[derive(Debug, Clone)]
pub struct PostgresRollStore {
    pool: PgPool,
}

impl PostgresRollStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `rolls` table and its index if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_table", e))?;
        sqlx::query(CREATE_ADDED_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_index", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RollStore for PostgresRollStore {
    #[instrument(skip(self), err)]
    async fn create(&self, new: NewRoll, added_at: DateTime<Utc>) -> Result<Roll, StoreError> {
        new.validate()?;

        let row = sqlx::query(&format!(
            "INSERT INTO rolls (length, weight, added_date) VALUES ($1, $2, $3) RETURNING {ROLL_COLUMNS}"
        ))
        .bind(new.length)
        .bind(new.weight)
        .bind(added_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_roll", e))?;

        roll_from_row(&row)
    }

    #[instrument(skip(self), fields(roll_id = %id), err)]
    async fn soft_delete(&self, id: RollId, removed_at: DateTime<Utc>) -> Result<Roll, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let row = sqlx::query(&format!("SELECT {ROLL_COLUMNS} FROM rolls WHERE id = $1 FOR UPDATE"))
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_roll", e))?
            .ok_or(StoreError::NotFound(id))?;

        let mut roll = roll_from_row(&row)?;
        roll.remove(removed_at)?;

        sqlx::query("UPDATE rolls SET removed_date = $2 WHERE id = $1")
            .bind(id.get())
            .bind(roll.removed_date)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_roll", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(roll)
    }

    async fn get(&self, id: RollId) -> Result<Option<Roll>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ROLL_COLUMNS} FROM rolls WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_roll", e))?;

        row.as_ref().map(roll_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: &RollFilter) -> Result<Vec<Roll>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ROLL_COLUMNS} FROM rolls WHERE TRUE"));

        if let Some(r) = &filter.id {
            push_between(&mut qb, "id", r);
        }
        if let Some(r) = &filter.weight {
            push_between(&mut qb, "weight", r);
        }
        if let Some(r) = &filter.length {
            push_between(&mut qb, "length", r);
        }
        if let Some(r) = &filter.added {
            push_between(&mut qb, "(added_date AT TIME ZONE 'UTC')::date", r);
        }
        if let Some(r) = &filter.removed {
            qb.push(" AND removed_date IS NOT NULL");
            push_between(&mut qb, "(removed_date AT TIME ZONE 'UTC')::date", r);
        }
        qb.push(" ORDER BY id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_rolls", e))?;

        rows.iter().map(roll_from_row).collect()
    }

    #[instrument(skip(self), fields(start = %window.start(), end = %window.end()), err)]
    async fn stats_snapshot(&self, window: &StatsWindow) -> Result<Vec<Roll>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ROLL_COLUMNS}
            FROM rolls
            WHERE added_date >= $1
                AND added_date <= $2
                AND (removed_date IS NULL OR removed_date <= $2)
            ORDER BY id
            "#
        ))
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("stats_snapshot", e))?;

        tracing::debug!(rolls = rows.len(), "loaded stats snapshot");
        rows.iter().map(roll_from_row).collect()
    }
}

fn push_between<'a, T>(qb: &mut QueryBuilder<'a, Postgres>, column: &str, range: &Range<T>)
where
    T: PartialOrd + Copy + Send + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + 'a,
{
    qb.push(" AND ")
        .push(column)
        .push(" BETWEEN ")
        .push_bind(range.min())
        .push(" AND ")
        .push_bind(range.max());
}

// SQLx row types

#[derive(Debug)]
struct RollRow {
    id: i64,
    length: f64,
    weight: f64,
    added_date: DateTime<Utc>,
    removed_date: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for RollRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RollRow {
            id: row.try_get("id")?,
            length: row.try_get("length")?,
            weight: row.try_get("weight")?,
            added_date: row.try_get("added_date")?,
            removed_date: row.try_get("removed_date")?,
        })
    }
}

impl From<RollRow> for Roll {
    fn from(row: RollRow) -> Self {
        Roll {
            id: RollId::new(row.id),
            length: row.length,
            weight: row.weight,
            added_date: row.added_date,
            removed_date: row.removed_date,
        }
    }
}

fn roll_from_row(row: &PgRow) -> Result<Roll, StoreError> {
    use sqlx::FromRow;

    RollRow::from_row(row)
        .map(Roll::from)
        .map_err(|e| StoreError::Storage(format!("failed to decode roll row: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23514") => StoreError::Domain(DomainError::validation(msg)),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Storage(format!("connection pool closed in {operation}")),
        other => StoreError::Storage(format!("{operation}: {other}")),
    }
}
