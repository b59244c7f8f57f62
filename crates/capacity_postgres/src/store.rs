//! Postgres implementation of the capacity persistence port.
//!
//! All SQL is runtime-checked (sqlx::query, not sqlx::query!).

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use capacity_core::error::{CapacityError, TechnicalMessage};
use capacity_core::model::*;
use capacity_core::ports::{CapacityPersistencePort, CapacityTransaction, Result};

use crate::rows::{group_by_bootcamp, CapacityBootcampRow, CapacityRow};

const CAPACITY_COLUMNS: &str = "id, name, description";

const SELECT_BY_NAME_ASC: &str = r#"
    SELECT id, name, description
    FROM capabilities
    ORDER BY name ASC, id ASC
    LIMIT $1 OFFSET $2
"#;

const SELECT_BY_NAME_DESC: &str = r#"
    SELECT id, name, description
    FROM capabilities
    ORDER BY name DESC, id ASC
    LIMIT $1 OFFSET $2
"#;

const BOOTCAMPS_BY_COUNT_ASC: &str = r#"
    SELECT id_bootcamp
    FROM capacity_bootcamp
    GROUP BY id_bootcamp
    ORDER BY COUNT(id_capacity) ASC, id_bootcamp ASC
    LIMIT $1 OFFSET $2
"#;

const BOOTCAMPS_BY_COUNT_DESC: &str = r#"
    SELECT id_bootcamp
    FROM capacity_bootcamp
    GROUP BY id_bootcamp
    ORDER BY COUNT(id_capacity) DESC, id_bootcamp ASC
    LIMIT $1 OFFSET $2
"#;

/// Map sqlx failures onto the domain taxonomy. A unique violation can only
/// come from `capabilities.name`, so it surfaces as already-exists.
fn db_error(e: sqlx::Error) -> CapacityError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return CapacityError::EntityAlreadyExists(TechnicalMessage::CapacityAlreadyExists);
        }
    }
    CapacityError::technical_from(TechnicalMessage::InternalError, anyhow!(e))
}

fn offset(page: i64, size: i64) -> i64 {
    page.max(0).saturating_mul(size.max(0))
}

// ── PgCapacityStore ───────────────────────────────────────────

/// Postgres-backed capacity store. Newtype over a shared pool.
#[derive(Clone)]
pub struct PgCapacityStore {
    pool: PgPool,
}

impl PgCapacityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    async fn load_bootcamps(&self, bootcamp_ids: &[i64]) -> Result<Vec<CapabilitiesBasicPerBootcamp>> {
        let rows = sqlx::query_as::<_, CapacityBootcampRow>(
            r#"
            SELECT DISTINCT cb.id_bootcamp AS bootcamp_id,
                   c.id AS capacity_id,
                   c.name AS capacity_name
            FROM capacity_bootcamp cb
            JOIN capabilities c ON c.id = cb.id_capacity
            WHERE cb.id_bootcamp = ANY($1)
            ORDER BY cb.id_bootcamp, c.id
            "#,
        )
        .bind(bootcamp_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(group_by_bootcamp(rows, bootcamp_ids))
    }
}

#[async_trait]
impl CapacityPersistencePort for PgCapacityStore {
    async fn begin(&self) -> Result<Box<dyn CapacityTransaction>> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgCapacityTransaction { tx }))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Capacity>> {
        let row = sqlx::query_as::<_, CapacityRow>(&format!(
            "SELECT {CAPACITY_COLUMNS} FROM capabilities WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Capacity::from))
    }

    async fn find_paginated_and_sort_by_name(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<Vec<Capacity>> {
        let query = match order {
            SortOrder::Ascending => SELECT_BY_NAME_ASC,
            SortOrder::Descending => SELECT_BY_NAME_DESC,
        };
        tracing::debug!(order = order.as_str(), size, page, "loading capacity page by name");
        let rows = sqlx::query_as::<_, CapacityRow>(query)
            .bind(size)
            .bind(offset(page, size))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Capacity::from).collect())
    }

    async fn find_all_by_ids(&self, ids: &[i64]) -> Result<Vec<Capacity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CapacityRow>(&format!(
            "SELECT {CAPACITY_COLUMNS} FROM capabilities WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Capacity::from).collect())
    }

    async fn count_capabilities(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM capabilities")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_capabilities_by_bootcamps_ids(
        &self,
        bootcamp_ids: &[i64],
    ) -> Result<Vec<CapabilitiesBasicPerBootcamp>> {
        if bootcamp_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load_bootcamps(bootcamp_ids).await
    }

    async fn find_paginated_and_sort_by_bootcamp_number(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<Vec<CapabilitiesBasicPerBootcamp>> {
        let query = match order {
            SortOrder::Ascending => BOOTCAMPS_BY_COUNT_ASC,
            SortOrder::Descending => BOOTCAMPS_BY_COUNT_DESC,
        };
        let bootcamp_ids: Vec<i64> = sqlx::query_scalar::<_, i64>(query)
            .bind(size)
            .bind(offset(page, size))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        tracing::debug!(
            order = order.as_str(),
            size,
            page,
            found = bootcamp_ids.len(),
            "loaded bootcamp page by capacity count"
        );
        if bootcamp_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load_bootcamps(&bootcamp_ids).await
    }

    async fn count_capabilities_per_bootcamps(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT id_bootcamp) FROM capacity_bootcamp")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_capabilities_by_bootcamp_id(&self, bootcamp_id: i64) -> Result<Vec<Capacity>> {
        let rows = sqlx::query_as::<_, CapacityRow>(
            r#"
            SELECT DISTINCT c.id, c.name, c.description
            FROM capabilities c
            JOIN capacity_bootcamp cb ON cb.id_capacity = c.id
            WHERE cb.id_bootcamp = $1
            ORDER BY c.id
            "#,
        )
        .bind(bootcamp_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Capacity::from).collect())
    }

    async fn verify_other_assignations(
        &self,
        capacity_id: i64,
        exclude_bootcamp_id: i64,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM capacity_bootcamp
                WHERE id_capacity = $1 AND id_bootcamp <> $2
            )
            "#,
        )
        .bind(capacity_id)
        .bind(exclude_bootcamp_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }
}

// ── PgCapacityTransaction ─────────────────────────────────────

/// Rolls back on drop unless committed.
pub struct PgCapacityTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CapacityTransaction for PgCapacityTransaction {
    async fn upsert(&mut self, capacity: &Capacity) -> Result<Capacity> {
        let row = match capacity.id {
            None => {
                sqlx::query_as::<_, CapacityRow>(&format!(
                    "INSERT INTO capabilities (name, description) VALUES ($1, $2) \
                     RETURNING {CAPACITY_COLUMNS}"
                ))
                .bind(&capacity.name)
                .bind(&capacity.description)
                .fetch_one(&mut *self.tx)
                .await
            }
            Some(id) => {
                sqlx::query_as::<_, CapacityRow>(&format!(
                    "INSERT INTO capabilities (id, name, description) VALUES ($1, $2, $3) \
                     ON CONFLICT (id) DO UPDATE \
                     SET name = EXCLUDED.name, description = EXCLUDED.description \
                     RETURNING {CAPACITY_COLUMNS}"
                ))
                .bind(id)
                .bind(&capacity.name)
                .bind(&capacity.description)
                .fetch_one(&mut *self.tx)
                .await
            }
        }
        .map_err(db_error)?;

        Ok(Capacity {
            technologies: capacity.technologies.clone(),
            ..Capacity::from(row)
        })
    }

    async fn assign_capabilities_to_bootcamp(
        &mut self,
        bootcamp_id: i64,
        ids: &[i64],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO capacity_bootcamp (id_capacity, id_bootcamp)
            SELECT unnest($1::bigint[]), $2
            "#,
        )
        .bind(ids)
        .bind(bootcamp_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn delete_all_capabilities(&mut self, ids: &[i64]) -> Result<()> {
        sqlx::query("DELETE FROM capabilities WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete_all_assignations(&mut self, bootcamp_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM capacity_bootcamp WHERE id_bootcamp = $1")
            .bind(bootcamp_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(db_error)
    }
}
