//! Port traits for storage and the remote technology service.
//! Implemented by capacity_postgres and capacity_tech_client; the use case
//! depends only on these traits.

use async_trait::async_trait;

use crate::error::CapacityError;
use crate::model::*;
use crate::page::CustomPage;

pub type Result<T> = std::result::Result<T, CapacityError>;

/// Relational store for capacities and the bootcamp join table.
#[async_trait]
pub trait CapacityPersistencePort: Send + Sync {
    /// Open a transaction for a multi-step write. Dropping the handle
    /// without calling [`CapacityTransaction::commit`] discards its writes.
    async fn begin(&self) -> Result<Box<dyn CapacityTransaction>>;

    // ── Capacities ─────────────────────────────────────────────

    /// Insert (id absent) or update (id present). Returns the stored record with its id.
    async fn upsert(&self, capacity: &Capacity) -> Result<Capacity> {
        let mut tx = self.begin().await?;
        let saved = tx.upsert(capacity).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Capacity>>;

    /// One page of capacities ordered by name.
    async fn find_paginated_and_sort_by_name(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<Vec<Capacity>>;

    /// Capacities whose id is in `ids`. Unknown ids are skipped.
    async fn find_all_by_ids(&self, ids: &[i64]) -> Result<Vec<Capacity>>;

    async fn count_capabilities(&self) -> Result<i64>;

    // ── Bootcamp assignments ───────────────────────────────────

    async fn assign_capabilities_to_bootcamp(&self, bootcamp_id: i64, ids: &[i64]) -> Result<()> {
        let mut tx = self.begin().await?;
        tx.assign_capabilities_to_bootcamp(bootcamp_id, ids).await?;
        tx.commit().await
    }

    /// Basic capacity lists grouped by bootcamp, one entry per bootcamp with data,
    /// in the order the bootcamp ids were requested.
    async fn find_capabilities_by_bootcamps_ids(
        &self,
        bootcamp_ids: &[i64],
    ) -> Result<Vec<CapabilitiesBasicPerBootcamp>>;

    /// One page of bootcamps ordered by how many capacities they have.
    async fn find_paginated_and_sort_by_bootcamp_number(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<Vec<CapabilitiesBasicPerBootcamp>>;

    /// Number of distinct bootcamps with at least one capacity.
    async fn count_capabilities_per_bootcamps(&self) -> Result<i64>;

    async fn find_capabilities_by_bootcamp_id(&self, bootcamp_id: i64) -> Result<Vec<Capacity>>;

    async fn delete_all_capabilities(&self, ids: &[i64]) -> Result<()> {
        let mut tx = self.begin().await?;
        tx.delete_all_capabilities(ids).await?;
        tx.commit().await
    }

    async fn delete_all_assignations(&self, bootcamp_id: i64) -> Result<()> {
        let mut tx = self.begin().await?;
        tx.delete_all_assignations(bootcamp_id).await?;
        tx.commit().await
    }

    /// Whether `capacity_id` is linked to any bootcamp other than `exclude_bootcamp_id`.
    async fn verify_other_assignations(
        &self,
        capacity_id: i64,
        exclude_bootcamp_id: i64,
    ) -> Result<bool>;
}

/// Write side of one local transaction.
#[async_trait]
pub trait CapacityTransaction: Send {
    async fn upsert(&mut self, capacity: &Capacity) -> Result<Capacity>;

    /// Batch insert of join rows.
    async fn assign_capabilities_to_bootcamp(
        &mut self,
        bootcamp_id: i64,
        ids: &[i64],
    ) -> Result<()>;

    async fn delete_all_capabilities(&mut self, ids: &[i64]) -> Result<()>;

    async fn delete_all_assignations(&mut self, bootcamp_id: i64) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Remote technology management service.
#[async_trait]
pub trait TechnologiesGateway: Send + Sync {
    /// Fails with not-found if any technology id is unknown remotely.
    async fn assign_technologies_to_capacity(
        &self,
        capacity_id: i64,
        technology_ids: &[i64],
    ) -> Result<()>;

    async fn get_technologies_by_capabilities_ids(
        &self,
        capability_ids: &[i64],
    ) -> Result<Vec<CapacityTechnologies>>;

    /// Capacities paginated and ordered by their technology count.
    async fn get_sort_technologies_by_capabilities(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<CustomPage<CapacityTechnologies>>;

    async fn delete_technologies_by_capabilities_ids(&self, capability_ids: &[i64]) -> Result<()>;
}
