//! CapacityUseCase: the only place capacity business rules live.
//!
//! Takes its ports via `Arc<dyn PortTrait>` so the same logic runs against
//! Postgres + the HTTP technology client, or against the in-memory ports in tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CapacityError, TechnicalMessage};
use crate::model::*;
use crate::page::CustomPage;
use crate::ports::{CapacityPersistencePort, TechnologiesGateway};
use crate::validator;

pub type Result<T> = std::result::Result<T, CapacityError>;

// ── CapacityServicePort trait ─────────────────────────────────

/// Public operations of the capacity service.
#[async_trait]
pub trait CapacityServicePort: Send + Sync {
    /// Validate, reject duplicate names, persist, and register the technologies remotely.
    async fn register_capacity(&self, capacity: Capacity) -> Result<Capacity>;

    async fn list_capabilities(
        &self,
        order: SortOrder,
        item: SortItem,
        page: i64,
        size: i64,
    ) -> Result<CustomPage<CapacityList>>;

    /// All-or-nothing: every id must exist before any join row is written.
    async fn assign_capabilities_to_bootcamp(
        &self,
        bootcamp_id: i64,
        capability_ids: &[i64],
    ) -> Result<()>;

    async fn get_capabilities_by_bootcamps_ids(
        &self,
        bootcamp_ids: &[i64],
    ) -> Result<Vec<CapabilitiesPerBootcamp>>;

    async fn get_sort_capabilities_by_bootcamps(
        &self,
        order: SortOrder,
        page: i64,
        size: i64,
    ) -> Result<CustomPage<CapabilitiesPerBootcamp>>;

    /// Remove the bootcamp's assignments and every capacity no other bootcamp still uses.
    async fn delete_capabilities_by_bootcamp_id(&self, bootcamp_id: Option<i64>) -> Result<()>;
}

// ── CapacityUseCase ───────────────────────────────────────────

pub struct CapacityUseCase {
    persistence: Arc<dyn CapacityPersistencePort>,
    technologies: Arc<dyn TechnologiesGateway>,
}

impl CapacityUseCase {
    pub fn new(
        persistence: Arc<dyn CapacityPersistencePort>,
        technologies: Arc<dyn TechnologiesGateway>,
    ) -> Self {
        Self {
            persistence,
            technologies,
        }
    }

    async fn list_sorted_by_name(
        &self,
        order: SortOrder,
        page: i64,
        size: i64,
    ) -> Result<CustomPage<CapacityList>> {
        let capabilities = self
            .persistence
            .find_paginated_and_sort_by_name(order, size, page)
            .await?;

        let data = if capabilities.is_empty() {
            Vec::new()
        } else {
            let ids: Vec<i64> = capabilities.iter().filter_map(|c| c.id).collect();
            let technologies = self
                .technologies
                .get_technologies_by_capabilities_ids(&ids)
                .await?;
            let index = TechnologyIndex::new(technologies);
            capabilities
                .into_iter()
                .filter_map(|capacity| index.enrich_capacity(capacity))
                .collect()
        };

        let total = self.persistence.count_capabilities().await?;
        Ok(CustomPage::build(data, page, size, total))
    }

    async fn list_sorted_by_technologies(
        &self,
        order: SortOrder,
        page: i64,
        size: i64,
    ) -> Result<CustomPage<CapacityList>> {
        let remote_page = self
            .technologies
            .get_sort_technologies_by_capabilities(order, size, page)
            .await?;

        if remote_page.data.is_empty() {
            return Ok(CustomPage::with_metadata_of(Vec::new(), &remote_page));
        }

        let ids: Vec<i64> = remote_page.data.iter().map(|c| c.id).collect();
        let capabilities = self.persistence.find_all_by_ids(&ids).await?;

        let index = TechnologyIndex::new(remote_page.data.iter().cloned());
        let mut data: Vec<CapacityList> = capabilities
            .into_iter()
            .filter_map(|capacity| index.enrich_capacity(capacity))
            .collect();
        sort_by_technology_count(&mut data, order);

        Ok(CustomPage::with_metadata_of(data, &remote_page))
    }

    /// Enrich grouped bootcamp rows with one batched technology lookup.
    async fn enrich_bootcamps(
        &self,
        bootcamps: Vec<CapabilitiesBasicPerBootcamp>,
    ) -> Result<Vec<CapabilitiesPerBootcamp>> {
        if bootcamps.is_empty() {
            return Ok(Vec::new());
        }
        let ids = distinct_capacity_ids(&bootcamps);
        let technologies = self
            .technologies
            .get_technologies_by_capabilities_ids(&ids)
            .await?;
        let index = TechnologyIndex::new(technologies);
        Ok(bootcamps
            .into_iter()
            .map(|bootcamp| index.enrich_bootcamp(bootcamp))
            .collect())
    }
}

#[async_trait]
impl CapacityServicePort for CapacityUseCase {
    async fn register_capacity(&self, capacity: Capacity) -> Result<Capacity> {
        validator::validate_capacity(&capacity)?;

        if self
            .persistence
            .find_by_name(&capacity.name)
            .await?
            .is_some()
        {
            return Err(CapacityError::EntityAlreadyExists(
                TechnicalMessage::CapacityAlreadyExists,
            ));
        }

        let mut tx = self.persistence.begin().await?;
        let saved = tx.upsert(&capacity).await?;
        let capacity_id = saved
            .id
            .ok_or_else(|| CapacityError::technical(TechnicalMessage::ErrorCreatingCapacity))?;

        // The local insert only commits once the technology service has accepted
        // the assignment; a remote failure drops `tx` and rolls the row back.
        self.technologies
            .assign_technologies_to_capacity(capacity_id, &capacity.technologies)
            .await?;
        tx.commit().await?;

        tracing::info!(capacity_id, name = %saved.name, "capacity registered");
        Ok(saved)
    }

    async fn list_capabilities(
        &self,
        order: SortOrder,
        item: SortItem,
        page: i64,
        size: i64,
    ) -> Result<CustomPage<CapacityList>> {
        match item {
            SortItem::Name => self.list_sorted_by_name(order, page, size).await,
            SortItem::Technologies => self.list_sorted_by_technologies(order, page, size).await,
        }
    }

    async fn assign_capabilities_to_bootcamp(
        &self,
        bootcamp_id: i64,
        capability_ids: &[i64],
    ) -> Result<()> {
        if capability_ids.is_empty() {
            return Err(CapacityError::ParamRequiredMissing(
                TechnicalMessage::MissingRequiredParam,
            ));
        }

        let found = self.persistence.find_all_by_ids(capability_ids).await?;
        if found.len() != capability_ids.len() {
            return Err(CapacityError::EntityNotFound(
                TechnicalMessage::SomeCapabilitiesNotFound,
            ));
        }

        let mut tx = self.persistence.begin().await?;
        tx.assign_capabilities_to_bootcamp(bootcamp_id, capability_ids)
            .await?;
        tx.commit().await?;

        tracing::info!(
            bootcamp_id,
            count = capability_ids.len(),
            "capabilities assigned to bootcamp"
        );
        Ok(())
    }

    async fn get_capabilities_by_bootcamps_ids(
        &self,
        bootcamp_ids: &[i64],
    ) -> Result<Vec<CapabilitiesPerBootcamp>> {
        if bootcamp_ids.is_empty() {
            return Err(CapacityError::ParamRequiredMissing(
                TechnicalMessage::MissingRequiredParam,
            ));
        }
        let bootcamps = self
            .persistence
            .find_capabilities_by_bootcamps_ids(bootcamp_ids)
            .await?;
        self.enrich_bootcamps(bootcamps).await
    }

    async fn get_sort_capabilities_by_bootcamps(
        &self,
        order: SortOrder,
        page: i64,
        size: i64,
    ) -> Result<CustomPage<CapabilitiesPerBootcamp>> {
        let bootcamps = self
            .persistence
            .find_paginated_and_sort_by_bootcamp_number(order, size, page)
            .await?;
        let data = self.enrich_bootcamps(bootcamps).await?;
        let total = self.persistence.count_capabilities_per_bootcamps().await?;
        Ok(CustomPage::build(data, page, size, total))
    }

    async fn delete_capabilities_by_bootcamp_id(&self, bootcamp_id: Option<i64>) -> Result<()> {
        let bootcamp_id = bootcamp_id
            .ok_or(CapacityError::InvalidFormatParam(TechnicalMessage::InvalidParameters))?;

        let linked = self
            .persistence
            .find_capabilities_by_bootcamp_id(bootcamp_id)
            .await?;

        let mut exclusive = Vec::with_capacity(linked.len());
        for capacity_id in linked.iter().filter_map(|c| c.id) {
            if !self
                .persistence
                .verify_other_assignations(capacity_id, bootcamp_id)
                .await?
            {
                exclusive.push(capacity_id);
            }
        }

        if exclusive.is_empty() {
            tracing::debug!(bootcamp_id, "no exclusive capabilities to delete");
            return Ok(());
        }

        let mut tx = self.persistence.begin().await?;
        tx.delete_all_capabilities(&exclusive).await?;
        tx.delete_all_assignations(bootcamp_id).await?;
        self.technologies
            .delete_technologies_by_capabilities_ids(&exclusive)
            .await?;
        tx.commit().await?;

        tracing::info!(
            bootcamp_id,
            deleted = exclusive.len(),
            "bootcamp capabilities deleted"
        );
        Ok(())
    }
}

// ── Enrichment helpers ────────────────────────────────────────

/// Technology details keyed by capacity id. The first entry for an id wins.
struct TechnologyIndex {
    by_capacity: HashMap<i64, Vec<TechnologyItem>>,
}

impl TechnologyIndex {
    fn new(entries: impl IntoIterator<Item = CapacityTechnologies>) -> Self {
        let mut by_capacity = HashMap::new();
        for entry in entries {
            by_capacity.entry(entry.id).or_insert(entry.technologies);
        }
        Self { by_capacity }
    }

    /// Capacities without a matching entry get an empty list.
    fn technologies_for(&self, capacity_id: i64) -> Vec<TechnologyItem> {
        self.by_capacity
            .get(&capacity_id)
            .cloned()
            .unwrap_or_default()
    }

    fn enrich_capacity(&self, capacity: Capacity) -> Option<CapacityList> {
        let id = capacity.id?;
        Some(CapacitySummary {
            id,
            name: capacity.name,
            technologies: self.technologies_for(id),
        })
    }

    fn enrich_bootcamp(&self, bootcamp: CapabilitiesBasicPerBootcamp) -> CapabilitiesPerBootcamp {
        CapabilitiesPerBootcamp {
            id: bootcamp.id,
            capabilities: bootcamp
                .capabilities
                .into_iter()
                .map(|basic| CapacitySummary {
                    technologies: self.technologies_for(basic.id),
                    id: basic.id,
                    name: basic.name,
                })
                .collect(),
        }
    }
}

fn distinct_capacity_ids(bootcamps: &[CapabilitiesBasicPerBootcamp]) -> Vec<i64> {
    bootcamps
        .iter()
        .flat_map(|b| b.capabilities.iter().map(|c| c.id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Order by resolved technology count; equal counts fall back to ascending id.
fn sort_by_technology_count(data: &mut [CapacityList], order: SortOrder) {
    data.sort_by(|a, b| {
        let by_count = a.technologies.len().cmp(&b.technologies.len());
        let by_count = match order {
            SortOrder::Ascending => by_count,
            SortOrder::Descending => by_count.reverse(),
        };
        by_count.then(a.id.cmp(&b.id))
    });
}
