//! In-memory implementations of the ports.
//!
//! Used by the unit and HTTP tests, and handy for running the server without
//! Postgres or a technology service. Transactions buffer their writes and
//! apply them on commit, so dropping one leaves the store untouched.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CapacityError, TechnicalMessage};
use crate::model::*;
use crate::page::CustomPage;
use crate::ports::{CapacityPersistencePort, CapacityTransaction, Result, TechnologiesGateway};

// ── InMemoryCapacityStore ─────────────────────────────────────

#[derive(Debug, Clone)]
struct StoredCapacity {
    name: String,
    description: String,
}

#[derive(Debug, Default)]
struct StoreState {
    capacities: BTreeMap<i64, StoredCapacity>,
    assignments: Vec<BootcampAssignment>,
}

impl StoreState {
    fn to_capacity(&self, id: i64) -> Option<Capacity> {
        self.capacities.get(&id).map(|stored| Capacity {
            id: Some(id),
            name: stored.name.clone(),
            description: stored.description.clone(),
            technologies: Vec::new(),
        })
    }

    /// Capacity ids linked to a bootcamp, ascending, without duplicates.
    fn capacity_ids_of(&self, bootcamp_id: i64) -> BTreeSet<i64> {
        self.assignments
            .iter()
            .filter(|a| a.bootcamp_id == bootcamp_id)
            .map(|a| a.capacity_id)
            .collect()
    }

    fn basic_per_bootcamp(&self, bootcamp_id: i64) -> Option<CapabilitiesBasicPerBootcamp> {
        let capabilities: Vec<CapacityBasicItem> = self
            .capacity_ids_of(bootcamp_id)
            .into_iter()
            .filter_map(|id| {
                self.capacities.get(&id).map(|c| CapacityBasicItem {
                    id,
                    name: c.name.clone(),
                })
            })
            .collect();
        (!capabilities.is_empty()).then_some(CapabilitiesBasicPerBootcamp {
            id: bootcamp_id,
            capabilities,
        })
    }
}

#[derive(Debug)]
enum PendingWrite {
    Upsert(i64, StoredCapacity),
    Assign(Vec<BootcampAssignment>),
    DeleteCapabilities(Vec<i64>),
    DeleteAssignations(i64),
}

pub struct InMemoryCapacityStore {
    state: Arc<RwLock<StoreState>>,
    next_id: Arc<AtomicI64>,
    calls: AtomicUsize,
}

impl InMemoryCapacityStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            next_id: Arc::new(AtomicI64::new(1)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of port calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every join-table row.
    pub async fn assignments(&self) -> Vec<BootcampAssignment> {
        self.state.read().await.assignments.clone()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn paginate<T>(items: Vec<T>, size: i64, page: i64) -> Vec<T> {
        let size = size.max(0) as usize;
        let offset = (page.max(0) as usize).saturating_mul(size);
        items.into_iter().skip(offset).take(size).collect()
    }
}

impl Default for InMemoryCapacityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapacityPersistencePort for InMemoryCapacityStore {
    async fn begin(&self) -> Result<Box<dyn CapacityTransaction>> {
        self.record_call();
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            next_id: Arc::clone(&self.next_id),
            pending: Vec::new(),
        }))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Capacity>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .capacities
            .iter()
            .find(|(_, c)| c.name == name)
            .and_then(|(id, _)| state.to_capacity(*id)))
    }

    async fn find_paginated_and_sort_by_name(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<Vec<Capacity>> {
        self.record_call();
        let state = self.state.read().await;
        let mut all: Vec<Capacity> = state
            .capacities
            .keys()
            .filter_map(|id| state.to_capacity(*id))
            .collect();
        all.sort_by(|a, b| {
            let by_name = a.name.cmp(&b.name);
            match order {
                SortOrder::Ascending => by_name,
                SortOrder::Descending => by_name.reverse(),
            }
            .then(a.id.cmp(&b.id))
        });
        Ok(Self::paginate(all, size, page))
    }

    async fn find_all_by_ids(&self, ids: &[i64]) -> Result<Vec<Capacity>> {
        self.record_call();
        let state = self.state.read().await;
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| state.to_capacity(id))
            .collect())
    }

    async fn count_capabilities(&self) -> Result<i64> {
        self.record_call();
        Ok(self.state.read().await.capacities.len() as i64)
    }

    async fn find_capabilities_by_bootcamps_ids(
        &self,
        bootcamp_ids: &[i64],
    ) -> Result<Vec<CapabilitiesBasicPerBootcamp>> {
        self.record_call();
        let state = self.state.read().await;
        let mut seen = BTreeSet::new();
        Ok(bootcamp_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| state.basic_per_bootcamp(*id))
            .collect())
    }

    async fn find_paginated_and_sort_by_bootcamp_number(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<Vec<CapabilitiesBasicPerBootcamp>> {
        self.record_call();
        let state = self.state.read().await;
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for assignment in &state.assignments {
            *counts.entry(assignment.bootcamp_id).or_default() += 1;
        }
        let mut bootcamps: Vec<(i64, usize)> = counts.into_iter().collect();
        bootcamps.sort_by(|(a_id, a_count), (b_id, b_count)| {
            let by_count = a_count.cmp(b_count);
            match order {
                SortOrder::Ascending => by_count,
                SortOrder::Descending => by_count.reverse(),
            }
            .then(a_id.cmp(b_id))
        });
        Ok(Self::paginate(bootcamps, size, page)
            .into_iter()
            .filter_map(|(id, _)| state.basic_per_bootcamp(id))
            .collect())
    }

    async fn count_capabilities_per_bootcamps(&self) -> Result<i64> {
        self.record_call();
        let state = self.state.read().await;
        let bootcamps: BTreeSet<i64> = state.assignments.iter().map(|a| a.bootcamp_id).collect();
        Ok(bootcamps.len() as i64)
    }

    async fn find_capabilities_by_bootcamp_id(&self, bootcamp_id: i64) -> Result<Vec<Capacity>> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .capacity_ids_of(bootcamp_id)
            .into_iter()
            .filter_map(|id| state.to_capacity(id))
            .collect())
    }

    async fn verify_other_assignations(
        &self,
        capacity_id: i64,
        exclude_bootcamp_id: i64,
    ) -> Result<bool> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .any(|a| a.capacity_id == capacity_id && a.bootcamp_id != exclude_bootcamp_id))
    }
}

struct InMemoryTransaction {
    state: Arc<RwLock<StoreState>>,
    next_id: Arc<AtomicI64>,
    pending: Vec<PendingWrite>,
}

#[async_trait]
impl CapacityTransaction for InMemoryTransaction {
    async fn upsert(&mut self, capacity: &Capacity) -> Result<Capacity> {
        let id = capacity
            .id
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));

        // Mirrors the unique constraint on the name column.
        let taken = {
            let state = self.state.read().await;
            state
                .capacities
                .iter()
                .any(|(other, c)| *other != id && c.name == capacity.name)
        } || self.pending.iter().any(|w| {
            matches!(w, PendingWrite::Upsert(other, c) if *other != id && c.name == capacity.name)
        });
        if taken {
            return Err(CapacityError::EntityAlreadyExists(
                TechnicalMessage::CapacityAlreadyExists,
            ));
        }

        self.pending.push(PendingWrite::Upsert(
            id,
            StoredCapacity {
                name: capacity.name.clone(),
                description: capacity.description.clone(),
            },
        ));
        Ok(Capacity {
            id: Some(id),
            ..capacity.clone()
        })
    }

    async fn assign_capabilities_to_bootcamp(
        &mut self,
        bootcamp_id: i64,
        ids: &[i64],
    ) -> Result<()> {
        self.pending.push(PendingWrite::Assign(
            ids.iter()
                .map(|capacity_id| BootcampAssignment {
                    capacity_id: *capacity_id,
                    bootcamp_id,
                })
                .collect(),
        ));
        Ok(())
    }

    async fn delete_all_capabilities(&mut self, ids: &[i64]) -> Result<()> {
        self.pending
            .push(PendingWrite::DeleteCapabilities(ids.to_vec()));
        Ok(())
    }

    async fn delete_all_assignations(&mut self, bootcamp_id: i64) -> Result<()> {
        self.pending
            .push(PendingWrite::DeleteAssignations(bootcamp_id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { state, pending, .. } = *self;
        let mut state = state.write().await;
        for write in pending {
            match write {
                PendingWrite::Upsert(id, capacity) => {
                    state.capacities.insert(id, capacity);
                }
                PendingWrite::Assign(rows) => state.assignments.extend(rows),
                PendingWrite::DeleteCapabilities(ids) => {
                    for id in &ids {
                        state.capacities.remove(id);
                    }
                    // Join rows follow their capacity (ON DELETE CASCADE).
                    state.assignments.retain(|a| !ids.contains(&a.capacity_id));
                }
                PendingWrite::DeleteAssignations(bootcamp_id) => {
                    state.assignments.retain(|a| a.bootcamp_id != bootcamp_id);
                }
            }
        }
        Ok(())
    }
}

// ── InMemoryTechnologiesGateway ───────────────────────────────

/// Stand-in for the technology service: a fixed technology catalog plus the
/// capacity → technologies assignments it has accepted.
pub struct InMemoryTechnologiesGateway {
    catalog: HashMap<i64, TechnologyItem>,
    assigned: RwLock<BTreeMap<i64, Vec<i64>>>,
    deleted: RwLock<Vec<i64>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryTechnologiesGateway {
    pub fn with_catalog(technologies: Vec<TechnologyItem>) -> Self {
        Self {
            catalog: technologies.into_iter().map(|t| (t.id, t)).collect(),
            assigned: RwLock::new(BTreeMap::new()),
            deleted: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// While set, every call fails as if the service answered 5xx.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn assigned_technologies(&self, capacity_id: i64) -> Vec<i64> {
        self.assigned
            .read()
            .await
            .get(&capacity_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Capacity ids whose technologies were deleted, in call order.
    pub async fn deleted_capabilities(&self) -> Vec<i64> {
        self.deleted.read().await.clone()
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CapacityError::technical(
                TechnicalMessage::ErrorTechnologyAdapter,
            ));
        }
        Ok(())
    }

    fn resolve(&self, capacity_id: i64, ids: &[i64]) -> CapacityTechnologies {
        CapacityTechnologies {
            id: capacity_id,
            technologies: ids
                .iter()
                .filter_map(|id| self.catalog.get(id).cloned())
                .collect(),
        }
    }
}

#[async_trait]
impl TechnologiesGateway for InMemoryTechnologiesGateway {
    async fn assign_technologies_to_capacity(
        &self,
        capacity_id: i64,
        technology_ids: &[i64],
    ) -> Result<()> {
        self.enter()?;
        if technology_ids.iter().any(|id| !self.catalog.contains_key(id)) {
            return Err(CapacityError::EntityNotFound(
                TechnicalMessage::TechnologiesNotFound,
            ));
        }
        self.assigned
            .write()
            .await
            .insert(capacity_id, technology_ids.to_vec());
        Ok(())
    }

    async fn get_technologies_by_capabilities_ids(
        &self,
        capability_ids: &[i64],
    ) -> Result<Vec<CapacityTechnologies>> {
        self.enter()?;
        let assigned = self.assigned.read().await;
        Ok(capability_ids
            .iter()
            .filter_map(|id| assigned.get(id).map(|techs| self.resolve(*id, techs)))
            .collect())
    }

    async fn get_sort_technologies_by_capabilities(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<CustomPage<CapacityTechnologies>> {
        self.enter()?;
        let assigned = self.assigned.read().await;
        let mut all: Vec<CapacityTechnologies> = assigned
            .iter()
            .map(|(id, techs)| self.resolve(*id, techs))
            .collect();
        all.sort_by(|a, b| {
            let by_count = a.technologies.len().cmp(&b.technologies.len());
            match order {
                SortOrder::Ascending => by_count,
                SortOrder::Descending => by_count.reverse(),
            }
            .then(a.id.cmp(&b.id))
        });
        let total = all.len() as i64;
        let data = InMemoryCapacityStore::paginate(all, size, page);
        Ok(CustomPage::build(data, page, size, total))
    }

    async fn delete_technologies_by_capabilities_ids(&self, capability_ids: &[i64]) -> Result<()> {
        self.enter()?;
        let mut assigned = self.assigned.write().await;
        for id in capability_ids {
            assigned.remove(id);
        }
        self.deleted.write().await.extend_from_slice(capability_ids);
        Ok(())
    }
}
