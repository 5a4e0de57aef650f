//! The record store: process-local ownership of every record.
//!
//! A [`Store`] is an explicit handle — constructible, resettable, droppable —
//! so isolated stores can coexist (one per test case) without any hidden
//! process-global state. Records live in a slab keyed by [`RecordRef`];
//! per-entity slices hold ordered handle sequences, and relation side-tables
//! hang off the same guarded state so that [`Store::clear`] drops everything
//! in one critical section.
//!
//! Removal detaches a record from its entity slice but leaves the slab entry
//! alive, so handles held elsewhere (relation lists, `Value::Ref` fields)
//! keep resolving. Slab entries are reclaimed only by `clear`.

use std::collections::{HashMap, HashSet};

use mimic_error::{MimicError, Result};
use mimic_types::{EntityType, Record, RecordId, RecordRef, Value};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::cursor::Cursor;
use crate::query::Query;
use crate::relation::RelationTable;

/// The engine's shared state handle.
///
/// One `RwLock` guards the whole store, so a query's read-filter pass and a
/// mutation's read-filter-mutate sequence each run against a consistent view.
#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
pub(crate) struct StoreInner {
    records: HashMap<RecordRef, Record>,
    slices: HashMap<EntityType, Vec<RecordRef>>,
    relations: RelationTable,
    relation_fields: HashMap<EntityType, HashSet<String>>,
    next_slot: u64,
}

impl StoreInner {
    /// The entity's slice, empty if no record was ever appended.
    pub(crate) fn slice(&self, entity: &EntityType) -> &[RecordRef] {
        self.slices.get(entity).map_or(&[], Vec::as_slice)
    }

    fn get_or_create_slice(&mut self, entity: &EntityType) -> &mut Vec<RecordRef> {
        self.slices.entry(entity.clone()).or_default()
    }

    pub(crate) fn record(&self, handle: RecordRef) -> Option<&Record> {
        self.records.get(&handle)
    }

    pub(crate) fn record_mut(&mut self, handle: RecordRef) -> Option<&mut Record> {
        self.records.get_mut(&handle)
    }

    pub(crate) fn relations(&self) -> &RelationTable {
        &self.relations
    }

    pub(crate) fn relation_fields(&self, entity: &EntityType) -> Option<&HashSet<String>> {
        self.relation_fields.get(entity)
    }

    fn append(&mut self, entity: &EntityType, record: Record) -> RecordRef {
        let handle = RecordRef::from_slot(self.next_slot);
        self.next_slot += 1;
        self.records.insert(handle, record);
        self.get_or_create_slice(entity).push(handle);
        handle
    }

    fn remove(&mut self, entity: &EntityType, handle: RecordRef) -> Result<()> {
        let slice = self.get_or_create_slice(entity);
        let position = slice.iter().position(|candidate| *candidate == handle);
        match position {
            Some(index) => {
                slice.remove(index);
                Ok(())
            }
            None => Err(MimicError::NotFound {
                entity: entity.to_string(),
            }),
        }
    }
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write()
    }

    /// Start a bare query over one entity's slice.
    #[must_use]
    pub fn query(&self, entity: impl Into<EntityType>) -> Query<'_> {
        Query::new(self, entity.into())
    }

    /// Start a cursor — the read/write operation surface — over one entity.
    #[must_use]
    pub fn cursor(&self, entity: impl Into<EntityType>) -> Cursor<'_> {
        Cursor::new(self.query(entity))
    }

    /// Append a record to the entity's slice, minting a fresh handle.
    ///
    /// Handles are never reused, so a record appears at most once per slice
    /// by construction.
    pub fn append(&self, entity: &EntityType, record: Record) -> RecordRef {
        let mut inner = self.write();
        let handle = inner.append(entity, record);
        debug!(entity = %entity, record = %handle, "record appended");
        handle
    }

    /// Detach a record from the entity's slice.
    ///
    /// Fails with `NotFound` if the handle is not currently a member. The
    /// slab entry survives so handles held elsewhere keep resolving.
    pub fn remove(&self, entity: &EntityType, handle: RecordRef) -> Result<()> {
        let mut inner = self.write();
        inner.remove(entity, handle)?;
        debug!(entity = %entity, record = %handle, "record removed");
        Ok(())
    }

    /// Number of records currently in the entity's slice.
    #[must_use]
    pub fn len(&self, entity: &EntityType) -> usize {
        self.read().slice(entity).len()
    }

    #[must_use]
    pub fn is_empty(&self, entity: &EntityType) -> bool {
        self.len(entity) == 0
    }

    /// Drop all slices, all records, and all relation state atomically from
    /// the caller's point of view. This is the global reset used for test
    /// isolation.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.records.clear();
        inner.slices.clear();
        inner.relations.clear_all();
        inner.relation_fields.clear();
        inner.next_slot = 0;
        info!("store cleared");
    }

    /// Snapshot one record by handle.
    #[must_use]
    pub fn record(&self, handle: RecordRef) -> Option<Record> {
        self.read().record(handle).cloned()
    }

    /// Read one field of one record. The reserved field path `id` resolves
    /// to the surrogate identifier.
    #[must_use]
    pub fn value_of(&self, handle: RecordRef, field: &str) -> Option<Value> {
        self.read().record(handle).and_then(|r| r.value_of(field))
    }

    /// Mark an entity field name as relation-backed.
    ///
    /// Predicates on a registered field compile to a relation-membership
    /// test against the side-table instead of a record-field comparison.
    /// The registry replaces the schema guesswork of matching on well-known
    /// field-name strings: callers that define the schema say which fields
    /// are relations.
    pub fn register_relation(&self, entity: &EntityType, field: &str) {
        let mut inner = self.write();
        inner
            .relation_fields
            .entry(entity.clone())
            .or_default()
            .insert(field.to_owned());
        debug!(entity = %entity, field, "relation field registered");
    }

    /// Append members to an owner's relation list.
    pub fn relation_add(
        &self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
        members: &[RecordRef],
    ) {
        self.write().relations.add(entity, relation, owner, members);
    }

    /// Remove members from an owner's relation list by handle equality.
    pub fn relation_remove(
        &self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
        members: &[RecordRef],
    ) -> Result<()> {
        self.write()
            .relations
            .remove(entity, relation, owner, members)
    }

    /// Reset a relation-name's mapping for EVERY owner (inherited coarse
    /// scope, see [`RelationTable::clear`]).
    pub fn relation_clear(&self, entity: &EntityType, relation: &str) {
        self.write().relations.clear(entity, relation);
    }

    /// An owner's relation members, in insertion order; empty when absent.
    #[must_use]
    pub fn members_of(
        &self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
    ) -> Vec<RecordRef> {
        self.read().relations.members_of(entity, relation, owner)
    }
}
