//! Query accumulation and the filter → order → paginate pipeline.
//!
//! A [`Query`] binds one entity-type's slice of the store, accumulates
//! predicates, an optional multi-key ordering, and pagination marks, and
//! executes on demand. Execution takes a shallow snapshot of the slice (new
//! sequence, same handles), so store mutation during result consumption
//! cannot corrupt an in-flight result set, while field mutation stays
//! visible through the shared handles.
//!
//! `Query` deliberately does not implement `Clone`: branching a query never
//! yields an independent copy, so refinements always narrow the one
//! accumulated state.

use std::cmp::Ordering;
use std::collections::HashSet;

use mimic_error::{MimicError, Result};
use mimic_types::{EntityType, FieldMap, Record, RecordId, RecordRef, Value};
use tracing::debug;

use crate::predicate::{ConditionGroup, ConditionNode, Connector, Predicate};
use crate::store::{Store, StoreInner};

/// One ordering key: a field name plus direction.
#[derive(Debug, Clone)]
struct OrderKey {
    field: String,
    descending: bool,
}

impl OrderKey {
    fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_owned(),
                descending: true,
            },
            None => Self {
                field: spec.to_owned(),
                descending: false,
            },
        }
    }
}

/// The execution unit bound to one entity-type.
#[derive(Debug)]
pub struct Query<'s> {
    store: &'s Store,
    entity: EntityType,
    /// Next identifier to assign. Seeded from the slice length at
    /// construction, not from a durable high-water mark: after deletions a
    /// fresh query can hand out an identifier that collides with a live
    /// record. Callers who delete and then create through a new query own
    /// that risk.
    counter: i64,
    low_mark: usize,
    high_mark: Option<usize>,
    predicates: Vec<Predicate>,
    ordering: Option<Vec<OrderKey>>,
    empty: bool,
}

impl<'s> Query<'s> {
    pub(crate) fn new(store: &'s Store, entity: EntityType) -> Self {
        let seed = store.read().slice(&entity).len() as i64 + 1;
        Self {
            store,
            entity,
            counter: seed,
            low_mark: 0,
            high_mark: None,
            predicates: Vec::new(),
            ordering: None,
            empty: false,
        }
    }

    /// The entity this query is bound to.
    #[must_use]
    pub const fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Append one filter descriptor to the predicate list. Entries compose
    /// as an implicit AND.
    pub fn add_filter(&mut self, path: &str, value: Value, negated: bool) {
        let predicate = {
            let inner = self.store.read();
            let empty = HashSet::new();
            let relation_fields = relation_registry(&inner, &self.entity, &empty);
            Predicate::compile(path, value, negated, relation_fields)
        };
        self.predicates.push(predicate);
    }

    /// Append an already-built predicate. This is the explicit route for
    /// tests and callers that want a relation-membership or negated test
    /// without going through path compilation.
    pub fn add_predicate(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Flatten a condition group into the predicate list.
    ///
    /// A group's negation applies to each of its own leaves; nested groups
    /// carry their own negation. OR connectors are rejected.
    pub fn add_group(&mut self, group: &ConditionGroup) -> Result<()> {
        if group.connector == Connector::Or {
            return Err(MimicError::UnsupportedConnector {
                connector: group.connector.to_string(),
            });
        }
        for child in &group.children {
            match child {
                ConditionNode::Group(nested) => self.add_group(nested)?,
                ConditionNode::Leaf { path, value } => {
                    self.add_filter(path, value.clone(), group.negated);
                }
            }
        }
        Ok(())
    }

    /// Replace the ordering with a multi-key comparator. Each field name may
    /// carry a leading `-` for descending; a descending field inverts only
    /// its own comparison, later fields stay tie-breakers.
    pub fn add_ordering(&mut self, fields: &[&str]) {
        self.ordering = Some(fields.iter().map(|spec| OrderKey::parse(spec)).collect());
    }

    pub fn clear_ordering(&mut self) {
        self.ordering = None;
    }

    /// Narrow the pagination window. Bounds accumulate: a second call
    /// slices within the window left by the first, it never resets it.
    pub fn set_limits(&mut self, low: Option<usize>, high: Option<usize>) {
        if let Some(high) = high {
            self.high_mark = Some(match self.high_mark {
                Some(existing) => existing.min(self.low_mark + high),
                None => self.low_mark + high,
            });
        }
        if let Some(low) = low {
            self.low_mark = match self.high_mark {
                Some(high_mark) => high_mark.min(self.low_mark + low),
                None => self.low_mark + low,
            };
        }
    }

    /// Short-circuit execution to no results.
    pub fn set_empty(&mut self) {
        self.empty = true;
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.empty
    }

    /// Run the filter → order → paginate pipeline.
    ///
    /// Returns handles, never record copies. The whole pass runs under one
    /// read acquisition of the store lock, so concurrent mutation cannot
    /// tear the view.
    pub fn execute(&self) -> Result<Vec<RecordRef>> {
        if self.empty {
            return Ok(Vec::new());
        }

        let inner = self.store.read();
        // Shallow snapshot: new sequence, same handles.
        let mut data: Vec<RecordRef> = inner.slice(&self.entity).to_vec();

        for predicate in &self.predicates {
            let mut kept = Vec::with_capacity(data.len());
            for handle in data {
                if predicate.matches(&self.entity, handle, &inner)? {
                    kept.push(handle);
                }
            }
            data = kept;
        }

        if let Some(keys) = &self.ordering {
            data = sort_by_keys(&inner, &self.entity, data, keys)?;
        }
        drop(inner);

        let data = apply_bounds(data, self.low_mark, self.high_mark);
        debug!(entity = %self.entity, matched = data.len(), "query executed");
        Ok(data)
    }

    /// Exactly one matching record, or a structured failure.
    pub fn single(&self) -> Result<RecordRef> {
        let matched = self.execute()?;
        match matched.as_slice() {
            [] => Err(MimicError::NotFound {
                entity: self.entity.to_string(),
            }),
            [only] => Ok(*only),
            _ => Err(MimicError::MultipleResults {
                entity: self.entity.to_string(),
                count: matched.len(),
            }),
        }
    }

    /// Append a record to the bound slice, assigning the next identifier if
    /// the record arrives without one.
    pub fn create(&mut self, mut record: Record) -> RecordRef {
        if record.id().is_none() {
            record.set_id(RecordId::new(self.counter));
            self.counter += 1;
        }
        self.store.append(&self.entity, record)
    }

    /// Remove every currently matched record from the store slice.
    ///
    /// Fails with `NotFound` if a matched record was already detached by a
    /// concurrent caller.
    pub fn delete_matched(&self) -> Result<usize> {
        let matched = self.execute()?;
        for handle in &matched {
            self.store.remove(&self.entity, *handle)?;
        }
        debug!(entity = %self.entity, deleted = matched.len(), "matched records deleted");
        Ok(matched.len())
    }

    /// Apply field assignments to every currently matched record in place.
    /// Returns the affected count.
    pub fn update_matched(&self, fields: &FieldMap) -> Result<usize> {
        let matched = self.execute()?;
        let mut inner = self.store.write();
        for handle in &matched {
            if let Some(record) = inner.record_mut(*handle) {
                for (name, value) in fields {
                    record.assign(name, value.clone());
                }
            }
        }
        debug!(entity = %self.entity, updated = matched.len(), "matched records updated");
        Ok(matched.len())
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.execute()?.len())
    }

    pub fn has_results(&self) -> Result<bool> {
        Ok(!self.execute()?.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Pipeline helpers
// ---------------------------------------------------------------------------

fn relation_registry<'a>(
    inner: &'a StoreInner,
    entity: &EntityType,
    fallback: &'a HashSet<String>,
) -> &'a HashSet<String> {
    // The registry lives on the store; queries only borrow it while
    // compiling.
    inner.relation_fields(entity).unwrap_or(fallback)
}

/// Stable multi-key sort over the filtered handles.
///
/// Keys are materialized per record up front so the comparator itself is
/// infallible; a missing ordering field surfaces as `NoSuchField` before any
/// reordering happens.
fn sort_by_keys(
    inner: &StoreInner,
    entity: &EntityType,
    data: Vec<RecordRef>,
    keys: &[OrderKey],
) -> Result<Vec<RecordRef>> {
    if keys.is_empty() {
        return Ok(data);
    }

    let mut decorated = Vec::with_capacity(data.len());
    for handle in data {
        let record = inner.record(handle).ok_or_else(|| MimicError::NotFound {
            entity: entity.to_string(),
        })?;
        let mut key_values = Vec::with_capacity(keys.len());
        for key in keys {
            let value =
                record
                    .value_of(&key.field)
                    .ok_or_else(|| MimicError::NoSuchField {
                        entity: entity.to_string(),
                        field: key.field.clone(),
                    })?;
            key_values.push(value);
        }
        decorated.push((key_values, handle));
    }

    decorated.sort_by(|(a, _), (b, _)| compare_keys(a, b, keys));
    Ok(decorated.into_iter().map(|(_, handle)| handle).collect())
}

fn compare_keys(a: &[Value], b: &[Value], keys: &[OrderKey]) -> Ordering {
    for ((x, y), key) in a.iter().zip(b).zip(keys) {
        let mut ord = x.total_cmp(y);
        if key.descending {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Apply the pagination window to an ordered result sequence.
fn apply_bounds(data: Vec<RecordRef>, low: usize, high: Option<usize>) -> Vec<RecordRef> {
    match high {
        None if low == 0 => data,
        None => data.into_iter().skip(low).collect(),
        Some(high) => {
            let lo = low.min(data.len());
            let hi = high.min(data.len()).max(lo);
            data[lo..hi].to_vec()
        }
    }
}
