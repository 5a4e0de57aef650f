//! The read/write operation surface offered to callers.
//!
//! A [`Cursor`] wraps one [`Query`] and exposes create / get / get_or_create
//! / delete / update / count / exists / iterate, delegating execution to the
//! query. Refinements (`filter`, `exclude`, `order_by`, `set_limits`) narrow
//! the one underlying query in place — there is no branching into
//! independent copies.

use mimic_error::Result;
use mimic_types::{FieldMap, Record, RecordRef, Value};

use crate::predicate::ConditionGroup;
use crate::query::Query;

/// Read/write façade over one query.
#[derive(Debug)]
pub struct Cursor<'s> {
    query: Query<'s>,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(query: Query<'s>) -> Self {
        Self { query }
    }

    /// Keep records matching the descriptor.
    #[must_use]
    pub fn filter(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.query.add_filter(path, value.into(), false);
        self
    }

    /// Drop records matching the descriptor.
    #[must_use]
    pub fn exclude(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.query.add_filter(path, value.into(), true);
        self
    }

    /// Apply several equality descriptors from one field map.
    #[must_use]
    pub fn filter_fields<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (path, value) in fields {
            self.query.add_filter(&path.into(), value, false);
        }
        self
    }

    /// Flatten a condition group into the query. OR groups are rejected.
    pub fn with_group(mut self, group: &ConditionGroup) -> Result<Self> {
        self.query.add_group(group)?;
        Ok(self)
    }

    /// Order results by the given fields; a leading `-` means descending.
    #[must_use]
    pub fn order_by(mut self, fields: &[&str]) -> Self {
        self.query.add_ordering(fields);
        self
    }

    /// Narrow the pagination window (cumulative, see
    /// [`Query::set_limits`]).
    #[must_use]
    pub fn set_limits(mut self, low: Option<usize>, high: Option<usize>) -> Self {
        self.query.set_limits(low, high);
        self
    }

    /// Short-circuit to an empty result set.
    #[must_use]
    pub fn none(mut self) -> Self {
        self.query.set_empty();
        self
    }

    /// Build a record from the field assignments and append it, assigning
    /// the next identifier unless the fields already carry one.
    pub fn create<I, K>(&mut self, fields: I) -> RecordRef
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.query.create(Record::from_fields(fields))
    }

    /// Exactly one matching record.
    pub fn get(&self) -> Result<RecordRef> {
        self.query.single()
    }

    /// Fetch the record matching the field assignments, creating it on a
    /// zero-result miss. Returns the record plus whether it was created.
    ///
    /// The equality filters stay accumulated on this cursor's query (the
    /// query is shared state, not a branched copy), which is what makes the
    /// second identical call find the first call's record. A
    /// multiple-results failure propagates unchanged.
    pub fn get_or_create<I, K>(&mut self, fields: I) -> Result<(RecordRef, bool)>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields: Vec<(String, Value)> = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        for (path, value) in &fields {
            self.query.add_filter(path, value.clone(), false);
        }
        match self.query.single() {
            Ok(found) => Ok((found, false)),
            Err(err) if err.is_not_found() => Ok((self.create(fields), true)),
            Err(err) => Err(err),
        }
    }

    /// Remove every matched record from the store. Returns the removed
    /// count.
    pub fn delete(&mut self) -> Result<usize> {
        self.query.delete_matched()
    }

    /// Assign fields on every matched record in place. Returns the affected
    /// count; applying the same update twice yields the same state and the
    /// same count.
    pub fn update<I, K>(&mut self, fields: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields: FieldMap = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        self.query.update_matched(&fields)
    }

    pub fn exists(&self) -> Result<bool> {
        self.query.has_results()
    }

    pub fn count(&self) -> Result<usize> {
        self.query.count()
    }

    /// Execute and iterate the matched handles. The iterator is finite and
    /// owns its snapshot; restarting means calling `iterate` again.
    pub fn iterate(&self) -> Result<std::vec::IntoIter<RecordRef>> {
        Ok(self.query.execute()?.into_iter())
    }
}
