//! Value, record, and identifier types shared across the MimicDB workspace.

pub mod value;

pub use value::Value;

use std::collections::BTreeMap;
use std::fmt;

/// A key naming a record's kind/schema, used to select a store slice.
///
/// Entity types compare by name; two handles over the same name address the
/// same slice of the store.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The entity name as a plain string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Surrogate identifier assigned to a stored record.
///
/// Identifiers are handed out by a per-query counter, not a durable
/// high-water mark; callers that set identifiers themselves are responsible
/// for uniqueness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct RecordId(i64);

impl RecordId {
    #[inline]
    #[must_use]
    pub const fn new(n: i64) -> Self {
        Self(n)
    }

    /// Get the raw i64 value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n)
    }
}

/// An opaque handle to one stored record.
///
/// Identity is by handle, never by field values: two records holding
/// identical fields are distinct unless they share a handle. Slots are
/// allocated monotonically by the store and never reused within a store's
/// lifetime, so a handle stays valid across unrelated store mutations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct RecordRef(u64);

impl RecordRef {
    /// Wrap a raw slot number. Handles are normally minted by the store;
    /// this exists for the store and for test fixtures.
    #[inline]
    #[must_use]
    pub const fn from_slot(slot: u64) -> Self {
        Self(slot)
    }

    /// Get the raw slot number.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Field assignments used to build or update records.
pub type FieldMap = BTreeMap<String, Value>;

/// One stored record: a nullable surrogate identifier plus named fields.
///
/// The identifier lives outside the field map but is addressable through the
/// reserved field path `id`, so predicates and ordering keys can use it like
/// any other field.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Record {
    id: Option<RecordId>,
    fields: FieldMap,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from field assignments. An `id` entry in the input is
    /// routed to the identifier slot, not stored as an ordinary field.
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut record = Self::new();
        for (name, value) in fields {
            record.assign(&name.into(), value);
        }
        record
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    /// Read one field by name, cloning the value. The reserved name `id`
    /// resolves to the surrogate identifier as an integer, or `Null` while
    /// no identifier has been assigned — an unset identifier is a value,
    /// not a missing field.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(self.id.map_or(Value::Null, |id| Value::Integer(id.get())));
        }
        self.fields.get(name).cloned()
    }

    /// Assign one field by name. The reserved name `id` writes the surrogate
    /// identifier instead (non-integer values are ignored there).
    pub fn assign(&mut self, name: &str, value: Value) {
        if name == "id" {
            if let Value::Integer(n) = value {
                self.id = Some(RecordId::new(n));
            }
            return;
        }
        self.fields.insert(name.to_owned(), value);
    }

    /// Iterate the ordinary fields in name order. The identifier is not
    /// included.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_roundtrip() {
        let id = RecordId::new(7);
        assert_eq!(id.get(), 7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(RecordId::from(7), id);
    }

    #[test]
    fn test_record_ref_identity() {
        let a = RecordRef::from_slot(1);
        let b = RecordRef::from_slot(2);
        assert_ne!(a, b);
        assert_eq!(a, RecordRef::from_slot(1));
        assert_eq!(a.slot(), 1);
        assert_eq!(a.to_string(), "#1");
    }

    #[test]
    fn test_record_fields_and_reserved_id() {
        let mut record = Record::from_fields([("name", Value::from("Bob"))]);
        assert_eq!(record.value_of("name"), Some(Value::from("Bob")));
        assert_eq!(record.value_of("id"), Some(Value::Null));
        assert_eq!(record.value_of("missing"), None);

        record.set_id(RecordId::new(3));
        assert_eq!(record.value_of("id"), Some(Value::Integer(3)));

        // Assigning through the reserved name rewrites the identifier.
        record.assign("id", Value::Integer(9));
        assert_eq!(record.id(), Some(RecordId::new(9)));
        // Non-integer writes to `id` are dropped, not stored as a field.
        record.assign("id", Value::from("nine"));
        assert_eq!(record.id(), Some(RecordId::new(9)));
        assert_eq!(record.fields().count(), 1);
    }

    #[test]
    fn test_from_fields_routes_id() {
        let record = Record::from_fields([
            ("id", Value::Integer(12)),
            ("name", Value::from("Adam")),
        ]);
        assert_eq!(record.id(), Some(RecordId::new(12)));
        assert_eq!(record.fields().count(), 1);
    }

    #[test]
    fn test_entity_type_display() {
        let entity = EntityType::from("artist");
        assert_eq!(entity.as_str(), "artist");
        assert_eq!(entity.to_string(), "artist");
    }
}
