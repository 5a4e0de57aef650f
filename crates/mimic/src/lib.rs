//! Public API facade for MimicDB.
//!
//! MimicDB holds typed collections of records in memory and answers
//! filtered, ordered, paginated queries over them — the operation surface a
//! SQL execution layer would offer, without a database behind it. Records
//! are addressed by opaque handles; foreign-key fields hold handles, and
//! many-to-many style relationships live in side-tables keyed per owner.
//!
//! ```
//! use mimic::{Store, Value};
//!
//! let store = Store::new();
//! let mut artists = store.cursor("artist");
//! artists.create([("name", Value::from("Bob"))]);
//! artists.create([("name", Value::from("Bobby"))]);
//!
//! let matched = store
//!     .cursor("artist")
//!     .filter("name__icontains", "bo")
//!     .count()
//!     .expect("filter should evaluate");
//! assert_eq!(matched, 2);
//! ```

pub use mimic_core::{
    CompareOp, ConditionGroup, ConditionNode, Connector, Cursor, Predicate, Query, RelationTable,
    Store,
};
pub use mimic_error::{MimicError, Result};
pub use mimic_types::{EntityType, FieldMap, Record, RecordId, RecordRef, Value};
