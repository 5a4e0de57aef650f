//! Core engine for MimicDB: the record store, relation side-tables,
//! predicate interpreter, query pipeline, and cursor façade.
//!
//! Data flows caller → [`Cursor`] → [`Query`] → predicates → [`Store`] and
//! back out as ordered, paginated sequences of record handles.

pub mod cursor;
pub mod predicate;
pub mod query;
pub mod relation;
pub mod store;

pub use cursor::Cursor;
pub use predicate::{CompareOp, ConditionGroup, ConditionNode, Connector, Predicate};
pub use query::Query;
pub use relation::RelationTable;
pub use store::Store;
