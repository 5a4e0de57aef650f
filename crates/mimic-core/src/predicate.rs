//! Predicate compilation and evaluation.
//!
//! A filter descriptor is a `__`-separated lookup path plus an operand:
//! `name`, `name__iexact`, `album__artist__name`. Compilation turns one
//! descriptor into a closed [`Predicate`] tree; evaluation interprets that
//! tree against a single record under the store lock.
//!
//! An unrecognized suffix is not an error: it is a nested path, so the
//! builder recurses with the same operand and wraps the result in a
//! traversal through the named field. Fields registered as relation-backed
//! compile to a membership test against the relation side-table instead;
//! missing relation state evaluates to false, never an error.

use std::collections::HashSet;
use std::fmt;

use mimic_error::{MimicError, Result};
use mimic_types::{EntityType, RecordId, RecordRef, Value};

use crate::store::StoreInner;

/// Lookup path separator.
pub const LOOKUP_SEP: &str = "__";

/// A compiled boolean test over one record.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Compare one field of the record against an operand.
    Compare { field: String, op: CompareOp },
    /// Follow a `Value::Ref` field and apply the inner predicate to the
    /// record it points at.
    Traverse { field: String, inner: Box<Predicate> },
    /// Membership of the record in the relation list keyed by the operand
    /// owner identifier.
    RelationMember { relation: String, owner: Value },
    /// Logical negation of the inner predicate.
    Not(Box<Predicate>),
}

/// Field comparison operators.
#[derive(Debug, Clone)]
pub enum CompareOp {
    /// `exact` (and the bare-path default): equality.
    Equals(Value),
    /// `iexact`: case-insensitive text equality.
    IEquals(Value),
    /// `contains`: operand is a substring of a text field, or a member of a
    /// list field.
    Contains(Value),
    /// `icontains`: case-insensitive substring.
    IContains(Value),
    /// `in`: the field value is a member of the operand collection (or a
    /// substring, when both sides are text).
    In(Value),
}

impl Predicate {
    /// Compile one filter descriptor.
    ///
    /// `relation_fields` is the entity's registry of relation-backed field
    /// names; a path whose head segment is registered compiles to
    /// [`Predicate::RelationMember`] whatever its suffix says.
    pub(crate) fn compile(
        path: &str,
        value: Value,
        negated: bool,
        relation_fields: &HashSet<String>,
    ) -> Self {
        let (head, rest) = match path.split_once(LOOKUP_SEP) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let predicate = if relation_fields.contains(head) {
            Self::RelationMember {
                relation: head.to_owned(),
                owner: value,
            }
        } else {
            match rest {
                None | Some("exact") => Self::Compare {
                    field: head.to_owned(),
                    op: CompareOp::Equals(value),
                },
                Some("iexact") => Self::Compare {
                    field: head.to_owned(),
                    op: CompareOp::IEquals(value),
                },
                Some("contains") => Self::Compare {
                    field: head.to_owned(),
                    op: CompareOp::Contains(value),
                },
                Some("icontains") => Self::Compare {
                    field: head.to_owned(),
                    op: CompareOp::IContains(value),
                },
                Some("in") => Self::Compare {
                    field: head.to_owned(),
                    op: CompareOp::In(value),
                },
                Some(rest) => Self::Traverse {
                    field: head.to_owned(),
                    inner: Box::new(Self::compile(rest, value, false, relation_fields)),
                },
            }
        };

        if negated {
            Self::Not(Box::new(predicate))
        } else {
            predicate
        }
    }

    /// Evaluate against one record.
    pub(crate) fn matches(
        &self,
        entity: &EntityType,
        handle: RecordRef,
        store: &StoreInner,
    ) -> Result<bool> {
        match self {
            Self::Not(inner) => Ok(!inner.matches(entity, handle, store)?),

            Self::RelationMember { relation, owner } => {
                let Value::Integer(owner_id) = owner else {
                    // Only integer owner keys address relation lists; any
                    // other operand shape means "no match".
                    return Ok(false);
                };
                Ok(store
                    .relations()
                    .contains(entity, relation, RecordId::new(*owner_id), handle))
            }

            Self::Traverse { field, inner } => {
                let value = field_value(entity, handle, field, store)?;
                match value.as_ref_handle() {
                    Some(target) => inner.matches(entity, target, store),
                    None => Err(MimicError::NotARecord {
                        field: field.clone(),
                    }),
                }
            }

            Self::Compare { field, op } => {
                let value = field_value(entity, handle, field, store)?;
                Ok(op.eval(&value))
            }
        }
    }
}

fn field_value(
    entity: &EntityType,
    handle: RecordRef,
    field: &str,
    store: &StoreInner,
) -> Result<Value> {
    let record = store.record(handle).ok_or_else(|| MimicError::NotFound {
        entity: entity.to_string(),
    })?;
    record.value_of(field).ok_or_else(|| MimicError::NoSuchField {
        entity: entity.to_string(),
        field: field.to_owned(),
    })
}

impl CompareOp {
    /// Apply the operator to an actual field value.
    fn eval(&self, actual: &Value) -> bool {
        match self {
            Self::Equals(expected) => actual == expected,

            Self::IEquals(expected) => match (actual.as_text(), expected.as_text()) {
                (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
                _ => false,
            },

            Self::Contains(expected) => match actual {
                Value::Text(haystack) => expected
                    .as_text()
                    .is_some_and(|needle| haystack.contains(needle)),
                Value::List(items) => items.iter().any(|item| item == expected),
                _ => false,
            },

            Self::IContains(expected) => match (actual.as_text(), expected.as_text()) {
                (Some(haystack), Some(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },

            Self::In(collection) => match collection {
                Value::List(items) => items.iter().any(|item| item == actual),
                Value::Text(haystack) => actual
                    .as_text()
                    .is_some_and(|needle| haystack.contains(needle)),
                _ => false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Condition groups
// ---------------------------------------------------------------------------

/// Connector for a group of conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
        }
    }
}

/// A tree of filter descriptors.
///
/// Groups flatten into the query's predicate list, which composes as an
/// implicit AND; a group's negation applies to each of its own leaves. OR
/// groups are rejected at flatten time rather than mis-evaluated.
#[derive(Debug, Clone)]
pub struct ConditionGroup {
    pub connector: Connector,
    pub negated: bool,
    pub children: Vec<ConditionNode>,
}

/// One entry in a condition group.
#[derive(Debug, Clone)]
pub enum ConditionNode {
    Leaf { path: String, value: Value },
    Group(ConditionGroup),
}

impl ConditionGroup {
    /// An empty AND group.
    #[must_use]
    pub fn and() -> Self {
        Self {
            connector: Connector::And,
            negated: false,
            children: Vec::new(),
        }
    }

    /// An empty OR group. Building one is allowed; flattening it into a
    /// query is what fails.
    #[must_use]
    pub fn or() -> Self {
        Self {
            connector: Connector::Or,
            negated: false,
            children: Vec::new(),
        }
    }

    /// Add one filter descriptor.
    #[must_use]
    pub fn leaf(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.children.push(ConditionNode::Leaf {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    /// Nest a child group.
    #[must_use]
    pub fn group(mut self, child: ConditionGroup) -> Self {
        self.children.push(ConditionNode::Group(child));
        self
    }

    /// Negate this group's own leaves.
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }
}
