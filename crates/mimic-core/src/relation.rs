//! Relation side-tables.
//!
//! Models many-to-many and reverse-collection relationships that the record
//! store alone cannot express: `(entity-type, relation-name) → owner id →
//! ordered members`. Membership order is insertion order. Lists are
//! duplicate-free only by caller discipline; the table itself does not
//! enforce it.

use std::collections::HashMap;

use mimic_error::{MimicError, Result};
use mimic_types::{EntityType, RecordId, RecordRef};
use tracing::debug;

/// Composite key for one relation's owner map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RelationKey {
    entity: EntityType,
    relation: String,
}

impl RelationKey {
    fn new(entity: &EntityType, relation: &str) -> Self {
        Self {
            entity: entity.clone(),
            relation: relation.to_owned(),
        }
    }
}

/// Auxiliary table tracking relation membership per owner.
#[derive(Debug, Default)]
pub struct RelationTable {
    map: HashMap<RelationKey, HashMap<RecordId, Vec<RecordRef>>>,
}

impl RelationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append members to the owner's list, creating the list if absent.
    pub fn add(
        &mut self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
        members: &[RecordRef],
    ) {
        let list = self
            .map
            .entry(RelationKey::new(entity, relation))
            .or_default()
            .entry(owner)
            .or_default();
        list.extend_from_slice(members);
        debug!(
            entity = %entity,
            relation,
            owner = %owner,
            added = members.len(),
            "relation members added"
        );
    }

    /// Remove each listed member from the owner's list by handle equality.
    ///
    /// Fails with `NotFound` on the first member that is not present;
    /// members removed before the failure stay removed.
    pub fn remove(
        &mut self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
        members: &[RecordRef],
    ) -> Result<()> {
        let list = self
            .map
            .entry(RelationKey::new(entity, relation))
            .or_default()
            .entry(owner)
            .or_default();
        for member in members {
            let position = list.iter().position(|candidate| candidate == member);
            match position {
                Some(index) => {
                    list.remove(index);
                }
                None => {
                    return Err(MimicError::NotFound {
                        entity: entity.to_string(),
                    });
                }
            }
        }
        debug!(
            entity = %entity,
            relation,
            owner = %owner,
            removed = members.len(),
            "relation members removed"
        );
        Ok(())
    }

    /// Reset the relation-name's mapping to empty.
    ///
    /// This clears EVERY owner's list for the relation name, not just one
    /// owner's. The coarse scope is inherited behavior (the key carries no
    /// owner) and is pinned by tests; narrowing it is a deliberate change,
    /// not a cleanup.
    pub fn clear(&mut self, entity: &EntityType, relation: &str) {
        self.map
            .insert(RelationKey::new(entity, relation), HashMap::new());
        debug!(entity = %entity, relation, "relation cleared for all owners");
    }

    /// The owner's members, in insertion order. Empty (never an error) when
    /// the relation or the owner's list is absent.
    #[must_use]
    pub fn members_of(
        &self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
    ) -> Vec<RecordRef> {
        self.map
            .get(&RelationKey::new(entity, relation))
            .and_then(|owners| owners.get(&owner))
            .cloned()
            .unwrap_or_default()
    }

    /// Membership test used by relation-backed predicates. Missing relation
    /// state resolves to false, never an error.
    pub(crate) fn contains(
        &self,
        entity: &EntityType,
        relation: &str,
        owner: RecordId,
        member: RecordRef,
    ) -> bool {
        self.map
            .get(&RelationKey::new(entity, relation))
            .and_then(|owners| owners.get(&owner))
            .is_some_and(|list| list.contains(&member))
    }

    /// Drop every relation for every entity.
    pub(crate) fn clear_all(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> EntityType {
        EntityType::from("track")
    }

    #[test]
    fn test_add_then_members_of() {
        let mut table = RelationTable::new();
        let member = RecordRef::from_slot(5);
        table.add(&entity(), "collaborators", RecordId::new(1), &[member]);
        assert_eq!(
            table.members_of(&entity(), "collaborators", RecordId::new(1)),
            vec![member]
        );
    }

    #[test]
    fn test_members_of_absent_is_empty() {
        let table = RelationTable::new();
        assert!(
            table
                .members_of(&entity(), "collaborators", RecordId::new(1))
                .is_empty()
        );
    }

    #[test]
    fn test_remove_member() {
        let mut table = RelationTable::new();
        let a = RecordRef::from_slot(1);
        let b = RecordRef::from_slot(2);
        table.add(&entity(), "collaborators", RecordId::new(1), &[a, b]);
        table
            .remove(&entity(), "collaborators", RecordId::new(1), &[a])
            .expect("present member should remove");
        assert_eq!(
            table.members_of(&entity(), "collaborators", RecordId::new(1)),
            vec![b]
        );
    }

    #[test]
    fn test_remove_absent_member_is_not_found() {
        let mut table = RelationTable::new();
        let err = table
            .remove(
                &entity(),
                "collaborators",
                RecordId::new(1),
                &[RecordRef::from_slot(9)],
            )
            .expect_err("never-added member should fail");
        assert!(matches!(err, MimicError::NotFound { .. }));
    }

    #[test]
    fn test_clear_scope_is_every_owner() {
        let mut table = RelationTable::new();
        table.add(
            &entity(),
            "collaborators",
            RecordId::new(1),
            &[RecordRef::from_slot(1)],
        );
        table.add(
            &entity(),
            "collaborators",
            RecordId::new(2),
            &[RecordRef::from_slot(2)],
        );
        table.clear(&entity(), "collaborators");
        assert!(
            table
                .members_of(&entity(), "collaborators", RecordId::new(1))
                .is_empty()
        );
        assert!(
            table
                .members_of(&entity(), "collaborators", RecordId::new(2))
                .is_empty()
        );
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut table = RelationTable::new();
        let refs: Vec<RecordRef> = (0..4).map(RecordRef::from_slot).collect();
        table.add(&entity(), "friends", RecordId::new(1), &refs[..2]);
        table.add(&entity(), "friends", RecordId::new(1), &refs[2..]);
        assert_eq!(table.members_of(&entity(), "friends", RecordId::new(1)), refs);
    }
}
