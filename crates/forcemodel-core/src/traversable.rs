//! Read-only view of which associations currently hold in-memory records.
//!
//! Everything here is a pure read over loaded state: associations that were
//! never loaded are invisible, and associations that were loaded but came back
//! empty are skipped so they can never trigger further traversal.

use std::collections::BTreeMap;

use crate::relationship::{Direction, RelationshipInfo};
use crate::sobject::{RecordSet, SObjectRef};

/// One declared association together with its loaded, non-empty value.
#[derive(Debug, Clone)]
pub struct LoadedAssociation {
    /// The association declaration.
    pub info: RelationshipInfo,
    /// Resolved wire relationship name.
    pub wire_name: String,
    /// Records currently held by the association.
    pub records: Vec<SObjectRef>,
}

/// Loaded, non-empty associations of `record` pointing in `direction`, in
/// declaration order.
///
/// The record is only borrowed while collecting, so callers are free to
/// borrow the returned records mutably afterwards (even when one of them is
/// `record` itself).
#[must_use]
pub fn loaded_associations(record: &SObjectRef, direction: Direction) -> Vec<LoadedAssociation> {
    let record = record.borrow();
    record
        .relationships()
        .iter()
        .filter(|info| info.direction() == direction)
        .filter_map(|info| {
            let records = record.peek_association(info.name).non_empty()?;
            Some(LoadedAssociation {
                info: *info,
                wire_name: record.relationship_name(info).into_owned(),
                records,
            })
        })
        .collect()
}

fn group_by_wire_name(associations: Vec<LoadedAssociation>) -> BTreeMap<String, RecordSet> {
    let mut grouped: BTreeMap<String, RecordSet> = BTreeMap::new();
    for association in associations {
        grouped
            .entry(association.wire_name)
            .or_default()
            .extend(association.records);
    }
    grouped
}

/// Loaded parent-direction records grouped by wire relationship name.
#[must_use]
pub fn parent_relationships(record: &SObjectRef) -> BTreeMap<String, RecordSet> {
    group_by_wire_name(loaded_associations(record, Direction::Parent))
}

/// Loaded child-direction records grouped by wire relationship name.
///
/// Declarations sharing a wire name are merged into one identity set.
#[must_use]
pub fn child_relationships(record: &SObjectRef) -> BTreeMap<String, RecordSet> {
    group_by_wire_name(loaded_associations(record, Direction::Child))
}

/// True iff no parent-direction association holds a loaded, non-empty value.
#[must_use]
pub fn is_root(record: &SObjectRef) -> bool {
    loaded_associations(record, Direction::Parent).is_empty()
}

/// Method-style access to the traversal helpers.
pub trait Traversable {
    /// See [`parent_relationships`].
    fn traversable_parents(&self) -> BTreeMap<String, RecordSet>;

    /// See [`child_relationships`].
    fn traversable_children(&self) -> BTreeMap<String, RecordSet>;

    /// See [`is_root`].
    fn is_traversable_root(&self) -> bool;
}

impl Traversable for SObjectRef {
    fn traversable_parents(&self) -> BTreeMap<String, RecordSet> {
        parent_relationships(self)
    }

    fn traversable_children(&self) -> BTreeMap<String, RecordSet> {
        child_relationships(self)
    }

    fn is_traversable_root(&self) -> bool {
        is_root(self)
    }
}
