//! The record contract and the shared handle records travel in.
//!
//! Record graphs are single-threaded, may share nodes and may even contain
//! cycles, so records are held behind `Rc<RefCell<dyn SObject>>`. Equality and
//! hashing of `SObjectRef` are by identity, never by value.

use std::any::Any;
use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::relationship::RelationshipInfo;

/// Result of peeking at an association without loading it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Peek {
    /// Nothing was ever assigned or fetched for this association.
    #[default]
    NotLoaded,
    /// The association holds these records (possibly none).
    Loaded(Vec<SObjectRef>),
}

impl Peek {
    /// Loaded records, or `None` when not loaded or loaded but empty.
    #[must_use]
    pub fn non_empty(self) -> Option<Vec<SObjectRef>> {
        match self {
            Peek::Loaded(records) if !records.is_empty() => Some(records),
            _ => None,
        }
    }
}

/// A domain record as seen by the composite tree machinery.
///
/// Implementations own field mapping and dirty tracking; this trait only
/// exposes what tree building and reconciliation need.
pub trait SObject: Any + fmt::Debug {
    /// Wire table name (e.g. `"Account"`, `"Root__c"`).
    fn table_name(&self) -> &str;

    /// Server-issued identifier, absent until persisted.
    fn id(&self) -> Option<&str>;

    /// Assign the server-issued identifier.
    fn set_id(&mut self, id: &str);

    /// Whether the record already exists remotely.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    /// Changed attributes keyed by wire attribute name (empty when clean).
    fn pending_attributes(&self) -> Map<String, Value>;

    /// Whether any attribute changed since the record was last persisted.
    fn has_changes(&self) -> bool;

    /// Mark every attribute as persisted.
    fn clear_changes(&mut self);

    /// Store a foreign key value the server has already persisted.
    ///
    /// Unlike a regular assignment this does not register a pending change.
    fn write_foreign_key(&mut self, field: &str, id: &str);

    /// Declared associations, in declaration order.
    fn relationships(&self) -> &[RelationshipInfo];

    /// Currently loaded value of an association. Must never fetch.
    fn peek_association(&self, name: &str) -> Peek;

    /// Wire relationship name of one of this record's associations.
    fn relationship_name(&self, info: &RelationshipInfo) -> Cow<'static, str> {
        info.wire_name(None)
    }

    /// Upcast for typed access through `SObjectRef::downcast_ref`.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access through `SObjectRef::downcast_mut`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Identity of a record handle, usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(usize);

/// Shared, identity-compared handle to a record.
#[derive(Clone)]
pub struct SObjectRef(Rc<RefCell<dyn SObject>>);

impl SObjectRef {
    /// Wrap a record in a new handle.
    pub fn new<T: SObject>(record: T) -> Self {
        let inner: Rc<RefCell<dyn SObject>> = Rc::new(RefCell::new(record));
        Self(inner)
    }

    /// Immutably borrow the record.
    pub fn borrow(&self) -> Ref<'_, dyn SObject> {
        self.0.borrow()
    }

    /// Mutably borrow the record.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn SObject> {
        self.0.borrow_mut()
    }

    /// Identity key of this handle.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey(Rc::as_ptr(&self.0).cast::<()>() as usize)
    }

    /// Whether both handles point at the same record.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    /// Wire table name of the record.
    #[must_use]
    pub fn table_name(&self) -> String {
        self.borrow().table_name().to_string()
    }

    /// Identifier of the record, if persisted.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.borrow().id().map(str::to_string)
    }

    /// Whether the record already exists remotely.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.borrow().is_persisted()
    }

    /// Borrow the record as a concrete type.
    pub fn downcast_ref<T: SObject>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.borrow(), |record| record.as_any().downcast_ref::<T>()).ok()
    }

    /// Mutably borrow the record as a concrete type.
    pub fn downcast_mut<T: SObject>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.borrow_mut(), |record| {
            record.as_any_mut().downcast_mut::<T>()
        })
        .ok()
    }
}

impl PartialEq for SObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SObjectRef {}

impl Hash for SObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

// Shallow on purpose: record graphs may be cyclic.
impl fmt::Display for SObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(record) => match record.id() {
                Some(id) => write!(f, "{}({})", record.table_name(), id),
                None => write!(f, "{}(new)", record.table_name()),
            },
            Err(_) => f.write_str("<borrowed record>"),
        }
    }
}

impl fmt::Debug for SObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SObjectRef({self})")
    }
}

/// Insertion-ordered set of records, de-duplicated by identity.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<SObjectRef>,
    seen: HashSet<RecordKey>,
}

impl RecordSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; returns `false` if it was already present.
    pub fn insert(&mut self, record: SObjectRef) -> bool {
        if self.seen.insert(record.key()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    /// Whether the record is present.
    #[must_use]
    pub fn contains(&self, record: &SObjectRef) -> bool {
        self.seen.contains(&record.key())
    }

    /// Number of distinct records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, SObjectRef> {
        self.records.iter()
    }

    /// Records in insertion order, as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[SObjectRef] {
        &self.records
    }
}

impl PartialEq for RecordSet {
    // Order-insensitive: two sets are equal when they hold the same records.
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for RecordSet {}

impl Extend<SObjectRef> for RecordSet {
    fn extend<I: IntoIterator<Item = SObjectRef>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<SObjectRef> for RecordSet {
    fn from_iter<I: IntoIterator<Item = SObjectRef>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a SObjectRef;
    type IntoIter = std::slice::Iter<'a, SObjectRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for RecordSet {
    type Item = SObjectRef;
    type IntoIter = std::vec::IntoIter<SObjectRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
