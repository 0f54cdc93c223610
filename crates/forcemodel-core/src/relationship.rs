//! Relationship metadata for ForceModel Rust.
//!
//! Relationships are declared as static metadata on each record type. The
//! composite tree layer only needs to know two things about them: which way
//! they point (towards a parent or towards children) and the wire
//! relationship name under which nested records travel.

use std::borrow::Cow;

/// The kind of association declared on a record type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// Many-to-one: a `Contact` belongs to one `Account` via a foreign key it holds.
    #[default]
    BelongsTo,
    /// One-to-one from the referenced side: an `Account` has one `Profile__c`.
    HasOne,
    /// One-to-many: an `Account` has many `Contact`s.
    HasMany,
}

impl RelationshipKind {
    /// Which way the association points in a record graph.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            RelationshipKind::BelongsTo => Direction::Parent,
            RelationshipKind::HasOne | RelationshipKind::HasMany => Direction::Child,
        }
    }
}

/// Direction of an association relative to the record declaring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The record references at most one other record by foreign key.
    Parent,
    /// The record owns zero or more records that reference it back.
    Child,
}

/// Metadata about an association between record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// Name of the association on the declaring record (e.g. `"contacts"`).
    pub name: &'static str,

    /// The related record's table name (e.g. `"Contact"`).
    pub related_table: &'static str,

    /// Kind of association.
    pub kind: RelationshipKind,

    /// Foreign key field name.
    ///
    /// For `BelongsTo` the field lives on the declaring record; for `HasOne`
    /// and `HasMany` it lives on the related record and points back here.
    pub foreign_key: Option<&'static str>,

    /// Explicit wire relationship name, overriding the default.
    pub relationship_name: Option<&'static str>,
}

impl RelationshipInfo {
    /// Create a new association with required fields.
    #[must_use]
    pub const fn new(
        name: &'static str,
        related_table: &'static str,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            name,
            related_table,
            kind,
            foreign_key: None,
            relationship_name: None,
        }
    }

    /// Declare a `BelongsTo` association.
    #[must_use]
    pub const fn belongs_to(name: &'static str, related_table: &'static str) -> Self {
        Self::new(name, related_table, RelationshipKind::BelongsTo)
    }

    /// Declare a `HasOne` association.
    #[must_use]
    pub const fn has_one(name: &'static str, related_table: &'static str) -> Self {
        Self::new(name, related_table, RelationshipKind::HasOne)
    }

    /// Declare a `HasMany` association.
    #[must_use]
    pub const fn has_many(name: &'static str, related_table: &'static str) -> Self {
        Self::new(name, related_table, RelationshipKind::HasMany)
    }

    /// Set the foreign key field name.
    #[must_use]
    pub const fn foreign_key(mut self, field: &'static str) -> Self {
        self.foreign_key = Some(field);
        self
    }

    /// Set an explicit wire relationship name.
    #[must_use]
    pub const fn relationship_name(mut self, name: &'static str) -> Self {
        self.relationship_name = Some(name);
        self
    }

    /// Direction of this association.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.kind.direction()
    }

    /// Wire relationship name, given the wire attribute name of the foreign key.
    ///
    /// An explicit `relationship_name` always wins. Otherwise child-direction
    /// associations use the related table name, and `BelongsTo` derives the
    /// name from its foreign key attribute (`Account__c` becomes `Account__r`),
    /// falling back to the association name when no attribute is known.
    #[must_use]
    pub fn wire_name(&self, foreign_key_api_name: Option<&str>) -> Cow<'static, str> {
        if let Some(name) = self.relationship_name {
            return Cow::Borrowed(name);
        }
        match self.kind {
            RelationshipKind::HasOne | RelationshipKind::HasMany => {
                Cow::Borrowed(self.related_table)
            }
            RelationshipKind::BelongsTo => match foreign_key_api_name {
                Some(api_name) => Cow::Owned(relationship_name_for(api_name)),
                None => Cow::Borrowed(self.name),
            },
        }
    }
}

impl Default for RelationshipInfo {
    fn default() -> Self {
        Self::new("", "", RelationshipKind::default())
    }
}

/// Relationship name for a custom lookup attribute (`Parent_Id__c` -> `Parent_Id__r`).
///
/// Standard attributes without the `__c` suffix are returned unchanged.
#[must_use]
pub fn relationship_name_for(api_name: &str) -> String {
    match api_name.strip_suffix("__c") {
        Some(stem) => format!("{stem}__r"),
        None => api_name.to_string(),
    }
}
