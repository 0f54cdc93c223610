//! Records whose shape is defined at runtime.
//!
//! Provides `DynamicSObject` for working with sObject types that have no
//! hand-written Rust struct.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::changes::ChangedFields;
use crate::field::FieldInfo;
use crate::relationship::{RelationshipInfo, RelationshipKind};
use crate::sobject::{Peek, SObject, SObjectRef};

/// A dynamically-defined record.
///
/// Field values live in a map keyed by field name, changes are tracked per
/// field, and association values are cached exactly as assigned. An
/// association missing from the cache is "not loaded".
///
/// # Example
///
/// ```
/// use forcemodel_core::{DynamicSObject, FieldInfo, SObject};
///
/// let mut account = DynamicSObject::new("Account").with_field(FieldInfo::new("name", "Name"));
/// account.set("name", "Acme");
///
/// assert_eq!(account.pending_attributes()["Name"], "Acme");
/// assert!(!account.is_persisted());
/// ```
#[derive(Debug, Clone)]
pub struct DynamicSObject {
    table_name: String,
    id: Option<String>,
    /// Field definitions in declaration order.
    fields: Vec<FieldInfo>,
    values: HashMap<String, Value>,
    changed: ChangedFields,
    relationships: Vec<RelationshipInfo>,
    /// Association name -> assigned records.
    associations: HashMap<&'static str, Vec<SObjectRef>>,
}

impl DynamicSObject {
    /// Create a new, unpersisted record of the given table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            id: None,
            fields: Vec::new(),
            values: HashMap::new(),
            changed: ChangedFields::default(),
            relationships: Vec::new(),
            associations: HashMap::new(),
        }
    }

    /// Add a field definition.
    #[must_use]
    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.add_field(field);
        self
    }

    /// Declare an association.
    #[must_use]
    pub fn with_relationship(mut self, info: RelationshipInfo) -> Self {
        self.add_relationship(info);
        self
    }

    /// Mark as already persisted under `id`.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a field definition (replacing one with the same name).
    pub fn add_field(&mut self, field: FieldInfo) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            *existing = field;
            return;
        }
        self.fields.push(field);
        self.changed.resize(self.fields.len());
    }

    /// Declare an association.
    pub fn add_relationship(&mut self, info: RelationshipInfo) {
        self.relationships.push(info);
    }

    /// Field definitions.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Look up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn field_index(&mut self, name: &str) -> usize {
        if let Some(idx) = self.fields.iter().position(|f| f.name == name) {
            return idx;
        }
        // Undeclared fields map to themselves on the wire.
        self.add_field(FieldInfo::new(name, name));
        self.fields.len() - 1
    }

    /// Assign a field value and mark it changed.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let idx = self.field_index(field);
        self.values.insert(field.to_string(), value.into());
        self.changed.mark(idx);
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Get a field value as a string slice.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    /// Whether the named field changed since last persisted.
    pub fn is_changed(&self, field: &str) -> bool {
        self.fields
            .iter()
            .position(|f| f.name == field)
            .is_some_and(|idx| self.changed.is_changed(idx))
    }

    /// Assign records to an association, marking it loaded.
    ///
    /// The association must be declared; undeclared names are ignored.
    pub fn associate(&mut self, name: &str, records: Vec<SObjectRef>) {
        match self.relationships.iter().find(|r| r.name == name) {
            Some(info) => {
                self.associations.insert(info.name, records);
            }
            None => tracing::warn!(
                table = %self.table_name,
                relationship = name,
                "Ignoring value for undeclared relationship"
            ),
        }
    }

    /// Mark an association as loaded but empty (e.g. a query returned nothing).
    pub fn mark_loaded(&mut self, name: &str) {
        self.associate(name, Vec::new());
    }

    /// Forget a loaded association value.
    pub fn unload(&mut self, name: &str) {
        self.associations.remove(name);
    }

    /// Records currently assigned to an association, if loaded.
    pub fn associated(&self, name: &str) -> Option<&[SObjectRef]> {
        self.associations.get(name).map(Vec::as_slice)
    }
}

impl SObject for DynamicSObject {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }

    fn pending_attributes(&self) -> Map<String, Value> {
        self.changed
            .iter()
            .filter_map(|idx| self.fields.get(idx))
            .filter(|field| !field.read_only)
            .map(|field| {
                let value = self.values.get(&field.name).cloned().unwrap_or(Value::Null);
                (field.api_name.clone(), value)
            })
            .collect()
    }

    fn has_changes(&self) -> bool {
        self.changed.any()
    }

    fn clear_changes(&mut self) {
        self.changed.clear();
    }

    fn write_foreign_key(&mut self, field: &str, id: &str) {
        self.field_index(field);
        self.values
            .insert(field.to_string(), Value::String(id.to_string()));
    }

    fn relationships(&self) -> &[RelationshipInfo] {
        &self.relationships
    }

    fn peek_association(&self, name: &str) -> Peek {
        match self.associations.get(name) {
            Some(records) => Peek::Loaded(records.clone()),
            None => Peek::NotLoaded,
        }
    }

    fn relationship_name(&self, info: &RelationshipInfo) -> Cow<'static, str> {
        let api_name = match info.kind {
            RelationshipKind::BelongsTo => info
                .foreign_key
                .and_then(|fk| self.field(fk))
                .map(|field| field.api_name.as_str()),
            RelationshipKind::HasOne | RelationshipKind::HasMany => None,
        };
        info.wire_name(api_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
