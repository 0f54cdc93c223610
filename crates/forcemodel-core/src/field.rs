//! Field definitions.

/// Metadata about a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Rust-side field name (e.g. `"parent_id"`).
    pub name: String,
    /// Wire attribute name (e.g. `"Parent_Id__c"`).
    pub api_name: String,
    /// Whether the server refuses writes to this field (formula, system fields).
    ///
    /// Read-only fields never appear in pending attributes.
    pub read_only: bool,
}

impl FieldInfo {
    /// Create a writable field mapping.
    pub fn new(name: impl Into<String>, api_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_name: api_name.into(),
            read_only: false,
        }
    }

    /// Mark as read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}
