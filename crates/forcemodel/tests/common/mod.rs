//! Shared fixtures: a small Account/Contact/Case schema and an in-memory org.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use forcemodel::prelude::*;
use forcemodel::{ApiError, SubrequestNode, TransportErrorKind};
use serde_json::Value;

pub const ACCOUNT_CONTACTS: RelationshipInfo = RelationshipInfo::has_many("contacts", "Contact")
    .foreign_key("account_id")
    .relationship_name("Contacts");
pub const CONTACT_ACCOUNT: RelationshipInfo = RelationshipInfo::belongs_to("account", "Account")
    .foreign_key("account_id")
    .relationship_name("Account");
pub const CONTACT_CASES: RelationshipInfo = RelationshipInfo::has_many("cases", "Case")
    .foreign_key("contact_id")
    .relationship_name("Cases");
pub const CASE_CONTACT: RelationshipInfo =
    RelationshipInfo::belongs_to("contact", "Contact").foreign_key("contact_id");

pub fn account(name: &str) -> SObjectRef {
    let mut record = DynamicSObject::new("Account")
        .with_field(FieldInfo::new("name", "Name"))
        .with_relationship(ACCOUNT_CONTACTS);
    record.set("name", name);
    SObjectRef::new(record)
}

pub fn contact(last_name: &str) -> SObjectRef {
    let mut record = DynamicSObject::new("Contact")
        .with_field(FieldInfo::new("last_name", "LastName"))
        .with_field(FieldInfo::new("account_id", "AccountId"))
        .with_relationship(CONTACT_ACCOUNT)
        .with_relationship(CONTACT_CASES);
    record.set("last_name", last_name);
    SObjectRef::new(record)
}

pub fn case(subject: &str) -> SObjectRef {
    let mut record = DynamicSObject::new("Case")
        .with_field(FieldInfo::new("subject", "Subject"))
        .with_field(FieldInfo::new("contact_id", "ContactId"))
        .with_relationship(CASE_CONTACT);
    record.set("subject", subject);
    SObjectRef::new(record)
}

/// Append `child` to `parent`'s `children` association and point `child`'s
/// `parent_name` association back at `parent`.
pub fn attach(parent: &SObjectRef, children: &str, child: &SObjectRef, parent_name: &str) {
    {
        let mut record = parent
            .downcast_mut::<DynamicSObject>()
            .expect("dynamic parent");
        let mut current = record
            .associated(children)
            .map(<[SObjectRef]>::to_vec)
            .unwrap_or_default();
        current.push(child.clone());
        record.associate(children, current);
    }
    child
        .downcast_mut::<DynamicSObject>()
        .expect("dynamic child")
        .associate(parent_name, vec![parent.clone()]);
}

pub fn get_str(record: &SObjectRef, field: &str) -> Option<String> {
    record
        .downcast_ref::<DynamicSObject>()
        .and_then(|r| r.get_str(field).map(str::to_string))
}

pub fn set(record: &SObjectRef, field: &str, value: &str) {
    record
        .downcast_mut::<DynamicSObject>()
        .expect("dynamic record")
        .set(field, value);
}

/// In-memory stand-in for the composite tree resource.
///
/// Creates every node it is sent, unless a node's `Name` is blocked, in which
/// case the whole request is rejected the way the API does it.
#[derive(Default)]
pub struct FakeOrg {
    pub requests: RefCell<Vec<(String, Value)>>,
    blocked_names: Vec<String>,
    offline: Cell<bool>,
    next_id: Cell<u64>,
}

impl FakeOrg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocking(mut self, name: &str) -> Self {
        self.blocked_names.push(name.to_string());
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn sent(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn body(&self, index: usize) -> Value {
        self.requests.borrow()[index].1.clone()
    }

    fn mint_id(&self) -> String {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        format!("id{n:04}")
    }
}

fn flatten<'a>(nodes: &'a [SubrequestNode], out: &mut Vec<&'a SubrequestNode>) {
    for node in nodes {
        out.push(node);
        for child in node.children.values() {
            flatten(&child.records, out);
        }
    }
}

impl Transport for FakeOrg {
    fn send(
        &self,
        endpoint: &str,
        payload: &TreeRequest,
    ) -> std::result::Result<CompositeResponse, TransportError> {
        if self.offline.get() {
            return Err(TransportError::new(
                TransportErrorKind::Connect,
                "connection refused",
            ));
        }
        let body = payload
            .to_json()
            .and_then(|json| Ok(serde_json::from_str::<Value>(&json)?))
            .map_err(|err| {
                TransportError::new(TransportErrorKind::Serialization, err.to_string())
                    .with_source(err)
            })?;
        self.requests
            .borrow_mut()
            .push((endpoint.to_string(), body));

        let mut nodes = Vec::new();
        flatten(&payload.records, &mut nodes);

        let failures: Vec<ResultEntry> = nodes
            .iter()
            .filter_map(|node| {
                let name = node.fields.get("Name").and_then(Value::as_str)?;
                self.blocked_names.iter().any(|b| b == name).then(|| {
                    ResultEntry::failed(
                        node.reference_id(),
                        vec![ApiError {
                            status_code: Some("FIELD_CUSTOM_VALIDATION_EXCEPTION".to_string()),
                            message: format!("{name} is not allowed"),
                            fields: vec!["Name".to_string()],
                        }],
                    )
                })
            })
            .collect();
        if !failures.is_empty() {
            return Err(TransportError::rejected(
                "HTTP 400 Bad Request",
                Some(CompositeResponse::with_errors(failures)),
            ));
        }

        let results = nodes
            .iter()
            .map(|node| ResultEntry::created(node.reference_id(), self.mint_id()))
            .collect();
        Ok(CompositeResponse::success(results))
    }
}
