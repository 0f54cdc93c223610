//! Core types and traits for ForceModel Rust.
//!
//! `forcemodel-core` is the **contract layer** for the workspace. It defines the
//! record and transport traits plus the shared data types that the composite
//! tree machinery builds on.
//!
//! # Role In The Architecture
//!
//! - **Record contract**: `SObject` is implemented by domain records (hand-written
//!   or the runtime-defined `DynamicSObject`) and shared through `SObjectRef`.
//! - **Relationship graph**: `RelationshipInfo` is static metadata; the
//!   `traversable` module reads which relationships currently hold in-memory
//!   values without ever loading anything.
//! - **Wire format**: `SubrequestNode`, `TreeRequest` and `CompositeResponse`
//!   mirror the sObject Tree request/response bodies.
//! - **Transport**: `Transport` is the injected seam to the remote API.
//!
//! # Who Uses This Crate
//!
//! - `forcemodel-composite` builds trees and batches over these contracts.
//! - Applications implement `SObject` for their records and `Transport` for
//!   their HTTP client.

pub mod changes;
pub mod dynamic;
pub mod error;
pub mod field;
pub mod relationship;
pub mod sobject;
pub mod transport;
pub mod traversable;
pub mod wire;

pub use changes::ChangedFields;
pub use dynamic::DynamicSObject;
pub use error::{Error, FailedRequestError, LimitError, LimitErrorKind, Result};
pub use field::FieldInfo;
pub use relationship::{Direction, RelationshipInfo, RelationshipKind, relationship_name_for};
pub use sobject::{Peek, RecordKey, RecordSet, SObject, SObjectRef};
pub use transport::{Transport, TransportError, TransportErrorKind, tree_endpoint};
pub use traversable::{
    LoadedAssociation, Traversable, child_relationships, is_root, loaded_associations,
    parent_relationships,
};
pub use wire::{
    ApiError, ChildRecords, CompositeResponse, NodeAttributes, ResultEntry, SubrequestNode,
    TreeRequest,
};
