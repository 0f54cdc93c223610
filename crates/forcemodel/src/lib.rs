//! ForceModel Rust: Salesforce sObject records with batched composite tree creation.
//!
//! This is the user-facing facade. It re-exports the record contracts from
//! `forcemodel-core` and the tree machinery from `forcemodel-composite`.
//!
//! # Example
//!
//! ```
//! use forcemodel::prelude::*;
//!
//! struct Server;
//!
//! impl Transport for Server {
//!     fn send(
//!         &self,
//!         _endpoint: &str,
//!         payload: &TreeRequest,
//!     ) -> std::result::Result<CompositeResponse, TransportError> {
//!         let results = payload
//!             .records
//!             .iter()
//!             .map(|node| ResultEntry::created(node.reference_id(), "001000000000001"))
//!             .collect();
//!         Ok(CompositeResponse::success(results))
//!     }
//! }
//!
//! let account = SObjectRef::new(DynamicSObject::new("Account").with_field(FieldInfo::new("name", "Name")));
//! account.downcast_mut::<DynamicSObject>().unwrap().set("name", "Acme");
//!
//! let mut sender = TreeSender::new("Account", Server);
//! sender.add_root(account.clone()).unwrap();
//! let result = sender.commit().unwrap();
//!
//! assert!(result.success());
//! assert_eq!(account.id().as_deref(), Some("001000000000001"));
//! ```

pub use forcemodel_composite::{
    CommitResult, RandomReferenceIds, ReferenceIdGenerator, SequentialReferenceIds, Tree,
    TreeSender, TreeSenderConfig, send_trees, send_trees_checked,
};
pub use forcemodel_core::{
    ApiError, ChangedFields, CompositeResponse, Direction, DynamicSObject, Error,
    FailedRequestError, FieldInfo, LimitError, LimitErrorKind, Peek, RecordSet, RelationshipInfo,
    RelationshipKind, Result, ResultEntry, SObject, SObjectRef, SubrequestNode, Transport,
    TransportError, TransportErrorKind, Traversable, TreeRequest, tree_endpoint,
};

/// Common imports.
pub mod prelude {
    pub use forcemodel_composite::{
        CommitResult, ReferenceIdGenerator, SequentialReferenceIds, Tree, TreeSender,
        TreeSenderConfig,
    };
    pub use forcemodel_core::{
        CompositeResponse, DynamicSObject, Error, FieldInfo, Peek, RelationshipInfo,
        RelationshipKind, Result, ResultEntry, SObject, SObjectRef, Transport, TransportError,
        Traversable, TreeRequest,
    };
}
