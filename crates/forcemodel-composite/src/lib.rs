//! Batched creation of nested sObject records.
//!
//! The sObject Tree resource creates a root record together with everything
//! nested under it in one call, as long as the request stays within the API's
//! record and depth limits. This crate turns in-memory object graphs into
//! such requests and maps the results back.
//!
//! - `Tree` serializes one root and the unpersisted records reachable from it
//!   through loaded child associations, and later copies created ids back.
//! - `TreeSender` queues roots of one table, packs their trees into requests
//!   under the configured limits, dispatches them through a `Transport` and
//!   reports which batches had errors.
//! - `ReferenceIdGenerator` mints the per-node reference ids responses are
//!   correlated by.

pub mod reference;
pub mod sender;
pub mod tree;

pub use reference::{RandomReferenceIds, ReferenceIdGenerator, SequentialReferenceIds};
pub use sender::{
    CommitResult, DEFAULT_MAX_OBJECTS, TreeSender, TreeSenderConfig, send_trees,
    send_trees_checked,
};
pub use tree::{DEFAULT_MAX_DEPTH, MAX_DEPTH_CEILING, Tree};
