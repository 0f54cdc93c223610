//! Batched sending of sObject trees that share a root type.
//!
//! The API caps how many records one request may create. `TreeSender` builds
//! a `Tree` per queued root, packs trees into requests that respect the cap,
//! sends them in order and maps the results back onto the records.
//!
//! By default everything must fit in a single request so the trees succeed or
//! fail together; anything larger is refused up front rather than silently
//! split. Opt into splitting with `allow_multiple_requests`.
//!
//! # Example
//!
//! ```ignore
//! let mut sender = TreeSender::new("Account", transport);
//! sender.add_roots([account_a, account_b])?;
//!
//! let result = sender.commit()?;
//! if !result.success() {
//!     for response in result.error_responses() { /* inspect, retry */ }
//! }
//! ```

use std::ops::Range;
use std::rc::Rc;

use forcemodel_core::{
    CompositeResponse, Error, FailedRequestError, RecordSet, Result, SObjectRef, Transport,
    TreeRequest, tree_endpoint,
};

use crate::reference::{RandomReferenceIds, ReferenceIdGenerator};
use crate::tree::{DEFAULT_MAX_DEPTH, Tree};

/// Default cap on records created by one request.
pub const DEFAULT_MAX_OBJECTS: usize = 200;

// ============================================================================
// Sender Configuration
// ============================================================================

/// Configuration for `TreeSender` behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSenderConfig {
    /// Whether trees may be spread over several requests.
    pub allow_multiple_requests: bool,
    /// Maximum number of records per request.
    pub max_objects: usize,
    /// Maximum nesting depth of each tree, clamped by `Tree::max_depth`.
    pub max_depth: usize,
}

impl Default for TreeSenderConfig {
    fn default() -> Self {
        Self {
            allow_multiple_requests: false,
            max_objects: DEFAULT_MAX_OBJECTS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TreeSenderConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or forbid splitting trees over several requests.
    #[must_use]
    pub fn allow_multiple_requests(mut self, allow: bool) -> Self {
        self.allow_multiple_requests = allow;
        self
    }

    /// Set the per-request record cap.
    #[must_use]
    pub fn max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    /// Set the per-tree depth limit.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// ============================================================================
// Commit Result
// ============================================================================

/// Outcome of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    error_responses: Vec<CompositeResponse>,
    requests_sent: usize,
    records_created: usize,
}

impl CommitResult {
    /// True iff no batch reported errors.
    pub fn success(&self) -> bool {
        self.error_responses.is_empty()
    }

    /// The raw error-bearing responses, one per failed batch, in send order.
    pub fn error_responses(&self) -> &[CompositeResponse] {
        &self.error_responses
    }

    /// Number of requests dispatched.
    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    /// Number of records that received an id.
    pub fn records_created(&self) -> usize {
        self.records_created
    }

    /// Convert into an error if any batch failed.
    pub fn into_result(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::FailedRequest(FailedRequestError::new(
                self.error_responses,
            )))
        }
    }
}

// ============================================================================
// Tree Sender
// ============================================================================

/// Queues roots of one table and creates them, with everything nested under
/// them, in as few requests as the limits allow.
///
/// Not meant to be shared between threads; run separate senders for
/// concurrent work.
#[derive(Debug)]
pub struct TreeSender<T: Transport> {
    transport: T,
    root_table: String,
    config: TreeSenderConfig,
    reference_ids: Rc<dyn ReferenceIdGenerator>,
    roots: RecordSet,
}

impl<T: Transport> TreeSender<T> {
    /// Create a sender for roots of `root_table` with default configuration.
    pub fn new(root_table: impl Into<String>, transport: T) -> Self {
        Self::with_config(root_table, transport, TreeSenderConfig::default())
    }

    /// Create a sender with custom configuration.
    pub fn with_config(
        root_table: impl Into<String>,
        transport: T,
        config: TreeSenderConfig,
    ) -> Self {
        Self {
            transport,
            root_table: root_table.into(),
            config,
            reference_ids: Rc::new(RandomReferenceIds),
            roots: RecordSet::new(),
        }
    }

    /// Use a custom reference id generator for every tree this sender builds.
    #[must_use]
    pub fn with_reference_ids(mut self, reference_ids: Rc<dyn ReferenceIdGenerator>) -> Self {
        self.reference_ids = reference_ids;
        self
    }

    /// Get a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Table every root must belong to.
    pub fn root_table(&self) -> &str {
        &self.root_table
    }

    /// Get the sender configuration.
    pub fn config(&self) -> &TreeSenderConfig {
        &self.config
    }

    /// Queued roots in insertion order.
    pub fn pending_roots(&self) -> &[SObjectRef] {
        self.roots.as_slice()
    }

    /// Number of queued roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// True if no roots are queued.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    // ========================================================================
    // Queueing
    // ========================================================================

    /// Queue one root. Adding the same record twice is a no-op.
    ///
    /// Fails if the record belongs to another table, or if a single request
    /// is required and the queue is already full.
    pub fn add_root(&mut self, record: SObjectRef) -> Result<()> {
        let table = record.table_name();
        if table != self.root_table {
            return Err(Error::TypeMismatch {
                expected: self.root_table.clone(),
                actual: table,
            });
        }
        if self.roots.contains(&record) {
            return Ok(());
        }
        if !self.config.allow_multiple_requests && self.roots.len() >= self.config.max_objects {
            return Err(Error::too_many_roots(format!(
                "Cannot have more than {} objects in one request",
                self.config.max_objects
            )));
        }
        self.roots.insert(record);
        Ok(())
    }

    /// Queue several roots, stopping at the first one that is refused.
    ///
    /// Roots queued before the failure stay queued.
    #[tracing::instrument(level = "debug", skip(self, records), fields(root_table = %self.root_table))]
    pub fn add_roots<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = SObjectRef>,
    {
        for record in records {
            self.add_root(record)?;
        }
        tracing::debug!(pending = self.roots.len(), "Queued roots");
        Ok(())
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Build, batch and send every queued root.
    ///
    /// Limit errors are raised before anything is sent. Batches are sent in
    /// order; records rejected by the API are reported in the result, not as
    /// an error. A transport failure aborts the commit immediately: batches
    /// already sent stay reconciled and later batches are not attempted.
    #[tracing::instrument(level = "debug", skip(self), fields(root_table = %self.root_table))]
    pub fn commit(&self) -> Result<CommitResult> {
        let max_objects = self.config.max_objects;
        let mut trees: Vec<Tree> = self
            .roots
            .iter()
            .map(|root| {
                Tree::new(root.clone())
                    .max_depth(self.config.max_depth)
                    .reference_ids(Rc::clone(&self.reference_ids))
            })
            .collect();

        let mut counts = Vec::with_capacity(trees.len());
        for tree in &mut trees {
            let count = tree.object_count()?;
            if count > max_objects {
                return Err(Error::too_many_objects(format!(
                    "A tree has more than {} objects",
                    max_objects
                )));
            }
            counts.push(count);
        }

        let batches = self.batch_trees(&counts)?;
        tracing::info!(
            roots = trees.len(),
            objects = counts.iter().sum::<usize>(),
            batches = batches.len(),
            "Sending composite tree requests"
        );

        let endpoint = tree_endpoint(&self.root_table);
        let mut result = CommitResult::default();
        for (index, range) in batches.into_iter().enumerate() {
            let batch = &trees[range];
            let payload = TreeRequest {
                records: batch.iter().filter_map(Tree::request).cloned().collect(),
            };
            if payload.records.is_empty() {
                tracing::debug!(batch = index, "Batch has nothing to create, skipping");
                continue;
            }

            let start = std::time::Instant::now();
            let response = match self.transport.send(&endpoint, &payload) {
                Ok(response) => response,
                Err(err) => match err.into_response() {
                    Ok(response) => response,
                    Err(err) => {
                        tracing::error!(batch = index, error = %err, "Composite tree request failed");
                        return Err(Error::Transport(err));
                    }
                },
            };
            result.requests_sent += 1;

            for tree in batch {
                result.records_created += tree.reconcile(&response);
            }

            tracing::info!(
                batch = index,
                objects = payload.node_count(),
                has_errors = response.has_errors,
                elapsed_ms = start.elapsed().as_millis(),
                "Composite tree request completed"
            );
            if response.has_errors {
                tracing::warn!(
                    batch = index,
                    failures = response.failures().count(),
                    "Composite tree request had errors"
                );
                result.error_responses.push(response);
            }
        }

        Ok(result)
    }

    /// Like `commit`, but fails with `Error::FailedRequest` if any batch had errors.
    ///
    /// Every batch is still attempted before the error is returned.
    pub fn commit_checked(&self) -> Result<CommitResult> {
        self.commit()?.into_result()
    }

    /// Greedily pack trees, in order, into batches of at most `max_objects`.
    fn batch_trees(&self, counts: &[usize]) -> Result<Vec<Range<usize>>> {
        let max_objects = self.config.max_objects;
        let mut batches: Vec<Range<usize>> = Vec::new();
        let mut batch_objects = 0;

        for (index, &count) in counts.iter().enumerate() {
            match batches.last_mut() {
                Some(current) if batch_objects + count <= max_objects => {
                    current.end = index + 1;
                    batch_objects += count;
                }
                Some(_) if !self.config.allow_multiple_requests => {
                    return Err(Error::too_many_objects(format!(
                        "Cannot have more than {} objects in one request",
                        max_objects
                    )));
                }
                _ => {
                    batches.push(index..index + 1);
                    batch_objects = count;
                }
            }
        }
        Ok(batches)
    }
}

/// Queue `roots` on a fresh sender and commit them.
pub fn send_trees<T, I>(
    transport: T,
    root_table: &str,
    roots: I,
    config: TreeSenderConfig,
) -> Result<CommitResult>
where
    T: Transport,
    I: IntoIterator<Item = SObjectRef>,
{
    let mut sender = TreeSender::with_config(root_table, transport, config);
    sender.add_roots(roots)?;
    sender.commit()
}

/// Like `send_trees`, but fails with `Error::FailedRequest` if any batch had errors.
pub fn send_trees_checked<T, I>(
    transport: T,
    root_table: &str,
    roots: I,
    config: TreeSenderConfig,
) -> Result<CommitResult>
where
    T: Transport,
    I: IntoIterator<Item = SObjectRef>,
{
    send_trees(transport, root_table, roots, config)?.into_result()
}

// ============================================================================
// Unit Tests
// ============================================================================
