//! A single rooted sObject tree.
//!
//! A `Tree` walks child-direction associations from its root, turns every
//! unpersisted record into a subrequest node with a fresh reference id, and
//! remembers which record each id was minted for so a response can be mapped
//! back onto the object graph.
//!
//! Depth is bounded by `max_depth`. The same bound is what stops cyclic
//! graphs: a record that reaches itself keeps nesting deeper until the limit
//! is hit, and fails exactly like an over-deep acyclic tree. Traversal
//! recurses once per level, so the limit itself is capped at
//! `MAX_DEPTH_CEILING`.

use std::collections::HashMap;
use std::rc::Rc;

use forcemodel_core::{
    CompositeResponse, Direction, Error, Result, SObjectRef, SubrequestNode, child_relationships,
    loaded_associations,
};

use crate::reference::{RandomReferenceIds, ReferenceIdGenerator};

/// Default maximum nesting depth of a tree.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Largest depth limit a tree accepts. Larger values are clamped to it.
pub const MAX_DEPTH_CEILING: usize = 64;

/// Memoized result of the first successful traversal.
#[derive(Debug)]
struct Built {
    request: Option<SubrequestNode>,
    object_count: usize,
    objects: HashMap<String, SObjectRef>,
}

/// One root record and everything nested under it.
#[derive(Debug)]
pub struct Tree {
    root: Option<SObjectRef>,
    max_depth: usize,
    reference_ids: Rc<dyn ReferenceIdGenerator>,
    built: Option<Built>,
}

impl Tree {
    /// Create an unbuilt tree with the default depth limit and random reference ids.
    pub fn new(root: impl Into<Option<SObjectRef>>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            reference_ids: Rc::new(RandomReferenceIds),
            built: None,
        }
    }

    /// Set the depth limit, clamped to `1..=MAX_DEPTH_CEILING`.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.clamp(1, MAX_DEPTH_CEILING);
        self
    }

    /// Use a shared reference id generator.
    #[must_use]
    pub fn reference_ids(mut self, reference_ids: Rc<dyn ReferenceIdGenerator>) -> Self {
        self.reference_ids = reference_ids;
        self
    }

    /// The root record.
    pub fn root(&self) -> Option<&SObjectRef> {
        self.root.as_ref()
    }

    /// The configured depth limit.
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Whether the tree was already traversed.
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Traverse the graph (once) and return the root's subrequest node.
    ///
    /// Returns `None` when the root is absent or already persisted. A failed
    /// traversal is not memoized, so calling again re-traverses.
    pub fn build(&mut self) -> Result<Option<&SubrequestNode>> {
        if self.built.is_none() {
            let mut objects = HashMap::new();
            let request = match self.root.as_ref() {
                Some(root) => self.traverse(root, 1, &mut objects)?,
                None => None,
            };
            let object_count = request.as_ref().map_or(0, SubrequestNode::node_count);
            tracing::debug!(
                root = %self.root.as_ref().map_or_else(|| "<none>".to_string(), SObjectRef::to_string),
                objects = object_count,
                max_depth = self.max_depth,
                "Built composite tree"
            );
            self.built = Some(Built {
                request,
                object_count,
                objects,
            });
        }
        Ok(self.built.as_ref().and_then(|built| built.request.as_ref()))
    }

    /// The built root node, without traversing.
    pub fn request(&self) -> Option<&SubrequestNode> {
        self.built.as_ref().and_then(|built| built.request.as_ref())
    }

    /// Number of subrequest nodes in the tree, building it if needed.
    pub fn object_count(&mut self) -> Result<usize> {
        self.build()?;
        Ok(self.built.as_ref().map_or(0, |built| built.object_count))
    }

    /// The record a reference id was minted for.
    ///
    /// Always `None` before the tree is built.
    pub fn find_object(&self, reference_id: &str) -> Option<&SObjectRef> {
        self.built.as_ref()?.objects.get(reference_id)
    }

    /// Reference ids minted by this tree.
    pub fn reference_ids_minted(&self) -> impl Iterator<Item = &str> {
        self.built
            .iter()
            .flat_map(|built| built.objects.keys().map(String::as_str))
    }

    /// Copy server-issued ids from `response` onto the records of this tree.
    ///
    /// For each entry carrying both a reference id known to this tree and an
    /// id: the record gets the id, every loaded child gets it in the foreign
    /// key pointing back, and the record's pending changes are cleared.
    /// Entries with errors, missing entries, and entries belonging to other
    /// trees leave records untouched. Returns how many records were updated.
    pub fn reconcile(&self, response: &CompositeResponse) -> usize {
        let mut reconciled = 0;
        for entry in &response.results {
            let (Some(reference_id), Some(id)) = (entry.reference_id.as_deref(), entry.id.as_deref())
            else {
                continue;
            };
            let Some(record) = self.find_object(reference_id) else {
                continue;
            };

            record.borrow_mut().set_id(id);
            for association in loaded_associations(record, Direction::Child) {
                let Some(foreign_key) = association.info.foreign_key else {
                    tracing::debug!(
                        relationship = association.info.name,
                        "Association declares no foreign key, children not linked"
                    );
                    continue;
                };
                for child in &association.records {
                    child.borrow_mut().write_foreign_key(foreign_key, id);
                }
            }
            record.borrow_mut().clear_changes();
            reconciled += 1;
        }
        reconciled
    }

    fn traverse(
        &self,
        record: &SObjectRef,
        depth: usize,
        objects: &mut HashMap<String, SObjectRef>,
    ) -> Result<Option<SubrequestNode>> {
        if record.is_persisted() {
            return Ok(None);
        }
        self.check_depth(depth)?;

        let reference_id = self.reference_ids.next_reference();
        let mut node = {
            let borrowed = record.borrow();
            SubrequestNode::new(
                borrowed.table_name(),
                reference_id.clone(),
                borrowed.pending_attributes(),
            )
        };

        for (wire_name, children) in child_relationships(record) {
            let mut records = Vec::with_capacity(children.len());
            for child in &children {
                if let Some(child_node) = self.traverse(child, depth + 1, objects)? {
                    records.push(child_node);
                }
            }
            if !records.is_empty() {
                node.attach_children(wire_name, records);
            }
        }

        objects.insert(reference_id, record.clone());
        Ok(Some(node))
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            let root = self
                .root
                .as_ref()
                .map_or_else(|| "<none>".to_string(), SObjectRef::to_string);
            return Err(Error::max_depth(format!(
                "Tree with root {} exceeds max depth of {}",
                root, self.max_depth
            )));
        }
        Ok(())
    }
}
