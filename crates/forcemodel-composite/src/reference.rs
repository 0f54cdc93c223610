//! Reference id generation.
//!
//! Every new record in a request gets a reference id the response is
//! correlated by. Ids must be unique across a whole request, so one generator
//! is shared by every tree a sender builds.

use std::cell::Cell;
use std::fmt;

use uuid::Uuid;

/// Mints reference ids.
pub trait ReferenceIdGenerator: fmt::Debug {
    /// Produce a fresh id, distinct from every id produced before.
    fn next_reference(&self) -> String;
}

/// Random UUID (v4) reference ids. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReferenceIds;

impl ReferenceIdGenerator for RandomReferenceIds {
    fn next_reference(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix1`, `prefix2`, ... ids.
#[derive(Debug)]
pub struct SequentialReferenceIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialReferenceIds {
    /// Start counting at 1 with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }

    /// How many ids were minted so far.
    pub fn issued(&self) -> u64 {
        self.next.get() - 1
    }
}

impl Default for SequentialReferenceIds {
    fn default() -> Self {
        Self::new("ref")
    }
}

impl ReferenceIdGenerator for SequentialReferenceIds {
    fn next_reference(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}{}", self.prefix, n)
    }
}
