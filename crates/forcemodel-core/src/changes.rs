//! Track which fields of a record changed since it was last persisted.
//!
//! The composite tree layer only sends changed attributes, and reconciliation
//! clears the set once the server confirms the write.

/// A compact bitset marking "field changed" for field indices `0..len`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangedFields {
    len: usize,
    words: Vec<u64>,
}

impl ChangedFields {
    /// Create a clean (nothing changed) set for `len` fields.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            len,
            words: vec![0u64; len.div_ceil(64)],
        }
    }

    /// Grow the tracked range to cover `len` fields, keeping existing marks.
    pub fn resize(&mut self, len: usize) {
        if len > self.len {
            self.len = len;
            self.words.resize(len.div_ceil(64), 0);
        }
    }

    /// Number of fields tracked.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if no fields are tracked at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark a field index as changed. Out-of-range indices are ignored.
    pub fn mark(&mut self, idx: usize) {
        if idx >= self.len {
            return;
        }
        if let Some(word) = self.words.get_mut(idx / 64) {
            *word |= 1u64 << (idx % 64);
        }
    }

    /// Whether a field index is marked as changed.
    #[must_use]
    pub fn is_changed(&self, idx: usize) -> bool {
        idx < self.len
            && self
                .words
                .get(idx / 64)
                .is_some_and(|word| word & (1u64 << (idx % 64)) != 0)
    }

    /// True if any field is marked.
    #[must_use]
    pub fn any(&self) -> bool {
        self.words.iter().any(|word| *word != 0)
    }

    /// Indices of changed fields in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|idx| self.is_changed(*idx))
    }

    /// Forget every mark.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }
}
