//! Surrogate id minting.
//!
//! The engine only needs ids that are unique and never reused; the format is
//! up to the embedding application. Storage backends typically mint UUIDs.

use crate::SurrogateId;

/// Produces a fresh surrogate id for every newly created record.
pub trait IdGenerator {
    fn next_id(&mut self) -> SurrogateId;
}

impl<F> IdGenerator for F
where
    F: FnMut() -> SurrogateId,
{
    fn next_id(&mut self) -> SurrogateId {
        self()
    }
}

/// Deterministic ids of the form `{prefix}-{n}`, starting at 1.
///
/// Unique only within one generator; share a single instance (or distinct
/// prefixes) across passes that write to the same store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Number of ids minted so far.
    pub fn minted(&self) -> u64 {
        self.next - 1
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> SurrogateId {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
