use std::fmt;

/// Stable identity of one logical block, independent of its grid position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(u64);

impl BlockId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic allocator for [`BlockId`]s. Identities are never reused.
#[derive(Debug, Default)]
pub struct BlockIdAllocator {
    next: u64,
}

impl BlockIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> BlockId {
        let id = BlockId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
