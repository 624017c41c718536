use serde::{Deserialize, Serialize};

/// Stable identifier for a bubble in the active collection.
///
/// Ids are never recycled within a simulation instance, so an image result that arrives
/// after its bubble was removed (or after a reseed) can never be applied to a stranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BubbleId(u64);

impl BubbleId {
    pub fn new(id: u64) -> Self {
        BubbleId(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// IdAllocator hands out monotonically increasing bubble ids
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_id: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { next_id: 0 }
    }

    /// Allocate the next id
    pub fn next(&mut self) -> BubbleId {
        let id = self.next_id;
        self.next_id += 1;
        BubbleId(id)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next_id
    }
}
