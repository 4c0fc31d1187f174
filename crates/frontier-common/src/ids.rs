//! ID types for placed world objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::ChunkCoord;

/// Identifies a placed object by its owning chunk and its index in that
/// chunk's generated list.
///
/// Derived from generation order, so the same seed always yields the same
/// ids. Ordering is by chunk, then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    /// Chunk that generated the object
    pub chunk: ChunkCoord,
    /// Index into the chunk's object list
    pub index: u32,
}

impl ObjectId {
    /// Creates an object ID.
    #[must_use]
    pub const fn new(chunk: ChunkCoord, index: u32) -> Self {
        Self { chunk, index }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.chunk, self.index)
    }
}
