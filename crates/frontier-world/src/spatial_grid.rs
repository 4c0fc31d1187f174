//! Uniform spatial grid over the XZ plane.
//!
//! Objects are bucketed by [`CellKey`]; proximity queries look at the 3×3
//! block of cells around a point, so their cost does not grow with the number
//! of live objects. An object whose registered position sits just outside that
//! window is missed even if its footprint reaches in; the cell size must stay
//! larger than any collision reach for the sweep to be exact.
//!
//! The grid is not internally synchronized. Callers that generate or query
//! from several threads must wrap it in a lock.

use ahash::{AHashMap, AHashSet};
use frontier_common::{CellKey, ObjectId};
use glam::Vec3;
use tracing::warn;

/// Cell-bucketed index of live object ids.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: AHashMap<CellKey, AHashSet<ObjectId>>,
    /// Side table of each registered object's current cell.
    object_cells: AHashMap<ObjectId, CellKey>,
}

impl SpatialGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
            object_cells: AHashMap::new(),
        }
    }

    /// Side length of a cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing `position`.
    #[must_use]
    pub fn cell_for(&self, position: Vec3) -> CellKey {
        CellKey::containing(position, self.cell_size)
    }

    /// Registers `id` at `position`, or in `hint` when the caller already
    /// knows the cell.
    ///
    /// Returns `true` if the id was not already in that cell. Adding an id
    /// that is registered elsewhere moves it.
    pub fn add(&mut self, id: ObjectId, position: Vec3, hint: Option<CellKey>) -> bool {
        let key = hint.unwrap_or_else(|| self.cell_for(position));
        match self.object_cells.get(&id) {
            Some(&current) if current == key => return false,
            Some(&current) => {
                self.detach(id, current);
            },
            None => {},
        }
        let inserted = self.cells.entry(key).or_default().insert(id);
        self.object_cells.insert(id, key);
        inserted
    }

    /// Unregisters `id`.
    ///
    /// Uses the cached cell; falls back to the cell of `position` when the
    /// id has no cached cell. With neither, logs and does nothing.
    pub fn remove(&mut self, id: ObjectId, position: Option<Vec3>) -> bool {
        let key = match self.object_cells.remove(&id) {
            Some(key) => key,
            None => match position {
                Some(position) => self.cell_for(position),
                None => {
                    warn!("Spatial grid: cannot resolve a cell for {id}, nothing removed");
                    return false;
                },
            },
        };
        self.detach(id, key)
    }

    /// Moves `id` to the cell of `position` if it changed.
    ///
    /// Returns `true` when the object changed cell (or was not registered).
    pub fn update(&mut self, id: ObjectId, position: Vec3) -> bool {
        let key = self.cell_for(position);
        if self.object_cells.get(&id) == Some(&key) {
            return false;
        }
        self.add(id, position, Some(key));
        true
    }

    /// Ids registered in the 3×3 cells around `position`, sorted.
    #[must_use]
    pub fn query_nearby(&self, position: Vec3) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.query_nearby_into(position, &mut out);
        out
    }

    /// Like [`Self::query_nearby`] but reuses `out` (cleared first).
    pub fn query_nearby_into(&self, position: Vec3, out: &mut Vec<ObjectId>) {
        out.clear();
        for key in self.cell_for(position).neighborhood() {
            if let Some(ids) = self.cells.get(&key) {
                out.extend(ids.iter().copied());
            }
        }
        out.sort_unstable();
    }

    /// Cell `id` is registered in.
    #[must_use]
    pub fn cell_of(&self, id: ObjectId) -> Option<CellKey> {
        self.object_cells.get(&id).copied()
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.object_cells.contains_key(&id)
    }

    /// Number of registered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.object_cells.len()
    }

    /// Whether the grid holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object_cells.is_empty()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.object_cells.clear();
    }

    fn detach(&mut self, id: ObjectId, key: CellKey) -> bool {
        let Some(ids) = self.cells.get_mut(&key) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            self.cells.remove(&key);
        }
        removed
    }
}
