//! Dirty tracking for commit/undo/redo passes.
//!
//! Every pass over the history fills a [`DirtyList`]: the deduplicated,
//! position-ordered set of touched positions plus a record per applied swap.
//! Downstream consumers use it to refresh rendering, the minimap and any
//! position-indexed caches for exactly the touched positions.

use std::collections::BTreeMap;

use atlas_core::{
  house::HouseId,
  position::{
    FloorMask,
    Position,
  },
};
use smallvec::SmallVec;

/// Opaque id of the editing session that produced a pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

/// One deduplicated position entry: packed x/y plus the touched floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyEntry {
  pub pos:    u32,
  pub floors: FloorMask,
}

/// What a single swap touched.
///
/// These are owned summaries rather than references into the action that
/// performed the swap, so a dirty list stays valid after history eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRecord {
  Tile { position: Position },
  HouseExit { house: HouseId },
  Waypoint { name: String, position: Position },
}

#[derive(Debug, Default)]
pub struct DirtyList {
  pub owner: SessionId,
  positions: BTreeMap<u32, FloorMask>,
  changes:   SmallVec<[ChangeRecord; 8]>,
}

impl DirtyList {
  pub fn new(owner: SessionId) -> Self {
    Self {
      owner,
      ..Self::default()
    }
  }

  /// Adds a touched position. Re-adding a position ORs its floor bit into
  /// the existing entry.
  pub fn add_position(&mut self, position: Position) {
    *self.positions.entry(position.packed_xy()).or_default() |= position.floor_mask();
  }

  pub fn add_change(&mut self, record: ChangeRecord) {
    self.changes.push(record);
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty() && self.changes.is_empty()
  }

  pub fn position_count(&self) -> usize {
    self.positions.len()
  }

  /// Touched positions in ascending packed x/y order.
  pub fn positions(&self) -> impl Iterator<Item = DirtyEntry> + '_ {
    self.positions.iter().map(|(&pos, &floors)| DirtyEntry { pos, floors })
  }

  pub fn changes(&self) -> &[ChangeRecord] {
    &self.changes
  }
}
