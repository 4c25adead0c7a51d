//! Actions and batches: the grouping layers of the history.
//!
//! An [`Action`] is an ordered, atomic group of changes; a [`BatchAction`]
//! is one visible history entry grouping actions, and the unit the queue
//! stores, merges and evicts.

use std::time::{
  Duration,
  Instant,
};

use crate::{
  change::Change,
  dirty::DirtyList,
  map::Map,
};

/// What kind of edit operation a history entry represents. Batches only
/// stack with batches of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
  Move,
  Select,
  DeleteTiles,
  CutTiles,
  PasteTiles,
  Randomize,
  Borderize,
  Draw,
  SwitchDoor,
  RotateItem,
  ChangeProperties,
}

/// An ordered, atomic group of changes.
///
/// Changes only ever address their own element, so commit and undo both
/// apply the swaps in insertion order; the `committed` flag toggles exactly
/// once per commit and once per undo.
#[derive(Debug)]
pub struct Action {
  kind:      ActionKind,
  committed: bool,
  changes:   Vec<Change>,
}

impl Action {
  pub fn new(kind: ActionKind) -> Self {
    Self {
      kind,
      committed: false,
      changes: Vec::new(),
    }
  }

  #[inline]
  pub fn kind(&self) -> ActionKind {
    self.kind
  }

  #[inline]
  pub fn is_committed(&self) -> bool {
    self.committed
  }

  pub fn size(&self) -> usize {
    self.changes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }

  /// Appends a change. Only valid while the action is uncommitted.
  pub fn add_change(&mut self, change: Change) {
    debug_assert!(!self.committed, "cannot extend a committed action");
    self.changes.push(change);
  }

  /// Applies every change's swap in insertion order. On an
  /// already-committed action this re-applies the swaps; that path is what
  /// [`Action::redo`] uses.
  pub fn commit(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    for change in &mut self.changes {
      change.swap(map, dirty);
    }
    self.committed = true;
  }

  /// Applies the same swaps again, returning the map to the state before
  /// the commit. Undoing an uncommitted action is a contract violation.
  pub fn undo(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    debug_assert!(self.committed, "cannot undo an action that was never committed");
    for change in &mut self.changes {
      change.swap(map, dirty);
    }
    self.committed = false;
  }

  pub fn redo(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    self.commit(map, dirty);
  }

  /// O(1) memory estimate used for budget bookkeeping.
  pub fn approx_memsize(&self) -> usize {
    size_of::<Self>() + self.changes.capacity() * size_of::<Change>()
  }

  /// Exact memory footprint, payloads included.
  pub fn memsize(&self) -> usize {
    size_of::<Self>()
      + self
        .changes
        .iter()
        .map(Change::memsize)
        .sum::<usize>()
  }
}

/// One visible history entry: an ordered group of actions committed and
/// undone as a unit.
///
/// The timestamp drives stacking: a batch whose timestamp is recent enough
/// can absorb the next same-kind batch instead of growing the history.
#[derive(Debug)]
pub struct BatchAction {
  kind:        ActionKind,
  timestamp:   Option<Instant>,
  memory_size: usize,
  actions:     Vec<Action>,
}

impl BatchAction {
  pub fn new(kind: ActionKind) -> Self {
    Self::new_at(kind, Instant::now())
  }

  pub fn new_at(kind: ActionKind, now: Instant) -> Self {
    Self {
      kind,
      timestamp: Some(now),
      memory_size: size_of::<Self>(),
      actions: Vec::new(),
    }
  }

  #[inline]
  pub fn kind(&self) -> ActionKind {
    self.kind
  }

  pub fn size(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  /// Cached memory estimate; kept current by the mutating operations.
  #[inline]
  pub fn memory_size(&self) -> usize {
    self.memory_size
  }

  /// Appends an uncommitted action. Empty actions are dropped.
  pub fn add_action(&mut self, action: Action) {
    debug_assert!(action.kind() == self.kind, "action kind must match its batch");
    debug_assert!(!action.is_committed(), "batched actions are committed by the batch");
    if action.is_empty() {
      return;
    }
    self.memory_size += action.approx_memsize();
    self.actions.push(action);
  }

  /// Commits `action` against the map, then appends it.
  pub fn add_and_commit_action(&mut self, mut action: Action, map: &mut Map, dirty: &mut DirtyList) {
    if action.is_empty() {
      return;
    }
    action.commit(map, dirty);
    self.memory_size += action.approx_memsize();
    self.actions.push(action);
  }

  /// Commits every not-yet-committed member in insertion order.
  pub(crate) fn commit(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    for action in &mut self.actions {
      if !action.is_committed() {
        action.commit(map, dirty);
      }
    }
  }

  /// Undoes every member in reverse insertion order.
  pub(crate) fn undo(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    for action in self.actions.iter_mut().rev() {
      action.undo(map, dirty);
    }
  }

  /// Re-commits every member in insertion order.
  pub(crate) fn redo(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    for action in &mut self.actions {
      action.redo(map, dirty);
    }
  }

  /// Transfers the other batch's actions into this one and refreshes the
  /// cached memory size.
  pub(crate) fn merge(&mut self, other: BatchAction) {
    self.actions.extend(other.actions);
    self.memory_size = size_of::<Self>()
      + self
        .actions
        .iter()
        .map(Action::approx_memsize)
        .sum::<usize>();
  }

  /// Clears the timestamp so this batch can never again absorb a stacking
  /// merge.
  pub fn reset_timer(&mut self) {
    self.timestamp = None;
  }

  pub(crate) fn touch(&mut self, now: Instant) {
    self.timestamp = Some(now);
  }

  /// Whether a batch of `kind` arriving at `now` may merge into this one.
  pub(crate) fn stacks_with(&self, kind: ActionKind, stacking_delay: Duration, now: Instant) -> bool {
    self.kind == kind
      && self
        .timestamp
        .is_some_and(|timestamp| now.duration_since(timestamp) < stacking_delay)
  }

  /// Exact memory footprint, payloads included.
  pub fn memsize(&self) -> usize {
    size_of::<Self>() + self.actions.iter().map(Action::memsize).sum::<usize>()
  }
}

#[cfg(test)]
mod test {
  use atlas_core::{
    item::Item,
    position::Position,
    tile::Tile,
  };

  use super::*;
  use crate::dirty::SessionId;

  fn draw_change(x: u16, y: u16, item: u16) -> Change {
    Change::tile(Tile::empty(Position::new(x, y, 7)).with_ground(Item::new(item)))
  }

  #[test]
  fn commit_then_undo_restores_the_map() {
    let mut map = Map::default();
    map.set_tile(Tile::empty(Position::new(10, 10, 7)).with_ground(Item::new(4526)));
    let before = map.clone();

    let mut action = Action::new(ActionKind::Draw);
    action.add_change(draw_change(10, 10, 106));
    action.add_change(draw_change(11, 10, 106));

    let mut commit_dirty = DirtyList::new(SessionId(0));
    action.commit(&mut map, &mut commit_dirty);
    assert!(action.is_committed());
    assert_ne!(map, before);
    let after = map.clone();

    let mut undo_dirty = DirtyList::new(SessionId(0));
    action.undo(&mut map, &mut undo_dirty);
    assert!(!action.is_committed());
    assert_eq!(map, before);

    // Both passes touch exactly the same positions.
    let committed: Vec<_> = commit_dirty.positions().collect();
    let undone: Vec<_> = undo_dirty.positions().collect();
    assert_eq!(committed, undone);

    // And redo brings back the committed state.
    let mut redo_dirty = DirtyList::new(SessionId(0));
    action.redo(&mut map, &mut redo_dirty);
    assert_eq!(map, after);
  }

  #[test]
  fn committing_an_empty_action_is_a_valid_noop() {
    let mut map = Map::default();
    let mut action = Action::new(ActionKind::Select);
    let mut dirty = DirtyList::new(SessionId(0));
    action.commit(&mut map, &mut dirty);
    assert!(action.is_committed());
    assert!(dirty.is_empty());
  }

  #[test]
  fn batch_undoes_in_reverse_order() {
    // Two actions touching the same position: the batch must unwind the
    // later one first to land back on the original value.
    let mut map = Map::default();
    map.set_tile(Tile::empty(Position::new(5, 5, 7)).with_ground(Item::new(1)));
    let before = map.clone();

    let mut batch = BatchAction::new(ActionKind::Draw);
    let mut dirty = DirtyList::new(SessionId(0));

    let mut first = Action::new(ActionKind::Draw);
    first.add_change(draw_change(5, 5, 2));
    batch.add_and_commit_action(first, &mut map, &mut dirty);

    let mut second = Action::new(ActionKind::Draw);
    second.add_change(draw_change(5, 5, 3));
    batch.add_and_commit_action(second, &mut map, &mut dirty);

    assert_eq!(map.tile(Position::new(5, 5, 7)).unwrap().ground.as_ref().unwrap().id, 3);

    let mut undo_dirty = DirtyList::new(SessionId(0));
    batch.undo(&mut map, &mut undo_dirty);
    assert_eq!(map, before);

    let mut redo_dirty = DirtyList::new(SessionId(0));
    batch.redo(&mut map, &mut redo_dirty);
    assert_eq!(map.tile(Position::new(5, 5, 7)).unwrap().ground.as_ref().unwrap().id, 3);
  }

  #[test]
  fn merge_transfers_actions_and_memory() {
    let mut batch = BatchAction::new(ActionKind::Draw);
    let mut action = Action::new(ActionKind::Draw);
    action.add_change(draw_change(1, 1, 10));
    batch.add_action(action);

    let mut other = BatchAction::new(ActionKind::Draw);
    let mut action = Action::new(ActionKind::Draw);
    action.add_change(draw_change(2, 1, 10));
    other.add_action(action);

    let merged_size = batch.memory_size() + other.memory_size() - size_of::<BatchAction>();
    batch.merge(other);
    assert_eq!(batch.size(), 2);
    assert_eq!(batch.memory_size(), merged_size);
  }

  #[test]
  fn empty_actions_are_dropped_from_batches() {
    let mut batch = BatchAction::new(ActionKind::Draw);
    batch.add_action(Action::new(ActionKind::Draw));
    assert!(batch.is_empty());
  }

  #[test]
  fn stacking_window() {
    let now = Instant::now();
    let mut batch = BatchAction::new_at(ActionKind::Draw, now);

    let later = now + Duration::from_secs(1);
    assert!(batch.stacks_with(ActionKind::Draw, Duration::from_secs(2), later));
    assert!(!batch.stacks_with(ActionKind::Draw, Duration::from_secs(1), later));
    assert!(!batch.stacks_with(ActionKind::Borderize, Duration::from_secs(2), later));
    // A zero window never stacks.
    assert!(!batch.stacks_with(ActionKind::Draw, Duration::ZERO, now));

    batch.reset_timer();
    assert!(!batch.stacks_with(ActionKind::Draw, Duration::from_secs(60), later));
  }
}
