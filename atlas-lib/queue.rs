//! The linear undo/redo history.
//!
//! Batches below the cursor are applied; batches at and above it have been
//! undone but are retained for redo. Pushing while a redo branch is pending
//! destroys that branch; history never forks. The queue also enforces the
//! history budget, evicting oldest entries when memory or entry caps are
//! exceeded.

use std::{
  collections::VecDeque,
  time::{
    Duration,
    Instant,
  },
};

use crate::{
  action::{
    Action,
    BatchAction,
  },
  dirty::{
    DirtyList,
    SessionId,
  },
  map::Map,
};

/// Default history memory budget, in bytes.
pub const DEFAULT_MAX_MEMORY: usize = 40 * 1024 * 1024;
/// Default cap on the number of history entries.
pub const DEFAULT_MAX_ENTRIES: usize = 400;

/// Bounds on how much history the queue may retain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
  pub max_memory:  usize,
  pub max_entries: usize,
}

impl Default for QueueLimits {
  fn default() -> Self {
    Self {
      max_memory:  DEFAULT_MAX_MEMORY,
      max_entries: DEFAULT_MAX_ENTRIES,
    }
  }
}

#[derive(Debug)]
pub struct ActionQueue {
  batches:     VecDeque<BatchAction>,
  current:     usize,
  memory_size: usize,
  limits:      QueueLimits,
  session:     SessionId,
}

impl ActionQueue {
  pub fn new(session: SessionId, limits: QueueLimits) -> Self {
    Self {
      batches: VecDeque::new(),
      current: 0,
      memory_size: 0,
      limits,
      session,
    }
  }

  pub fn len(&self) -> usize {
    self.batches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.batches.is_empty()
  }

  /// Running total of the cached batch memory estimates.
  pub fn memory_size(&self) -> usize {
    self.memory_size
  }

  pub fn limits(&self) -> QueueLimits {
    self.limits
  }

  #[inline]
  pub fn can_undo(&self) -> bool {
    self.current > 0
  }

  #[inline]
  pub fn can_redo(&self) -> bool {
    self.current < self.batches.len()
  }

  /// Commits `batch` against the map and records it in history.
  ///
  /// If nothing is pending redo and the top entry is a same-kind batch
  /// whose timestamp is younger than `stacking_delay`, the batch merges
  /// into that entry instead of growing the history. Otherwise the stale
  /// redo branch is destroyed and the batch is appended. Either way the
  /// history budget is enforced afterwards.
  pub fn add_batch(&mut self, map: &mut Map, batch: BatchAction, stacking_delay: Duration) -> DirtyList {
    self.add_batch_at(map, batch, stacking_delay, Instant::now())
  }

  pub fn add_batch_at(
    &mut self,
    map: &mut Map,
    mut batch: BatchAction,
    stacking_delay: Duration,
    now: Instant,
  ) -> DirtyList {
    debug_assert!(self.current <= self.batches.len());

    let mut dirty = DirtyList::new(self.session);
    if batch.is_empty() {
      return dirty;
    }

    batch.commit(map, &mut dirty);

    // Stacking is only attempted on the top entry, and only while no redo
    // branch is pending.
    let stacks = self.current == self.batches.len()
      && self
        .batches
        .back()
        .is_some_and(|top| top.stacks_with(batch.kind(), stacking_delay, now));

    if stacks {
      if let Some(top) = self.batches.back_mut() {
        self.memory_size -= top.memory_size();
        top.merge(batch);
        top.touch(now);
        self.memory_size += top.memory_size();
        tracing::trace!(kind = ?top.kind(), actions = top.size(), "stacked batch into top history entry");
      }
    } else {
      self.truncate_redo();
      batch.touch(now);
      self.memory_size += batch.memory_size();
      self.batches.push_back(batch);
      self.current = self.batches.len();
    }

    self.enforce_limits();
    dirty
  }

  /// Single-action convenience form: wraps `action` in a batch of its own
  /// kind and funnels it through [`ActionQueue::add_batch`].
  pub fn add_action(&mut self, map: &mut Map, action: Action, stacking_delay: Duration) -> DirtyList {
    self.add_action_at(map, action, stacking_delay, Instant::now())
  }

  pub fn add_action_at(
    &mut self,
    map: &mut Map,
    action: Action,
    stacking_delay: Duration,
    now: Instant,
  ) -> DirtyList {
    let mut batch = BatchAction::new_at(action.kind(), now);
    batch.add_action(action);
    self.add_batch_at(map, batch, stacking_delay, now)
  }

  /// Steps the cursor back and undoes the batch it now points at. `None`
  /// when there is nothing to undo.
  pub fn undo(&mut self, map: &mut Map) -> Option<DirtyList> {
    if self.current == 0 {
      return None;
    }
    self.current -= 1;
    let mut dirty = DirtyList::new(self.session);
    if let Some(batch) = self.batches.get_mut(self.current) {
      batch.undo(map, &mut dirty);
    }
    Some(dirty)
  }

  /// Redoes the batch at the cursor and steps forward. `None` when there is
  /// nothing to redo.
  pub fn redo(&mut self, map: &mut Map) -> Option<DirtyList> {
    if self.current == self.batches.len() {
      return None;
    }
    let mut dirty = DirtyList::new(self.session);
    if let Some(batch) = self.batches.get_mut(self.current) {
      batch.redo(map, &mut dirty);
    }
    self.current += 1;
    Some(dirty)
  }

  /// Drops all history.
  pub fn clear(&mut self) {
    self.batches.clear();
    self.current = 0;
    self.memory_size = 0;
  }

  /// Clears the top batch's timer so the next push can never stack into it.
  pub fn reset_timer(&mut self) {
    if let Some(top) = self.batches.back_mut() {
      top.reset_timer();
    }
  }

  fn truncate_redo(&mut self) {
    while self.current < self.batches.len() {
      if let Some(dropped) = self.batches.pop_back() {
        self.memory_size -= dropped.memory_size();
      }
    }
  }

  fn enforce_limits(&mut self) {
    while self.memory_size > self.limits.max_memory && !self.batches.is_empty() {
      self.evict_oldest();
    }
    while self.batches.len() > self.limits.max_entries {
      self.evict_oldest();
    }
  }

  fn evict_oldest(&mut self) {
    if let Some(batch) = self.batches.pop_front() {
      self.memory_size -= batch.memory_size();
      self.current = self.current.saturating_sub(1);
      tracing::debug!(
        kind = ?batch.kind(),
        freed = batch.memory_size(),
        remaining = self.batches.len(),
        "evicted oldest history entry"
      );
    }
  }
}
