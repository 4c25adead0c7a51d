//! The editing context.
//!
//! An [`Editor`] owns the live map and its undo history, builds actions and
//! batches, and hands the [`DirtyList`] produced by every pass to downstream
//! consumers (rendering, minimap, position-indexed caches). All queue access
//! goes through it on the single control thread driving edits.

use std::time::{
  Duration,
  Instant,
};

use crate::{
  action::{
    Action,
    ActionKind,
    BatchAction,
  },
  dirty::{
    DirtyList,
    SessionId,
  },
  map::Map,
  queue::{
    ActionQueue,
    QueueLimits,
  },
};

#[derive(Debug)]
pub struct Editor {
  session: SessionId,
  pub map: Map,
  queue:   ActionQueue,
}

impl Editor {
  pub fn new(session: SessionId, map: Map, limits: QueueLimits) -> Self {
    Self {
      session,
      map,
      queue: ActionQueue::new(session, limits),
    }
  }

  #[inline]
  pub fn session(&self) -> SessionId {
    self.session
  }

  pub fn queue(&self) -> &ActionQueue {
    &self.queue
  }

  pub fn new_action(&self, kind: ActionKind) -> Action {
    Action::new(kind)
  }

  pub fn new_batch(&self, kind: ActionKind) -> BatchAction {
    BatchAction::new(kind)
  }

  pub fn add_action(&mut self, action: Action, stacking_delay: Duration) -> DirtyList {
    self.queue.add_action(&mut self.map, action, stacking_delay)
  }

  pub fn add_action_at(&mut self, action: Action, stacking_delay: Duration, now: Instant) -> DirtyList {
    self
      .queue
      .add_action_at(&mut self.map, action, stacking_delay, now)
  }

  pub fn add_batch(&mut self, batch: BatchAction, stacking_delay: Duration) -> DirtyList {
    self.queue.add_batch(&mut self.map, batch, stacking_delay)
  }

  pub fn add_batch_at(&mut self, batch: BatchAction, stacking_delay: Duration, now: Instant) -> DirtyList {
    self
      .queue
      .add_batch_at(&mut self.map, batch, stacking_delay, now)
  }

  pub fn undo(&mut self) -> Option<DirtyList> {
    self.queue.undo(&mut self.map)
  }

  pub fn redo(&mut self) -> Option<DirtyList> {
    self.queue.redo(&mut self.map)
  }

  pub fn can_undo(&self) -> bool {
    self.queue.can_undo()
  }

  pub fn can_redo(&self) -> bool {
    self.queue.can_redo()
  }

  pub fn clear_history(&mut self) {
    self.queue.clear();
  }

  pub fn reset_timer(&mut self) {
    self.queue.reset_timer();
  }
}
