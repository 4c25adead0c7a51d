//! Benchmarks for history queue operations in atlas-lib.
//!
//! Run with: `cargo bench -p atlas-lib --bench queue`

use std::time::{
  Duration,
  Instant,
};

use atlas_core::{
  item::Item,
  position::Position,
  tile::Tile,
};
use atlas_lib::{
  action::{
    Action,
    ActionKind,
  },
  change::Change,
  dirty::SessionId,
  map::Map,
  queue::{
    ActionQueue,
    QueueLimits,
  },
};
use divan::{
  Bencher,
  black_box,
};

fn main() {
  divan::main();
}

fn draw_action(x: u16, y: u16) -> Action {
  let mut action = Action::new(ActionKind::Draw);
  action.add_change(Change::tile(
    Tile::empty(Position::new(x, y, 7)).with_ground(Item::new(4526)),
  ));
  action
}

fn filled_queue(edits: u16) -> (Map, ActionQueue) {
  let mut map = Map::default();
  let mut queue = ActionQueue::new(SessionId(0), QueueLimits::default());
  let now = Instant::now();
  for i in 0..edits {
    queue.add_action_at(&mut map, draw_action(i, 0), Duration::ZERO, now);
  }
  (map, queue)
}

#[divan::bench(args = [64, 512])]
fn push_batches(bencher: Bencher, edits: u16) {
  bencher
    .with_inputs(|| (Map::default(), ActionQueue::new(SessionId(0), QueueLimits::default())))
    .bench_local_values(|(mut map, mut queue)| {
      let now = Instant::now();
      for i in 0..edits {
        queue.add_action_at(&mut map, draw_action(i, 0), Duration::ZERO, now);
      }
      black_box(queue.len())
    });
}

#[divan::bench(args = [64, 512])]
fn stacked_pushes(bencher: Bencher, edits: u16) {
  bencher
    .with_inputs(|| (Map::default(), ActionQueue::new(SessionId(0), QueueLimits::default())))
    .bench_local_values(|(mut map, mut queue)| {
      let now = Instant::now();
      for i in 0..edits {
        queue.add_action_at(&mut map, draw_action(i, 0), Duration::from_secs(60), now);
      }
      black_box(queue.len())
    });
}

#[divan::bench(args = [64, 512])]
fn undo_redo_walk(bencher: Bencher, edits: u16) {
  bencher
    .with_inputs(|| filled_queue(edits))
    .bench_local_values(|(mut map, mut queue)| {
      while queue.undo(&mut map).is_some() {}
      while queue.redo(&mut map).is_some() {}
      black_box(queue.len())
    });
}
