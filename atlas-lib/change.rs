//! The atomic, reversible edit.
//!
//! A [`Change`] owns the payload it will exchange with the live map: a full
//! replacement tile, a house exit position, or a waypoint position. Commit
//! and undo share one involutive `swap` primitive; applying it twice
//! restores the original state, which is also why redo is a plain re-commit.

use atlas_core::{
  house::HouseId,
  position::Position,
  tile::Tile,
};

use crate::{
  dirty::{
    ChangeRecord,
    DirtyList,
  },
  map::Map,
};

/// Discriminant of a [`Change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
  Tile,
  MoveHouseExit,
  MoveWaypoint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
  /// Full replacement of the tile at the payload's position.
  Tile(Box<Tile>),
  /// Exchange of a house's exit position.
  HouseExit { house: HouseId, exit: Option<Position> },
  /// Exchange of a named waypoint's position.
  Waypoint { name: String, position: Position },
}

impl Change {
  #[must_use]
  pub fn tile(tile: Tile) -> Self {
    Change::Tile(Box::new(tile))
  }

  #[must_use]
  pub fn house_exit(house: HouseId, exit: Option<Position>) -> Self {
    Change::HouseExit { house, exit }
  }

  #[must_use]
  pub fn waypoint(name: impl Into<String>, position: Position) -> Self {
    Change::Waypoint {
      name: name.into(),
      position,
    }
  }

  pub fn kind(&self) -> ChangeKind {
    match self {
      Change::Tile(_) => ChangeKind::Tile,
      Change::HouseExit { .. } => ChangeKind::MoveHouseExit,
      Change::Waypoint { .. } => ChangeKind::MoveWaypoint,
    }
  }

  /// Memory footprint of this change, payload included.
  pub fn memsize(&self) -> usize {
    match self {
      Change::Tile(tile) => size_of::<Self>() + tile.memsize(),
      Change::HouseExit { .. } => size_of::<Self>(),
      Change::Waypoint { name, .. } => size_of::<Self>() + name.capacity(),
    }
  }

  /// Exchanges the owned payload with the corresponding live value and
  /// records the touched position(s) in `dirty`.
  ///
  /// The addressed element is guaranteed to exist while this change is
  /// pending in history; a missing house/waypoint means that contract was
  /// broken upstream, and the swap is skipped to keep payload and live
  /// state consistent.
  pub(crate) fn swap(&mut self, map: &mut Map, dirty: &mut DirtyList) {
    match self {
      Change::Tile(tile) => {
        let position = tile.position;
        map.swap_tile(tile);
        dirty.add_position(position);
        dirty.add_change(ChangeRecord::Tile { position });
      },
      Change::HouseExit { house, exit } => {
        let Some(live) = map.house_exit_mut(*house) else {
          tracing::warn!(house = house.0, "house exit swap targets a missing house");
          return;
        };
        if let Some(position) = *live {
          dirty.add_position(position);
        }
        if let Some(position) = *exit {
          dirty.add_position(position);
        }
        std::mem::swap(live, exit);
        dirty.add_change(ChangeRecord::HouseExit { house: *house });
      },
      Change::Waypoint { name, position } => {
        let Some(live) = map.waypoint_position_mut(name) else {
          tracing::warn!(name = name.as_str(), "waypoint swap targets a missing waypoint");
          return;
        };
        dirty.add_position(*live);
        dirty.add_position(*position);
        std::mem::swap(live, position);
        dirty.add_change(ChangeRecord::Waypoint {
          name: name.clone(),
          position: *live,
        });
      },
    }
  }
}

#[cfg(test)]
mod test {
  use atlas_core::{
    house::House,
    item::Item,
    waypoint::Waypoint,
  };

  use super::*;
  use crate::dirty::SessionId;

  #[test]
  fn tile_swap_is_involutive() {
    let mut map = Map::default();
    let position = Position::new(100, 100, 7);
    map.set_tile(Tile::empty(position).with_ground(Item::new(4526)));
    let before = map.clone();

    let mut change = Change::tile(Tile::empty(position).with_ground(Item::new(106)));
    let mut dirty = DirtyList::new(SessionId(0));

    change.swap(&mut map, &mut dirty);
    assert_eq!(map.tile(position).unwrap().ground.as_ref().unwrap().id, 106);

    change.swap(&mut map, &mut dirty);
    assert_eq!(map, before);
  }

  #[test]
  fn house_exit_swap_exchanges_both_ways() {
    let mut map = Map::default();
    let old_exit = Position::new(20, 20, 7);
    let new_exit = Position::new(30, 30, 7);
    map.add_house(House::new(HouseId(1), "Villa").with_exit(old_exit));

    let mut change = Change::house_exit(HouseId(1), Some(new_exit));
    let mut dirty = DirtyList::new(SessionId(0));
    change.swap(&mut map, &mut dirty);

    assert_eq!(map.house(HouseId(1)).unwrap().exit, Some(new_exit));
    assert_eq!(change, Change::house_exit(HouseId(1), Some(old_exit)));
    // Both the old and the new exit positions need a refresh.
    assert_eq!(dirty.position_count(), 2);
  }

  #[test]
  fn waypoint_swap_exchanges_positions() {
    let mut map = Map::default();
    let old_pos = Position::new(1, 2, 7);
    let new_pos = Position::new(3, 4, 7);
    map.add_waypoint(Waypoint::new("spawn", old_pos));

    let mut change = Change::waypoint("spawn", new_pos);
    let mut dirty = DirtyList::new(SessionId(0));
    change.swap(&mut map, &mut dirty);

    assert_eq!(map.waypoint("spawn").unwrap().position, new_pos);
    assert_eq!(change, Change::waypoint("spawn", old_pos));
  }

  #[test]
  fn missing_house_is_skipped() {
    let mut map = Map::default();
    let mut change = Change::house_exit(HouseId(9), Some(Position::new(1, 1, 7)));
    let mut dirty = DirtyList::new(SessionId(0));
    change.swap(&mut map, &mut dirty);
    assert!(dirty.is_empty());
    assert_eq!(change, Change::house_exit(HouseId(9), Some(Position::new(1, 1, 7))));
  }
}
