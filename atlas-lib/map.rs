//! The live map store the change engine addresses.
//!
//! This is intentionally small: tile content keyed by position, houses keyed
//! by id, waypoints keyed by name. Rendering, IO and pathing live outside of
//! atlas-lib; the engine only needs lookups and the swap primitives below.

use std::collections::{
  HashMap,
  hash_map::Entry,
};

use atlas_core::{
  house::{
    House,
    HouseId,
  },
  position::Position,
  tile::Tile,
  waypoint::Waypoint,
};

use crate::versions::MapVersion;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Map {
  version:   MapVersion,
  tiles:     HashMap<Position, Tile>,
  houses:    HashMap<HouseId, House>,
  waypoints: HashMap<String, Waypoint>,
}

impl Map {
  pub fn new(version: MapVersion) -> Self {
    Self {
      version,
      ..Self::default()
    }
  }

  pub fn version(&self) -> MapVersion {
    self.version
  }

  pub fn tile(&self, position: Position) -> Option<&Tile> {
    self.tiles.get(&position)
  }

  pub fn tile_count(&self) -> usize {
    self.tiles.len()
  }

  /// Stores a tile at its own position, returning the previous one. Empty
  /// tiles vacate the position instead of being stored.
  pub fn set_tile(&mut self, tile: Tile) -> Option<Tile> {
    if tile.is_empty() {
      self.tiles.remove(&tile.position)
    } else {
      self.tiles.insert(tile.position, tile)
    }
  }

  pub fn remove_tile(&mut self, position: Position) -> Option<Tile> {
    self.tiles.remove(&position)
  }

  /// Exchanges `tile` with the stored tile at its position. A vacant
  /// position reads as [`Tile::empty`], and storing an empty tile vacates
  /// the position, so the exchange is involutive.
  pub fn swap_tile(&mut self, tile: &mut Tile) {
    match self.tiles.entry(tile.position) {
      Entry::Occupied(mut entry) => {
        std::mem::swap(entry.get_mut(), tile);
        if entry.get().is_empty() {
          entry.remove();
        }
      },
      Entry::Vacant(entry) => {
        let incoming = std::mem::replace(tile, Tile::empty(tile.position));
        if !incoming.is_empty() {
          entry.insert(incoming);
        }
      },
    }
  }

  pub fn add_house(&mut self, house: House) {
    self.houses.insert(house.id, house);
  }

  pub fn house(&self, id: HouseId) -> Option<&House> {
    self.houses.get(&id)
  }

  pub fn house_exit_mut(&mut self, id: HouseId) -> Option<&mut Option<Position>> {
    self.houses.get_mut(&id).map(|house| &mut house.exit)
  }

  pub fn add_waypoint(&mut self, waypoint: Waypoint) {
    self.waypoints.insert(waypoint.name.clone(), waypoint);
  }

  pub fn waypoint(&self, name: &str) -> Option<&Waypoint> {
    self.waypoints.get(name)
  }

  pub fn waypoint_position_mut(&mut self, name: &str) -> Option<&mut Position> {
    self
      .waypoints
      .get_mut(name)
      .map(|waypoint| &mut waypoint.position)
  }
}

#[cfg(test)]
mod test {
  use atlas_core::item::Item;

  use super::*;

  #[test]
  fn swap_tile_roundtrips_through_vacant_position() {
    let mut map = Map::default();
    let position = Position::new(10, 10, 7);

    let mut tile = Tile::empty(position).with_ground(Item::new(4526));
    map.swap_tile(&mut tile);
    assert!(tile.is_empty(), "payload should now hold the old (empty) tile");
    assert!(map.tile(position).is_some());

    map.swap_tile(&mut tile);
    assert!(!tile.is_empty(), "second swap restores the payload");
    assert!(map.tile(position).is_none(), "and vacates the position");
  }

  #[test]
  fn set_tile_drops_empty_tiles() {
    let mut map = Map::default();
    let position = Position::new(5, 5, 7);
    map.set_tile(Tile::empty(position).with_ground(Item::new(100)));
    assert_eq!(map.tile_count(), 1);

    map.set_tile(Tile::empty(position));
    assert_eq!(map.tile_count(), 0);
  }
}
