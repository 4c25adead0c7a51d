use bitflags::bitflags;

use crate::{
  house::HouseId,
  item::Item,
  position::Position,
};

bitflags! {
  /// Zone flags stored on a tile.
  #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
  pub struct TileFlags: u32 {
    const PROTECTION_ZONE = 1 << 0;
    const NO_PVP          = 1 << 2;
    const NO_LOGOUT       = 1 << 3;
    const PVP_ZONE        = 1 << 4;
  }
}

/// The full content of one map position: ground, item stack, house
/// membership and zone flags.
///
/// "No tile here" is represented by an empty tile, so exchanging tile values
/// is total: swapping content in and out of a vacant position round-trips
/// exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
  pub position: Position,
  pub ground:   Option<Item>,
  pub items:    Vec<Item>,
  pub house_id: Option<HouseId>,
  pub flags:    TileFlags,
}

impl Tile {
  #[must_use]
  pub fn empty(position: Position) -> Self {
    Self {
      position,
      ground: None,
      items: Vec::new(),
      house_id: None,
      flags: TileFlags::empty(),
    }
  }

  pub fn with_ground(mut self, ground: Item) -> Self {
    self.ground = Some(ground);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.ground.is_none() && self.items.is_empty() && self.house_id.is_none() && self.flags.is_empty()
  }

  pub fn add_item(&mut self, item: Item) {
    self.items.push(item);
  }

  /// Exact heap footprint, used by the history memory budget.
  pub fn memsize(&self) -> usize {
    size_of::<Self>()
      + self.ground.as_ref().map_or(0, |ground| ground.attributes.memsize())
      + self.items.capacity() * size_of::<Item>()
      + self
        .items
        .iter()
        .map(|item| item.attributes.memsize())
        .sum::<usize>()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn emptiness() {
    let pos = Position::new(100, 100, 7);
    assert!(Tile::empty(pos).is_empty());

    let mut tile = Tile::empty(pos);
    tile.flags |= TileFlags::PROTECTION_ZONE;
    assert!(!tile.is_empty());

    let tile = Tile::empty(pos).with_ground(Item::new(4526));
    assert!(!tile.is_empty());
  }

  #[test]
  fn memsize_grows_with_content() {
    let pos = Position::new(1, 1, 7);
    let empty = Tile::empty(pos).memsize();

    let mut tile = Tile::empty(pos).with_ground(Item::new(4526));
    tile.add_item(Item::new(2173).with_attribute("text", "engraved"));
    assert!(tile.memsize() > empty);
  }
}
