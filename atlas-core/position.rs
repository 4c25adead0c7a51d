use std::fmt;

use bitflags::bitflags;
use serde::{
  Deserialize,
  Serialize,
};

/// Highest floor a map position can address.
pub const MAP_MAX_FLOOR: u8 = 15;

/// A single point on the map. `x`/`y` are horizontal coordinates, `z` is the
/// floor (0 is the top floor, [`MAP_MAX_FLOOR`] the bottom).
#[derive(
  Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
  pub x: u16,
  pub y: u16,
  pub z: u8,
}

impl Position {
  pub const fn new(x: u16, y: u16, z: u8) -> Self {
    Self { x, y, z }
  }

  /// Packs x/y into a single sort key: x in the high half, y in the low half.
  ///
  /// This is the key dirty lists deduplicate and order by.
  #[inline]
  pub const fn packed_xy(self) -> u32 {
    (self.x as u32) << 16 | self.y as u32
  }

  #[inline]
  pub const fn is_valid(self) -> bool {
    self.z <= MAP_MAX_FLOOR
  }

  /// The floor mask containing only this position's floor.
  #[inline]
  pub const fn floor_mask(self) -> FloorMask {
    FloorMask::floor(self.z)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {}, {})", self.x, self.y, self.z)
  }
}

bitflags! {
  /// A set of floors, bit `z` standing for floor `z`.
  #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
  pub struct FloorMask: u16 {
    const ALL = u16::MAX;
  }
}

impl FloorMask {
  /// The mask containing only floor `z`. Out-of-range floors clamp to
  /// [`MAP_MAX_FLOOR`].
  pub const fn floor(z: u8) -> Self {
    let z = if z > MAP_MAX_FLOOR { MAP_MAX_FLOOR } else { z };
    Self::from_bits_retain(1 << z)
  }
}
