use smartstring::{LazyCompact, SmartString};

pub mod attributes;
pub mod house;
pub mod item;
pub mod position;
pub mod tile;
pub mod waypoint;

pub type Tendril = SmartString<LazyCompact>;
