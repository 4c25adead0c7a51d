//! Item attribute storage.
//!
//! Attributes are a small, lazily allocated key-value map attached to items.
//! Values are a tagged sum type ([`AttributeValue`]) with plain value
//! semantics, and the map round-trips through the compact binary layout used
//! by map files: a `u16` entry count, `u16`-length-prefixed keys, and values
//! encoded as a one-byte tag followed by the payload.
//!
//! Decoding never panics and never yields a partially constructed map: a
//! truncated or malformed stream reports an [`AttributeError`] and the whole
//! map is discarded by the caller.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::Tendril;

pub type Result<T> = std::result::Result<T, AttributeError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
  #[error("attribute stream ended unexpectedly")]
  UnexpectedEof,
  #[error("unknown attribute tag {0}")]
  UnknownTag(u8),
  #[error("attribute key or value is not valid utf-8")]
  InvalidUtf8,
}

const TAG_STRING: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_BOOL: u8 = 4;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
  String(Tendril),
  Int(i32),
  Float(f32),
  Bool(bool),
}

impl AttributeValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      AttributeValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i32> {
    match self {
      AttributeValue::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_float(&self) -> Option<f32> {
    match self {
      AttributeValue::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      AttributeValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  fn tag(&self) -> u8 {
    match self {
      AttributeValue::String(_) => TAG_STRING,
      AttributeValue::Int(_) => TAG_INT,
      AttributeValue::Float(_) => TAG_FLOAT,
      AttributeValue::Bool(_) => TAG_BOOL,
    }
  }

  /// Heap footprint estimate beyond `size_of::<Self>()`.
  pub fn memsize(&self) -> usize {
    match self {
      AttributeValue::String(s) => s.len(),
      _ => 0,
    }
  }

  pub fn serialize(&self, out: &mut Vec<u8>) {
    out.push(self.tag());
    match self {
      AttributeValue::String(s) => write_long_string(out, s),
      AttributeValue::Int(i) => out.extend_from_slice(&(*i as u32).to_le_bytes()),
      AttributeValue::Float(f) => out.extend_from_slice(&f.to_bits().to_le_bytes()),
      AttributeValue::Bool(b) => out.push(*b as u8),
    }
  }

  pub fn deserialize(input: &mut &[u8]) -> Result<Self> {
    let tag = read_u8(input)?;
    let value = match tag {
      TAG_STRING => AttributeValue::String(read_long_string(input)?),
      TAG_INT => AttributeValue::Int(read_u32(input)? as i32),
      TAG_FLOAT => AttributeValue::Float(f32::from_bits(read_u32(input)?)),
      TAG_BOOL => AttributeValue::Bool(read_u8(input)? != 0),
      other => return Err(AttributeError::UnknownTag(other)),
    };
    Ok(value)
  }
}

impl From<&str> for AttributeValue {
  fn from(value: &str) -> Self {
    AttributeValue::String(value.into())
  }
}

impl From<Tendril> for AttributeValue {
  fn from(value: Tendril) -> Self {
    AttributeValue::String(value)
  }
}

impl From<i32> for AttributeValue {
  fn from(value: i32) -> Self {
    AttributeValue::Int(value)
  }
}

impl From<f32> for AttributeValue {
  fn from(value: f32) -> Self {
    AttributeValue::Float(value)
  }
}

impl From<bool> for AttributeValue {
  fn from(value: bool) -> Self {
    AttributeValue::Bool(value)
  }
}

pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// Key-value attributes of an item. The backing map is only allocated once
/// the first attribute is set; most items carry none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemAttributes {
  attributes: Option<Box<AttributeMap>>,
}

impl ItemAttributes {
  pub fn new() -> Self {
    Self::default()
  }

  fn map_mut(&mut self) -> &mut AttributeMap {
    self.attributes.get_or_insert_default()
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
    self.map_mut().insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&AttributeValue> {
    self.attributes.as_ref()?.get(key)
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.get(key)?.as_str()
  }

  pub fn get_int(&self, key: &str) -> Option<i32> {
    self.get(key)?.as_int()
  }

  pub fn get_float(&self, key: &str) -> Option<f32> {
    self.get(key)?.as_float()
  }

  pub fn get_bool(&self, key: &str) -> Option<bool> {
    self.get(key)?.as_bool()
  }

  pub fn has(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  pub fn erase(&mut self, key: &str) {
    if let Some(map) = self.attributes.as_mut() {
      map.remove(key);
    }
  }

  pub fn len(&self) -> usize {
    self.attributes.as_ref().map_or(0, |map| map.len())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
    self
      .attributes
      .iter()
      .flat_map(|map| map.iter())
      .map(|(key, value)| (key.as_str(), value))
  }

  /// Heap footprint estimate, used by the history memory budget.
  pub fn memsize(&self) -> usize {
    match &self.attributes {
      None => 0,
      Some(map) => {
        size_of::<AttributeMap>()
          + map
            .iter()
            .map(|(key, value)| {
              key.capacity() + size_of::<String>() + size_of::<AttributeValue>() + value.memsize()
            })
            .sum::<usize>()
      },
    }
  }

  /// Appends the binary encoding to `out`. At most `u16::MAX` entries are
  /// written; keys longer than `u16::MAX` bytes are truncated.
  pub fn serialize(&self, out: &mut Vec<u8>) {
    let count = self.len().min(u16::MAX as usize);
    out.extend_from_slice(&(count as u16).to_le_bytes());
    for (key, value) in self.iter().take(count) {
      write_string(out, key);
      value.serialize(out);
    }
  }

  /// Decodes attributes from the front of `input`, advancing it past the
  /// consumed bytes.
  pub fn deserialize(input: &mut &[u8]) -> Result<Self> {
    let count = read_u16(input)?;
    if count == 0 {
      return Ok(Self::default());
    }

    let mut map = AttributeMap::new();
    for _ in 0..count {
      let key = read_string(input)?;
      let value = AttributeValue::deserialize(input)?;
      map.insert(key.into(), value);
    }
    Ok(Self {
      attributes: Some(Box::new(map)),
    })
  }
}

fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
  if input.len() < n {
    return Err(AttributeError::UnexpectedEof);
  }
  let (head, tail) = input.split_at(n);
  *input = tail;
  Ok(head)
}

fn read_u8(input: &mut &[u8]) -> Result<u8> {
  Ok(take(input, 1)?[0])
}

fn read_u16(input: &mut &[u8]) -> Result<u16> {
  let bytes = take(input, 2)?;
  Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(input: &mut &[u8]) -> Result<u32> {
  let bytes = take(input, 4)?;
  Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_string(input: &mut &[u8]) -> Result<Tendril> {
  let len = read_u16(input)? as usize;
  decode_utf8(take(input, len)?)
}

fn read_long_string(input: &mut &[u8]) -> Result<Tendril> {
  let len = read_u32(input)? as usize;
  decode_utf8(take(input, len)?)
}

fn decode_utf8(bytes: &[u8]) -> Result<Tendril> {
  std::str::from_utf8(bytes)
    .map(Tendril::from)
    .map_err(|_| AttributeError::InvalidUtf8)
}

fn write_string(out: &mut Vec<u8>, s: &str) {
  let len = s.len().min(u16::MAX as usize);
  out.extend_from_slice(&(len as u16).to_le_bytes());
  out.extend_from_slice(&s.as_bytes()[..len]);
}

fn write_long_string(out: &mut Vec<u8>, s: &str) {
  out.extend_from_slice(&(s.len() as u32).to_le_bytes());
  out.extend_from_slice(s.as_bytes());
}
