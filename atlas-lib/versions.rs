//! The client version catalog.
//!
//! Maps a client version id to the OTB revision, display name and data paths
//! the editor needs when loading content for that client. The catalog is an
//! explicitly constructed registry owned by the caller and loaded from a
//! TOML file; nothing here is process-global.

use std::{
  collections::HashMap,
  fs,
  io,
  path::{
    Path,
    PathBuf,
  },
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VersionError>;

#[derive(Debug, Error)]
pub enum VersionError {
  #[error("failed to read version catalog: {0}")]
  Io(#[from] io::Error),
  #[error("failed to parse version catalog: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("failed to encode version catalog: {0}")]
  Encode(#[from] toml::ser::Error),
  #[error("duplicate client version id {0}")]
  DuplicateId(i32),
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientVersionId(pub i32);

impl ClientVersionId {
  pub const NONE: Self = Self(-1);
}

/// OTBM container format revisions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OtbmVersion {
  #[default]
  Otbm1,
  Otbm2,
  Otbm3,
  Otbm4,
}

/// The composed version of a map file: container format plus client id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapVersion {
  pub otbm:   OtbmVersion,
  pub client: ClientVersionId,
}

impl Default for MapVersion {
  fn default() -> Self {
    Self {
      otbm:   OtbmVersion::Otbm1,
      client: ClientVersionId::NONE,
    }
  }
}

/// OTB item database format revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtbFormatVersion {
  V1,
  V2,
  V3,
}

/// One revision of the OTB item database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtbVersion {
  /// Display name, e.g. "8.60".
  pub name:           String,
  pub format_version: OtbFormatVersion,
  pub id:             ClientVersionId,
}

/// A client release the editor can load data files for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientVersion {
  pub otb:                    OtbVersion,
  pub name:                   String,
  pub visible:                bool,
  pub data_path:              PathBuf,
  pub preferred_map_version:  OtbmVersion,
  pub supported_map_versions: Vec<OtbmVersion>,
}

impl ClientVersion {
  pub fn id(&self) -> ClientVersionId {
    self.otb.id
  }

  pub fn supports(&self, version: OtbmVersion) -> bool {
    self.supported_map_versions.contains(&version)
  }
}

/// The on-disk shape of the catalog: an array of `[[versions]]` tables.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalog {
  versions: Vec<ClientVersion>,
}

#[derive(Debug, Default)]
pub struct VersionRegistry {
  versions: HashMap<ClientVersionId, ClientVersion>,
}

impl VersionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, version: ClientVersion) -> Result<()> {
    let id = version.id();
    if self.versions.contains_key(&id) {
      return Err(VersionError::DuplicateId(id.0));
    }
    self.versions.insert(id, version);
    Ok(())
  }

  pub fn load(path: &Path) -> Result<Self> {
    let catalog: Catalog = toml::from_str(&fs::read_to_string(path)?)?;
    let mut registry = Self::new();
    for version in catalog.versions {
      registry.insert(version)?;
    }
    tracing::debug!(count = registry.len(), path = %path.display(), "loaded client version catalog");
    Ok(registry)
  }

  /// Writes the catalog sorted by id, so saves are deterministic.
  pub fn save(&self, path: &Path) -> Result<()> {
    let mut versions: Vec<_> = self.versions.values().cloned().collect();
    versions.sort_by_key(ClientVersion::id);
    let encoded = toml::to_string_pretty(&Catalog { versions })?;
    fs::write(path, encoded)?;
    Ok(())
  }

  pub fn get(&self, id: ClientVersionId) -> Option<&ClientVersion> {
    self.versions.get(&id)
  }

  pub fn get_by_name(&self, name: &str) -> Option<&ClientVersion> {
    self.versions.values().find(|version| version.name == name)
  }

  pub fn latest(&self) -> Option<&ClientVersion> {
    self.versions.values().max_by_key(|version| version.id())
  }

  /// Visible versions, sorted by id.
  pub fn visible(&self) -> Vec<&ClientVersion> {
    let mut versions: Vec<_> = self.versions.values().filter(|v| v.visible).collect();
    versions.sort_by_key(|version| version.id());
    versions
  }

  /// Versions able to open a map saved with `version`, sorted by id.
  pub fn for_map_version(&self, version: MapVersion) -> Vec<&ClientVersion> {
    let mut versions: Vec<_> = self
      .versions
      .values()
      .filter(|v| v.supports(version.otbm))
      .collect();
    versions.sort_by_key(|v| v.id());
    versions
  }

  pub fn len(&self) -> usize {
    self.versions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.versions.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ClientVersion> {
    self.versions.values()
  }
}
