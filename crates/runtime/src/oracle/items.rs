//! [`ItemOracle`] backed by an in-memory map, loadable from RON files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use inventory_core::{DefinitionId, InventoryConfig, ItemDefinition, ItemKind, ItemOracle};
use serde::Deserialize;

/// Catalog structure for RON files.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    items: Vec<CatalogEntry>,
}

/// Raw record shape of one catalog entry. Data files carry plain integers
/// and `(width, height)` pairs; the typed definition is built on load.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: u32,
    kind: ItemKind,
    max_stack: u32,
    #[serde(default)]
    dims: Option<(i32, i32)>,
    #[serde(default)]
    weight: f32,
}

impl CatalogEntry {
    fn into_definition(self) -> Result<ItemDefinition, CatalogError> {
        let id = DefinitionId(self.id);
        if self.max_stack == 0 {
            return Err(CatalogError::Invalid {
                id,
                reason: "max_stack must be at least 1",
            });
        }
        let mut def = ItemDefinition::new(id, self.kind, self.max_stack).with_weight(self.weight);
        if let Some((width, height)) = self.dims {
            let extent = InventoryConfig::MAX_ITEM_EXTENT;
            if !(1..=extent).contains(&width) || !(1..=extent).contains(&height) {
                return Err(CatalogError::Invalid {
                    id,
                    reason: "footprint axis outside the supported extent",
                });
            }
            def = def.with_dims(width, height);
        }
        Ok(def)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("duplicate definition {0}")]
    Duplicate(DefinitionId),
    #[error("invalid definition {id}: {reason}")]
    Invalid {
        id: DefinitionId,
        reason: &'static str,
    },
}

/// ItemOracle implementation with static item definitions
#[derive(Default)]
pub struct ItemCatalog {
    definitions: HashMap<DefinitionId, ItemDefinition>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item definition, replacing any previous one with the same id.
    pub fn add_definition(&mut self, def: ItemDefinition) {
        self.definitions.insert(def.id, def);
    }

    /// Load a catalog from a RON file. Duplicate ids in the file are an
    /// error rather than a silent overwrite, and every entry is range
    /// checked before it becomes a definition.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile = ron::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut catalog = Self::new();
        for entry in file.items {
            let def = entry.into_definition()?;
            if catalog.definitions.contains_key(&def.id) {
                return Err(CatalogError::Duplicate(def.id));
            }
            tracing::debug!(id = %def.id, "loaded item definition");
            catalog.add_definition(def);
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ItemOracle for ItemCatalog {
    fn definition(&self, id: DefinitionId) -> Option<ItemDefinition> {
        self.definitions.get(&id).cloned()
    }
}
