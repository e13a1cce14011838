//! Host-side data sources for the engine's oracle seams.

mod items;

pub use items::{CatalogError, ItemCatalog};
