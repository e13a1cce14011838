//! Host-level errors.

use crate::oracle::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Engine refused the operation.
    #[error(transparent)]
    Inventory(#[from] inventory_core::InventoryError),

    /// Item catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
