//! In-memory implementation of the catalog store

mod memory_store;
mod state;

pub use memory_store::{MemoryCatalogStore, MemoryTransaction};
pub use state::CatalogSeed;
