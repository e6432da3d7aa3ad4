//! Path mapping: translating changed repository paths into purge targets.
//!
//! The mapping list is an ordered set of prefix -> target-host rules loaded
//! from a [`MappingSource`] (TOML file or inline config). Every rule whose
//! prefix matches a changed path contributes one target; rules are not
//! mutually exclusive.

pub mod file;
pub mod lookup;
pub mod resolver;

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::errors::MappingError;
use crate::models::MappingEntry;

pub use file::MappingFile;
pub use lookup::{FixedPageLookup, JcrPageLookup, PageLookup};
pub use resolver::{MapperConfig, PathMapper};

/// A provider of the mapping list.
pub trait MappingSource: Send + Sync {
    /// Produce a fresh snapshot of the mapping list, in priority order.
    fn load(&self) -> Result<Vec<MappingEntry>, MappingError>;
}

/// A fixed, in-memory mapping list (inline config entries).
#[derive(Debug, Clone, Default)]
pub struct StaticMappings {
    entries: Vec<MappingEntry>,
}

impl StaticMappings {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }
}

impl MappingSource for StaticMappings {
    fn load(&self) -> Result<Vec<MappingEntry>, MappingError> {
        Ok(self.entries.clone())
    }
}

/// Holds the currently published mapping snapshot.
///
/// Readers get an `Arc` to an immutable list; [`reload`](Self::reload)
/// builds a complete new list and swaps the pointer, so a resolution in
/// flight keeps the snapshot it started with.
pub struct MappingStore {
    current: ArcSwap<Vec<MappingEntry>>,
}

impl MappingStore {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self {
            current: ArcSwap::from_pointee(entries),
        }
    }

    /// Create a store primed from a source.
    pub fn from_source(source: &dyn MappingSource) -> Result<Self, MappingError> {
        let entries = source.load()?;
        info!(count = entries.len(), "loaded purge mappings");
        Ok(Self::new(entries))
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Vec<MappingEntry>> {
        self.current.load_full()
    }

    /// Replace the snapshot with a fresh load. On error the old snapshot stays.
    pub fn reload(&self, source: &dyn MappingSource) -> Result<usize, MappingError> {
        let entries = source.load()?;
        let count = entries.len();
        self.current.store(Arc::new(entries));
        info!(count, "reloaded purge mappings");
        Ok(count)
    }
}
