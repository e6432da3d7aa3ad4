//! Core path -> purge-target resolution.

use tracing::{debug, warn};

use super::lookup::PageLookup;
use crate::errors::MappingError;
use crate::models::{MappingEntry, PurgeTarget};

/// Filters applied before any mapping entry is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// Paths outside this root are ignored.
    pub content_root: String,
    /// Paths that do not contain this substring are ignored.
    pub tenant_marker: String,
    /// Paths containing this substring flush the bare entry target.
    pub site_flush_marker: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            content_root: "/content".into(),
            tenant_marker: "mercer".into(),
            site_flush_marker: "flush-site-cache".into(),
        }
    }
}

/// Translates a changed repository path into purge targets.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    config: MapperConfig,
}

impl PathMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Whether `path` passes the root and tenant filters.
    pub fn is_relevant(&self, path: &str) -> bool {
        path.starts_with(&self.config.content_root) && path.contains(&self.config.tenant_marker)
    }

    /// Resolve `path` against `mappings`.
    ///
    /// Every entry whose prefix starts `path` yields one target, in list
    /// order. An exact match or a site-flush path yields the bare target;
    /// anything else yields `target + (page - prefix) + ".html"` where `page`
    /// comes from `lookup`. A missing page fails the whole resolution.
    pub fn resolve(
        &self,
        mappings: &[MappingEntry],
        path: &str,
        lookup: &dyn PageLookup,
    ) -> Result<Vec<PurgeTarget>, MappingError> {
        if !self.is_relevant(path) {
            debug!(
                path,
                content_root = %self.config.content_root,
                "path is outside the purge scope"
            );
            return Ok(Vec::new());
        }

        let site_flush = path.contains(&self.config.site_flush_marker);
        let mut targets = Vec::new();

        for entry in mappings {
            if entry.prefix.is_empty() {
                warn!(target_url = %entry.target, "ignoring mapping entry with empty prefix");
                continue;
            }
            if !path.starts_with(&entry.prefix) {
                continue;
            }

            if path == entry.prefix || site_flush {
                targets.push(PurgeTarget::new(entry.target.as_str()));
                continue;
            }

            let page = lookup
                .containing_page(path)
                .ok_or_else(|| MappingError::ContainingPageNotFound {
                    path: path.to_string(),
                })?;
            let remainder = page.strip_prefix(&entry.prefix).unwrap_or(&page);
            targets.push(PurgeTarget::new(format!("{}{}.html", entry.target, remainder)));
        }

        debug!(path, count = targets.len(), "resolved purge targets");
        Ok(targets)
    }
}
