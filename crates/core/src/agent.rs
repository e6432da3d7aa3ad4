//! The purge agent: entry point for content-change events.
//!
//! A [`PurgeAgent`] owns the live mapping table, the path mapper and the
//! dispatcher. The content system (or the daemon's HTTP API) hands it one
//! [`ChangeEvent`] at a time; the agent decides whether a purge is needed,
//! resolves targets and submits them.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::{AppConfig, MappingConfig, TRANSPORT_SCHEME};
use crate::errors::{AgentError, CoreError, MappingError};
use crate::mapping::{
    FixedPageLookup, JcrPageLookup, MappingFile, MappingSource, MappingStore, PageLookup,
    PathMapper, StaticMappings,
};
use crate::models::{
    ChangeEvent, DeliveryReport, MappingEntry, PurgeMode, PurgeTarget, ReplicationAction,
};
use crate::notify::AlertSink;
use crate::purge::{PurgeDispatcher, PurgeTransport};

/// Pick the mapping source for `config`: the mapping file when one is
/// configured, the inline entries otherwise.
pub fn mapping_source(config: &MappingConfig) -> Box<dyn MappingSource> {
    match config.file {
        Some(ref path) => {
            if !config.entries.is_empty() {
                warn!(
                    file = %path.display(),
                    inline = config.entries.len(),
                    "mapping file configured; inline mapping entries are ignored"
                );
            }
            Box::new(MappingFile::new(path.clone()))
        }
        None => Box::new(StaticMappings::new(config.entries.clone())),
    }
}

/// Turns change events into purge requests.
pub struct PurgeAgent {
    store: MappingStore,
    mapper: PathMapper,
    dispatcher: PurgeDispatcher,
    mode: PurgeMode,
}

impl PurgeAgent {
    pub fn new(
        store: MappingStore,
        mapper: PathMapper,
        dispatcher: PurgeDispatcher,
        mode: PurgeMode,
    ) -> Self {
        Self {
            store,
            mapper,
            dispatcher,
            mode,
        }
    }

    /// Assemble an agent from a resolved configuration.
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn PurgeTransport>,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, CoreError> {
        let credential = config.credential()?;
        let dispatcher =
            PurgeDispatcher::new(config.dispatcher_config(), credential, transport, alerts)?;
        let store = MappingStore::from_source(mapping_source(&config.mapping).as_ref())?;
        let mode = config.purge.mode();

        info!(
            mappings = store.snapshot().len(),
            mode = %mode,
            "purge agent initialized"
        );

        Ok(Self::new(
            store,
            PathMapper::new(config.mapper_config()),
            dispatcher,
            mode,
        ))
    }

    /// Whether a replication agent with this transport URI belongs to us.
    pub fn can_handle(transport_uri: &str) -> bool {
        transport_uri
            .get(..TRANSPORT_SCHEME.len())
            .map_or(false, |scheme| scheme.eq_ignore_ascii_case(TRANSPORT_SCHEME))
    }

    pub fn mode(&self) -> PurgeMode {
        self.mode
    }

    pub fn dispatcher(&self) -> &PurgeDispatcher {
        &self.dispatcher
    }

    /// Current mapping table.
    pub fn mappings(&self) -> Arc<Vec<MappingEntry>> {
        self.store.snapshot()
    }

    /// Resolve `path` against the current mappings.
    ///
    /// `containing_page` short-circuits the page lookup when the caller
    /// already knows the enclosing page; otherwise it is derived from the
    /// path itself.
    pub fn resolve(
        &self,
        path: &str,
        containing_page: Option<&str>,
    ) -> Result<Vec<PurgeTarget>, MappingError> {
        let mappings = self.store.snapshot();
        let lookup: Box<dyn PageLookup> = match containing_page {
            Some(page) => Box::new(FixedPageLookup::new(page)),
            None => Box::new(JcrPageLookup::new(self.mapper.config().content_root.as_str())),
        };
        self.mapper.resolve(&mappings, path, lookup.as_ref())
    }

    /// Handle one change event.
    #[instrument(skip(self, event), fields(action = %event.action, path = %event.path))]
    pub async fn deliver(&self, event: ChangeEvent) -> Result<DeliveryReport, AgentError> {
        let ChangeEvent {
            path,
            action,
            containing_page,
        } = event;

        match action {
            ReplicationAction::Test => {
                let result = self.dispatcher.test().await?;
                Ok(DeliveryReport {
                    action,
                    path,
                    targets: vec![PurgeTarget::new(
                        self.dispatcher.config().test_object.as_str(),
                    )],
                    result: Some(result),
                })
            }
            ReplicationAction::Activate
            | ReplicationAction::Deactivate
            | ReplicationAction::Delete => {
                let targets = self.resolve(&path, containing_page.as_deref())?;
                if targets.is_empty() {
                    debug!("no mapping matched; nothing to purge");
                    return Ok(DeliveryReport {
                        action,
                        path,
                        targets,
                        result: None,
                    });
                }

                let result = self.dispatcher.submit(&targets, &self.mode).await?;
                Ok(DeliveryReport {
                    action,
                    path,
                    targets,
                    result: Some(result),
                })
            }
            ReplicationAction::Other => {
                debug!("action does not affect published content; acknowledged");
                Ok(DeliveryReport {
                    action,
                    path,
                    targets: Vec::new(),
                    result: None,
                })
            }
        }
    }

    /// Replace the mapping table from `source`. On error the old table stays.
    pub fn reload_mappings(&self, source: &dyn MappingSource) -> Result<usize, MappingError> {
        self.store.reload(source)
    }
}
