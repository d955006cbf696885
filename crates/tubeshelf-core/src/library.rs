//! Published playlist library.
//!
//! Each load (catalog enrichment, sheet import, or enrichment of an import)
//! builds a fresh list of playlists and publishes it in one step. Loads are numbered: only the most
//! recently started load may publish, so a slow earlier load finishing late
//! cannot overwrite newer data.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::pipeline::{AssemblyPipeline, CatalogLoad};
use crate::playlist::Playlist;
use crate::sheet::{self, SheetImport};

/// Handle for one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// Sequence number of the load.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// The currently published playlists.
#[derive(Debug, Default)]
pub struct Library {
    generation: AtomicU64,
    playlists: RwLock<Arc<Vec<Playlist>>>,
}

impl Library {
    /// Create an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding any load still in flight.
    pub fn begin_load(&self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Starting load #{}", generation);
        LoadTicket { generation }
    }

    /// Whether `ticket` belongs to the most recently started load.
    #[must_use]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Publish the result of a load. Returns `false`, leaving the library
    /// untouched, if a newer load has started since.
    pub async fn publish(&self, ticket: LoadTicket, playlists: Vec<Playlist>) -> bool {
        let mut guard = self.playlists.write().await;
        if !self.is_current(ticket) {
            info!(
                "Discarding stale load #{} ({} playlists)",
                ticket.generation,
                playlists.len()
            );
            return false;
        }
        *guard = Arc::new(playlists);
        true
    }

    /// Record that a load failed: the library is emptied unless a newer
    /// load has started.
    pub async fn publish_failure(&self, ticket: LoadTicket) -> bool {
        self.publish(ticket, Vec::new()).await
    }

    /// Snapshot of the published playlists.
    pub async fn playlists(&self) -> Arc<Vec<Playlist>> {
        Arc::clone(&*self.playlists.read().await)
    }

    /// Enrich `catalog` and publish the result.
    ///
    /// Returns `Ok(None)` if the load was superseded before it finished. On
    /// error the library is emptied (unless superseded).
    pub async fn load_catalog(
        &self,
        pipeline: &AssemblyPipeline,
        catalog: &Catalog,
    ) -> Result<Option<CatalogLoad>> {
        let ticket = self.begin_load();

        match pipeline.assemble(catalog).await {
            Ok(load) => {
                let published = self.publish(ticket, load.playlists.clone()).await;
                Ok(published.then_some(load))
            }
            Err(e) => {
                warn!("Catalog load #{} failed: {}", ticket.generation, e);
                self.publish_failure(ticket).await;
                Err(e)
            }
        }
    }

    /// Enrich the published playlists in place and publish the merged result.
    ///
    /// Meant for imported sheets: looked-up metadata is merged over each
    /// imported video (see [`crate::pipeline::merge_details`]). Returns
    /// `Ok(None)` if the load was superseded. On error the published
    /// playlists are left as they were.
    pub async fn enrich_published(
        &self,
        pipeline: &AssemblyPipeline,
    ) -> Result<Option<CatalogLoad>> {
        let ticket = self.begin_load();
        let current = self.playlists().await;

        let load = pipeline
            .enrich_playlists(&current)
            .await
            .inspect_err(|e| warn!("Enrichment #{} failed: {}", ticket.generation, e))?;

        let published = self.publish(ticket, load.playlists.clone()).await;
        Ok(published.then_some(load))
    }

    /// Import a sheet file and publish the result.
    ///
    /// Same publishing rules as [`Library::load_catalog`].
    pub async fn import_sheet(&self, path: &Path) -> Result<Option<SheetImport>> {
        let ticket = self.begin_load();

        match sheet::import_file(path).await {
            Ok(import) => {
                let published = self.publish(ticket, import.playlists.clone()).await;
                Ok(published.then_some(import))
            }
            Err(e) => {
                warn!("Import #{} of {} failed: {}", ticket.generation, path.display(), e);
                self.publish_failure(ticket).await;
                Err(e)
            }
        }
    }
}
