//! # Content Fetcher
//!
//! Materializes job items the server prepared for this device: the local
//! record, the media body, artwork and subtitles.
//!
//! ## Workflow (per job item)
//!
//! 1. Create the local record (an existing record for the same identity is
//!    reused, never duplicated)
//! 2. Download the media body and persist the completed path
//! 3. Download artwork for the fixed image slots (see [`images`])
//! 4. Download subtitle files (see [`subtitles`])
//! 5. Report the transfer as complete
//!
//! Job items are processed strictly one after another so at most one download
//! is in flight. A failing job item is logged and skipped; the phase itself
//! fails only if the ready-item listing cannot be fetched.

mod images;
mod subtitles;

pub use images::{image_slots, ImageSlot};
pub use subtitles::{find_subtitle_stream, MissingStreamPolicy};

use crate::run::FetchSummary;
use crate::{Result, SyncError};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    LibraryItem, LocalItem, MediaServerClient, OfflineStore, ServerTarget, SyncJobItem,
};
use core_runtime::logging::{redact_url, strip_path};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

pub struct ContentFetcher {
    client: Arc<dyn MediaServerClient>,
    store: Arc<dyn OfflineStore>,
    download_timeout: Duration,
    missing_stream_policy: MissingStreamPolicy,
}

impl ContentFetcher {
    pub fn new(
        client: Arc<dyn MediaServerClient>,
        store: Arc<dyn OfflineStore>,
        download_timeout: Duration,
        missing_stream_policy: MissingStreamPolicy,
    ) -> Self {
        Self {
            client,
            store,
            download_timeout,
            missing_stream_policy,
        }
    }

    /// Transfer every job item that is ready for this device.
    #[instrument(skip(self, target), fields(server_id = %target.server_id))]
    pub async fn fetch_new_content(&self, target: &ServerTarget) -> Result<FetchSummary> {
        let device_id = self.client.device_id();
        let job_items = self
            .client
            .list_ready_sync_items(&device_id)
            .await
            .map_err(SyncError::transport("list_ready_sync_items"))?;

        info!(count = job_items.len(), "Ready job items received");

        let mut summary = FetchSummary::default();
        for job_item in &job_items {
            match self.transfer_job_item(target, job_item).await {
                Ok(()) => summary.items_transferred += 1,
                Err(e) => {
                    error!(
                        job_item_id = %job_item.sync_job_item_id,
                        item_id = %job_item.item.id,
                        error = %e,
                        "Failed to transfer job item"
                    );
                    summary.items_failed += 1;
                }
            }
        }

        Ok(summary)
    }

    #[instrument(
        skip_all,
        fields(job_item_id = %job_item.sync_job_item_id, item_id = %job_item.item.id)
    )]
    async fn transfer_job_item(&self, target: &ServerTarget, job_item: &SyncJobItem) -> Result<()> {
        let mut local_item = self.create_local_item(target, job_item).await?;

        self.download_media(job_item, &mut local_item).await?;
        self.download_images(&target.server_id, &local_item).await;
        self.download_subtitles(job_item, &mut local_item).await?;

        self.client
            .report_transfer_complete(&job_item.sync_job_item_id)
            .await
            .map_err(SyncError::transport("report_transfer_complete"))?;

        info!("Job item transferred");
        Ok(())
    }

    async fn create_local_item(
        &self,
        target: &ServerTarget,
        job_item: &SyncJobItem,
    ) -> Result<LocalItem> {
        let existing = self
            .store
            .get_local_item(&target.server_id, &job_item.item.id)
            .await
            .map_err(SyncError::storage("get_local_item"))?;

        if let Some(mut local_item) = existing {
            debug!("Reusing existing local item");
            let mut refreshed = job_item.item.clone();
            carry_over_stream_paths(&local_item.item, &mut refreshed);
            local_item.item = refreshed;
            return Ok(local_item);
        }

        self.store
            .create_local_item(
                &job_item.item,
                &target.server_id,
                job_item.original_file_name.as_deref(),
            )
            .await
            .map_err(SyncError::storage("create_local_item"))
    }

    async fn download_media(&self, job_item: &SyncJobItem, local_item: &mut LocalItem) -> Result<()> {
        let url = self.client.media_file_url(&job_item.sync_job_item_id);
        debug!(url = %redact_url(&url), "Downloading media body");

        let path = self
            .with_download_timeout("download_file", self.store.download_file(&url, local_item))
            .await?;

        debug!(file = %strip_path(&path), "Media body stored");
        local_item.local_path = Some(path);

        self.store
            .add_or_update_local_item(local_item)
            .await
            .map_err(SyncError::storage("add_or_update_local_item"))
    }

    /// Bound one download by the configured timeout; expiry counts as a
    /// transport failure of that download.
    async fn with_download_timeout<T, F>(&self, operation: &'static str, download: F) -> Result<T>
    where
        F: Future<Output = BridgeResult<T>>,
    {
        match tokio::time::timeout(self.download_timeout, download).await {
            Ok(result) => result.map_err(SyncError::transport(operation)),
            Err(_) => Err(SyncError::Timeout {
                operation: operation.to_string(),
                seconds: self.download_timeout.as_secs(),
            }),
        }
    }
}

/// Keep subtitle paths recorded by an earlier transfer when the server's
/// metadata replaces the stored copy. Streams are matched by type and index
/// within the first media source; a path the server already sends wins.
fn carry_over_stream_paths(previous: &LibraryItem, refreshed: &mut LibraryItem) {
    let (Some(old_source), Some(new_source)) =
        (previous.media_sources.first(), refreshed.media_sources.first_mut())
    else {
        return;
    };

    for stream in new_source.media_streams.iter_mut().filter(|s| s.path.is_none()) {
        stream.path = old_source
            .media_streams
            .iter()
            .find(|old| old.stream_type == stream.stream_type && old.index == stream.index)
            .and_then(|old| old.path.clone());
    }
}
