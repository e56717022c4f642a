//! Media Server API Abstraction
//!
//! The remote half of offline sync: the catalog server that accepts queued
//! offline actions, reconciles device inventories and hands out job items
//! ready for transfer. Transport and token minting live in the implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::media::{
    ImageKind, ReconciliationRequest, ReconciliationResult, RemoteActionRecord, SyncJobItem,
};

/// Remote media server client trait
///
/// Implementations own the access credential and embed it in the URLs they
/// build, so callers never handle tokens directly.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media_server::MediaServerClient;
///
/// async fn pending(client: &dyn MediaServerClient) -> Result<usize> {
///     let items = client.list_ready_sync_items(&client.device_id()).await?;
///     Ok(items.len())
/// }
/// ```
#[async_trait]
pub trait MediaServerClient: Send + Sync {
    /// Identity of this device as registered with the server
    fn device_id(&self) -> String;

    /// Upload a batch of offline actions in a single request
    async fn report_offline_actions(&self, actions: &[RemoteActionRecord]) -> Result<()>;

    /// Exchange the local inventory for removals and access lists
    async fn reconcile(&self, request: &ReconciliationRequest) -> Result<ReconciliationResult>;

    /// List job items prepared for transfer to `device_id`
    async fn list_ready_sync_items(&self, device_id: &str) -> Result<Vec<SyncJobItem>>;

    /// Acknowledge that a job item is fully stored on the device
    async fn report_transfer_complete(&self, job_item_id: &str) -> Result<()>;

    /// URL of the media body for a job item
    fn media_file_url(&self, job_item_id: &str) -> String;

    /// URL of an item image identified by kind and tag
    fn image_url(&self, item_id: &str, kind: ImageKind, tag: &str) -> String;

    /// URL of a named additional file (subtitles, etc.) of a job item
    fn additional_file_url(&self, job_item_id: &str, file_name: &str) -> String;
}
