//! Offline Store Abstraction
//!
//! The local half of offline sync. Hosts decide how records and payloads are
//! laid out on disk; the sync core only relies on the operations below.

use async_trait::async_trait;

use crate::error::Result;
use crate::media::{LibraryItem, LocalItem, MediaStream, RemoteActionRecord};

/// Local offline replica trait
///
/// Implementations:
/// - Desktop: database rows plus files under the data directory
/// - iOS/Android: app sandbox storage
///
/// Every write is self-contained; the core never opens a transaction that
/// spans more than one item.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Offline actions queued for a server, oldest first
    async fn get_offline_actions(&self, server_id: &str) -> Result<Vec<RemoteActionRecord>>;

    /// Delete acknowledged offline actions
    async fn delete_offline_actions(&self, actions: &[RemoteActionRecord]) -> Result<()>;

    /// Library item ids held locally for a server
    async fn get_server_item_ids(&self, server_id: &str) -> Result<Vec<String>>;

    /// Build a local record for `item`, reserving its local path
    ///
    /// The returned record is not persisted until
    /// [`add_or_update_local_item`](Self::add_or_update_local_item) is called.
    async fn create_local_item(
        &self,
        item: &LibraryItem,
        server_id: &str,
        original_file_name: Option<&str>,
    ) -> Result<LocalItem>;

    /// Load a local record by server and library item id
    async fn get_local_item(&self, server_id: &str, item_id: &str) -> Result<Option<LocalItem>>;

    /// Insert or replace a local record
    async fn add_or_update_local_item(&self, item: &LocalItem) -> Result<()>;

    /// Remove a local record together with its payload files
    async fn remove_local_item(&self, server_id: &str, item_id: &str) -> Result<()>;

    /// Whether the image identified by `(server, item, tag)` is stored
    async fn has_image(&self, server_id: &str, item_id: &str, tag: &str) -> Result<bool>;

    /// Download a media body into the item's reserved path
    ///
    /// Returns the final local path.
    async fn download_file(&self, url: &str, item: &LocalItem) -> Result<String>;

    /// Download an image keyed by `(server, item, tag)`
    async fn download_image(
        &self,
        url: &str,
        server_id: &str,
        item_id: &str,
        tag: &str,
    ) -> Result<()>;

    /// Download a subtitle file for `stream` next to the item's media body
    ///
    /// Returns the local subtitle path.
    async fn download_subtitles(
        &self,
        url: &str,
        item: &LocalItem,
        stream: &MediaStream,
    ) -> Result<String>;
}
