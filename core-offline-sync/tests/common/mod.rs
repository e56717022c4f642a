//! In-memory collaborators shared by the offline sync integration tests.
//!
//! Both fakes record every call so tests can assert on ordering and on what
//! was (or was not) written, and both accept targeted failure injection.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AdditionalFile, BridgeError, ImageKind, ItemFileType, LibraryItem, LocalItem, MediaSource,
    MediaStream, MediaStreamType, MediaServerClient, OfflineStore, ReconciliationRequest,
    ReconciliationResult, RemoteActionRecord, SyncJobItem,
};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

pub const SERVER_ID: &str = "server-1";
pub const DEVICE_ID: &str = "device-1";

// ============================================================================
// Fake media server
// ============================================================================

#[derive(Default)]
pub struct ServerState {
    pub calls: Vec<String>,
    pub reported_batches: Vec<Vec<RemoteActionRecord>>,
    pub reconcile_requests: Vec<ReconciliationRequest>,
    pub reconcile_result: ReconciliationResult,
    pub ready_items: Vec<SyncJobItem>,
    pub transferred: Vec<String>,
    pub fail_report: bool,
    pub fail_reconcile: bool,
    pub fail_listing: bool,
    pub fail_transfer: HashSet<String>,
    pub listing_delay: Option<Duration>,
}

#[derive(Default)]
pub struct FakeServer {
    pub state: AsyncMutex<ServerState>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    pub async fn transferred(&self) -> Vec<String> {
        self.state.lock().await.transferred.clone()
    }
}

#[async_trait]
impl MediaServerClient for FakeServer {
    fn device_id(&self) -> String {
        DEVICE_ID.to_string()
    }

    async fn report_offline_actions(&self, actions: &[RemoteActionRecord]) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push("report_offline_actions".to_string());
        if state.fail_report {
            return Err(BridgeError::Http {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        state.reported_batches.push(actions.to_vec());
        Ok(())
    }

    async fn reconcile(&self, request: &ReconciliationRequest) -> BridgeResult<ReconciliationResult> {
        let mut state = self.state.lock().await;
        state.calls.push("reconcile".to_string());
        if state.fail_reconcile {
            return Err(BridgeError::OperationFailed("connection reset".to_string()));
        }
        state.reconcile_requests.push(request.clone());
        Ok(state.reconcile_result.clone())
    }

    async fn list_ready_sync_items(&self, device_id: &str) -> BridgeResult<Vec<SyncJobItem>> {
        let delay = {
            let mut state = self.state.lock().await;
            state.calls.push(format!("list_ready_sync_items:{}", device_id));
            if state.fail_listing {
                return Err(BridgeError::OperationFailed("connection reset".to_string()));
            }
            state.listing_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self.state.lock().await.ready_items.clone())
    }

    async fn report_transfer_complete(&self, job_item_id: &str) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("report_transfer_complete:{}", job_item_id));
        if state.fail_transfer.contains(job_item_id) {
            return Err(BridgeError::Http {
                status: 500,
                message: "job item state not updated".to_string(),
            });
        }
        state.transferred.push(job_item_id.to_string());
        Ok(())
    }

    fn media_file_url(&self, job_item_id: &str) -> String {
        format!("https://media.test/Sync/JobItems/{}/File?api_key=secret", job_item_id)
    }

    fn image_url(&self, item_id: &str, kind: ImageKind, tag: &str) -> String {
        format!(
            "https://media.test/Items/{}/Images/{}?tag={}&api_key=secret",
            item_id, kind, tag
        )
    }

    fn additional_file_url(&self, job_item_id: &str, file_name: &str) -> String {
        format!(
            "https://media.test/Sync/JobItems/{}/AdditionalFiles?Name={}&api_key=secret",
            job_item_id, file_name
        )
    }
}

// ============================================================================
// Fake offline store
// ============================================================================

#[derive(Default)]
pub struct StoreState {
    pub actions: Vec<RemoteActionRecord>,
    pub items: Vec<LocalItem>,
    pub images: HashSet<(String, String, String)>,

    pub created: Vec<String>,
    pub updates: Vec<LocalItem>,
    pub image_downloads: Vec<(String, String)>,
    pub subtitle_downloads: Vec<i32>,

    pub fail_get_actions: bool,
    pub fail_delete_actions: bool,
    pub fail_enumerate: bool,
    pub fail_create: HashSet<String>,
    pub fail_get_item: HashSet<String>,
    pub fail_remove: HashSet<String>,
    pub fail_update: HashSet<String>,
    pub fail_download_file: HashSet<String>,
    pub fail_image_tags: HashSet<String>,
    pub fail_subtitle_indices: HashSet<i32>,
    pub download_delay: Option<Duration>,
}

#[derive(Default)]
pub struct FakeStore {
    pub state: AsyncMutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn item(&self, item_id: &str) -> Option<LocalItem> {
        self.state
            .lock()
            .await
            .items
            .iter()
            .find(|i| i.item_id == item_id)
            .cloned()
    }

    pub async fn item_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .items
            .iter()
            .map(|i| i.item_id.clone())
            .collect()
    }

    pub async fn insert_item(&self, item_id: &str, user_ids: &[&str]) {
        let mut local = LocalItem::new(SERVER_ID, LibraryItem::new(item_id));
        local.local_path = Some(format!("/offline/{}/{}.media", SERVER_ID, item_id));
        local.user_ids_with_access = user_ids.iter().map(|u| u.to_string()).collect();
        self.state.lock().await.items.push(local);
    }
}

#[async_trait]
impl OfflineStore for FakeStore {
    async fn get_offline_actions(&self, server_id: &str) -> BridgeResult<Vec<RemoteActionRecord>> {
        let state = self.state.lock().await;
        if state.fail_get_actions {
            return Err(BridgeError::Storage("action queue unreadable".to_string()));
        }
        Ok(state
            .actions
            .iter()
            .filter(|a| a.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn delete_offline_actions(&self, actions: &[RemoteActionRecord]) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_delete_actions {
            return Err(BridgeError::Storage("action queue locked".to_string()));
        }
        let ids: HashSet<&str> = actions.iter().map(|a| a.id.as_str()).collect();
        state.actions.retain(|a| !ids.contains(a.id.as_str()));
        Ok(())
    }

    async fn get_server_item_ids(&self, server_id: &str) -> BridgeResult<Vec<String>> {
        let state = self.state.lock().await;
        if state.fail_enumerate {
            return Err(BridgeError::Storage("item table unreadable".to_string()));
        }
        Ok(state
            .items
            .iter()
            .filter(|i| i.server_id == server_id)
            .map(|i| i.item_id.clone())
            .collect())
    }

    async fn create_local_item(
        &self,
        item: &LibraryItem,
        server_id: &str,
        _original_file_name: Option<&str>,
    ) -> BridgeResult<LocalItem> {
        let mut state = self.state.lock().await;
        if state.fail_create.contains(&item.id) {
            return Err(BridgeError::Storage(format!("cannot reserve {}", item.id)));
        }
        state.created.push(item.id.clone());
        Ok(LocalItem::new(server_id, item.clone()))
    }

    async fn get_local_item(&self, server_id: &str, item_id: &str) -> BridgeResult<Option<LocalItem>> {
        let state = self.state.lock().await;
        if state.fail_get_item.contains(item_id) {
            return Err(BridgeError::Storage(format!("cannot read {}", item_id)));
        }
        Ok(state
            .items
            .iter()
            .find(|i| i.server_id == server_id && i.item_id == item_id)
            .cloned())
    }

    async fn add_or_update_local_item(&self, item: &LocalItem) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_update.contains(&item.item_id) {
            return Err(BridgeError::Storage(format!("cannot write {}", item.item_id)));
        }
        state.updates.push(item.clone());
        if let Some(pos) = state.items.iter().position(|i| i.id == item.id) {
            state.items[pos] = item.clone();
        } else {
            state.items.push(item.clone());
        }
        Ok(())
    }

    async fn remove_local_item(&self, server_id: &str, item_id: &str) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_remove.contains(item_id) {
            return Err(BridgeError::Storage(format!("cannot delete {}", item_id)));
        }
        state
            .items
            .retain(|i| !(i.server_id == server_id && i.item_id == item_id));
        Ok(())
    }

    async fn has_image(&self, server_id: &str, item_id: &str, tag: &str) -> BridgeResult<bool> {
        Ok(self.state.lock().await.images.contains(&(
            server_id.to_string(),
            item_id.to_string(),
            tag.to_string(),
        )))
    }

    async fn download_file(&self, _url: &str, item: &LocalItem) -> BridgeResult<String> {
        let delay = {
            let state = self.state.lock().await;
            if state.fail_download_file.contains(&item.item_id) {
                return Err(BridgeError::Http {
                    status: 404,
                    message: "job item file missing".to_string(),
                });
            }
            state.download_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(format!("/offline/{}/{}.media", item.server_id, item.item_id))
    }

    async fn download_image(
        &self,
        _url: &str,
        server_id: &str,
        item_id: &str,
        tag: &str,
    ) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_image_tags.contains(tag) {
            return Err(BridgeError::Http {
                status: 500,
                message: "image render failed".to_string(),
            });
        }
        state
            .image_downloads
            .push((item_id.to_string(), tag.to_string()));
        state
            .images
            .insert((server_id.to_string(), item_id.to_string(), tag.to_string()));
        Ok(())
    }

    async fn download_subtitles(
        &self,
        _url: &str,
        item: &LocalItem,
        stream: &MediaStream,
    ) -> BridgeResult<String> {
        let mut state = self.state.lock().await;
        if state.fail_subtitle_indices.contains(&stream.index) {
            return Err(BridgeError::Http {
                status: 500,
                message: "subtitle extraction failed".to_string(),
            });
        }
        state.subtitle_downloads.push(stream.index);
        Ok(format!(
            "/offline/{}/{}.{}.srt",
            item.server_id, item.item_id, stream.index
        ))
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn action(id: &str) -> RemoteActionRecord {
    RemoteActionRecord {
        id: id.to_string(),
        server_id: SERVER_ID.to_string(),
        action_type: "PlayedItem".to_string(),
        date: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        user_id: Some("user-1".to_string()),
        item_id: Some("item-1".to_string()),
        payload: serde_json::json!({ "PositionTicks": 0 }),
    }
}

pub fn job_item(job_id: &str, item: LibraryItem) -> SyncJobItem {
    SyncJobItem {
        sync_job_item_id: job_id.to_string(),
        original_file_name: Some(format!("{}.mkv", item.id)),
        item,
        additional_files: Vec::new(),
    }
}

pub fn stream(stream_type: MediaStreamType, index: i32) -> MediaStream {
    MediaStream {
        stream_type,
        index,
        codec: None,
        language: None,
        is_external: false,
        path: None,
    }
}

pub fn media_source(streams: Vec<MediaStream>) -> MediaSource {
    MediaSource {
        id: Some("source-1".to_string()),
        media_streams: streams,
        ..MediaSource::default()
    }
}

pub fn subtitle_file(name: &str, index: i32) -> AdditionalFile {
    AdditionalFile {
        name: name.to_string(),
        file_type: ItemFileType::Subtitles,
        index,
        path: None,
    }
}
