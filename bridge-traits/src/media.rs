//! Media Catalog Models
//!
//! Data exchanged between the offline sync core, the media server and the
//! local offline store. Field names follow the server's PascalCase wire
//! format so the same values can be persisted locally without translation.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Server registration targeted by one sync run.
///
/// Carries the users that enabled offline access on this device. Never
/// mutated while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerTarget {
    #[serde(rename = "Id")]
    pub server_id: String,
    #[serde(default)]
    pub offline_user_ids: Vec<String>,
}

impl ServerTarget {
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            offline_user_ids: Vec::new(),
        }
    }

    pub fn with_offline_user(mut self, user_id: impl Into<String>) -> Self {
        self.offline_user_ids.push(user_id.into());
        self
    }
}

/// A mutation recorded while the device was disconnected (e.g. playback
/// progress). Lives in the local store until the server acknowledges it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteActionRecord {
    pub id: String,
    pub server_id: String,
    #[serde(rename = "Type")]
    pub action_type: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Inventory sent to the server for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReconciliationRequest {
    pub target_id: String,
    pub local_item_ids: Vec<String>,
    pub offline_user_ids: Vec<String>,
}

/// Server verdict for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReconciliationResult {
    #[serde(default)]
    pub item_ids_to_remove: Vec<String>,
    #[serde(default)]
    pub item_user_access: ItemUserAccess,
}

/// Item id → user ids allowed to play it, kept in the order the server sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUserAccess(Vec<(String, Vec<String>)>);

impl ItemUserAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the access list for `item_id`, keeping its first position.
    pub fn insert(&mut self, item_id: impl Into<String>, user_ids: Vec<String>) {
        let item_id = item_id.into();
        match self.0.iter_mut().find(|(id, _)| *id == item_id) {
            Some((_, existing)) => *existing = user_ids,
            None => self.0.push((item_id, user_ids)),
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(id, _)| id == item_id)
            .map(|(_, users)| users.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(id, users)| (id.as_str(), users.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for ItemUserAccess {
    fn from_iter<T: IntoIterator<Item = (K, Vec<String>)>>(iter: T) -> Self {
        let mut access = Self::new();
        for (item_id, users) in iter {
            access.insert(item_id, users);
        }
        access
    }
}

impl Serialize for ItemUserAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (item_id, users) in &self.0 {
            map.serialize_entry(item_id, users)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ItemUserAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AccessVisitor;

        impl<'de> Visitor<'de> for AccessVisitor {
            type Value = ItemUserAccess;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of item ids to user id lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut access = ItemUserAccess::new();
                while let Some((item_id, users)) = map.next_entry::<String, Vec<String>>()? {
                    access.insert(item_id, users);
                }
                Ok(access)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ItemUserAccess::new())
            }
        }

        deserializer.deserialize_any(AccessVisitor)
    }
}

/// Image kinds fetched for offline artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageKind {
    Primary,
    Thumb,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Primary => "Primary",
            ImageKind::Thumb => "Thumb",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library item metadata as the server describes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LibraryItem {
    pub id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "Type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub image_tags: HashMap<String, String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub series_primary_image_tag: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub album_primary_image_tag: Option<String>,
    #[serde(default)]
    pub media_sources: Vec<MediaSource>,
}

impl LibraryItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Tag of the item's own image of the given kind, if the server has one.
    pub fn image_tag(&self, kind: ImageKind) -> Option<&str> {
        self.image_tags.get(kind.as_str()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub media_streams: Vec<MediaStream>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaStreamType {
    Audio,
    Video,
    Subtitle,
    EmbeddedImage,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStream {
    #[serde(rename = "Type")]
    pub stream_type: MediaStreamType,
    pub index: i32,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_external: bool,
    /// Local path of the downloaded subtitle, set once the file is fetched.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemFileType {
    Media,
    Subtitles,
    #[serde(other)]
    Other,
}

/// Extra file shipped with a job item (subtitles, etc).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdditionalFile {
    pub name: String,
    #[serde(rename = "Type")]
    pub file_type: ItemFileType,
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub path: Option<String>,
}

/// One library item the server has prepared for transfer to this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncJobItem {
    pub sync_job_item_id: String,
    pub item: LibraryItem,
    #[serde(default)]
    pub original_file_name: Option<String>,
    #[serde(default)]
    pub additional_files: Vec<AdditionalFile>,
}

/// On-device record of a synced library item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalItem {
    pub id: String,
    pub server_id: String,
    pub item_id: String,
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub user_ids_with_access: Vec<String>,
    pub item: LibraryItem,
}

impl LocalItem {
    pub fn new(server_id: impl Into<String>, item: LibraryItem) -> Self {
        let server_id = server_id.into();
        Self {
            id: Self::local_id(&server_id, &item.id),
            item_id: item.id.clone(),
            server_id,
            local_path: None,
            user_ids_with_access: Vec::new(),
            item,
        }
    }

    /// Identity of a local item: the library item id scoped to its server.
    pub fn local_id(server_id: &str, item_id: &str) -> String {
        format!("local:{}:{}", server_id, item_id)
    }

    /// Whether the stored access list matches `user_ids` ignoring order and repeats.
    pub fn has_same_access(&self, user_ids: &[String]) -> bool {
        let stored: HashSet<&str> = self.user_ids_with_access.iter().map(String::as_str).collect();
        let reported: HashSet<&str> = user_ids.iter().map(String::as_str).collect();
        stored == reported
    }
}
