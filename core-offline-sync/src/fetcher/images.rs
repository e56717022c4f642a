//! Artwork download for a transferred item.
//!
//! Four fixed slots are evaluated in order. The first slot without a source
//! identity ends evaluation for the item; a slot with an identity but no tag
//! only skips itself.

use super::ContentFetcher;
use crate::SyncError;
use bridge_traits::{ImageKind, LibraryItem, LocalItem};
use core_runtime::logging::redact_url;
use tracing::{debug, warn};

/// One candidate image for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlot<'a> {
    /// Item the image belongs to (the item itself, its series or its album)
    pub item_id: Option<&'a str>,
    pub kind: ImageKind,
    pub tag: Option<&'a str>,
}

/// Candidate slots for `item`, in evaluation order.
///
/// Both series slots use the series primary tag.
pub fn image_slots(item: &LibraryItem) -> [ImageSlot<'_>; 4] {
    let series_tag = non_empty(item.series_primary_image_tag.as_deref());
    let series_id = non_empty(item.series_id.as_deref());

    [
        ImageSlot {
            item_id: non_empty(Some(item.id.as_str())),
            kind: ImageKind::Primary,
            tag: non_empty(item.image_tag(ImageKind::Primary)),
        },
        ImageSlot {
            item_id: series_id,
            kind: ImageKind::Primary,
            tag: series_tag,
        },
        ImageSlot {
            item_id: series_id,
            kind: ImageKind::Thumb,
            tag: series_tag,
        },
        ImageSlot {
            item_id: non_empty(item.album_id.as_deref()),
            kind: ImageKind::Primary,
            tag: non_empty(item.album_primary_image_tag.as_deref()),
        },
    ]
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl ContentFetcher {
    /// Never fails; per-slot errors are logged.
    pub(super) async fn download_images(&self, server_id: &str, local_item: &LocalItem) {
        for (position, slot) in image_slots(&local_item.item).iter().enumerate() {
            let Some(item_id) = slot.item_id else {
                debug!(slot = position, "No image source for slot, stopping");
                break;
            };

            let Some(tag) = slot.tag else {
                debug!(slot = position, image_item_id = %item_id, "No image tag for slot");
                continue;
            };

            if let Err(e) = self.download_image(server_id, item_id, slot.kind, tag).await {
                warn!(
                    slot = position,
                    image_item_id = %item_id,
                    kind = %slot.kind,
                    error = %e,
                    "Failed to download image"
                );
            }
        }
    }

    async fn download_image(
        &self,
        server_id: &str,
        item_id: &str,
        kind: ImageKind,
        tag: &str,
    ) -> crate::Result<()> {
        let exists = self
            .store
            .has_image(server_id, item_id, tag)
            .await
            .map_err(SyncError::storage("has_image"))?;

        if exists {
            debug!(image_item_id = %item_id, tag = %tag, "Image already stored");
            return Ok(());
        }

        let url = self.client.image_url(item_id, kind, tag);
        debug!(url = %redact_url(&url), "Downloading image");

        self.with_download_timeout(
            "download_image",
            self.store.download_image(&url, server_id, item_id, tag),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_series_and_album() -> LibraryItem {
        let mut item = LibraryItem::new("episode-1");
        item.image_tags
            .insert("Primary".to_string(), "ep-tag".to_string());
        item.series_id = Some("series-1".to_string());
        item.series_primary_image_tag = Some("series-tag".to_string());
        item.album_id = Some("album-1".to_string());
        item.album_primary_image_tag = Some("album-tag".to_string());
        item
    }

    #[test]
    fn test_slot_table_order() {
        let item = item_with_series_and_album();
        let slots = image_slots(&item);

        assert_eq!(
            slots,
            [
                ImageSlot {
                    item_id: Some("episode-1"),
                    kind: ImageKind::Primary,
                    tag: Some("ep-tag"),
                },
                ImageSlot {
                    item_id: Some("series-1"),
                    kind: ImageKind::Primary,
                    tag: Some("series-tag"),
                },
                ImageSlot {
                    item_id: Some("series-1"),
                    kind: ImageKind::Thumb,
                    tag: Some("series-tag"),
                },
                ImageSlot {
                    item_id: Some("album-1"),
                    kind: ImageKind::Primary,
                    tag: Some("album-tag"),
                },
            ]
        );
    }

    #[test]
    fn test_series_tag_shared_by_both_series_slots() {
        let mut item = item_with_series_and_album();
        item.series_primary_image_tag = None;

        let slots = image_slots(&item);
        assert_eq!(slots[1].item_id, Some("series-1"));
        assert_eq!(slots[1].tag, None);
        assert_eq!(slots[2].tag, None);
        assert_eq!(slots[3].tag, Some("album-tag"));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let mut item = LibraryItem::new("movie-1");
        item.image_tags.insert("Primary".to_string(), String::new());
        item.series_id = Some(String::new());

        let slots = image_slots(&item);
        assert_eq!(slots[0].item_id, Some("movie-1"));
        assert_eq!(slots[0].tag, None);
        assert_eq!(slots[1].item_id, None);
        assert_eq!(slots[3].item_id, None);
    }
}
