//! Subtitle download for a transferred item.

use super::ContentFetcher;
use crate::{Result, SyncError};
use bridge_traits::{AdditionalFile, ItemFileType, LocalItem, MediaSource, MediaStreamType, SyncJobItem};
use core_runtime::logging::{redact_url, strip_path};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do with a subtitle file whose index matches no subtitle stream in
/// the item's first media source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStreamPolicy {
    /// Fail the job item; its transfer is not reported complete and the server
    /// offers it again on a later run.
    #[default]
    Fail,
    /// Log and skip the file.
    Skip,
}

/// Position of the subtitle stream with the given index in `source`.
pub fn find_subtitle_stream(source: &MediaSource, index: i32) -> Option<usize> {
    source
        .media_streams
        .iter()
        .position(|s| s.stream_type == MediaStreamType::Subtitle && s.index == index)
}

impl ContentFetcher {
    pub(super) async fn download_subtitles(
        &self,
        job_item: &SyncJobItem,
        local_item: &mut LocalItem,
    ) -> Result<()> {
        if local_item.item.media_sources.is_empty() {
            warn!("Item has no media sources, skipping subtitles");
            return Ok(());
        }

        let files = job_item
            .additional_files
            .iter()
            .filter(|f| f.file_type == ItemFileType::Subtitles);

        for file in files {
            match self.download_subtitle_file(job_item, local_item, file).await {
                Ok(()) => {}
                Err(e @ SyncError::MissingSubtitleStream { .. }) => match self.missing_stream_policy {
                    MissingStreamPolicy::Fail => return Err(e),
                    MissingStreamPolicy::Skip => {
                        warn!(file = %file.name, error = %e, "Skipping subtitle without stream");
                    }
                },
                Err(e) => {
                    warn!(file = %file.name, error = %e, "Failed to download subtitle");
                }
            }
        }

        Ok(())
    }

    async fn download_subtitle_file(
        &self,
        job_item: &SyncJobItem,
        local_item: &mut LocalItem,
        file: &AdditionalFile,
    ) -> Result<()> {
        let source = &local_item.item.media_sources[0];
        let position = find_subtitle_stream(source, file.index).ok_or_else(|| {
            SyncError::MissingSubtitleStream {
                item_id: local_item.item_id.clone(),
                index: file.index,
            }
        })?;
        let stream = source.media_streams[position].clone();

        let url = self
            .client
            .additional_file_url(&job_item.sync_job_item_id, &file.name);
        debug!(url = %redact_url(&url), index = file.index, "Downloading subtitle");

        let path = self
            .with_download_timeout(
                "download_subtitles",
                self.store.download_subtitles(&url, local_item, &stream),
            )
            .await?;

        debug!(file = %strip_path(&path), "Subtitle stored");
        local_item.item.media_sources[0].media_streams[position].path = Some(path);

        self.store
            .add_or_update_local_item(local_item)
            .await
            .map_err(SyncError::storage("add_or_update_local_item"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::MediaStream;

    fn stream(stream_type: MediaStreamType, index: i32) -> MediaStream {
        MediaStream {
            stream_type,
            index,
            codec: None,
            language: None,
            is_external: false,
            path: None,
        }
    }

    #[test]
    fn test_find_matches_type_and_index() {
        let source = MediaSource {
            media_streams: vec![
                stream(MediaStreamType::Video, 0),
                stream(MediaStreamType::Audio, 1),
                stream(MediaStreamType::Subtitle, 2),
                stream(MediaStreamType::Subtitle, 3),
            ],
            ..MediaSource::default()
        };

        assert_eq!(find_subtitle_stream(&source, 3), Some(3));
        assert_eq!(find_subtitle_stream(&source, 2), Some(2));
    }

    #[test]
    fn test_find_ignores_other_stream_types() {
        let source = MediaSource {
            media_streams: vec![stream(MediaStreamType::Audio, 1)],
            ..MediaSource::default()
        };

        assert_eq!(find_subtitle_stream(&source, 1), None);
        assert_eq!(find_subtitle_stream(&MediaSource::default(), 0), None);
    }

    #[test]
    fn test_policy_defaults_to_fail() {
        assert_eq!(MissingStreamPolicy::default(), MissingStreamPolicy::Fail);
        assert_eq!(
            serde_json::to_string(&MissingStreamPolicy::Skip).unwrap(),
            "\"skip\""
        );
    }
}
