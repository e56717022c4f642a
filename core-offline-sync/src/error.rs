use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote call {operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: BridgeError,
    },

    #[error("Local store operation {operation} failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: BridgeError,
    },

    #[error("No subtitle stream with index {index} in the first media source of item {item_id}")]
    MissingSubtitleStream { item_id: String, index: i32 },

    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("Offline sync already in progress for server {server_id}")]
    SyncInProgress { server_id: String },

    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Adapter for `map_err` on media server calls.
    pub fn transport(operation: &'static str) -> impl FnOnce(BridgeError) -> Self {
        move |source| Self::Transport { operation, source }
    }

    /// Adapter for `map_err` on offline store calls.
    pub fn storage(operation: &'static str) -> impl FnOnce(BridgeError) -> Self {
        move |source| Self::Storage { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::transport("reconcile")(BridgeError::Http {
            status: 503,
            message: "unavailable".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Remote call reconcile failed: Remote request failed with status 503: unavailable"
        );

        let err = SyncError::MissingSubtitleStream {
            item_id: "item-1".to_string(),
            index: 3,
        };
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn test_error_source_is_preserved() {
        use std::error::Error as _;

        let err = SyncError::storage("remove_local_item")(BridgeError::Storage(
            "locked".to_string(),
        ));
        let source = err.source().expect("storage errors carry their cause");
        assert_eq!(source.to_string(), "Local store error: locked");
    }
}
