//! # Core Configuration Module
//!
//! Collects the host-provided bridges the offline sync core depends on.
//!
//! ## Overview
//!
//! `CoreConfig` is assembled with a builder that fails fast when a required
//! bridge is missing, so a misconfigured host is caught at startup rather than
//! in the middle of a sync run.
//!
//! ## Required Dependencies
//!
//! - `MediaServerClient` - Remote catalog API for the registered server
//! - `OfflineStore` - Local offline replica
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source (default: `SystemClock`)
//! - Event bus buffer size (default: 100)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_server(Arc::new(MyServerClient::new(http, "https://media.local")))
//!     .offline_store(Arc::new(MyOfflineStore::open(data_dir)?))
//!     .event_buffer_size(32)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, MediaServerClient, OfflineStore, SystemClock};
use std::sync::Arc;

/// Upper bound for the event bus buffer.
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Core configuration for the offline sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Remote catalog API client (required)
    pub media_server: Arc<dyn MediaServerClient>,

    /// Local offline replica (required)
    pub offline_store: Arc<dyn OfflineStore>,

    /// Time source used for run durations
    pub clock: Arc<dyn Clock>,

    /// Events buffered per subscriber before it lags
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("media_server", &"MediaServerClient { ... }")
            .field("offline_store", &"OfflineStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// The event buffer must be non-zero and at most 10,000 events.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

fn media_server_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaServerClient".to_string(),
        message: "MediaServerClient implementation is required to talk to the media server. \
                 Desktop: wrap an HttpClient with provider-media-server's MediaServerConnector. \
                 Mobile: inject the platform API client."
            .to_string(),
    }
}

fn offline_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "OfflineStore".to_string(),
        message: "OfflineStore implementation is required to hold the offline replica. \
                 Inject the host's local item database and download manager."
            .to_string(),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    media_server: Option<Arc<dyn MediaServerClient>>,
    offline_store: Option<Arc<dyn OfflineStore>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    pub fn media_server(mut self, client: Arc<dyn MediaServerClient>) -> Self {
        self.media_server = Some(client);
        self
    }

    pub fn offline_store(mut self, store: Arc<dyn OfflineStore>) -> Self {
        self.offline_store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge was not provided
    /// - [`Error::Config`] when a value fails validation
    pub fn build(self) -> Result<CoreConfig> {
        let media_server = self.media_server.ok_or_else(media_server_missing_error)?;
        let offline_store = self.offline_store.ok_or_else(offline_store_missing_error)?;

        let config = CoreConfig {
            media_server,
            offline_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
