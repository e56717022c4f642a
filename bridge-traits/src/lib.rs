//! # Host Bridge Traits
//!
//! Contracts between the offline sync core and the host platform.
//!
//! ## Overview
//!
//! The sync core never talks to a network stack or a database directly. Each
//! capability it needs is expressed as a trait here and injected by the host
//! (desktop, iOS, Android) at construction time.
//!
//! ## Traits
//!
//! ### Offline sync collaborators
//! - [`MediaServerClient`](media_server::MediaServerClient) - Remote catalog API
//! - [`OfflineStore`](offline_store::OfflineStore) - Local offline replica
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP used by server connectors
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep the message actionable
//! (include the item id or status code involved).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one instance can be shared by the
//! sync engine and the rest of the host application.

pub mod error;
pub mod http;
pub mod media;
pub mod media_server;
pub mod offline_store;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use media::{
    AdditionalFile, ImageKind, ItemFileType, ItemUserAccess, LibraryItem, LocalItem,
    MediaSource, MediaStream, MediaStreamType, ReconciliationRequest, ReconciliationResult,
    RemoteActionRecord, ServerTarget, SyncJobItem,
};
pub use media_server::MediaServerClient;
pub use offline_store::OfflineStore;
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
