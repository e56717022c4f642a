//! Workspace facade crate.
//!
//! Re-exports the offline sync engine, its host contracts and runtime so host
//! applications can depend on `media-sync-workspace` alone. The
//! `http-provider` feature (on by default) adds the HTTP `MediaServerClient`.

pub use bridge_traits;
pub use core_offline_sync;
pub use core_runtime;

#[cfg(feature = "http-provider")]
pub use provider_media_server;

pub use core_offline_sync::{OfflineSyncEngine, SyncConfig, SyncError};
