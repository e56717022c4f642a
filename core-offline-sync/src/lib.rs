//! # Offline Sync Module
//!
//! Keeps a disconnected on-device replica in step with a media server.
//!
//! ## Overview
//!
//! One sync run targets one server and executes four phases in a fixed order:
//! - Upload actions queued while offline, then clear them locally
//! - Reconcile the local inventory with the server (removals only)
//! - Fetch newly prepared content: media body, artwork, subtitles
//! - Reconcile again, this time propagating per-item access lists
//!
//! Phase-level failures abort the run. These include any failure to read, upload
//! or clear the action queue, a failed reconciliation request, and a failure
//! to list the job items that are ready for this device. Failures of a single
//! removal, access update, job item, image slot or subtitle file are logged
//! and skipped.
//!
//! ## Components
//!
//! - **Offline Action Reporter** (`action_reporter`): At-least-once upload of the action queue
//! - **Data Reconciler** (`reconciler`): Removal and access-list diffing
//! - **Content Fetcher** (`fetcher`): Sequential job item transfer with image slots and subtitle matching
//! - **Offline Sync Engine** (`engine`): Phase ordering, run guard, timeout and events

pub mod action_reporter;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod reconciler;
pub mod run;

pub use action_reporter::OfflineActionReporter;
pub use engine::{OfflineSyncEngine, SyncConfig};
pub use error::{Result, SyncError};
pub use fetcher::{find_subtitle_stream, image_slots, ContentFetcher, ImageSlot, MissingStreamPolicy};
pub use reconciler::DataReconciler;
pub use run::{FetchSummary, ReconcileSummary, SyncRunId, SyncRunStats};
