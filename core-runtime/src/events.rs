//! # Event Bus System
//!
//! Broadcast channel (`tokio::sync::broadcast`) through which the offline sync
//! core reports run lifecycle to the host UI.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! let event_bus = EventBus::new(16);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::Started {
//!         run_id: "run-1".to_string(),
//!         server_id: "server-1".to_string(),
//!     }))
//!     .ok();
//!
//! assert!(matches!(subscriber.try_recv(), Ok(CoreEvent::Sync(SyncEvent::Started { .. }))));
//! ```
//!
//! Emitting with no subscribers returns an error that callers ignore; events
//! are informational and never influence the outcome of a sync run.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::SendError, Receiver};

/// Default buffer size for the event bus.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Offline sync lifecycle events
    Sync(SyncEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sync(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Sync(_) => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Phases of an offline sync run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncPhase {
    ReportOfflineActions,
    Reconcile,
    FetchNewContent,
    ReconcileWithAccess,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::ReportOfflineActions => "report_offline_actions",
            SyncPhase::Reconcile => "reconcile",
            SyncPhase::FetchNewContent => "fetch_new_content",
            SyncPhase::ReconcileWithAccess => "reconcile_with_access",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events describing one offline sync run against a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Run accepted and first phase about to start.
    Started { run_id: String, server_id: String },
    /// A phase finished successfully.
    PhaseCompleted {
        run_id: String,
        server_id: String,
        phase: SyncPhase,
    },
    /// All four phases finished.
    Completed {
        run_id: String,
        server_id: String,
        actions_reported: u64,
        items_removed: u64,
        access_lists_updated: u64,
        items_transferred: u64,
        items_failed: u64,
        duration_secs: u64,
    },
    /// A phase failed and the run was aborted.
    Failed {
        run_id: String,
        server_id: String,
        phase: Option<SyncPhase>,
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Offline sync started",
            SyncEvent::PhaseCompleted { .. } => "Offline sync phase completed",
            SyncEvent::Completed { .. } => "Offline sync completed successfully",
            SyncEvent::Failed { .. } => "Offline sync failed",
        }
    }
}

/// Central event bus.
///
/// Cheap to clone; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
