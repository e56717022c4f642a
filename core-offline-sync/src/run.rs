//! Run identity and bookkeeping for a single offline sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncRunId(Uuid);

impl SyncRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of the reconciliation phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub items_removed: u64,
    pub removal_failures: u64,
    pub access_lists_updated: u64,
    pub access_failures: u64,
}

/// Outcome of the content fetch phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub items_transferred: u64,
    pub items_failed: u64,
}

/// Counters accumulated over a whole run.
///
/// Only used for logs and the completion event; callers of `sync` get a plain
/// success or failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunStats {
    pub actions_reported: u64,
    pub items_removed: u64,
    pub removal_failures: u64,
    pub access_lists_updated: u64,
    pub access_failures: u64,
    pub items_transferred: u64,
    pub items_failed: u64,
}

impl SyncRunStats {
    pub fn record_reconcile(&mut self, summary: ReconcileSummary) {
        self.items_removed += summary.items_removed;
        self.removal_failures += summary.removal_failures;
        self.access_lists_updated += summary.access_lists_updated;
        self.access_failures += summary.access_failures;
    }

    pub fn record_fetch(&mut self, summary: FetchSummary) {
        self.items_transferred += summary.items_transferred;
        self.items_failed += summary.items_failed;
    }
}
