//! # Offline Sync Engine
//!
//! Runs the four sync phases against one server, strictly in order:
//!
//! 1. [`ReportOfflineActions`](SyncPhase::ReportOfflineActions)
//! 2. [`Reconcile`](SyncPhase::Reconcile) without access propagation
//! 3. [`FetchNewContent`](SyncPhase::FetchNewContent)
//! 4. [`ReconcileWithAccess`](SyncPhase::ReconcileWithAccess)
//!
//! A phase starts only after the previous one succeeded; the first phase
//! error aborts the run and becomes the result of [`OfflineSyncEngine::sync`].
//! Progress is published on the [`EventBus`] and per-item detail goes to the
//! log stream.
//!
//! ## Usage
//!
//! ```ignore
//! use core_offline_sync::{OfflineSyncEngine, SyncConfig};
//! use bridge_traits::ServerTarget;
//!
//! let engine = OfflineSyncEngine::from_core_config(&core_config, SyncConfig::default())?;
//! let mut events = engine.subscribe();
//!
//! engine
//!     .sync(&ServerTarget::new("server-1").with_offline_user("user-1"))
//!     .await?;
//! ```

use crate::action_reporter::OfflineActionReporter;
use crate::fetcher::{ContentFetcher, MissingStreamPolicy};
use crate::reconciler::DataReconciler;
use crate::run::{SyncRunId, SyncRunStats};
use crate::{Result, SyncError};
use bridge_traits::{Clock, MediaServerClient, OfflineStore, ServerTarget};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent, SyncPhase};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tracing::{error, field, info, instrument, warn, Span};

/// Configuration for offline sync runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Timeout for an entire sync run (seconds)
    pub sync_timeout_secs: u64,

    /// Timeout for each media, image or subtitle download (seconds)
    pub download_timeout_secs: u64,

    /// Handling of subtitle files with no matching stream
    pub missing_subtitle_stream: MissingStreamPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_timeout_secs: 3600, // 1 hour
            download_timeout_secs: 300,
            missing_subtitle_stream: MissingStreamPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sync_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "sync_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.download_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "download_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

type ActiveSyncs = Arc<Mutex<HashSet<String>>>;

/// Marks a server as being synced until dropped.
///
/// Released on every exit path, including a timed out or abandoned run.
struct RunGuard {
    active_syncs: ActiveSyncs,
    server_id: String,
}

impl RunGuard {
    fn acquire(active_syncs: &ActiveSyncs, server_id: &str) -> Result<Self> {
        let mut active = active_syncs.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(server_id.to_string()) {
            return Err(SyncError::SyncInProgress {
                server_id: server_id.to_string(),
            });
        }

        Ok(Self {
            active_syncs: Arc::clone(active_syncs),
            server_id: server_id.to_string(),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active_syncs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.server_id);
    }
}

/// Tags a phase error with the phase it came from.
fn in_phase(phase: SyncPhase) -> impl FnOnce(SyncError) -> (Option<SyncPhase>, SyncError) {
    move |e| (Some(phase), e)
}

pub struct OfflineSyncEngine {
    config: SyncConfig,
    reporter: OfflineActionReporter,
    reconciler: DataReconciler,
    fetcher: ContentFetcher,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    active_syncs: ActiveSyncs,
}

impl OfflineSyncEngine {
    pub fn new(
        config: SyncConfig,
        client: Arc<dyn MediaServerClient>,
        store: Arc<dyn OfflineStore>,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let fetcher = ContentFetcher::new(
            Arc::clone(&client),
            Arc::clone(&store),
            Duration::from_secs(config.download_timeout_secs),
            config.missing_subtitle_stream,
        );

        Ok(Self {
            reporter: OfflineActionReporter::new(Arc::clone(&client), Arc::clone(&store)),
            reconciler: DataReconciler::new(client, store),
            fetcher,
            config,
            event_bus,
            clock,
            active_syncs: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Build an engine from the host's core configuration.
    pub fn from_core_config(core: &CoreConfig, config: SyncConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::clone(&core.media_server),
            Arc::clone(&core.offline_store),
            EventBus::new(core.event_buffer_size),
            Arc::clone(&core.clock),
        )
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    pub fn is_sync_active(&self, server_id: &str) -> bool {
        self.active_syncs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(server_id)
    }

    /// Run a full offline sync against `target`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SyncInProgress`] if this engine is already syncing the server
    /// - [`SyncError::Timeout`] if the run exceeds `sync_timeout_secs`
    /// - the first phase-level error otherwise
    #[instrument(skip(self, target), fields(server_id = %target.server_id, run_id = field::Empty))]
    pub async fn sync(&self, target: &ServerTarget) -> Result<()> {
        let _guard = RunGuard::acquire(&self.active_syncs, &target.server_id)?;

        let run_id = SyncRunId::new();
        Span::current().record("run_id", field::display(run_id));

        let started_at = self.clock.now();
        info!("Starting offline sync");
        self.emit(SyncEvent::Started {
            run_id: run_id.to_string(),
            server_id: target.server_id.clone(),
        });

        let limit = Duration::from_secs(self.config.sync_timeout_secs);
        let outcome = match tokio::time::timeout(limit, self.run_phases(run_id, target)).await {
            Ok(outcome) => outcome,
            Err(_) => Err((
                None,
                SyncError::Timeout {
                    operation: "offline sync".to_string(),
                    seconds: self.config.sync_timeout_secs,
                },
            )),
        };

        match outcome {
            Ok(stats) => {
                let duration_secs = (self.clock.now() - started_at).num_seconds().max(0) as u64;
                info!(
                    actions_reported = stats.actions_reported,
                    items_removed = stats.items_removed,
                    removal_failures = stats.removal_failures,
                    access_lists_updated = stats.access_lists_updated,
                    access_failures = stats.access_failures,
                    items_transferred = stats.items_transferred,
                    items_failed = stats.items_failed,
                    duration_secs,
                    "Offline sync completed"
                );
                self.emit(SyncEvent::Completed {
                    run_id: run_id.to_string(),
                    server_id: target.server_id.clone(),
                    actions_reported: stats.actions_reported,
                    items_removed: stats.items_removed,
                    access_lists_updated: stats.access_lists_updated,
                    items_transferred: stats.items_transferred,
                    items_failed: stats.items_failed,
                    duration_secs,
                });
                Ok(())
            }
            Err((phase, e)) => {
                error!(phase = ?phase, error = %e, "Offline sync failed");
                self.emit(SyncEvent::Failed {
                    run_id: run_id.to_string(),
                    server_id: target.server_id.clone(),
                    phase,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_phases(
        &self,
        run_id: SyncRunId,
        target: &ServerTarget,
    ) -> std::result::Result<SyncRunStats, (Option<SyncPhase>, SyncError)> {
        let mut stats = SyncRunStats::default();

        let reported = self
            .reporter
            .report_offline_actions(target)
            .await
            .map_err(in_phase(SyncPhase::ReportOfflineActions))?;
        stats.actions_reported = reported as u64;
        self.phase_completed(run_id, target, SyncPhase::ReportOfflineActions);

        let summary = self
            .reconciler
            .reconcile(target, false)
            .await
            .map_err(in_phase(SyncPhase::Reconcile))?;
        stats.record_reconcile(summary);
        self.phase_completed(run_id, target, SyncPhase::Reconcile);

        let summary = self
            .fetcher
            .fetch_new_content(target)
            .await
            .map_err(in_phase(SyncPhase::FetchNewContent))?;
        stats.record_fetch(summary);
        self.phase_completed(run_id, target, SyncPhase::FetchNewContent);

        let summary = self
            .reconciler
            .reconcile(target, true)
            .await
            .map_err(in_phase(SyncPhase::ReconcileWithAccess))?;
        stats.record_reconcile(summary);
        self.phase_completed(run_id, target, SyncPhase::ReconcileWithAccess);

        Ok(stats)
    }

    fn phase_completed(&self, run_id: SyncRunId, target: &ServerTarget, phase: SyncPhase) {
        info!(phase = %phase, "Sync phase completed");
        self.emit(SyncEvent::PhaseCompleted {
            run_id: run_id.to_string(),
            server_id: target.server_id.clone(),
            phase,
        });
    }

    fn emit(&self, event: SyncEvent) {
        if self.event_bus.subscriber_count() == 0 {
            return;
        }
        if let Err(e) = self.event_bus.emit(CoreEvent::Sync(event)) {
            warn!(error = %e, "Failed to publish sync event");
        }
    }
}
