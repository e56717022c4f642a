//! # Offline Action Reporter
//!
//! Uploads mutations queued while the device was offline and clears them
//! locally once the server has acknowledged the batch.
//!
//! Delivery is at-least-once: the local queue is only touched after a
//! confirmed upload, so a failed run leaves every action in place for the next
//! attempt. There is no per-action tolerance; any failure fails the phase.

use crate::{Result, SyncError};
use bridge_traits::{MediaServerClient, OfflineStore, ServerTarget};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct OfflineActionReporter {
    client: Arc<dyn MediaServerClient>,
    store: Arc<dyn OfflineStore>,
}

impl OfflineActionReporter {
    pub fn new(client: Arc<dyn MediaServerClient>, store: Arc<dyn OfflineStore>) -> Self {
        Self { client, store }
    }

    /// Report all queued actions for `target` in one request.
    ///
    /// Returns the number of actions reported. An empty queue succeeds
    /// without contacting the server.
    #[instrument(skip(self, target), fields(server_id = %target.server_id))]
    pub async fn report_offline_actions(&self, target: &ServerTarget) -> Result<usize> {
        let actions = self
            .store
            .get_offline_actions(&target.server_id)
            .await
            .map_err(SyncError::storage("get_offline_actions"))?;

        if actions.is_empty() {
            debug!("No offline actions queued");
            return Ok(0);
        }

        info!(count = actions.len(), "Reporting offline actions");

        self.client
            .report_offline_actions(&actions)
            .await
            .map_err(SyncError::transport("report_offline_actions"))?;

        self.store
            .delete_offline_actions(&actions)
            .await
            .map_err(SyncError::storage("delete_offline_actions"))?;

        debug!(count = actions.len(), "Acknowledged offline actions removed");
        Ok(actions.len())
    }
}
