//! # Data Reconciler
//!
//! Exchanges the local inventory with the server and applies its verdict.
//!
//! ## Workflow
//!
//! 1. Enumerate local item ids for the server
//! 2. Send a [`ReconciliationRequest`] and receive the result
//! 3. Remove every item the server no longer wants on the device
//! 4. Optionally rewrite per-item access lists that changed
//!
//! Only the enumeration and the request itself can fail the call. Removal and
//! access updates are isolated per item: a failure is logged and the next item
//! is attempted. The call returns only after both sub-phases have settled.
//!
//! The orchestrator runs this twice: once before fetching new content without
//! access propagation, and once after with it, so freshly created items
//! receive their access lists in the same run.

use crate::run::ReconcileSummary;
use crate::{Result, SyncError};
use bridge_traits::{
    ItemUserAccess, MediaServerClient, OfflineStore, ReconciliationRequest, ServerTarget,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of applying one access list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessOutcome {
    Updated,
    Unchanged,
    NotHeldLocally,
}

pub struct DataReconciler {
    client: Arc<dyn MediaServerClient>,
    store: Arc<dyn OfflineStore>,
}

impl DataReconciler {
    pub fn new(client: Arc<dyn MediaServerClient>, store: Arc<dyn OfflineStore>) -> Self {
        Self { client, store }
    }

    #[instrument(skip(self, target), fields(server_id = %target.server_id))]
    pub async fn reconcile(
        &self,
        target: &ServerTarget,
        propagate_access: bool,
    ) -> Result<ReconcileSummary> {
        let local_item_ids = self
            .store
            .get_server_item_ids(&target.server_id)
            .await
            .map_err(SyncError::storage("get_server_item_ids"))?;

        let request = ReconciliationRequest {
            target_id: self.client.device_id(),
            local_item_ids,
            offline_user_ids: target.offline_user_ids.clone(),
        };

        debug!(
            local_items = request.local_item_ids.len(),
            offline_users = request.offline_user_ids.len(),
            "Sending reconciliation request"
        );

        let result = self
            .client
            .reconcile(&request)
            .await
            .map_err(SyncError::transport("reconcile"))?;

        info!(
            to_remove = result.item_ids_to_remove.len(),
            access_entries = result.item_user_access.len(),
            "Reconciliation result received"
        );

        let mut summary = ReconcileSummary::default();
        self.remove_local_items(target, &result.item_ids_to_remove, &mut summary)
            .await;

        if propagate_access {
            self.sync_user_item_access(target, &result.item_user_access, &mut summary)
                .await;
        }

        Ok(summary)
    }

    async fn remove_local_items(
        &self,
        target: &ServerTarget,
        item_ids: &[String],
        summary: &mut ReconcileSummary,
    ) {
        for item_id in item_ids {
            match self
                .store
                .remove_local_item(&target.server_id, item_id)
                .await
            {
                Ok(()) => {
                    debug!(item_id = %item_id, "Removed local item");
                    summary.items_removed += 1;
                }
                Err(e) => {
                    warn!(item_id = %item_id, error = %e, "Failed to remove local item");
                    summary.removal_failures += 1;
                }
            }
        }
    }

    async fn sync_user_item_access(
        &self,
        target: &ServerTarget,
        access: &ItemUserAccess,
        summary: &mut ReconcileSummary,
    ) {
        for (item_id, user_ids) in access.iter() {
            match self
                .sync_user_access_for_item(&target.server_id, item_id, user_ids)
                .await
            {
                Ok(AccessOutcome::Updated) => {
                    debug!(item_id = %item_id, users = user_ids.len(), "Updated access list");
                    summary.access_lists_updated += 1;
                }
                Ok(AccessOutcome::Unchanged) => {}
                Ok(AccessOutcome::NotHeldLocally) => {
                    debug!(item_id = %item_id, "Access list for item not held locally");
                }
                Err(e) => {
                    warn!(item_id = %item_id, error = %e, "Failed to update access list");
                    summary.access_failures += 1;
                }
            }
        }
    }

    async fn sync_user_access_for_item(
        &self,
        server_id: &str,
        item_id: &str,
        user_ids: &[String],
    ) -> Result<AccessOutcome> {
        let Some(mut local_item) = self
            .store
            .get_local_item(server_id, item_id)
            .await
            .map_err(SyncError::storage("get_local_item"))?
        else {
            return Ok(AccessOutcome::NotHeldLocally);
        };

        if local_item.has_same_access(user_ids) {
            return Ok(AccessOutcome::Unchanged);
        }

        local_item.user_ids_with_access = user_ids.to_vec();
        self.store
            .add_or_update_local_item(&local_item)
            .await
            .map_err(SyncError::storage("add_or_update_local_item"))?;

        Ok(AccessOutcome::Updated)
    }
}
