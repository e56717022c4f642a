//! Media server API connector implementation
//!
//! Implements the `MediaServerClient` trait over the host's `HttpClient`.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::{
    ImageKind, MediaServerClient, ReconciliationRequest, ReconciliationResult,
    RemoteActionRecord, SyncJobItem,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use urlencoding::encode;

use crate::error::MediaServerError;

/// Header carrying the access token on API calls
const TOKEN_HEADER: &str = "X-MediaBrowser-Token";

/// Timeout for API calls (download URLs are fetched by the host)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts for idempotent reads
const READ_ATTEMPTS: u32 = 3;

/// Media server API connector
///
/// Implements `MediaServerClient` for the server's sync endpoints.
///
/// # Endpoints
///
/// - `POST /Sync/OfflineActions` - upload queued offline actions
/// - `POST /Sync/Data` - reconcile the local inventory
/// - `GET /Sync/Items/Ready?TargetId=` - job items ready for this device
/// - `POST /Sync/JobItems/{id}/Transferred` - acknowledge a transfer
///
/// Download URLs embed the access token as `api_key` because the host's
/// download manager fetches them without our headers.
///
/// # Example
///
/// ```ignore
/// use provider_media_server::MediaServerConnector;
///
/// let connector = MediaServerConnector::new(
///     http_client,
///     "https://media.example.com",
///     access_token,
///     device_id,
/// )?;
/// ```
pub struct MediaServerConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    access_token: String,
    device_id: String,
}

impl MediaServerConnector {
    /// Create a new connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `base_url` - Server root, with or without a trailing slash
    /// * `access_token` - Token issued to this device's session
    /// * `device_id` - Identity the server uses as the sync target
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        device_id: impl Into<String>,
    ) -> crate::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(MediaServerError::InvalidConfig(format!(
                "base URL must be http(s): {}",
                base_url
            )));
        }

        let device_id = device_id.into();
        if device_id.is_empty() {
            return Err(MediaServerError::InvalidConfig(
                "device id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            http_client,
            base_url,
            access_token: access_token.into(),
            device_id,
        })
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}/{}", self.base_url, path))
            .header(TOKEN_HEADER, self.access_token.clone())
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body).map_err(|e| {
            MediaServerError::ParseError(format!("Failed to parse {}: {}", what, e)).into()
        })
    }

    /// Execute a request, retrying rate limits, server errors and transport
    /// failures with exponential backoff.
    #[instrument(skip(self, request), fields(path = %request.url.trim_start_matches(&self.base_url)))]
    async fn execute_with_retry(&self, request: HttpRequest, max_attempts: u32) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, "API request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status;
                    let retryable = status == 429 || (500..600).contains(&status);

                    if !retryable || attempt >= max_attempts {
                        warn!(status, attempt, "API request failed");
                        return Err(MediaServerError::ApiError {
                            status_code: status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        }
                        .into());
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(status, attempt, backoff_ms, "API request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        warn!(attempt, error = %e, "API request failed");
                        return Err(e);
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(attempt, backoff_ms, error = %e, "API request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl MediaServerClient for MediaServerConnector {
    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    #[instrument(skip(self, actions), fields(count = actions.len()))]
    async fn report_offline_actions(&self, actions: &[RemoteActionRecord]) -> Result<()> {
        let request = self
            .request(HttpMethod::Post, "Sync/OfflineActions")
            .json(actions)?;

        self.execute_with_retry(request, 1).await?;
        info!("Reported offline actions");
        Ok(())
    }

    #[instrument(skip(self, request), fields(local_items = request.local_item_ids.len()))]
    async fn reconcile(&self, request: &ReconciliationRequest) -> Result<ReconciliationResult> {
        let http_request = self.request(HttpMethod::Post, "Sync/Data").json(request)?;

        let response = self.execute_with_retry(http_request, 1).await?;
        let result: ReconciliationResult = Self::parse(&response, "sync data response")?;

        info!(
            to_remove = result.item_ids_to_remove.len(),
            access_entries = result.item_user_access.len(),
            "Received sync data"
        );
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn list_ready_sync_items(&self, device_id: &str) -> Result<Vec<SyncJobItem>> {
        let path = format!("Sync/Items/Ready?TargetId={}", encode(device_id));
        let request = self.request(HttpMethod::Get, &path);

        let response = self.execute_with_retry(request, READ_ATTEMPTS).await?;
        let items: Vec<SyncJobItem> = Self::parse(&response, "ready sync items")?;

        info!(count = items.len(), "Listed ready sync items");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn report_transfer_complete(&self, job_item_id: &str) -> Result<()> {
        let path = format!("Sync/JobItems/{}/Transferred", encode(job_item_id));
        let request = self.request(HttpMethod::Post, &path);

        self.execute_with_retry(request, 1).await?;
        Ok(())
    }

    fn media_file_url(&self, job_item_id: &str) -> String {
        format!(
            "{}/Sync/JobItems/{}/File?api_key={}",
            self.base_url,
            encode(job_item_id),
            encode(&self.access_token)
        )
    }

    fn image_url(&self, item_id: &str, kind: ImageKind, tag: &str) -> String {
        format!(
            "{}/Items/{}/Images/{}?tag={}&api_key={}",
            self.base_url,
            encode(item_id),
            kind,
            encode(tag),
            encode(&self.access_token)
        )
    }

    fn additional_file_url(&self, job_item_id: &str, file_name: &str) -> String {
        format!(
            "{}/Sync/JobItems/{}/AdditionalFiles?Name={}&api_key={}",
            self.base_url,
            encode(job_item_id),
            encode(file_name),
            encode(&self.access_token)
        )
    }
}
