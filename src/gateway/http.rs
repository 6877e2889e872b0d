//! REST implementation of [`SeatingGateway`]

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::*;
use crate::config::SessionConfig;

/// HTTP client for the seating service
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &SessionConfig) -> GatewayResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn seating_path(event_id: &str, rest: &str) -> String {
        if rest.is_empty() {
            format!("events/{event_id}/seating")
        } else {
            format!("events/{event_id}/seating/{rest}")
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let url = self.url(path);
        debug!("GET {url}");
        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> GatewayResult<T> {
        let url = self.url(path);
        debug!("POST {url}");
        let response = self.authorize(self.client.post(&url).json(body)).send().await?;
        Self::handle_response(response).await
    }

    async fn check_status(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        Err(match status {
            StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
            StatusCode::NOT_FOUND => GatewayError::NotFound(text),
            _ => GatewayError::Rejected {
                status: status.as_u16(),
                body: text,
            },
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SeatingGateway for HttpGateway {
    async fn fetch_roster(&self, event_id: &str) -> GatewayResult<Roster> {
        self.get(&format!("events/{event_id}/guests")).await
    }

    async fn fetch_snapshot(&self, event_id: &str) -> GatewayResult<Option<SeatingSnapshot>> {
        match self.get(&Self::seating_path(event_id, "")).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            // Nothing saved yet is an empty state, not a failure.
            Err(GatewayError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn push_snapshot(&self, event_id: &str, snapshot: &SeatingSnapshot) -> GatewayResult<Option<Ms>> {
        let url = self.url(&Self::seating_path(event_id, ""));
        debug!("POST {url}");
        let response = self.authorize(self.client.post(&url).json(snapshot)).send().await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        // Acknowledgement bodies vary; only `updatedAt` matters.
        Ok(serde_json::from_slice::<PushAck>(&bytes)
            .map(|ack| ack.updated_at)
            .unwrap_or(None))
    }

    async fn process_sync(&self, event_id: &str, request: &SyncProcessRequest) -> GatewayResult<SyncProcessResponse> {
        self.post(&Self::seating_path(event_id, "sync/process"), request).await
    }

    async fn apply_sync_option(&self, event_id: &str, request: &ApplyOptionRequest) -> GatewayResult<SeatingSnapshot> {
        self.post(&Self::seating_path(event_id, "sync/apply-option"), request)
            .await
    }

    async fn move_to_unassigned(
        &self,
        event_id: &str,
        request: &MoveToUnassignedRequest,
    ) -> GatewayResult<SeatingSnapshot> {
        self.post(&Self::seating_path(event_id, "sync/move-to-unassigned"), request)
            .await
    }

    async fn generate_arrangement(&self, event_id: &str, request: &GenerateRequest) -> GatewayResult<SeatingSnapshot> {
        self.post(&Self::seating_path(event_id, "ai-generate"), request).await
    }

    async fn suggest_tables(&self, event_id: &str, request: &SuggestTablesRequest) -> GatewayResult<TablePlan> {
        self.post(&Self::seating_path(event_id, "suggest-tables"), request)
            .await
    }

    async fn export(
        &self,
        event_id: &str,
        format: ExportFormat,
        request: &ExportRequest,
    ) -> GatewayResult<serde_json::Value> {
        let path = format!("{}?format={}", Self::seating_path(event_id, "export"), format.as_str());
        self.post(&path, request).await
    }
}
