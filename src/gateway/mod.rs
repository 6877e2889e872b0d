//! Boundary to the remote seating service: roster, snapshot persistence,
//! reconciliation, suggestion and export endpoints.

mod error;
mod http;

pub use error::{GatewayError, GatewayResult};
pub use http::HttpGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::TableSummary;
use crate::limits::MAX_TABLES_PER_EVENT;
use crate::model::*;
use crate::reconcile::DriftEvent;

// ── Wire documents ───────────────────────────────────────────────

/// Confirmed-guest roster as supplied by the roster collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(default)]
    pub separated_seating: bool,
    pub guests: Vec<Guest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushAck {
    #[serde(default)]
    pub updated_at: Option<Ms>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProcessRequest {
    pub triggers: Vec<DriftEvent>,
    pub is_separated_seating: bool,
}

/// A server-proposed resolution of an ambiguous drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncProcessResponse {
    pub has_changes: bool,
    pub requires_user_decision: bool,
    pub options: Vec<SyncOption>,
    pub affected_guests: Vec<GuestId>,
    pub pending_triggers: Vec<DriftEvent>,
    pub seating: Option<SeatingSnapshot>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOptionRequest {
    pub option_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_arrangement: Option<SeatingSnapshot>,
    pub is_separated_seating: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToUnassignedRequest {
    pub affected_guest_ids: Vec<GuestId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingTable {
    pub id: TableId,
    pub capacity: u32,
    pub occupied: u32,
    pub gender: Partition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTablesRequest {
    pub total_guests: u32,
    pub male_guests: u32,
    pub female_guests: u32,
    pub existing_tables: Vec<ExistingTable>,
    pub preferences: Preferences,
    pub preserve_existing: bool,
    pub is_separated_seating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSuggestion {
    pub capacity: u32,
    pub count: u32,
}

/// Suggested counts by capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePlan {
    pub suggestions: Vec<TableSuggestion>,
    pub message: Option<String>,
}

impl TablePlan {
    /// One capacity per table to create. Stops one past the per-event table
    /// limit so an oversized plan is rejected by the engine rather than
    /// expanded in full.
    pub fn capacities(&self) -> Vec<u32> {
        self.suggestions
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.capacity, s.count as usize))
            .take(MAX_TABLES_PER_EVENT + 1)
            .collect()
    }

    pub fn total_seats(&self) -> u32 {
        self.suggestions
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.capacity.saturating_mul(s.count)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub guests: Vec<Guest>,
    #[serde(flatten)]
    pub seating: SeatingSnapshot,
    pub preserve_existing: bool,
    pub is_separated_seating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Excel,
    Png,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
            ExportFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(flatten)]
    pub seating: SeatingSnapshot,
    pub summaries: Vec<TableSummary>,
    pub guests: Vec<Guest>,
}

// ── Collaborator boundary ────────────────────────────────────────

/// Everything a seating session needs from the outside world.
#[async_trait]
pub trait SeatingGateway: Send + Sync {
    async fn fetch_roster(&self, event_id: &str) -> GatewayResult<Roster>;

    /// Current persisted snapshot; `None` when nothing was saved yet.
    async fn fetch_snapshot(&self, event_id: &str) -> GatewayResult<Option<SeatingSnapshot>>;

    /// Persist a full snapshot. Returns the server's `updatedAt` if it
    /// reports one.
    async fn push_snapshot(&self, event_id: &str, snapshot: &SeatingSnapshot) -> GatewayResult<Option<Ms>>;

    async fn process_sync(&self, event_id: &str, request: &SyncProcessRequest) -> GatewayResult<SyncProcessResponse>;

    async fn apply_sync_option(&self, event_id: &str, request: &ApplyOptionRequest) -> GatewayResult<SeatingSnapshot>;

    async fn move_to_unassigned(
        &self,
        event_id: &str,
        request: &MoveToUnassignedRequest,
    ) -> GatewayResult<SeatingSnapshot>;

    async fn generate_arrangement(&self, event_id: &str, request: &GenerateRequest) -> GatewayResult<SeatingSnapshot>;

    async fn suggest_tables(&self, event_id: &str, request: &SuggestTablesRequest) -> GatewayResult<TablePlan>;

    /// Export-ready document description; rendering happens elsewhere.
    async fn export(
        &self,
        event_id: &str,
        format: ExportFormat,
        request: &ExportRequest,
    ) -> GatewayResult<serde_json::Value>;
}
