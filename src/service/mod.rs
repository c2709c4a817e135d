//! Scheduling service contract.
//!
//! The board reads full snapshots from an external planning/scheduling
//! service and sends it mutation requests. Transport is up to the
//! implementor; the board only relies on the request/response shapes
//! below. [`InMemoryService`] is an in-process implementation used for
//! tests and offline demos.

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::models::{PlanningData, Timestamp};

pub use memory::{InMemoryService, Operation};

/// Destination of a move request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(rename = "resourceId")]
    pub court_id: String,
    pub start_time: Timestamp,
}

/// Court-only reassignment. `court_id: None` removes the court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAssignment {
    pub encounter_id: String,
    #[serde(rename = "resourceId")]
    pub court_id: Option<String>,
}

/// Bulk auto-assignment for one division (optionally one phase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScheduleRequest {
    pub event_id: String,
    pub division_id: String,
    pub phase_id: Option<String>,
    /// Drop existing placements of the scope before planning.
    pub clear_existing: bool,
    /// Avoid courts already occupied by other divisions.
    pub respect_resource_overlap: bool,
}

/// A problem the scheduler could not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    pub encounter_ids: Vec<String>,
    pub court_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScheduleResponse {
    pub assigned_count: usize,
    #[serde(default)]
    pub conflicts: Vec<ScheduleConflict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub has_conflicts: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub conflict_count: usize,
}

/// Publish either succeeds or is refused because of conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishOutcome {
    Published,
    Rejected { conflict_count: usize },
}

/// Operations the board needs from the scheduling service.
///
/// Every method is a single request; the board reloads the full snapshot
/// afterwards rather than trusting any partial response.
#[async_trait]
pub trait SchedulingService: Send + Sync {
    /// Full planning snapshot for an event.
    async fn planning_data(&self, event_id: &str) -> Result<PlanningData, ServiceError>;

    /// Secondary timeline dataset. Best effort; opaque to the board.
    async fn timeline_data(&self, event_id: &str) -> Result<serde_json::Value, ServiceError>;

    async fn auto_schedule(
        &self,
        request: AutoScheduleRequest,
    ) -> Result<AutoScheduleResponse, ServiceError>;

    /// Removes every court/time assignment of a division.
    async fn clear_assignments(&self, division_id: &str) -> Result<(), ServiceError>;

    async fn move_encounter(
        &self,
        encounter_id: &str,
        placement: Placement,
    ) -> Result<MoveResponse, ServiceError>;

    async fn assign_resources(
        &self,
        event_id: &str,
        assignments: Vec<ResourceAssignment>,
    ) -> Result<(), ServiceError>;

    /// Read-only conflict check.
    async fn validate_schedule(&self, event_id: &str) -> Result<ValidationReport, ServiceError>;

    async fn publish_schedule(&self, event_id: &str) -> Result<PublishOutcome, ServiceError>;

    async fn unpublish_schedule(&self, event_id: &str) -> Result<(), ServiceError>;
}
