//! In-process scheduling service.
//!
//! Holds one [`PlanningData`] value and applies requests to it directly.
//! Auto-scheduling is a greedy earliest-available-court heuristic:
//!
//! 1. Order the scope's unassigned encounters by phase order, then match number.
//! 2. For each encounter, pick the allowed court that frees up first.
//! 3. Place it there and advance that court's availability by its duration.
//!
//! Court availability starts at the event start and is pushed past
//! existing placements of the same division, and of other divisions when
//! `respect_resource_overlap` is set. Conflicts are court overlaps.
//!
//! Not a replacement for the real scheduler: it exists so the board can
//! run offline and so degraded paths can be tested (see [`InMemoryService::fail`]).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Duration;

use super::{
    AutoScheduleRequest, AutoScheduleResponse, MoveResponse, Placement, PublishOutcome,
    ResourceAssignment, ScheduleConflict, SchedulingService, ValidationReport,
};
use crate::config::DEFAULT_DURATION_MINUTES;
use crate::error::ServiceError;
use crate::layout::ResourceGridIndex;
use crate::models::{EncounterStatus, PlanningData, Timestamp};
use crate::sync::lock;

/// Service operations, for failure injection and call inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PlanningData,
    TimelineData,
    AutoSchedule,
    ClearAssignments,
    MoveEncounter,
    AssignResources,
    ValidateSchedule,
    PublishSchedule,
    UnpublishSchedule,
}

/// A [`SchedulingService`] over an in-memory planning dataset.
#[derive(Debug)]
pub struct InMemoryService {
    data: Mutex<PlanningData>,
    timeline: Mutex<Option<serde_json::Value>>,
    failing: Mutex<HashSet<Operation>>,
    calls: Mutex<Vec<Operation>>,
    auto_requests: Mutex<Vec<AutoScheduleRequest>>,
    default_duration_minutes: u32,
}

impl InMemoryService {
    pub fn new(data: PlanningData) -> Self {
        Self {
            data: Mutex::new(data),
            timeline: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            auto_requests: Mutex::new(Vec::new()),
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn with_timeline(self, timeline: serde_json::Value) -> Self {
        *lock(&self.timeline) = Some(timeline);
        self
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Makes every following call of `op` fail with `Unavailable`.
    pub fn fail(&self, op: Operation) {
        lock(&self.failing).insert(op);
    }

    pub fn recover(&self, op: Operation) {
        lock(&self.failing).remove(&op);
    }

    /// Copy of the current dataset.
    pub fn snapshot(&self) -> PlanningData {
        lock(&self.data).clone()
    }

    /// Replaces the dataset, as another operator's edit would.
    pub fn replace(&self, data: PlanningData) {
        *lock(&self.data) = data;
    }

    /// Operations received so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        lock(&self.calls).clone()
    }

    /// Auto-schedule requests received so far, including failed ones.
    pub fn auto_schedule_requests(&self) -> Vec<AutoScheduleRequest> {
        lock(&self.auto_requests).clone()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        lock(&self.calls).iter().filter(|&&c| c == op).count()
    }

    fn enter(&self, op: Operation) -> Result<(), ServiceError> {
        lock(&self.calls).push(op);
        if lock(&self.failing).contains(&op) {
            return Err(ServiceError::Unavailable(format!("{op:?} is failing")));
        }
        Ok(())
    }

    fn overlaps(&self, data: &PlanningData) -> Vec<ScheduleConflict> {
        ResourceGridIndex::build_with_duration(data.schedulable_encounters(), self.default_duration_minutes)
            .overlaps()
            .into_iter()
            .map(|o| ScheduleConflict {
                message: format!("{} overlaps {} on {}", o.first, o.second, o.court_id),
                encounter_ids: vec![o.first, o.second],
                court_id: Some(o.court_id),
            })
            .collect()
    }

    fn greedy_schedule(
        &self,
        data: &mut PlanningData,
        request: &AutoScheduleRequest,
    ) -> Result<AutoScheduleResponse, ServiceError> {
        let division = data
            .division(&request.division_id)
            .ok_or_else(|| ServiceError::not_found("division", &request.division_id))?;
        if let Some(pid) = &request.phase_id {
            if division.phase(pid).is_none() {
                return Err(ServiceError::not_found("phase", pid));
            }
        }
        let phase_rank: HashMap<String, usize> = division
            .ordered_phases()
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let courts: Vec<String> = data
            .allowed_courts(&request.division_id)
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        if courts.is_empty() {
            return Err(ServiceError::Rejected(format!(
                "division {} has no resource groups",
                request.division_id
            )));
        }

        let in_scope = |division_id: &str, phase_id: Option<&String>| {
            division_id == request.division_id
                && request
                    .phase_id
                    .as_ref()
                    .map_or(true, |pid| phase_id == Some(pid))
        };
        let movable = |status: EncounterStatus| {
            matches!(status, EncounterStatus::Pending | EncounterStatus::Scheduled)
        };

        if request.clear_existing {
            for e in data.encounters.iter_mut().filter(|e| !e.is_bye) {
                if in_scope(&e.division_id, e.phase_id.as_ref()) && movable(e.status) {
                    e.court_id = None;
                    e.start_time = None;
                    e.status = EncounterStatus::Pending;
                }
            }
        }

        // Court availability: after the event start and after every blocking placement.
        let mut available: HashMap<&str, Timestamp> = courts
            .iter()
            .map(|c| (c.as_str(), data.event_start_date))
            .collect();
        for e in data.schedulable_encounters() {
            let blocks = e.division_id == request.division_id || request.respect_resource_overlap;
            let (Some(court), Some((_, end))) = (&e.court_id, e.interval(self.default_duration_minutes))
            else {
                continue;
            };
            if let Some(t) = available.get_mut(court.as_str()) {
                if blocks && end > *t {
                    *t = end;
                }
            }
        }

        let mut order: Vec<usize> = data
            .encounters
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                !e.is_bye
                    && !e.is_assigned()
                    && movable(e.status)
                    && in_scope(&e.division_id, e.phase_id.as_ref())
            })
            .map(|(i, _)| i)
            .collect();
        let rank = |i: usize| {
            let e = &data.encounters[i];
            let phase = e
                .phase_id
                .as_ref()
                .and_then(|p| phase_rank.get(p).copied())
                .unwrap_or(usize::MAX);
            (phase, e.match_number, e.id.clone())
        };
        order.sort_by_key(|&i| rank(i));

        let mut placements: Vec<(usize, String, Timestamp)> = Vec::with_capacity(order.len());
        for i in order {
            // Earliest-available court; ties go to the first court in group order.
            let Some((court, start)) = courts
                .iter()
                .filter_map(|c| available.get(c.as_str()).map(|t| (c, *t)))
                .min_by_key(|(_, t)| *t)
            else {
                continue;
            };
            let minutes = data.encounters[i].effective_duration(self.default_duration_minutes);
            available.insert(court.as_str(), start + Duration::minutes(i64::from(minutes)));
            placements.push((i, court.clone(), start));
        }

        let assigned_count = placements.len();
        for (i, court, start) in placements {
            let e = &mut data.encounters[i];
            e.court_id = Some(court);
            e.start_time = Some(start);
            e.status = EncounterStatus::Scheduled;
        }

        let conflicts = self
            .overlaps(data)
            .into_iter()
            .filter(|c| {
                c.encounter_ids.iter().any(|id| {
                    data.encounter(id)
                        .is_some_and(|e| in_scope(&e.division_id, e.phase_id.as_ref()))
                })
            })
            .collect();

        Ok(AutoScheduleResponse {
            assigned_count,
            conflicts,
        })
    }
}

#[async_trait]
impl SchedulingService for InMemoryService {
    async fn planning_data(&self, event_id: &str) -> Result<PlanningData, ServiceError> {
        self.enter(Operation::PlanningData)?;
        let data = lock(&self.data);
        if data.event_id != event_id {
            return Err(ServiceError::not_found("event", event_id));
        }
        Ok(data.clone())
    }

    async fn timeline_data(&self, _event_id: &str) -> Result<serde_json::Value, ServiceError> {
        self.enter(Operation::TimelineData)?;
        lock(&self.timeline)
            .clone()
            .ok_or_else(|| ServiceError::Unavailable("no timeline data".into()))
    }

    async fn auto_schedule(
        &self,
        request: AutoScheduleRequest,
    ) -> Result<AutoScheduleResponse, ServiceError> {
        lock(&self.auto_requests).push(request.clone());
        self.enter(Operation::AutoSchedule)?;
        let mut data = lock(&self.data);
        // Plan on a copy so a rejected request leaves the dataset untouched.
        let mut draft = data.clone();
        let response = self.greedy_schedule(&mut draft, &request)?;
        *data = draft;
        Ok(response)
    }

    async fn clear_assignments(&self, division_id: &str) -> Result<(), ServiceError> {
        self.enter(Operation::ClearAssignments)?;
        let mut data = lock(&self.data);
        if data.division(division_id).is_none() {
            return Err(ServiceError::not_found("division", division_id));
        }
        for e in data.encounters.iter_mut().filter(|e| e.division_id == division_id) {
            e.court_id = None;
            e.start_time = None;
            if e.status == EncounterStatus::Scheduled {
                e.status = EncounterStatus::Pending;
            }
        }
        Ok(())
    }

    async fn move_encounter(
        &self,
        encounter_id: &str,
        placement: Placement,
    ) -> Result<MoveResponse, ServiceError> {
        self.enter(Operation::MoveEncounter)?;
        let mut data = lock(&self.data);
        if data.court(&placement.court_id).is_none() {
            return Err(ServiceError::not_found("court", &placement.court_id));
        }
        let e = data
            .encounters
            .iter_mut()
            .find(|e| e.id == encounter_id)
            .ok_or_else(|| ServiceError::not_found("encounter", encounter_id))?;
        e.court_id = Some(placement.court_id);
        e.start_time = Some(placement.start_time);
        if e.status == EncounterStatus::Pending {
            e.status = EncounterStatus::Scheduled;
        }

        let has_conflicts = self
            .overlaps(&data)
            .iter()
            .any(|c| c.encounter_ids.iter().any(|id| id == encounter_id));
        Ok(MoveResponse { has_conflicts })
    }

    async fn assign_resources(
        &self,
        event_id: &str,
        assignments: Vec<ResourceAssignment>,
    ) -> Result<(), ServiceError> {
        self.enter(Operation::AssignResources)?;
        let mut data = lock(&self.data);
        if data.event_id != event_id {
            return Err(ServiceError::not_found("event", event_id));
        }
        for a in &assignments {
            if data.encounter(&a.encounter_id).is_none() {
                return Err(ServiceError::not_found("encounter", &a.encounter_id));
            }
            if let Some(court) = &a.court_id {
                if data.court(court).is_none() {
                    return Err(ServiceError::not_found("court", court));
                }
            }
        }
        for a in assignments {
            if let Some(e) = data.encounters.iter_mut().find(|e| e.id == a.encounter_id) {
                e.court_id = a.court_id;
            }
        }
        Ok(())
    }

    async fn validate_schedule(&self, _event_id: &str) -> Result<ValidationReport, ServiceError> {
        self.enter(Operation::ValidateSchedule)?;
        let conflict_count = self.overlaps(&lock(&self.data)).len();
        Ok(ValidationReport {
            is_valid: conflict_count == 0,
            conflict_count,
        })
    }

    async fn publish_schedule(&self, _event_id: &str) -> Result<PublishOutcome, ServiceError> {
        self.enter(Operation::PublishSchedule)?;
        let mut data = lock(&self.data);
        let conflict_count = self.overlaps(&data).len();
        if conflict_count > 0 {
            return Ok(PublishOutcome::Rejected { conflict_count });
        }
        data.schedule_published_at = Some(chrono::Utc::now().fixed_offset());
        Ok(PublishOutcome::Published)
    }

    async fn unpublish_schedule(&self, _event_id: &str) -> Result<(), ServiceError> {
        self.enter(Operation::UnpublishSchedule)?;
        lock(&self.data).schedule_published_at = None;
        Ok(())
    }
}
