//! Board orchestration.
//!
//! [`ScheduleOrchestrator`] owns the loaded snapshot, the view state and
//! the current notice, and routes every mutation through one pipeline:
//!
//! 1. Take the busy gate (a second mutation while one is pending is refused).
//! 2. Ask for confirmation if the action is destructive.
//! 3. Send one (or, for a whole-event auto-assign, one per division) request.
//! 4. Reload the full snapshot from the service.
//! 5. Turn the outcome into a [`Notice`].
//!
//! Local data is never patched in place; derived state (hierarchy, grid,
//! axis) is always rebuilt from the reloaded snapshot. Service errors stop
//! at this boundary and become notices.
//!
//! # Reload policy
//! | Action | Reload |
//! |--------|--------|
//! | move | always, success or failure |
//! | assign court, clear, publish, unpublish | on success |
//! | auto-assign | when at least one request succeeded |
//! | validate, rejected publish | never |

mod notice;
mod snapshot;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

pub use notice::{
    AutoAssignSummary, DivisionRef, FailedDivision, Notice, NoticeDetail, NoticeLevel,
    SkipReason, SkippedDivision,
};
pub use snapshot::{BoardSnapshot, LoadState};

use crate::config::BoardConfig;
use crate::error::{BoardError, ServiceError};
use crate::interaction::{PlacementController, ViewState, ViewStateManager};
use crate::layout::{GridRow, TimeAxis};
use crate::models::Timestamp;
use crate::service::{AutoScheduleRequest, Placement, PublishOutcome, SchedulingService};
use crate::sync::lock;
use crate::validation::validate_planning_data;

/// What an auto-assign run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoAssignScope {
    /// Every division with courts and encounters, one request each.
    WholeEvent,
    /// Destructive re-plan of one division.
    Division(String),
    /// Fill the unassigned encounters of one phase, keeping other placements.
    Phase {
        division_id: String,
        phase_id: String,
    },
}

/// Destructive actions that need the user's consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearDivision { division_id: String, name: String },
    Publish,
    Unpublish,
}

/// Asks the user to confirm a destructive action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, action: &ConfirmAction) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&ConfirmAction) -> bool + Send + Sync,
{
    fn confirm(&self, action: &ConfirmAction) -> bool {
        self(action)
    }
}

/// Confirms everything. The default for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _action: &ConfirmAction) -> bool {
        true
    }
}

/// Clears the busy flag when the mutation settles, whatever the outcome.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates loading, mutations and derived state for one event.
pub struct ScheduleOrchestrator<S: SchedulingService> {
    service: Arc<S>,
    event_id: String,
    config: BoardConfig,
    confirm: Box<dyn Confirm>,
    snapshot: Mutex<Option<Arc<BoardSnapshot>>>,
    load_state: Mutex<LoadState>,
    view: Mutex<ViewStateManager>,
    notice: Mutex<Option<Notice>>,
    busy: AtomicBool,
    /// Last load ticket handed out.
    load_seq: AtomicU64,
    /// Newest load ticket whose outcome has been applied.
    load_applied: AtomicU64,
}

impl<S: SchedulingService> ScheduleOrchestrator<S> {
    pub fn new(
        service: Arc<S>,
        event_id: impl Into<String>,
        config: BoardConfig,
    ) -> Result<Self, BoardError> {
        config.validate()?;
        Ok(Self {
            service,
            event_id: event_id.into(),
            view: Mutex::new(ViewStateManager::from_config(&config)),
            config,
            confirm: Box::new(AlwaysConfirm),
            snapshot: Mutex::new(None),
            load_state: Mutex::new(LoadState::NotLoaded),
            notice: Mutex::new(None),
            busy: AtomicBool::new(false),
            load_seq: AtomicU64::new(0),
            load_applied: AtomicU64::new(0),
        })
    }

    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Whether a mutation is in flight. Mutating controls should be disabled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Option<Arc<BoardSnapshot>> {
        lock(&self.snapshot).clone()
    }

    pub fn load_state(&self) -> LoadState {
        lock(&self.load_state).clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.notice).clone()
    }

    pub fn dismiss_notice(&self) {
        *lock(&self.notice) = None;
    }

    pub fn view_state(&self) -> ViewState {
        lock(&self.view).state().clone()
    }

    pub fn view<R>(&self, f: impl FnOnce(&ViewStateManager) -> R) -> R {
        f(&lock(&self.view))
    }

    /// Mutates view state: expansion, filter, granularity, selection.
    pub fn view_mut<R>(&self, f: impl FnOnce(&mut ViewStateManager) -> R) -> R {
        f(&mut lock(&self.view))
    }

    /// Time axis at the current granularity.
    pub fn time_axis(&self) -> Result<TimeAxis, BoardError> {
        let snapshot = self.snapshot().ok_or(BoardError::NotLoaded)?;
        let granularity = lock(&self.view).granularity();
        snapshot.time_axis(&self.config, granularity)
    }

    /// Classified grid for the current filter and granularity.
    pub fn grid(&self) -> Result<Vec<GridRow>, BoardError> {
        let snapshot = self.snapshot().ok_or(BoardError::NotLoaded)?;
        let (filter, granularity) = self.view(|v| (v.filter().clone(), v.granularity()));
        let axis = snapshot.time_axis(&self.config, granularity)?;
        let index = snapshot.grid_index(&filter, self.config.default_duration_minutes);
        Ok(index.render(snapshot.courts(), &axis))
    }

    /// Fetches the planning and timeline datasets concurrently.
    ///
    /// A timeline failure only drops the timeline. A planning failure keeps
    /// the previous snapshot, marks the board `Failed` and posts an error
    /// notice.
    ///
    /// Loads may overlap. Each takes a ticket before fetching, and an outcome
    /// is dropped if a load started later has already been applied. The
    /// return value is the board's load state after this call.
    pub async fn load_all(&self) -> LoadState {
        let ticket = self.load_seq.fetch_add(1, Ordering::AcqRel) + 1;
        let (primary, timeline) = futures::join!(
            self.service.planning_data(&self.event_id),
            self.service.timeline_data(&self.event_id)
        );

        let data = match primary {
            Ok(data) => data,
            Err(e) => {
                let slot = lock(&self.snapshot);
                if !self.claim_load(ticket) {
                    return self.load_state();
                }
                error!(event_id = %self.event_id, error = %e, "failed to load planning data");
                *lock(&self.load_state) = LoadState::Failed(e.to_string());
                drop(slot);
                self.post(Notice::error(format!("Failed to load planning data: {e}")));
                return self.load_state();
            }
        };
        let timeline = match timeline {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(event_id = %self.event_id, error = %e, "timeline data unavailable");
                None
            }
        };
        if let Err(problems) = validate_planning_data(&data) {
            for p in &problems {
                warn!(kind = ?p.kind, "{}", p.message);
            }
        }

        let snapshot = Arc::new(BoardSnapshot::new(
            data,
            timeline,
            self.config.default_duration_minutes,
        ));
        let mut slot = lock(&self.snapshot);
        if !self.claim_load(ticket) {
            return self.load_state();
        }
        lock(&self.view).reconcile(&snapshot.hierarchy, |id| snapshot.encounter_exists(id));
        info!(
            event_id = %self.event_id,
            divisions = snapshot.data.divisions.len(),
            courts = snapshot.courts().len(),
            encounters = snapshot.data.encounters.len(),
            timeline = snapshot.timeline.is_some(),
            "planning data loaded"
        );
        *slot = Some(snapshot);
        *lock(&self.load_state) = LoadState::Ready;
        LoadState::Ready
    }

    /// Marks `ticket` as applied unless a newer load already was. Called
    /// with the snapshot lock held so claim and store happen together.
    fn claim_load(&self, ticket: u64) -> bool {
        let newest = self.load_applied.fetch_max(ticket, Ordering::AcqRel);
        if newest > ticket {
            debug!(ticket, newest, "dropping stale load result");
            return false;
        }
        true
    }

    /// Runs the external scheduler over `scope`.
    pub async fn auto_assign(&self, scope: AutoAssignScope) -> Notice {
        let _guard = match self.begin("auto-assign") {
            Ok(g) => g,
            Err(n) => return n,
        };
        let snapshot = match self.snapshot() {
            Some(s) => s,
            None => return self.post(Notice::error(BoardError::NotLoaded.to_string())),
        };

        let mut summary = AutoAssignSummary::default();
        let targets: Vec<(DivisionRef, Option<String>, bool)> = match &scope {
            AutoAssignScope::WholeEvent => {
                let mut targets = Vec::new();
                for d in &snapshot.hierarchy.divisions {
                    let division = DivisionRef {
                        division_id: d.division_id.clone(),
                        name: d.name.clone(),
                    };
                    let reason = if !d.has_resource_groups {
                        Some(SkipReason::NoResourceGroups)
                    } else if d.stats.total == 0 {
                        Some(SkipReason::NoEncounters)
                    } else {
                        None
                    };
                    match reason {
                        Some(reason) => summary.skipped.push(SkippedDivision { division, reason }),
                        None => targets.push((division, None, true)),
                    }
                }
                targets
            }
            AutoAssignScope::Division(id) | AutoAssignScope::Phase { division_id: id, .. } => {
                let Some(d) = snapshot.hierarchy.division(id) else {
                    let err = BoardError::UnknownDivision(id.clone());
                    return self.post(Notice::error(err.to_string()));
                };
                let division = DivisionRef {
                    division_id: d.division_id.clone(),
                    name: d.name.clone(),
                };
                match &scope {
                    AutoAssignScope::Phase { phase_id, .. } => {
                        vec![(division, Some(phase_id.clone()), false)]
                    }
                    _ => vec![(division, None, true)],
                }
            }
        };

        let single = !matches!(scope, AutoAssignScope::WholeEvent);
        for (division, phase_id, clear_existing) in targets {
            let request = AutoScheduleRequest {
                event_id: self.event_id.clone(),
                division_id: division.division_id.clone(),
                phase_id,
                clear_existing,
                respect_resource_overlap: self.config.respect_resource_overlap,
            };
            info!(
                division_id = %request.division_id,
                phase_id = ?request.phase_id,
                clear_existing,
                "auto-schedule requested"
            );
            match self.service.auto_schedule(request).await {
                Ok(resp) => {
                    if !resp.conflicts.is_empty() {
                        warn!(
                            division_id = %division.division_id,
                            conflicts = resp.conflicts.len(),
                            "auto-schedule reported conflicts"
                        );
                    }
                    summary.assigned_count += resp.assigned_count;
                    summary.conflict_count += resp.conflicts.len();
                    summary.scheduled.push(division);
                }
                Err(e) => {
                    warn!(division_id = %division.division_id, error = %e, "auto-schedule failed");
                    if single {
                        return self.post(Notice::error(format!(
                            "Auto-assign failed for {}: {e}",
                            division.name
                        )));
                    }
                    summary.failed.push(FailedDivision {
                        division,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            assigned = summary.assigned_count,
            scheduled = summary.scheduled.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "auto-assign finished"
        );
        if !summary.scheduled.is_empty() {
            self.reload().await;
        }
        self.post(summary.into_notice())
    }

    /// Removes every assignment of a division, after confirmation.
    pub async fn clear(&self, division_id: &str) -> Notice {
        let _guard = match self.begin("clear") {
            Ok(g) => g,
            Err(n) => return n,
        };
        let name = self
            .snapshot()
            .and_then(|s| s.data.division(division_id).map(|d| d.name.clone()))
            .unwrap_or_else(|| division_id.to_string());
        let action = ConfirmAction::ClearDivision {
            division_id: division_id.to_string(),
            name: name.clone(),
        };
        if !self.confirm.confirm(&action) {
            return self.post(Notice::info("Clear cancelled"));
        }

        info!(division_id, "clearing assignments");
        match self.service.clear_assignments(division_id).await {
            Ok(()) => {
                self.reload().await;
                self.post(Notice::success(format!("Cleared assignments of {name}")))
            }
            Err(e) => self.post(failure("Clear", &e)),
        }
    }

    /// Moves an encounter to a court and start time.
    ///
    /// If this encounter was in move mode, the placement controller returns
    /// to idle. The board reloads whatever the outcome. Conflicts produce a
    /// warning, not an error.
    pub async fn move_encounter(&self, encounter_id: &str, court_id: &str, start_time: Timestamp) -> Notice {
        let _guard = match self.begin("move") {
            Ok(g) => g,
            Err(n) => return n,
        };
        let placement = Placement {
            court_id: court_id.to_string(),
            start_time,
        };
        info!(encounter_id, court_id, start = %start_time, "moving encounter");
        let result = self.service.move_encounter(encounter_id, placement).await;
        {
            let mut view = lock(&self.view);
            if view.placement().moving() == Some(encounter_id) {
                view.placement_mut().finish();
            }
        }
        self.reload().await;

        let notice = match result {
            Ok(resp) if resp.has_conflicts => {
                warn!(encounter_id, court_id, "move reported conflicts");
                Notice::warning("Encounter moved, but the new placement has conflicts")
                    .with_detail(NoticeDetail::Conflicts { count: 1 })
            }
            Ok(_) => Notice::success("Encounter moved"),
            Err(e) => failure("Move", &e),
        };
        self.post(notice)
    }

    /// A grid cell was clicked. Issues a move only while in move mode and
    /// only for an empty cell of the currently displayed grid.
    pub async fn place_at(&self, court_id: &str, slot: Timestamp) -> Option<Notice> {
        let snapshot = self.snapshot()?;
        let request = {
            let view = lock(&self.view);
            view.placement().moving()?;
            let index = snapshot.grid_index(view.filter(), self.config.default_duration_minutes);
            let cell = index.classify(court_id, slot, view.granularity());
            view.placement().click_cell(court_id, slot, &cell)?
        };
        Some(
            self.move_encounter(
                &request.encounter_id,
                &request.placement.court_id,
                request.placement.start_time,
            )
            .await,
        )
    }

    /// Sets or removes an encounter's court without touching its start.
    pub async fn assign_court(&self, encounter_id: &str, court_id: Option<&str>) -> Notice {
        let _guard = match self.begin("assign") {
            Ok(g) => g,
            Err(n) => return n,
        };
        if let Some(snapshot) = self.snapshot() {
            if !snapshot.encounter_exists(encounter_id) {
                let err = BoardError::UnknownEncounter(encounter_id.to_string());
                return self.post(Notice::error(err.to_string()));
            }
        }
        let assignment = PlacementController::reassign(encounter_id, court_id);
        info!(encounter_id, court_id = ?court_id, "assigning court");
        match self
            .service
            .assign_resources(&self.event_id, vec![assignment])
            .await
        {
            Ok(()) => {
                self.reload().await;
                let message = match court_id {
                    Some(c) => format!("Court {c} assigned"),
                    None => "Court removed".to_string(),
                };
                self.post(Notice::success(message))
            }
            Err(e) => self.post(failure("Assign", &e)),
        }
    }

    /// Read-only conflict check. Never reloads.
    pub async fn validate(&self) -> Notice {
        let _guard = match self.begin("validate") {
            Ok(g) => g,
            Err(n) => return n,
        };
        let notice = match self.service.validate_schedule(&self.event_id).await {
            Ok(report) if report.is_valid && report.conflict_count == 0 => {
                info!("schedule has no conflicts");
                Notice::success("No conflicts found")
            }
            Ok(report) => {
                warn!(conflicts = report.conflict_count, "schedule has conflicts");
                Notice::warning(format!("{} conflict(s) found", report.conflict_count))
                    .with_detail(NoticeDetail::Conflicts {
                        count: report.conflict_count,
                    })
            }
            Err(e) => failure("Validation", &e),
        };
        self.post(notice)
    }

    /// Publishes the schedule, after confirmation. A rejection because of
    /// conflicts is a warning carrying the count, distinct from a failure.
    pub async fn publish(&self) -> Notice {
        let _guard = match self.begin("publish") {
            Ok(g) => g,
            Err(n) => return n,
        };
        if !self.confirm.confirm(&ConfirmAction::Publish) {
            return self.post(Notice::info("Publish cancelled"));
        }
        info!(event_id = %self.event_id, "publishing schedule");
        match self.service.publish_schedule(&self.event_id).await {
            Ok(PublishOutcome::Published) => {
                self.reload().await;
                self.post(Notice::success("Schedule published"))
            }
            Ok(PublishOutcome::Rejected { conflict_count }) => {
                warn!(conflicts = conflict_count, "publish rejected");
                self.post(
                    Notice::warning(format!(
                        "Schedule not published: {conflict_count} conflict(s) must be resolved first"
                    ))
                    .with_detail(NoticeDetail::Conflicts {
                        count: conflict_count,
                    }),
                )
            }
            Err(e) => self.post(failure("Publish", &e)),
        }
    }

    /// Withdraws the published schedule, after confirmation.
    pub async fn unpublish(&self) -> Notice {
        let _guard = match self.begin("unpublish") {
            Ok(g) => g,
            Err(n) => return n,
        };
        if !self.confirm.confirm(&ConfirmAction::Unpublish) {
            return self.post(Notice::info("Unpublish cancelled"));
        }
        info!(event_id = %self.event_id, "unpublishing schedule");
        match self.service.unpublish_schedule(&self.event_id).await {
            Ok(()) => {
                self.reload().await;
                self.post(Notice::success("Schedule unpublished"))
            }
            Err(e) => self.post(failure("Unpublish", &e)),
        }
    }

    /// Takes the busy gate. The refusal notice is returned but not posted,
    /// so it does not replace the notice of the pending action.
    fn begin(&self, action: &'static str) -> Result<BusyGuard<'_>, Notice> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(action, "mutation refused while another is pending");
            return Err(Notice::warning(BoardError::Busy.to_string()));
        }
        Ok(BusyGuard(&self.busy))
    }

    /// Post-mutation reload. A failure is reflected in the load state; the
    /// mutation's own notice still takes the notice slot.
    async fn reload(&self) {
        if let LoadState::Failed(reason) = self.load_all().await {
            warn!(%reason, "reload after mutation failed");
        }
    }

    fn post(&self, notice: Notice) -> Notice {
        *lock(&self.notice) = Some(notice.clone());
        notice
    }
}

fn failure(action: &str, err: &ServiceError) -> Notice {
    warn!(action, error = %err, "request failed");
    Notice::error(format!("{action} failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::DivisionFilter;
    use crate::layout::{CellKind, PhaseKey, PhaseNodeKey};
    use crate::models::{Court, Division, Encounter, Phase, PlanningData, ResourceGroup};
    use crate::service::{
        AutoScheduleResponse, InMemoryService, MoveResponse, Operation, ResourceAssignment,
        ValidationReport,
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use tokio::sync::Notify;

    fn at(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn dataset() -> PlanningData {
        PlanningData::new("E1", at("2026-05-02T08:00:00Z"))
            .with_name("Spring Cup")
            .with_resource_group(
                ResourceGroup::new("G1", "Hall A")
                    .with_court(Court::new("C1", "Court 1"))
                    .with_court(Court::new("C2", "Court 2")),
            )
            .with_resource_group(ResourceGroup::new("G2", "Hall B").with_court(Court::new("C3", "Court 3")))
            .with_division(
                Division::new("A", "Boys U10")
                    .with_sort_order(0)
                    .with_resource_group("G1")
                    .with_phase(Phase::new("P1", "Pools").with_order(1))
                    .with_phase(Phase::new("P2", "Finals").with_order(2)),
            )
            .with_division(Division::new("B", "Girls U10").with_sort_order(1).with_resource_group("G2"))
            .with_division(Division::new("C", "Mixed U8").with_sort_order(2))
            .with_encounter(Encounter::new("a1", "A").with_phase("P1").with_match_number(1))
            .with_encounter(Encounter::new("a2", "A").with_phase("P1").with_match_number(2))
            .with_encounter(Encounter::new("a3", "A").with_phase("P2").with_match_number(1))
            .with_encounter(Encounter::new("b1", "B").with_match_number(1))
            .with_encounter(Encounter::new("b2", "B").with_match_number(2))
            .with_encounter(Encounter::new("c1", "C").with_match_number(1))
    }

    fn board(svc: InMemoryService) -> ScheduleOrchestrator<InMemoryService> {
        ScheduleOrchestrator::new(Arc::new(svc), "E1", BoardConfig::default()).unwrap()
    }

    async fn loaded() -> ScheduleOrchestrator<InMemoryService> {
        let orch = board(InMemoryService::new(dataset()).with_timeline(serde_json::json!({"days": 1})));
        assert_eq!(orch.load_all().await, LoadState::Ready);
        orch
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let svc = Arc::new(InMemoryService::new(dataset()));
        let err = ScheduleOrchestrator::new(svc, "E1", BoardConfig::default().with_granularity(0))
            .err()
            .unwrap();
        assert_eq!(err, BoardError::InvalidGranularity(0));
    }

    #[tokio::test]
    async fn test_load_all() {
        let orch = loaded().await;
        let snap = orch.snapshot().unwrap();
        assert_eq!(snap.hierarchy.divisions.len(), 3);
        assert!(snap.timeline.is_some());
        assert_eq!(orch.notice(), None);
        assert!(orch.time_axis().is_ok());
    }

    #[tokio::test]
    async fn test_timeline_failure_is_tolerated() {
        let svc = InMemoryService::new(dataset());
        svc.fail(Operation::TimelineData);
        let orch = board(svc);
        assert_eq!(orch.load_all().await, LoadState::Ready);
        assert!(orch.snapshot().unwrap().timeline.is_none());
        assert_eq!(orch.notice(), None);
    }

    #[tokio::test]
    async fn test_primary_failure_keeps_prior_data() {
        let orch = loaded().await;
        orch.service().fail(Operation::PlanningData);
        let state = orch.load_all().await;
        assert!(matches!(state, LoadState::Failed(_)));
        assert!(orch.snapshot().is_some());
        assert!(orch.notice().unwrap().is_error());

        let fresh = board(InMemoryService::new(dataset()));
        fresh.service().fail(Operation::PlanningData);
        fresh.load_all().await;
        assert!(fresh.snapshot().is_none());
        assert_eq!(fresh.grid().unwrap_err(), BoardError::NotLoaded);
    }

    #[tokio::test]
    async fn test_whole_event_skips_division_without_groups() {
        let orch = loaded().await;
        let notice = orch.auto_assign(AutoAssignScope::WholeEvent).await;

        let Some(NoticeDetail::AutoAssign(summary)) = &notice.detail else {
            panic!("expected an auto-assign summary");
        };
        let scheduled: Vec<&str> = summary.scheduled.iter().map(|d| d.division_id.as_str()).collect();
        assert_eq!(scheduled, vec!["A", "B"]);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].division.division_id, "C");
        assert_eq!(summary.skipped[0].reason, SkipReason::NoResourceGroups);
        assert_eq!(summary.assigned_count, 5);
        assert!(notice.message.contains("Mixed U8"));
        assert_eq!(notice.level, NoticeLevel::Success);

        let requests = orch.service().auto_schedule_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.clear_existing && r.phase_id.is_none()));
        assert_eq!(orch.snapshot().unwrap().hierarchy.totals().assigned, 5);
        assert!(!orch.is_busy());
    }

    #[tokio::test]
    async fn test_whole_event_collects_failures() {
        let data = dataset()
            .with_division(Division::new("D", "Ghost hall").with_sort_order(3).with_resource_group("G9"))
            .with_encounter(Encounter::new("d1", "D"))
            .with_division(Division::new("E", "Empty").with_sort_order(4).with_resource_group("G1"));
        let orch = board(InMemoryService::new(data));
        orch.load_all().await;

        let notice = orch.auto_assign(AutoAssignScope::WholeEvent).await;
        let Some(NoticeDetail::AutoAssign(summary)) = &notice.detail else {
            panic!("expected an auto-assign summary");
        };
        assert_eq!(summary.scheduled.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].division.division_id, "D");
        let skipped: Vec<(&str, SkipReason)> = summary
            .skipped
            .iter()
            .map(|s| (s.division.division_id.as_str(), s.reason))
            .collect();
        assert_eq!(
            skipped,
            vec![("C", SkipReason::NoResourceGroups), ("E", SkipReason::NoEncounters)]
        );
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_division_and_phase_scopes() {
        let orch = loaded().await;
        orch.auto_assign(AutoAssignScope::Division("A".into())).await;
        orch.auto_assign(AutoAssignScope::Phase {
            division_id: "A".into(),
            phase_id: "P2".into(),
        })
        .await;

        let requests = orch.service().auto_schedule_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].division_id, "A");
        assert!(requests[0].clear_existing);
        assert_eq!(requests[0].phase_id, None);
        assert_eq!(requests[1].phase_id.as_deref(), Some("P2"));
        assert!(!requests[1].clear_existing);
        assert!(requests.iter().all(|r| r.respect_resource_overlap));
    }

    #[tokio::test]
    async fn test_single_scope_failure_is_an_error() {
        let orch = loaded().await;
        let notice = orch.auto_assign(AutoAssignScope::Division("C".into())).await;
        assert!(notice.is_error());
        assert!(notice.message.contains("Mixed U8"));

        let unknown = orch.auto_assign(AutoAssignScope::Division("Z".into())).await;
        assert!(unknown.is_error());
        assert_eq!(orch.service().auto_schedule_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_move_with_conflicts_warns_and_reloads() {
        let orch = loaded().await;
        orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
        let loads = orch.service().call_count(Operation::PlanningData);

        orch.view_mut(|v| {
            v.placement_mut().begin_move("a2");
        });
        let notice = orch.move_encounter("a2", "C1", at("2026-05-02T10:10:00Z")).await;
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.conflict_count(), Some(1));
        assert_eq!(orch.service().call_count(Operation::PlanningData), loads + 1);
        assert!(!orch.view(|v| v.placement().is_moving()));

        let snap = orch.snapshot().unwrap();
        let a2 = snap.data.encounter("a2").unwrap();
        assert_eq!(a2.start_time, Some(at("2026-05-02T10:10:00Z")));
    }

    #[tokio::test]
    async fn test_move_failure_still_reloads() {
        let orch = loaded().await;
        orch.service().fail(Operation::MoveEncounter);
        orch.view_mut(|v| {
            v.placement_mut().begin_move("a1");
        });
        let loads = orch.service().call_count(Operation::PlanningData);

        let notice = orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
        assert!(notice.is_error());
        assert_eq!(orch.service().call_count(Operation::PlanningData), loads + 1);
        assert!(!orch.view(|v| v.placement().is_moving()));
    }

    #[tokio::test]
    async fn test_place_at_only_on_empty_cells_in_move_mode() {
        let orch = loaded().await;
        orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
        let slot = at("2026-05-02T10:00:00Z");

        assert_eq!(orch.place_at("C2", slot).await, None);

        orch.view_mut(|v| {
            v.placement_mut().begin_move("a2");
        });
        assert_eq!(orch.place_at("C1", slot).await, None);
        assert_eq!(orch.place_at("C1", at("2026-05-02T10:15:00Z")).await, None);
        assert!(orch.view(|v| v.placement().is_moving()));

        let notice = orch.place_at("C2", slot).await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        let snap = orch.snapshot().unwrap();
        assert_eq!(snap.data.encounter("a2").unwrap().court_id.as_deref(), Some("C2"));
        assert!(!orch.view(|v| v.placement().is_moving()));
    }

    #[tokio::test]
    async fn test_place_at_uses_filtered_grid() {
        let orch = loaded().await;
        orch.move_encounter("b1", "C1", at("2026-05-02T10:00:00Z")).await;
        orch.view_mut(|v| {
            v.set_filter(DivisionFilter::Only("A".into()));
            v.placement_mut().begin_move("a1");
        });
        let rows = orch.grid().unwrap();
        let row = rows.iter().find(|r| r.slot == at("2026-05-02T10:00:00Z")).unwrap();
        assert_eq!(row.cells[0].kind, CellKind::Empty);

        let notice = orch.place_at("C1", at("2026-05-02T10:00:00Z")).await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_assign_court() {
        let orch = loaded().await;
        let notice = orch.assign_court("b1", Some("C3")).await;
        assert_eq!(notice.level, NoticeLevel::Success);
        let snap = orch.snapshot().unwrap();
        assert_eq!(snap.data.encounter("b1").unwrap().court_id.as_deref(), Some("C3"));
        assert_eq!(snap.data.encounter("b1").unwrap().start_time, None);

        orch.assign_court("b1", None).await;
        assert_eq!(orch.snapshot().unwrap().data.encounter("b1").unwrap().court_id, None);

        let calls = orch.service().call_count(Operation::AssignResources);
        assert!(orch.assign_court("zz", Some("C1")).await.is_error());
        assert_eq!(orch.service().call_count(Operation::AssignResources), calls);
    }

    #[tokio::test]
    async fn test_validate_never_reloads() {
        let orch = loaded().await;
        let loads = orch.service().call_count(Operation::PlanningData);
        assert_eq!(orch.validate().await.level, NoticeLevel::Success);

        orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
        orch.move_encounter("a2", "C1", at("2026-05-02T10:05:00Z")).await;
        let loads_after_moves = orch.service().call_count(Operation::PlanningData);
        let notice = orch.validate().await;
        assert_eq!(notice.conflict_count(), Some(1));
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(orch.service().call_count(Operation::PlanningData), loads_after_moves);
        assert_eq!(loads_after_moves, loads + 2);
    }

    #[tokio::test]
    async fn test_publish_rejection_is_distinct_from_failure() {
        let orch = loaded().await;
        orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
        orch.move_encounter("a2", "C1", at("2026-05-02T10:05:00Z")).await;

        let rejected = orch.publish().await;
        assert_eq!(rejected.level, NoticeLevel::Warning);
        assert_eq!(rejected.conflict_count(), Some(1));
        assert!(!orch.snapshot().unwrap().data.is_published());

        orch.service().fail(Operation::PublishSchedule);
        let failed = orch.publish().await;
        assert!(failed.is_error());
        assert_eq!(failed.conflict_count(), None);
    }

    #[tokio::test]
    async fn test_publish_and_unpublish_reload() {
        let orch = loaded().await;
        assert_eq!(orch.publish().await.level, NoticeLevel::Success);
        assert!(orch.snapshot().unwrap().data.is_published());
        assert_eq!(orch.unpublish().await.level, NoticeLevel::Success);
        assert!(!orch.snapshot().unwrap().data.is_published());
    }

    #[tokio::test]
    async fn test_declined_confirmation_sends_nothing() {
        let orch = board(InMemoryService::new(dataset())).with_confirm(|_: &ConfirmAction| false);
        orch.load_all().await;

        for notice in [orch.clear("A").await, orch.publish().await, orch.unpublish().await] {
            assert_eq!(notice.level, NoticeLevel::Info);
        }
        assert_eq!(orch.service().calls(), vec![Operation::PlanningData, Operation::TimelineData]);
    }

    #[tokio::test]
    async fn test_clear_names_division() {
        let asked = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&asked);
        let orch = board(InMemoryService::new(dataset())).with_confirm(move |a: &ConfirmAction| {
            seen.lock().unwrap().push(a.clone());
            true
        });
        orch.load_all().await;
        orch.auto_assign(AutoAssignScope::Division("A".into())).await;

        let notice = orch.clear("A").await;
        assert_eq!(notice.message, "Cleared assignments of Boys U10");
        assert_eq!(
            asked.lock().unwrap()[0],
            ConfirmAction::ClearDivision {
                division_id: "A".into(),
                name: "Boys U10".into()
            }
        );
        assert_eq!(orch.snapshot().unwrap().hierarchy.division("A").unwrap().stats.assigned, 0);
    }

    #[tokio::test]
    async fn test_view_state_survives_reload() {
        let orch = loaded().await;
        let phase = PhaseNodeKey {
            division_id: "A".into(),
            phase: PhaseKey::Phase("P1".into()),
        };
        orch.view_mut(|v| {
            v.toggle_division("A");
            v.toggle_phase(phase.clone());
            v.set_filter(DivisionFilter::Only("B".into()));
            v.set_granularity(30).unwrap();
        });
        orch.auto_assign(AutoAssignScope::Division("A".into())).await;

        let state = orch.view_state();
        assert!(state.expanded_divisions.contains("A"));
        assert!(state.expanded_phases.contains(&phase));
        assert_eq!(state.filter, DivisionFilter::Only("B".into()));
        assert_eq!(orch.time_axis().unwrap().granularity_minutes, 30);

        orch.service().replace(PlanningData::new("E1", at("2026-05-02T08:00:00Z")));
        orch.load_all().await;
        let state = orch.view_state();
        assert!(state.expanded_divisions.is_empty());
        assert_eq!(state.filter, DivisionFilter::All);
    }

    #[tokio::test]
    async fn test_dismiss_notice() {
        let orch = loaded().await;
        orch.validate().await;
        assert!(orch.notice().is_some());
        orch.dismiss_notice();
        assert_eq!(orch.notice(), None);
    }

    /// Holds the response of the first `held` call until released. The
    /// response is computed before holding, so it reflects the dataset at
    /// the time of the call.
    struct GatedService {
        inner: InMemoryService,
        held: Operation,
        armed: AtomicBool,
        gate: Notify,
    }

    impl GatedService {
        fn new(inner: InMemoryService, held: Operation) -> Self {
            Self {
                inner,
                held,
                armed: AtomicBool::new(true),
                gate: Notify::new(),
            }
        }

        async fn hold(&self, op: Operation) {
            if op == self.held && self.armed.swap(false, Ordering::AcqRel) {
                self.gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl SchedulingService for GatedService {
        async fn planning_data(&self, event_id: &str) -> Result<PlanningData, ServiceError> {
            let result = self.inner.planning_data(event_id).await;
            self.hold(Operation::PlanningData).await;
            result
        }

        async fn timeline_data(&self, event_id: &str) -> Result<serde_json::Value, ServiceError> {
            self.inner.timeline_data(event_id).await
        }

        async fn auto_schedule(
            &self,
            request: AutoScheduleRequest,
        ) -> Result<AutoScheduleResponse, ServiceError> {
            self.inner.auto_schedule(request).await
        }

        async fn clear_assignments(&self, division_id: &str) -> Result<(), ServiceError> {
            self.inner.clear_assignments(division_id).await
        }

        async fn move_encounter(
            &self,
            encounter_id: &str,
            placement: Placement,
        ) -> Result<MoveResponse, ServiceError> {
            self.inner.move_encounter(encounter_id, placement).await
        }

        async fn assign_resources(
            &self,
            event_id: &str,
            assignments: Vec<ResourceAssignment>,
        ) -> Result<(), ServiceError> {
            self.inner.assign_resources(event_id, assignments).await
        }

        async fn validate_schedule(&self, event_id: &str) -> Result<ValidationReport, ServiceError> {
            let result = self.inner.validate_schedule(event_id).await;
            self.hold(Operation::ValidateSchedule).await;
            result
        }

        async fn publish_schedule(&self, event_id: &str) -> Result<PublishOutcome, ServiceError> {
            self.inner.publish_schedule(event_id).await
        }

        async fn unpublish_schedule(&self, event_id: &str) -> Result<(), ServiceError> {
            self.inner.unpublish_schedule(event_id).await
        }
    }

    #[tokio::test]
    async fn test_busy_gate_refuses_concurrent_mutations() {
        let svc = Arc::new(GatedService::new(
            InMemoryService::new(dataset()),
            Operation::ValidateSchedule,
        ));
        let orch = ScheduleOrchestrator::new(Arc::clone(&svc), "E1", BoardConfig::default()).unwrap();
        orch.load_all().await;

        let (first, (during, busy)) = tokio::join!(orch.validate(), async {
            let busy = orch.is_busy();
            let during = orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
            svc.gate.notify_one();
            (during, busy)
        });

        assert!(busy);
        assert_eq!(during.level, NoticeLevel::Warning);
        assert_eq!(during.message, BoardError::Busy.to_string());
        assert_eq!(first.level, NoticeLevel::Success);
        assert_eq!(svc.inner.call_count(Operation::MoveEncounter), 0);
        assert!(!orch.is_busy());
        assert_eq!(orch.notice(), Some(first));
    }

    #[tokio::test]
    async fn test_older_load_cannot_replace_newer_snapshot() {
        let svc = Arc::new(GatedService::new(
            InMemoryService::new(dataset()),
            Operation::PlanningData,
        ));
        let orch = ScheduleOrchestrator::new(Arc::clone(&svc), "E1", BoardConfig::default()).unwrap();

        let (early, published) = tokio::join!(orch.load_all(), async {
            let notice = orch.publish().await;
            let published = orch.snapshot().map(|s| s.data.is_published());
            svc.gate.notify_one();
            (notice, published)
        });

        assert_eq!(published.0.level, NoticeLevel::Success);
        assert_eq!(published.1, Some(true));
        assert_eq!(early, LoadState::Ready);
        assert!(svc.inner.snapshot().is_published());
        assert!(orch.snapshot().unwrap().data.is_published());
    }

    #[tokio::test]
    async fn test_stale_load_failure_is_dropped() {
        let svc = Arc::new(GatedService::new(
            InMemoryService::new(dataset()),
            Operation::PlanningData,
        ));
        svc.inner.fail(Operation::PlanningData);
        let orch = ScheduleOrchestrator::new(Arc::clone(&svc), "E1", BoardConfig::default()).unwrap();

        let (early, late) = tokio::join!(orch.load_all(), async {
            svc.inner.recover(Operation::PlanningData);
            let state = orch.load_all().await;
            svc.gate.notify_one();
            state
        });

        assert_eq!(late, LoadState::Ready);
        assert_eq!(early, LoadState::Ready);
        assert_eq!(orch.load_state(), LoadState::Ready);
        assert_eq!(orch.notice(), None);
    }

    #[tokio::test]
    async fn test_direct_move_keeps_unrelated_selection() {
        let orch = loaded().await;
        orch.view_mut(|v| {
            v.placement_mut().select("b1");
        });
        orch.move_encounter("a1", "C1", at("2026-05-02T10:00:00Z")).await;
        assert_eq!(orch.view(|v| v.placement().selected().map(str::to_owned)), Some("b1".to_string()));

        orch.view_mut(|v| {
            v.placement_mut().begin_move("a2");
        });
        orch.move_encounter("a1", "C2", at("2026-05-02T11:00:00Z")).await;
        assert!(orch.view(|v| v.placement().is_moving()));
    }
}
