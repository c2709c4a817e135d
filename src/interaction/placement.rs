//! Move-mode state machine.
//!
//! ```text
//!   Idle ──select(e)──▶ Selected(e) ──begin_move──▶ Moving(e)
//!    ▲                     │   ▲                       │
//!    └──select(e) again────┘   │                       │
//!    └────────────── cancel / finish ◀─────────────────┘
//! ```
//!
//! Only one encounter can be moving; starting a move for another encounter
//! replaces the previous one. While moving, only empty cells accept a
//! click, and clicks on encounters are ignored. The controller never talks
//! to the service: it hands back a [`MoveRequest`] and is returned to
//! `Idle` by [`PlacementController::finish`] once the request settles.

use serde::Serialize;

use crate::layout::CellKind;
use crate::models::Timestamp;
use crate::service::{Placement, ResourceAssignment};

/// Selection / move state. At most one encounter is ever referenced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum PlacementState {
    #[default]
    Idle,
    Selected(String),
    Moving(String),
}

/// A destination chosen in move mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRequest {
    pub encounter_id: String,
    pub placement: Placement,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementController {
    state: PlacementState,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.state {
            PlacementState::Selected(id) => Some(id),
            _ => None,
        }
    }

    pub fn moving(&self) -> Option<&str> {
        match &self.state {
            PlacementState::Moving(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, PlacementState::Moving(_))
    }

    /// Selects an encounter; selecting the selected one again deselects it.
    /// Ignored while moving.
    pub fn select(&mut self, encounter_id: &str) -> &PlacementState {
        if self.is_moving() {
            return &self.state;
        }
        let next = match &self.state {
            PlacementState::Selected(current) if current == encounter_id => PlacementState::Idle,
            _ => PlacementState::Selected(encounter_id.to_string()),
        };
        self.transition(next)
    }

    /// Enters move mode for `encounter_id`, replacing any prior move.
    pub fn begin_move(&mut self, encounter_id: &str) -> &PlacementState {
        self.transition(PlacementState::Moving(encounter_id.to_string()))
    }

    /// Enters move mode for the selected encounter. Returns `false` when
    /// nothing is selected.
    pub fn move_selected(&mut self) -> bool {
        match self.selected().map(str::to_owned) {
            Some(id) => {
                self.begin_move(&id);
                true
            }
            None => false,
        }
    }

    /// Leaves selection or move mode without any request.
    pub fn cancel(&mut self) {
        if self.state != PlacementState::Idle {
            self.transition(PlacementState::Idle);
        }
    }

    /// A grid cell was clicked. Produces a request only while moving and
    /// only for empty cells.
    pub fn click_cell(&self, court_id: &str, slot: Timestamp, cell: &CellKind) -> Option<MoveRequest> {
        let encounter_id = self.moving()?;
        if *cell != CellKind::Empty {
            return None;
        }
        Some(MoveRequest {
            encounter_id: encounter_id.to_string(),
            placement: Placement {
                court_id: court_id.to_string(),
                start_time: slot,
            },
        })
    }

    /// The move request settled (either way): back to idle, selection cleared.
    pub fn finish(&mut self) {
        self.transition(PlacementState::Idle);
    }

    /// Court-only reassignment from an inline selector. Independent of the
    /// move state and never touches the start time.
    pub fn reassign(encounter_id: &str, court_id: Option<&str>) -> ResourceAssignment {
        ResourceAssignment {
            encounter_id: encounter_id.to_string(),
            court_id: court_id.map(str::to_owned),
        }
    }

    /// Drops a reference to an encounter that no longer exists.
    pub fn retain_known(&mut self, exists: impl Fn(&str) -> bool) {
        let stale = match &self.state {
            PlacementState::Idle => false,
            PlacementState::Selected(id) | PlacementState::Moving(id) => !exists(id),
        };
        if stale {
            self.transition(PlacementState::Idle);
        }
    }

    fn transition(&mut self, next: PlacementState) -> &PlacementState {
        tracing::debug!(from = ?self.state, to = ?next, "placement transition");
        self.state = next;
        &self.state
    }
}
