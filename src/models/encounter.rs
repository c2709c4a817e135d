//! Encounter (match) model.
//!
//! An encounter occupies one court for one contiguous interval. It is
//! *assigned* iff both a court and a start time are known; the lifecycle
//! status is reported by the service and never inferred from assignment.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Label shown for a participant slot that is not resolved yet.
pub const TBD_LABEL: &str = "TBD";

/// Lifecycle status of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncounterStatus {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
}

/// A contest between two participants that needs one court for one interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    /// Unique encounter identifier.
    pub id: String,
    /// Owning division.
    pub division_id: String,
    /// Owning phase. `None` is a valid bucket of its own.
    #[serde(default)]
    pub phase_id: Option<String>,
    /// Ordinal number within the round.
    #[serde(default)]
    pub match_number: u32,
    /// First participant, `None` while unresolved.
    #[serde(default)]
    pub home_label: Option<String>,
    /// Second participant, `None` while unresolved.
    #[serde(default)]
    pub away_label: Option<String>,
    /// Round or phase label (e.g. "Pool A", "Semi-final").
    #[serde(default)]
    pub round_label: String,
    #[serde(default)]
    pub status: EncounterStatus,
    /// Assigned court.
    #[serde(default)]
    pub court_id: Option<String>,
    /// Assigned start time.
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    /// Estimated duration (minutes). `None` means "use the board default".
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Byes have no opponent and are never scheduled.
    #[serde(default)]
    pub is_bye: bool,
}

impl Encounter {
    /// Creates an unassigned, pending encounter.
    pub fn new(id: impl Into<String>, division_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            division_id: division_id.into(),
            phase_id: None,
            match_number: 0,
            home_label: None,
            away_label: None,
            round_label: String::new(),
            status: EncounterStatus::Pending,
            court_id: None,
            start_time: None,
            duration_minutes: None,
            is_bye: false,
        }
    }

    pub fn with_phase(mut self, phase_id: impl Into<String>) -> Self {
        self.phase_id = Some(phase_id.into());
        self
    }

    pub fn with_match_number(mut self, number: u32) -> Self {
        self.match_number = number;
        self
    }

    pub fn with_participants(mut self, home: impl Into<String>, away: impl Into<String>) -> Self {
        self.home_label = Some(home.into());
        self.away_label = Some(away.into());
        self
    }

    pub fn with_round(mut self, label: impl Into<String>) -> Self {
        self.round_label = label.into();
        self
    }

    pub fn with_status(mut self, status: EncounterStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_court(mut self, court_id: impl Into<String>) -> Self {
        self.court_id = Some(court_id.into());
        self
    }

    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Marks this encounter as a bye.
    pub fn as_bye(mut self) -> Self {
        self.is_bye = true;
        self
    }

    /// Both court and start time are set.
    pub fn is_assigned(&self) -> bool {
        self.court_id.is_some() && self.start_time.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.status == EncounterStatus::Completed
    }

    /// Duration in minutes, falling back to `default_minutes`.
    pub fn effective_duration(&self, default_minutes: u32) -> u32 {
        self.duration_minutes.unwrap_or(default_minutes)
    }

    /// End time (start + duration), if a start time is known.
    pub fn end_time(&self, default_minutes: u32) -> Option<Timestamp> {
        self.start_time
            .map(|start| start + Duration::minutes(i64::from(self.effective_duration(default_minutes))))
    }

    /// `[start, end)` interval when the encounter is assigned.
    pub fn interval(&self, default_minutes: u32) -> Option<(Timestamp, Timestamp)> {
        if !self.is_assigned() {
            return None;
        }
        let start = self.start_time?;
        Some((start, self.end_time(default_minutes)?))
    }

    /// "Home vs Away", with unresolved participants shown as TBD.
    pub fn matchup_label(&self) -> String {
        format!(
            "{} vs {}",
            self.home_label.as_deref().unwrap_or(TBD_LABEL),
            self.away_label.as_deref().unwrap_or(TBD_LABEL)
        )
    }
}
