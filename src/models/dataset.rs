//! Planning dataset snapshot.
//!
//! The full state the service reports for one event. The board never
//! mutates it in place; every change is a service request followed by a
//! fresh snapshot.

use serde::{Deserialize, Serialize};

use super::{Court, Division, Encounter, ResourceGroup, Timestamp};

/// Everything needed to render the board for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningData {
    pub event_id: String,
    #[serde(default)]
    pub event_name: String,
    /// Reference date for the empty-board axis and for auto-scheduling.
    pub event_start_date: Timestamp,
    /// Set while the schedule is published.
    #[serde(default)]
    pub schedule_published_at: Option<Timestamp>,
    #[serde(default)]
    pub divisions: Vec<Division>,
    #[serde(default)]
    pub resource_groups: Vec<ResourceGroup>,
    #[serde(default, rename = "ungroupedResources")]
    pub ungrouped_courts: Vec<Court>,
    #[serde(default)]
    pub encounters: Vec<Encounter>,
}

impl PlanningData {
    /// Creates an empty dataset.
    pub fn new(event_id: impl Into<String>, event_start_date: Timestamp) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: String::new(),
            event_start_date,
            schedule_published_at: None,
            divisions: Vec::new(),
            resource_groups: Vec::new(),
            ungrouped_courts: Vec::new(),
            encounters: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    pub fn with_division(mut self, division: Division) -> Self {
        self.divisions.push(division);
        self
    }

    pub fn with_resource_group(mut self, group: ResourceGroup) -> Self {
        self.resource_groups.push(group);
        self
    }

    pub fn with_ungrouped_court(mut self, court: Court) -> Self {
        self.ungrouped_courts.push(court);
        self
    }

    pub fn with_encounter(mut self, encounter: Encounter) -> Self {
        self.encounters.push(encounter);
        self
    }

    pub fn is_published(&self) -> bool {
        self.schedule_published_at.is_some()
    }

    /// Grid columns: grouped courts in group order, then ungrouped courts.
    pub fn courts(&self) -> Vec<&Court> {
        self.resource_groups
            .iter()
            .flat_map(|g| g.courts.iter())
            .chain(self.ungrouped_courts.iter())
            .collect()
    }

    pub fn court(&self, court_id: &str) -> Option<&Court> {
        self.courts().into_iter().find(|c| c.id == court_id)
    }

    /// Courts in the resource groups assigned to a division.
    pub fn allowed_courts(&self, division_id: &str) -> Vec<&Court> {
        let Some(division) = self.division(division_id) else {
            return Vec::new();
        };
        self.resource_groups
            .iter()
            .filter(|g| division.resource_group_ids.contains(&g.id))
            .flat_map(|g| g.courts.iter())
            .collect()
    }

    pub fn division(&self, division_id: &str) -> Option<&Division> {
        self.divisions.iter().find(|d| d.id == division_id)
    }

    pub fn encounter(&self, encounter_id: &str) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.id == encounter_id)
    }

    /// All encounters except byes.
    pub fn schedulable_encounters(&self) -> impl Iterator<Item = &Encounter> {
        self.encounters.iter().filter(|e| !e.is_bye)
    }

    /// Non-bye encounters of one division.
    pub fn division_encounters<'a>(
        &'a self,
        division_id: &'a str,
    ) -> impl Iterator<Item = &'a Encounter> + 'a {
        self.schedulable_encounters()
            .filter(move |e| e.division_id == division_id)
    }
}
