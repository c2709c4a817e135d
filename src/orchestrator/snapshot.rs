//! Loaded board snapshot.
//!
//! Built once per reload from the service's planning data. The hierarchy
//! is computed here; the grid index and time axis are recomputed on
//! demand because they depend on view state (filter, granularity).

use serde::Serialize;

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::interaction::DivisionFilter;
use crate::layout::{Hierarchy, HierarchyAggregator, ResourceGridIndex, TimeAxis, TimeAxisBuilder};
use crate::models::{Court, PlanningData};

/// Loading status of the board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Ready,
    /// The primary dataset could not be loaded. Prior data, if any, is kept.
    Failed(String),
}

/// Immutable post-reload state shared with renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub data: PlanningData,
    pub hierarchy: Hierarchy,
    /// Secondary timeline dataset, `None` when it failed to load.
    pub timeline: Option<serde_json::Value>,
}

impl BoardSnapshot {
    pub fn new(
        data: PlanningData,
        timeline: Option<serde_json::Value>,
        default_duration_minutes: u32,
    ) -> Self {
        let hierarchy = HierarchyAggregator::new()
            .with_default_duration(default_duration_minutes)
            .aggregate(&data.divisions, &data.encounters);
        Self {
            data,
            hierarchy,
            timeline,
        }
    }

    /// Grid columns.
    pub fn courts(&self) -> Vec<&Court> {
        self.data.courts()
    }

    /// Axis over every schedulable encounter, independent of the filter.
    pub fn time_axis(&self, config: &BoardConfig, granularity_minutes: u32) -> Result<TimeAxis, BoardError> {
        TimeAxisBuilder::from_config(config)
            .with_granularity(granularity_minutes)
            .build(self.data.schedulable_encounters(), self.data.event_start_date)
    }

    /// Fresh grid index over the encounters passing `filter`.
    pub fn grid_index(&self, filter: &DivisionFilter, default_duration_minutes: u32) -> ResourceGridIndex {
        ResourceGridIndex::build_with_duration(
            self.data
                .schedulable_encounters()
                .filter(|e| filter.includes(&e.division_id)),
            default_duration_minutes,
        )
    }

    pub fn encounter_exists(&self, encounter_id: &str) -> bool {
        self.data.encounter(encounter_id).is_some()
    }
}
