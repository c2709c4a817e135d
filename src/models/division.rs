//! Division and phase models.

use serde::{Deserialize, Serialize};

/// Top-level grouping of encounters (e.g. an age group or category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    /// Unique division identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Stable ordinal assigned by the service, if it sends one. Drives the
    /// display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
    /// Phases in competition order.
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Resource groups this division may use.
    #[serde(default)]
    pub resource_group_ids: Vec<String>,
}

/// A sub-stage of a division (pool round, bracket, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub name: String,
    /// Opaque type tag (e.g. "pool", "bracket").
    #[serde(default)]
    pub phase_type: String,
    /// Position within the division.
    #[serde(default)]
    pub order: u32,
}

impl Division {
    /// Creates a division with no phases and no resource groups.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sort_order: None,
            phases: Vec::new(),
            resource_group_ids: Vec::new(),
        }
    }

    pub fn with_sort_order(mut self, sort_order: u32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Appends a phase; its order is its position in the list.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn with_resource_group(mut self, group_id: impl Into<String>) -> Self {
        self.resource_group_ids.push(group_id.into());
        self
    }

    /// Palette key: the explicit `sort_order`, else the division's position
    /// in the dataset's division list.
    pub fn color_key(&self, position: usize) -> u32 {
        self.sort_order
            .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX))
    }

    pub fn has_resource_groups(&self) -> bool {
        !self.resource_group_ids.is_empty()
    }

    pub fn phase(&self, phase_id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    /// Phases sorted by `order`, ties kept in list order.
    pub fn ordered_phases(&self) -> Vec<&Phase> {
        let mut phases: Vec<&Phase> = self.phases.iter().collect();
        phases.sort_by_key(|p| p.order);
        phases
    }
}

impl Phase {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phase_type: String::new(),
            order: 0,
        }
    }

    pub fn with_type(mut self, phase_type: impl Into<String>) -> Self {
        self.phase_type = phase_type.into();
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}
