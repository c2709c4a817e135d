//! Court and resource group models.
//!
//! A court is the unit of mutual exclusion: at most one encounter may
//! occupy it during any interval. The board does not enforce this; the
//! service does, and the board reports overlaps after the fact.

use serde::{Deserialize, Serialize};

/// A court (field, table, ...) that encounters are assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    /// Unique court identifier.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Owning resource group, `None` for ungrouped courts.
    #[serde(default)]
    pub group_id: Option<String>,
}

/// A named cluster of courts a division may be allowed to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub courts: Vec<Court>,
}

impl Court {
    /// Creates an ungrouped court.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group_id: None,
        }
    }
}

impl ResourceGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            courts: Vec::new(),
        }
    }

    /// Adds a court, stamping it with this group's id.
    pub fn with_court(mut self, mut court: Court) -> Self {
        court.group_id = Some(self.id.clone());
        self.courts.push(court);
        self
    }

    pub fn contains(&self, court_id: &str) -> bool {
        self.courts.iter().any(|c| c.id == court_id)
    }
}
