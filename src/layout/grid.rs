//! Court × time grid index.
//!
//! Indexes assigned encounters by court (sorted by start) so each
//! `(court, slot)` cell can be classified during a render pass:
//!
//! 1. **Starting**: an encounter starts within `[slot, slot + granularity)`.
//!    It spans `ceil(duration / granularity)` rows, at least 1.
//! 2. **Spanning**: nothing starts here, but an earlier encounter's
//!    `[start, end)` strictly contains the slot instant.
//! 3. **Empty**: a placement target while moving an encounter.
//!
//! The index is rebuilt for every render pass (linear in encounter count)
//! and never cached across reloads.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::axis::TimeAxis;
use crate::config::DEFAULT_DURATION_MINUTES;
use crate::models::{Court, Encounter, Timestamp};

/// An assigned encounter as placed on one court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridEntry {
    pub encounter_id: String,
    pub division_id: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_minutes: u32,
}

/// Classification of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CellKind {
    /// An encounter starts in this slot and covers `row_span` rows.
    Starting { encounter_id: String, row_span: usize },
    /// Covered by the block of an encounter started in an earlier row.
    Spanning { encounter_id: String },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub court_id: String,
    pub kind: CellKind,
}

/// One time row of the rendered grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub slot: Timestamp,
    /// Hour label on whole hours.
    pub label: Option<String>,
    pub cells: Vec<GridCell>,
}

/// Two encounters whose intervals intersect on the same court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub court_id: String,
    pub first: String,
    pub second: String,
}

/// Encounters indexed by court.
#[derive(Debug, Clone, Default)]
pub struct ResourceGridIndex {
    by_court: HashMap<String, Vec<GridEntry>>,
}

impl ResourceGridIndex {
    /// Indexes assigned, non-bye encounters with the default duration.
    pub fn build<'a, I>(encounters: I) -> Self
    where
        I: IntoIterator<Item = &'a Encounter>,
    {
        Self::build_with_duration(encounters, DEFAULT_DURATION_MINUTES)
    }

    /// Indexes assigned, non-bye encounters.
    pub fn build_with_duration<'a, I>(encounters: I, default_duration_minutes: u32) -> Self
    where
        I: IntoIterator<Item = &'a Encounter>,
    {
        let mut by_court: HashMap<String, Vec<GridEntry>> = HashMap::new();
        for e in encounters.into_iter().filter(|e| !e.is_bye) {
            let (Some(court_id), Some((start, end))) =
                (&e.court_id, e.interval(default_duration_minutes))
            else {
                continue;
            };
            by_court.entry(court_id.clone()).or_default().push(GridEntry {
                encounter_id: e.id.clone(),
                division_id: e.division_id.clone(),
                start,
                end,
                duration_minutes: e.effective_duration(default_duration_minutes),
            });
        }
        for entries in by_court.values_mut() {
            entries.sort_by(|a, b| {
                a.start
                    .cmp(&b.start)
                    .then_with(|| a.encounter_id.cmp(&b.encounter_id))
            });
        }
        Self { by_court }
    }

    /// Entries on a court, sorted by start.
    pub fn entries(&self, court_id: &str) -> &[GridEntry] {
        self.by_court.get(court_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entry_count(&self) -> usize {
        self.by_court.values().map(Vec::len).sum()
    }

    /// Classifies the cell at `(court_id, slot)`.
    pub fn classify(&self, court_id: &str, slot: Timestamp, granularity_minutes: u32) -> CellKind {
        let entries = self.entries(court_id);
        let granularity = granularity_minutes.max(1);
        let slot_end = slot + chrono::Duration::minutes(i64::from(granularity));

        let idx = entries.partition_point(|e| e.start < slot);
        if let Some(e) = entries.get(idx).filter(|e| e.start < slot_end) {
            return CellKind::Starting {
                encounter_id: e.encounter_id.clone(),
                row_span: row_span(e.duration_minutes, granularity),
            };
        }
        if let Some(e) = entries[..idx].iter().rev().find(|e| e.end > slot) {
            return CellKind::Spanning {
                encounter_id: e.encounter_id.clone(),
            };
        }
        CellKind::Empty
    }

    /// Classifies every cell of the grid, one row per axis slot.
    pub fn render<'a, I>(&self, courts: I, axis: &TimeAxis) -> Vec<GridRow>
    where
        I: IntoIterator<Item = &'a Court>,
    {
        let courts: Vec<&Court> = courts.into_iter().collect();
        axis.slots
            .iter()
            .map(|&slot| GridRow {
                slot,
                label: TimeAxis::hour_label(slot),
                cells: courts
                    .iter()
                    .map(|c| GridCell {
                        court_id: c.id.clone(),
                        kind: self.classify(&c.id, slot, axis.granularity_minutes),
                    })
                    .collect(),
            })
            .collect()
    }

    /// All pairs of intersecting intervals, per court.
    pub fn overlaps(&self) -> Vec<Overlap> {
        let mut result = Vec::new();
        let mut courts: Vec<&String> = self.by_court.keys().collect();
        courts.sort();
        for court_id in courts {
            let entries = self.entries(court_id);
            for (i, a) in entries.iter().enumerate() {
                for b in entries[i + 1..].iter().take_while(|b| b.start < a.end) {
                    result.push(Overlap {
                        court_id: court_id.clone(),
                        first: a.encounter_id.clone(),
                        second: b.encounter_id.clone(),
                    });
                }
            }
        }
        result
    }

    /// Ids of encounters involved in at least one overlap.
    pub fn conflicted_encounters(&self) -> HashSet<String> {
        self.overlaps()
            .into_iter()
            .flat_map(|o| [o.first, o.second])
            .collect()
    }
}

#[inline]
fn row_span(duration_minutes: u32, granularity_minutes: u32) -> usize {
    duration_minutes.div_ceil(granularity_minutes).max(1) as usize
}
