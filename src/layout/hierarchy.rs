//! Division → phase → encounter aggregation.
//!
//! A pure function of `(divisions, encounters)`: it is re-run in full on
//! every reload and produces an immutable [`Hierarchy`] consumed by all
//! rendering. Each node carries total / assigned / completed counts and
//! the time range of its assigned encounters.
//!
//! # Phase buckets
//! Encounters are partitioned by phase id. Known phases come first in the
//! division's phase order, then phase ids the division does not list (in
//! order of first appearance), then the "no phase" bucket. The no-phase
//! bucket is never merged with a real phase.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::DEFAULT_DURATION_MINUTES;
use crate::models::{palette_color, ColorToken, Division, Encounter, Timestamp};

/// Key of a phase bucket within one division.
///
/// Ordering places [`PhaseKey::NoPhase`] after every real phase id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PhaseKey {
    Phase(String),
    NoPhase,
}

/// A phase bucket namespaced by its division.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PhaseNodeKey {
    pub division_id: String,
    pub phase: PhaseKey,
}

/// Earliest start and latest end of a node's assigned encounters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBounds {
    pub earliest_start: Timestamp,
    pub latest_end: Timestamp,
}

/// Counts and time range of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub total: usize,
    pub assigned: usize,
    pub completed: usize,
    pub bounds: Option<TimeBounds>,
}

/// Aggregated view of one phase bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseNode {
    pub key: PhaseKey,
    /// Phase name, "No phase" for the sentinel bucket, the raw id for
    /// phases the division does not list.
    pub name: String,
    pub phase_type: String,
    pub stats: NodeStats,
    /// Encounters of the bucket, ordered by match number.
    pub encounters: Vec<Encounter>,
}

/// Aggregated view of one division.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionNode {
    pub division_id: String,
    pub name: String,
    pub color: ColorToken,
    pub has_resource_groups: bool,
    pub stats: NodeStats,
    pub phases: Vec<PhaseNode>,
}

/// The full division tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hierarchy {
    pub divisions: Vec<DivisionNode>,
}

/// Builds a [`Hierarchy`] from flat division and encounter lists.
#[derive(Debug, Clone)]
pub struct HierarchyAggregator {
    default_duration_minutes: u32,
}

impl HierarchyAggregator {
    pub fn new() -> Self {
        Self {
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Groups encounters under their division and phase. Byes and
    /// encounters of unknown divisions are left out.
    pub fn aggregate(&self, divisions: &[Division], encounters: &[Encounter]) -> Hierarchy {
        let mut by_division: HashMap<&str, Vec<&Encounter>> = HashMap::new();
        for e in encounters.iter().filter(|e| !e.is_bye) {
            by_division.entry(e.division_id.as_str()).or_default().push(e);
        }

        let divisions = divisions
            .iter()
            .enumerate()
            .map(|(position, d)| {
                let members = by_division.remove(d.id.as_str()).unwrap_or_default();
                self.division_node(d, position, members)
            })
            .collect();

        Hierarchy { divisions }
    }

    fn division_node(
        &self,
        division: &Division,
        position: usize,
        encounters: Vec<&Encounter>,
    ) -> DivisionNode {
        let mut buckets: Vec<(PhaseKey, Vec<&Encounter>)> = division
            .ordered_phases()
            .into_iter()
            .map(|p| (PhaseKey::Phase(p.id.clone()), Vec::new()))
            .collect();
        let mut no_phase: Vec<&Encounter> = Vec::new();

        for &e in &encounters {
            match &e.phase_id {
                None => no_phase.push(e),
                Some(pid) => match buckets
                    .iter_mut()
                    .find(|(k, _)| matches!(k, PhaseKey::Phase(id) if id == pid))
                {
                    Some((_, list)) => list.push(e),
                    None => buckets.push((PhaseKey::Phase(pid.clone()), vec![e])),
                },
            }
        }
        if !no_phase.is_empty() {
            buckets.push((PhaseKey::NoPhase, no_phase));
        }

        let phases = buckets
            .into_iter()
            .map(|(key, members)| {
                let (name, phase_type) = match &key {
                    PhaseKey::Phase(id) => match division.phase(id) {
                        Some(p) => (p.name.clone(), p.phase_type.clone()),
                        None => (id.clone(), String::new()),
                    },
                    PhaseKey::NoPhase => ("No phase".to_string(), String::new()),
                };
                let mut members: Vec<Encounter> = members.into_iter().cloned().collect();
                members.sort_by(|a, b| {
                    a.match_number
                        .cmp(&b.match_number)
                        .then_with(|| a.id.cmp(&b.id))
                });
                PhaseNode {
                    stats: self.stats(members.iter()),
                    key,
                    name,
                    phase_type,
                    encounters: members,
                }
            })
            .collect();

        DivisionNode {
            division_id: division.id.clone(),
            name: division.name.clone(),
            color: palette_color(division.color_key(position)),
            has_resource_groups: division.has_resource_groups(),
            stats: self.stats(encounters.into_iter()),
            phases,
        }
    }

    fn stats<'a>(&self, encounters: impl Iterator<Item = &'a Encounter>) -> NodeStats {
        let mut stats = NodeStats::default();
        for e in encounters {
            stats.total += 1;
            if e.is_completed() {
                stats.completed += 1;
            }
            if let Some((start, end)) = e.interval(self.default_duration_minutes) {
                stats.assigned += 1;
                stats.bounds = Some(match stats.bounds {
                    None => TimeBounds {
                        earliest_start: start,
                        latest_end: end,
                    },
                    Some(b) => TimeBounds {
                        earliest_start: b.earliest_start.min(start),
                        latest_end: b.latest_end.max(end),
                    },
                });
            }
        }
        stats
    }
}

impl Default for HierarchyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    pub fn division(&self, division_id: &str) -> Option<&DivisionNode> {
        self.divisions.iter().find(|d| d.division_id == division_id)
    }

    pub fn phase(&self, key: &PhaseNodeKey) -> Option<&PhaseNode> {
        self.division(&key.division_id)?
            .phases
            .iter()
            .find(|p| p.key == key.phase)
    }

    pub fn division_ids(&self) -> impl Iterator<Item = &str> {
        self.divisions.iter().map(|d| d.division_id.as_str())
    }

    /// Every phase bucket, namespaced by division.
    pub fn phase_keys(&self) -> Vec<PhaseNodeKey> {
        self.divisions
            .iter()
            .flat_map(|d| {
                d.phases.iter().map(|p| PhaseNodeKey {
                    division_id: d.division_id.clone(),
                    phase: p.key.clone(),
                })
            })
            .collect()
    }

    /// Event-wide totals.
    pub fn totals(&self) -> NodeStats {
        self.divisions.iter().fold(NodeStats::default(), |mut acc, d| {
            acc.total += d.stats.total;
            acc.assigned += d.stats.assigned;
            acc.completed += d.stats.completed;
            acc.bounds = match (acc.bounds, d.stats.bounds) {
                (None, b) | (b, None) => b,
                (Some(a), Some(b)) => Some(TimeBounds {
                    earliest_start: a.earliest_start.min(b.earliest_start),
                    latest_end: a.latest_end.max(b.latest_end),
                }),
            };
            acc
        })
    }
}

impl NodeStats {
    /// Completed share (0.0..1.0); 0.0 for empty nodes.
    pub fn progress(&self) -> f64 {
        ratio(self.completed, self.total)
    }

    /// Assigned share (0.0..1.0); 0.0 for empty nodes.
    pub fn assignment_ratio(&self) -> f64 {
        ratio(self.assigned, self.total)
    }

    pub fn unassigned(&self) -> usize {
        self.total - self.assigned
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl TimeBounds {
    /// "HH:MM-HH:MM" in each instant's own offset.
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.earliest_start.format("%H:%M"),
            self.latest_end.format("%H:%M")
        )
    }
}
