//! Client-side view state.
//!
//! Expansion sets, division filter, grid granularity and the placement
//! state machine, kept apart from the planning data so a reload does not
//! reset navigation. [`ViewStateManager::reconcile`] runs after each
//! reload and forgets only what the new snapshot no longer contains.

use std::collections::BTreeSet;

use serde::Serialize;

use super::placement::PlacementController;
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::layout::{DivisionNode, Hierarchy, PhaseNodeKey};

/// Which divisions the board shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum DivisionFilter {
    #[default]
    All,
    Only(String),
}

impl DivisionFilter {
    pub fn includes(&self, division_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => id == division_id,
        }
    }
}

/// Everything the UI remembers between renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub expanded_divisions: BTreeSet<String>,
    /// Phase buckets, namespaced per division.
    pub expanded_phases: BTreeSet<PhaseNodeKey>,
    pub filter: DivisionFilter,
    pub granularity_minutes: u32,
    pub placement: PlacementController,
}

#[derive(Debug, Clone)]
pub struct ViewStateManager {
    state: ViewState,
}

impl ViewStateManager {
    pub fn new(granularity_minutes: u32) -> Self {
        Self {
            state: ViewState {
                expanded_divisions: BTreeSet::new(),
                expanded_phases: BTreeSet::new(),
                filter: DivisionFilter::All,
                granularity_minutes: granularity_minutes.max(1),
                placement: PlacementController::new(),
            },
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(config.granularity_minutes)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn placement(&self) -> &PlacementController {
        &self.state.placement
    }

    pub fn placement_mut(&mut self) -> &mut PlacementController {
        &mut self.state.placement
    }

    pub fn granularity(&self) -> u32 {
        self.state.granularity_minutes
    }

    pub fn set_granularity(&mut self, minutes: u32) -> Result<(), BoardError> {
        if minutes == 0 {
            return Err(BoardError::InvalidGranularity(minutes));
        }
        self.state.granularity_minutes = minutes;
        Ok(())
    }

    /// Returns whether the division is expanded afterwards.
    pub fn toggle_division(&mut self, division_id: &str) -> bool {
        toggle(&mut self.state.expanded_divisions, division_id.to_string())
    }

    /// Returns whether the phase is expanded afterwards.
    pub fn toggle_phase(&mut self, key: PhaseNodeKey) -> bool {
        toggle(&mut self.state.expanded_phases, key)
    }

    pub fn is_division_expanded(&self, division_id: &str) -> bool {
        self.state.expanded_divisions.contains(division_id)
    }

    pub fn is_phase_expanded(&self, key: &PhaseNodeKey) -> bool {
        self.state.expanded_phases.contains(key)
    }

    /// Expands every division and phase of the tree.
    pub fn expand_all(&mut self, hierarchy: &Hierarchy) {
        self.state.expanded_divisions = hierarchy.division_ids().map(str::to_owned).collect();
        self.state.expanded_phases = hierarchy.phase_keys().into_iter().collect();
    }

    pub fn collapse_all(&mut self) {
        self.state.expanded_divisions.clear();
        self.state.expanded_phases.clear();
    }

    /// Whether every division of the tree is expanded (drives the bulk toggle).
    pub fn all_expanded(&self, hierarchy: &Hierarchy) -> bool {
        !hierarchy.divisions.is_empty()
            && hierarchy
                .division_ids()
                .all(|id| self.state.expanded_divisions.contains(id))
    }

    pub fn filter(&self) -> &DivisionFilter {
        &self.state.filter
    }

    pub fn set_filter(&mut self, filter: DivisionFilter) {
        self.state.filter = filter;
    }

    /// Divisions passing the filter, in tree order.
    pub fn visible_divisions<'a>(&self, hierarchy: &'a Hierarchy) -> Vec<&'a DivisionNode> {
        hierarchy
            .divisions
            .iter()
            .filter(|d| self.state.filter.includes(&d.division_id))
            .collect()
    }

    /// Forgets divisions, phases and encounters the new snapshot dropped.
    /// Everything still present is kept as is.
    pub fn reconcile(&mut self, hierarchy: &Hierarchy, encounter_exists: impl Fn(&str) -> bool) {
        let phase_keys: BTreeSet<PhaseNodeKey> = hierarchy.phase_keys().into_iter().collect();
        let before = (
            self.state.expanded_divisions.len(),
            self.state.expanded_phases.len(),
        );

        self.state
            .expanded_divisions
            .retain(|id| hierarchy.division(id).is_some());
        self.state.expanded_phases.retain(|k| phase_keys.contains(k));
        if let DivisionFilter::Only(id) = &self.state.filter {
            if hierarchy.division(id).is_none() {
                self.state.filter = DivisionFilter::All;
            }
        }
        self.state.placement.retain_known(encounter_exists);

        tracing::debug!(
            divisions_dropped = before.0 - self.state.expanded_divisions.len(),
            phases_dropped = before.1 - self.state.expanded_phases.len(),
            "view state reconciled"
        );
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{HierarchyAggregator, PhaseKey};
    use crate::models::{Division, Encounter, Phase};

    fn tree() -> Hierarchy {
        let divisions = vec![
            Division::new("D1", "U10").with_phase(Phase::new("1", "Pools")),
            Division::new("D2", "U12").with_phase(Phase::new("1", "Pools")),
        ];
        let encounters = vec![
            Encounter::new("M1", "D1").with_phase("1"),
            Encounter::new("M2", "D2"),
        ];
        HierarchyAggregator::new().aggregate(&divisions, &encounters)
    }

    fn key(division: &str, phase: PhaseKey) -> PhaseNodeKey {
        PhaseNodeKey {
            division_id: division.into(),
            phase,
        }
    }

    #[test]
    fn test_toggle_division() {
        let mut vs = ViewStateManager::new(15);
        assert!(vs.toggle_division("D1"));
        assert!(vs.is_division_expanded("D1"));
        assert!(!vs.toggle_division("D1"));
        assert!(!vs.is_division_expanded("D1"));
    }

    #[test]
    fn test_phase_ids_are_namespaced() {
        let mut vs = ViewStateManager::new(15);
        vs.toggle_phase(key("D1", PhaseKey::Phase("1".into())));
        assert!(vs.is_phase_expanded(&key("D1", PhaseKey::Phase("1".into()))));
        assert!(!vs.is_phase_expanded(&key("D2", PhaseKey::Phase("1".into()))));
    }

    #[test]
    fn test_expand_and_collapse_all() {
        let tree = tree();
        let mut vs = ViewStateManager::new(15);
        assert!(!vs.all_expanded(&tree));

        vs.expand_all(&tree);
        assert!(vs.all_expanded(&tree));
        assert!(vs.is_phase_expanded(&key("D2", PhaseKey::NoPhase)));
        assert_eq!(vs.state().expanded_phases.len(), 3);

        vs.collapse_all();
        assert!(!vs.all_expanded(&tree));
        assert!(vs.state().expanded_phases.is_empty());
    }

    #[test]
    fn test_filter() {
        let tree = tree();
        let mut vs = ViewStateManager::new(15);
        assert_eq!(vs.visible_divisions(&tree).len(), 2);
        vs.set_filter(DivisionFilter::Only("D2".into()));
        let visible = vs.visible_divisions(&tree);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].division_id, "D2");
    }

    #[test]
    fn test_granularity() {
        let mut vs = ViewStateManager::new(15);
        assert_eq!(vs.set_granularity(0), Err(BoardError::InvalidGranularity(0)));
        assert_eq!(vs.granularity(), 15);
        vs.set_granularity(30).unwrap();
        assert_eq!(vs.granularity(), 30);
    }

    #[test]
    fn test_reconcile_keeps_surviving_state() {
        let tree = tree();
        let mut vs = ViewStateManager::new(15);
        vs.expand_all(&tree);
        vs.set_filter(DivisionFilter::Only("D1".into()));
        vs.placement_mut().select("M1");

        vs.reconcile(&tree, |id| id == "M1" || id == "M2");
        assert!(vs.all_expanded(&tree));
        assert_eq!(vs.filter(), &DivisionFilter::Only("D1".into()));
        assert_eq!(vs.placement().selected(), Some("M1"));
    }

    #[test]
    fn test_reconcile_drops_removed_nodes() {
        let mut vs = ViewStateManager::new(15);
        vs.expand_all(&tree());
        vs.set_filter(DivisionFilter::Only("D2".into()));
        vs.placement_mut().begin_move("M2");

        let smaller = HierarchyAggregator::new().aggregate(
            &[Division::new("D1", "U10").with_phase(Phase::new("1", "Pools"))],
            &[Encounter::new("M1", "D1").with_phase("1")],
        );
        vs.reconcile(&smaller, |id| id == "M1");

        assert!(vs.is_division_expanded("D1"));
        assert!(!vs.is_division_expanded("D2"));
        assert_eq!(vs.state().expanded_phases.len(), 1);
        assert_eq!(vs.filter(), &DivisionFilter::All);
        assert!(!vs.placement().is_moving());
    }
}
