//! Integrity checks for a loaded planning dataset.
//!
//! The board renders whatever the service returns, so these checks never
//! reject a dataset; the orchestrator logs what they find. Detects:
//! - Duplicate encounter, court and division IDs
//! - Encounters referencing an unknown division
//! - Encounters referencing a phase their division does not have
//! - Encounters assigned to an unknown court

use std::collections::HashSet;
use std::fmt;

use crate::models::PlanningData;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An encounter references a division that doesn't exist.
    UnknownDivision,
    /// An encounter references a phase its division doesn't have.
    UnknownPhase,
    /// An encounter is assigned to a court that doesn't exist.
    UnknownCourt,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates a planning dataset.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_planning_data(data: &PlanningData) -> ValidationResult {
    let mut errors = Vec::new();

    let mut court_ids = HashSet::new();
    for court in data.courts() {
        if !court_ids.insert(court.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate court ID: {}", court.id),
            ));
        }
    }

    let mut division_ids = HashSet::new();
    for division in &data.divisions {
        if !division_ids.insert(division.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate division ID: {}", division.id),
            ));
        }
    }

    let mut encounter_ids = HashSet::new();
    for e in &data.encounters {
        if !encounter_ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate encounter ID: {}", e.id),
            ));
        }

        match data.division(&e.division_id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::UnknownDivision,
                format!(
                    "Encounter '{}' references unknown division '{}'",
                    e.id, e.division_id
                ),
            )),
            Some(division) => {
                if let Some(pid) = &e.phase_id {
                    if division.phase(pid).is_none() {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::UnknownPhase,
                            format!(
                                "Encounter '{}' references phase '{}' not in division '{}'",
                                e.id, pid, division.id
                            ),
                        ));
                    }
                }
            }
        }

        if let Some(court) = &e.court_id {
            if !court_ids.contains(court.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownCourt,
                    format!("Encounter '{}' is assigned to unknown court '{}'", e.id, court),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Court, Division, Encounter, Phase, ResourceGroup, Timestamp};
    use chrono::DateTime;

    fn start() -> Timestamp {
        DateTime::parse_from_rfc3339("2026-05-02T08:00:00Z").unwrap()
    }

    fn valid() -> PlanningData {
        PlanningData::new("E1", start())
            .with_resource_group(ResourceGroup::new("G1", "Hall").with_court(Court::new("C1", "Court 1")))
            .with_ungrouped_court(Court::new("C2", "Court 2"))
            .with_division(Division::new("D1", "U10").with_phase(Phase::new("P1", "Pools")))
            .with_encounter(Encounter::new("M1", "D1").with_phase("P1").with_court("C2"))
            .with_encounter(Encounter::new("M2", "D1"))
    }

    fn kinds(data: &PlanningData) -> Vec<ValidationErrorKind> {
        validate_planning_data(data)
            .unwrap_err()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_valid_dataset() {
        assert!(validate_planning_data(&valid()).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let data = valid()
            .with_ungrouped_court(Court::new("C1", "Court 1 again"))
            .with_division(Division::new("D1", "U10 again"))
            .with_encounter(Encounter::new("M2", "D1"));
        assert_eq!(
            kinds(&data),
            vec![
                ValidationErrorKind::DuplicateId,
                ValidationErrorKind::DuplicateId,
                ValidationErrorKind::DuplicateId
            ]
        );
    }

    #[test]
    fn test_unknown_references() {
        let data = valid()
            .with_encounter(Encounter::new("M3", "D9"))
            .with_encounter(Encounter::new("M4", "D1").with_phase("P9"))
            .with_encounter(Encounter::new("M5", "D1").with_court("C9"));
        assert_eq!(
            kinds(&data),
            vec![
                ValidationErrorKind::UnknownDivision,
                ValidationErrorKind::UnknownPhase,
                ValidationErrorKind::UnknownCourt
            ]
        );
    }

    #[test]
    fn test_error_display() {
        let errs = validate_planning_data(&valid().with_encounter(Encounter::new("M3", "D9"))).unwrap_err();
        assert_eq!(
            errs[0].to_string(),
            "Encounter 'M3' references unknown division 'D9'"
        );
    }
}
