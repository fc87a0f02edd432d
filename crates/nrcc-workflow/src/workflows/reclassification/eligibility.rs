//! Eligibility validation for proposed reclassifications.
//!
//! Applications may only propose an upgrade to the regional or trunk class,
//! and must select at least one criterion from the catalog partition matching
//! the proposed class. R-codes justify a regional upgrade, T-codes a trunk
//! upgrade; a selection from the wrong partition alone is rejected.

use thiserror::Error;

use super::domain::{CriterionSelection, RoadClass};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one eligibility criterion must be selected")]
    NoEligibilityCriteria,
    #[error("a regional reclassification requires at least one R-series criterion")]
    MissingRegionalCriterion,
    #[error("a trunk reclassification requires at least one T-series criterion")]
    MissingTrunkCriterion,
    #[error("reclassification may only propose the regional or trunk class")]
    UnsupportedProposedClass,
    #[error("required form field missing or empty: {field}")]
    MissingFormField { field: &'static str },
    #[error("a disapproval decision must carry a disapproval type")]
    MissingDisapprovalType,
    #[error("verification may only be assigned to an active NRCC member")]
    NotAnNrccMember,
    #[error("appeal grounds must not be empty")]
    EmptyGrounds,
}

/// Checks the eligibility selections against the proposed class. Runs on
/// create, update, and again on submit.
pub fn validate_eligibility(
    proposed: RoadClass,
    selections: &[CriterionSelection],
) -> Result<(), ValidationError> {
    if selections.is_empty() {
        return Err(ValidationError::NoEligibilityCriteria);
    }
    match proposed {
        RoadClass::Regional => {
            if selections.iter().any(|s| s.criterion.is_regional()) {
                Ok(())
            } else {
                Err(ValidationError::MissingRegionalCriterion)
            }
        }
        RoadClass::Trunk => {
            if selections.iter().any(|s| s.criterion.is_trunk()) {
                Ok(())
            } else {
                Err(ValidationError::MissingTrunkCriterion)
            }
        }
        _ => Err(ValidationError::UnsupportedProposedClass),
    }
}

/// Submission requires the core descriptive fields to be filled in; drafts
/// may be saved incomplete.
pub fn validate_form_complete(
    form: &super::domain::RoadFormData,
) -> Result<(), ValidationError> {
    if form.road_name.trim().is_empty() {
        return Err(ValidationError::MissingFormField { field: "road_name" });
    }
    if form.road_length_km <= 0.0 {
        return Err(ValidationError::MissingFormField {
            field: "road_length_km",
        });
    }
    if form.starting_point.trim().is_empty() {
        return Err(ValidationError::MissingFormField {
            field: "starting_point",
        });
    }
    if form.terminal_point.trim().is_empty() {
        return Err(ValidationError::MissingFormField {
            field: "terminal_point",
        });
    }
    if form.reclassification_reasons.trim().is_empty() {
        return Err(ValidationError::MissingFormField {
            field: "reclassification_reasons",
        });
    }
    Ok(())
}
