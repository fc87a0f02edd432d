//! Road-reclassification application workflow.
//!
//! Applications for upgrading a road to the regional or trunk class move
//! through a fixed review pipeline: regional review for board-initiated
//! submissions, ministerial review, NRCC field verification, a committee
//! recommendation, the ministerial decision, and gazettement or appeal.
//! The transition table lives in `routing`; `engine` layers authorization,
//! ownership, and validation guards around it.

pub mod audit;
pub mod domain;
pub(crate) mod eligibility;
pub mod engine;
pub mod repository;
pub mod router;
pub(crate) mod routing;

#[cfg(test)]
mod tests;

pub use audit::{ApprovalAction, AuditTrail, WorkflowAction};
pub use domain::{
    Appeal, AppealStatus, ApplicantType, Application, ApplicationId, ApplicationStatus,
    ApplicationView, AssignmentId, CriterionSelection, DecisionType, DisapprovalType,
    EligibilityCriterion, Gazettement, GazettementStatus, MinisterDecision, Permission,
    Recommendation, RoadClass, RoadFormData, UserId, UserRef, UserRole, VerificationAssignment,
    VerificationReport, VerificationStatus,
};
pub use eligibility::ValidationError;
pub use engine::{
    ActionInput, AppealDecisionInput, AppealInput, CreateApplication, DecisionInput,
    GazettementUpdate, RecommendationInput, ReclassificationEngine, UpdateApplication,
    VerificationReportInput, VerificationRequest, WorkflowConfig, WorkflowError,
};
pub use repository::{
    AccessPolicy, ApplicationStore, InMemoryApplicationStore, Notifier, NotifyError,
    RolePermissionPolicy, StoreError, UserDirectory,
};
pub use router::application_router;
