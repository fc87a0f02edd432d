//! Pure transition table for the reclassification pipeline.
//!
//! `resolve` maps (current status, trigger, context) to the next status and
//! owner routing without touching storage or performing authorization; the
//! engine layers guards around it. Keeping the table pure makes the full
//! status matrix testable in isolation.

use thiserror::Error;

use super::audit::WorkflowAction;
use super::domain::{
    ApplicantType, ApplicationStatus, DecisionType, DisapprovalType, Permission, UserRole,
};

/// The workflow triggers an actor can fire against an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Submit,
    RasApprove,
    RcApprove,
    ReturnForCorrection,
    ForwardToChair,
    AssignVerification,
    SubmitVerificationReport,
    SubmitRecommendation,
    RecordDecision,
    UpdateGazettement,
    SubmitAppeal,
    DecideAppeal,
}

impl TriggerKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::RasApprove => "ras-approve",
            Self::RcApprove => "rc-approve",
            Self::ReturnForCorrection => "return-for-correction",
            Self::ForwardToChair => "forward-to-chair",
            Self::AssignVerification => "assign-verification",
            Self::SubmitVerificationReport => "submit-verification-report",
            Self::SubmitRecommendation => "submit-recommendation",
            Self::RecordDecision => "record-decision",
            Self::UpdateGazettement => "update-gazettement",
            Self::SubmitAppeal => "submit-appeal",
            Self::DecideAppeal => "decide-appeal",
        }
    }

    /// Statuses the trigger may fire from.
    pub const fn allowed_from(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Self::Submit => &[Draft, ReturnedForCorrection],
            Self::RasApprove => &[UnderRasReview],
            Self::RcApprove => &[UnderRcReview],
            Self::ReturnForCorrection => {
                &[UnderRasReview, UnderRcReview, UnderMinisterReview, WithNrccChair]
            }
            Self::ForwardToChair => &[UnderMinisterReview],
            Self::AssignVerification => &[WithNrccChair, VerificationInProgress],
            Self::SubmitVerificationReport => &[VerificationInProgress],
            Self::SubmitRecommendation => &[NrccReviewMeeting],
            Self::RecordDecision => &[RecommendationSubmitted],
            Self::UpdateGazettement => &[PendingGazettement],
            Self::SubmitAppeal => &[DisapprovedRefused],
            Self::DecideAppeal => &[AppealSubmitted],
        }
    }

    pub const fn required_permission(self) -> Permission {
        match self {
            Self::Submit => Permission::ApplicationSubmit,
            Self::RasApprove | Self::RcApprove | Self::ForwardToChair => {
                Permission::ApplicationApprove
            }
            Self::ReturnForCorrection => Permission::ApplicationReturn,
            Self::AssignVerification => Permission::ApplicationAssignVerification,
            Self::SubmitVerificationReport => Permission::ApplicationVerify,
            Self::SubmitRecommendation => Permission::ApplicationRecommend,
            Self::RecordDecision | Self::DecideAppeal => Permission::ApplicationDecide,
            Self::UpdateGazettement => Permission::ApplicationGazette,
            Self::SubmitAppeal => Permission::ApplicationAppeal,
        }
    }

    pub const fn action(self) -> WorkflowAction {
        match self {
            Self::Submit => WorkflowAction::Submit,
            Self::RasApprove | Self::RcApprove => WorkflowAction::Approve,
            Self::ReturnForCorrection => WorkflowAction::Return,
            Self::ForwardToChair => WorkflowAction::Forward,
            Self::AssignVerification => WorkflowAction::Assign,
            Self::SubmitVerificationReport => WorkflowAction::Verify,
            Self::SubmitRecommendation => WorkflowAction::Recommend,
            Self::RecordDecision => WorkflowAction::Decide,
            Self::UpdateGazettement => WorkflowAction::Gazette,
            Self::SubmitAppeal => WorkflowAction::Appeal,
            Self::DecideAppeal => WorkflowAction::AppealDecide,
        }
    }
}

/// Inputs the table needs beyond the current status. Decision-bearing
/// triggers read the corresponding field; others ignore the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingContext {
    pub applicant_type: Option<ApplicantType>,
    pub all_verifications_complete: bool,
    pub minister_decision: Option<(DecisionType, Option<DisapprovalType>)>,
    pub appeal_decision: Option<DecisionType>,
}

/// How ownership changes across a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRouting {
    /// Route to the first active holder of the role.
    Role(UserRole),
    /// Return to the original applicant.
    Applicant,
    /// Ownership is unchanged.
    Keep,
    /// The application reaches a resting or terminal state with no owner.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub next_status: ApplicationStatus,
    pub owner: OwnerRouting,
}

const fn route(next_status: ApplicationStatus, owner: OwnerRouting) -> Route {
    Route { next_status, owner }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("trigger {} not allowed from status {}", .kind.label(), .status.label())]
    NotAllowedFrom {
        kind: TriggerKind,
        status: ApplicationStatus,
    },
    #[error("trigger requires decision input absent from the routing context")]
    MissingDecisionInput,
}

/// Resolves the transition for `kind` fired from `status`.
pub fn resolve(
    status: ApplicationStatus,
    kind: TriggerKind,
    ctx: &RoutingContext,
) -> Result<Route, RoutingError> {
    use ApplicationStatus::*;

    if !kind.allowed_from().contains(&status) {
        return Err(RoutingError::NotAllowedFrom { kind, status });
    }

    let routed = match kind {
        TriggerKind::Submit => {
            let applicant_type = ctx
                .applicant_type
                .ok_or(RoutingError::MissingDecisionInput)?;
            if applicant_type.follows_board_route() {
                route(
                    UnderRasReview,
                    OwnerRouting::Role(UserRole::RegionalAdministrativeSecretary),
                )
            } else {
                route(
                    UnderMinisterReview,
                    OwnerRouting::Role(UserRole::MinisterOfWorks),
                )
            }
        }
        TriggerKind::RasApprove => route(
            UnderRcReview,
            OwnerRouting::Role(UserRole::RegionalCommissioner),
        ),
        TriggerKind::RcApprove => route(
            UnderMinisterReview,
            OwnerRouting::Role(UserRole::MinisterOfWorks),
        ),
        TriggerKind::ReturnForCorrection => {
            route(ReturnedForCorrection, OwnerRouting::Applicant)
        }
        TriggerKind::ForwardToChair => route(
            WithNrccChair,
            OwnerRouting::Role(UserRole::NrccChairperson),
        ),
        TriggerKind::AssignVerification => route(VerificationInProgress, OwnerRouting::Keep),
        TriggerKind::SubmitVerificationReport => {
            // The status only advances once every assignment has a report.
            if ctx.all_verifications_complete {
                route(NrccReviewMeeting, OwnerRouting::Keep)
            } else {
                route(VerificationInProgress, OwnerRouting::Keep)
            }
        }
        TriggerKind::SubmitRecommendation => route(
            RecommendationSubmitted,
            OwnerRouting::Role(UserRole::MinisterOfWorks),
        ),
        TriggerKind::RecordDecision => {
            let (decision, disapproval) = ctx
                .minister_decision
                .ok_or(RoutingError::MissingDecisionInput)?;
            match decision {
                DecisionType::Approve => route(
                    PendingGazettement,
                    OwnerRouting::Role(UserRole::MinistryLawyer),
                ),
                DecisionType::Disapprove => match disapproval {
                    Some(DisapprovalType::Refused) => {
                        route(DisapprovedRefused, OwnerRouting::Clear)
                    }
                    Some(DisapprovalType::Designated) => {
                        route(DisapprovedDesignated, OwnerRouting::Clear)
                    }
                    None => return Err(RoutingError::MissingDecisionInput),
                },
            }
        }
        TriggerKind::UpdateGazettement => route(Gazetted, OwnerRouting::Clear),
        TriggerKind::SubmitAppeal => route(
            AppealSubmitted,
            OwnerRouting::Role(UserRole::MinisterOfWorks),
        ),
        TriggerKind::DecideAppeal => {
            let decision = ctx
                .appeal_decision
                .ok_or(RoutingError::MissingDecisionInput)?;
            match decision {
                // A granted appeal re-enters the committee flow at the chair.
                DecisionType::Approve => route(
                    WithNrccChair,
                    OwnerRouting::Role(UserRole::NrccChairperson),
                ),
                DecisionType::Disapprove => route(AppealRejected, OwnerRouting::Clear),
            }
        }
    };

    Ok(routed)
}
