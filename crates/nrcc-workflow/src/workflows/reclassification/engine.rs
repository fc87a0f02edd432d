//! Orchestrates reclassification transitions against the storage, directory,
//! and notification seams.
//!
//! Every operation runs its guards in a fixed order: permission, status
//! precondition, ownership, input validation, then the effect. The whole
//! aggregate (status, child records, audit row) is saved in a single store
//! call so a transition commits atomically or not at all.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::audit::WorkflowAction;
use super::domain::{
    Appeal, AppealStatus, ApplicantType, Application, ApplicationId, ApplicationStatus,
    AssignmentId, CriterionSelection, DecisionType, DisapprovalType, Gazettement,
    GazettementStatus, MinisterDecision, Permission, Recommendation, RoadClass, RoadFormData,
    UserId, UserRef, UserRole, VerificationAssignment, VerificationReport, VerificationStatus,
};
use super::eligibility::{self, ValidationError};
use super::repository::{
    AccessPolicy, ApplicationStore, Notifier, StoreError, UserDirectory,
};
use super::routing::{self, OwnerRouting, RoutingContext, RoutingError, TriggerKind};

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Prefix of generated application numbers, e.g. `NRCC/2026/0001`.
    pub application_number_prefix: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            application_number_prefix: "NRCC".to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{action} is not allowed while the application is {}", .status.label())]
    Precondition {
        action: &'static str,
        status: ApplicationStatus,
    },
    #[error("an appeal is already open for this application")]
    AppealAlreadyOpen,
    #[error("a verification report was already submitted for this assignment")]
    ReportAlreadySubmitted,
    #[error("role {} lacks the {permission:?} permission", .role.label())]
    PermissionDenied {
        role: UserRole,
        permission: Permission,
    },
    #[error("only the original applicant may perform this action")]
    NotApplicant,
    #[error("the application is not currently owned by the caller's role")]
    NotCurrentOwner,
    #[error("verification reports may only be submitted by the assigned member")]
    NotAssignee,
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("user {0} not found")]
    ActorNotFound(UserId),
    #[error("verification assignment {0} not found")]
    AssignmentNotFound(AssignmentId),
    #[error("no committee recommendation has been submitted")]
    RecommendationNotFound,
    #[error("no ministerial decision has been recorded")]
    DecisionNotFound,
    #[error("no gazettement record exists for this application")]
    GazettementNotFound,
    #[error("no open appeal exists for this application")]
    AppealNotFound,
    #[error("no active holder of role {}", .0.label())]
    NoActiveRoleHolder(UserRole),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplication {
    pub actor: UserId,
    pub applicant_type: ApplicantType,
    pub proposed_class: RoadClass,
    pub form_data: RoadFormData,
    pub eligibility: Vec<CriterionSelection>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApplication {
    pub actor: UserId,
    pub form_data: RoadFormData,
    pub eligibility: Vec<CriterionSelection>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Actor plus optional comments; the shape of most advance triggers.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionInput {
    pub actor: UserId,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub actor: UserId,
    pub member: UserId,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationReportInput {
    pub actor: UserId,
    pub assignment_id: AssignmentId,
    pub findings: String,
    pub visit_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationInput {
    pub actor: UserId,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionInput {
    pub actor: UserId,
    pub decision: DecisionType,
    #[serde(default)]
    pub disapproval_type: Option<DisapprovalType>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GazettementUpdate {
    pub actor: UserId,
    pub gazette_number: String,
    pub gazette_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppealInput {
    pub actor: UserId,
    pub grounds: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppealDecisionInput {
    pub actor: UserId,
    pub decision: DecisionType,
    pub reason: String,
}

/// Workflow engine generic over its persistence, directory, and notification
/// collaborators.
pub struct ReclassificationEngine<S, D, N> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
    policy: Arc<dyn AccessPolicy>,
    config: WorkflowConfig,
}

impl<S, D, N> ReclassificationEngine<S, D, N>
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        notifier: Arc<N>,
        policy: Arc<dyn AccessPolicy>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            policy,
            config,
        }
    }

    pub fn create(&self, input: CreateApplication) -> Result<Application, WorkflowError> {
        let actor = self.require_permission(&input.actor, Permission::ApplicationCreate)?;
        eligibility::validate_eligibility(input.proposed_class, &input.eligibility)?;

        let id = self.next_application_number()?;
        let mut application = Application {
            id: id.clone(),
            applicant_type: input.applicant_type,
            applicant: actor.clone(),
            proposed_class: input.proposed_class,
            status: ApplicationStatus::Draft,
            current_owner: Some(actor.clone()),
            submission_date: None,
            decision_date: None,
            remarks: input.remarks,
            form_data: input.form_data,
            eligibility: input.eligibility,
            audit: Default::default(),
            verification_assignments: Vec::new(),
            recommendation: None,
            decision: None,
            gazettement: None,
            appeals: Vec::new(),
            version: 0,
        };
        application.audit.record(
            WorkflowAction::Create,
            None,
            ApplicationStatus::Draft,
            actor,
            None,
        );

        let saved = self.store.insert(application)?;
        info!(application = %saved.id, "application created");
        Ok(saved)
    }

    pub fn get(&self, id: &ApplicationId, actor: &UserId) -> Result<Application, WorkflowError> {
        self.require_permission(actor, Permission::ApplicationRead)?;
        self.load(id)
    }

    pub fn update(
        &self,
        id: &ApplicationId,
        input: UpdateApplication,
    ) -> Result<Application, WorkflowError> {
        let actor = self.require_permission(&input.actor, Permission::ApplicationUpdate)?;
        let mut application = self.load(id)?;
        if !application.status.is_editable_by_applicant() {
            return Err(WorkflowError::Precondition {
                action: "update",
                status: application.status,
            });
        }
        if !application.applicant_is(&actor.id) {
            return Err(WorkflowError::NotApplicant);
        }
        eligibility::validate_eligibility(application.proposed_class, &input.eligibility)?;

        application.form_data = input.form_data;
        application.eligibility = input.eligibility;
        application.remarks = input.remarks;
        application.audit.record(
            WorkflowAction::Update,
            Some(application.status),
            application.status,
            actor,
            None,
        );
        self.save(application)
    }

    /// Drafts may be discarded by their applicant; nothing that has entered
    /// the pipeline can be deleted.
    pub fn delete(&self, id: &ApplicationId, actor: &UserId) -> Result<(), WorkflowError> {
        let actor = self.require_permission(actor, Permission::ApplicationDelete)?;
        let application = self.load(id)?;
        if application.status != ApplicationStatus::Draft {
            return Err(WorkflowError::Precondition {
                action: "delete",
                status: application.status,
            });
        }
        if !application.applicant_is(&actor.id) {
            return Err(WorkflowError::NotApplicant);
        }
        self.store.remove(id)?;
        info!(application = %id, "draft application deleted");
        Ok(())
    }

    pub fn submit(
        &self,
        id: &ApplicationId,
        input: ActionInput,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::Submit;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        if !application.applicant_is(&actor.id) {
            return Err(WorkflowError::NotApplicant);
        }
        eligibility::validate_eligibility(application.proposed_class, &application.eligibility)?;
        eligibility::validate_form_complete(&application.form_data)?;

        // The submission date marks first entry into the pipeline and is
        // never rewritten on resubmission.
        if application.submission_date.is_none() {
            application.submission_date = Some(Utc::now().date_naive());
        }
        let ctx = RoutingContext {
            applicant_type: Some(application.applicant_type),
            ..Default::default()
        };
        self.advance(&mut application, kind, &actor, &ctx, input.comments)?;
        let saved = self.commit(application, &actor)?;
        self.notify(
            &saved.applicant,
            &format!("Application {} was submitted for review.", saved.id),
        );
        Ok(saved)
    }

    pub fn ras_approve(
        &self,
        id: &ApplicationId,
        input: ActionInput,
    ) -> Result<Application, WorkflowError> {
        self.simple_advance(id, TriggerKind::RasApprove, input)
    }

    pub fn rc_approve(
        &self,
        id: &ApplicationId,
        input: ActionInput,
    ) -> Result<Application, WorkflowError> {
        self.simple_advance(id, TriggerKind::RcApprove, input)
    }

    pub fn return_for_correction(
        &self,
        id: &ApplicationId,
        input: ActionInput,
    ) -> Result<Application, WorkflowError> {
        let saved = self.simple_advance(id, TriggerKind::ReturnForCorrection, input)?;
        self.notify(
            &saved.applicant,
            &format!("Application {} was returned for correction.", saved.id),
        );
        Ok(saved)
    }

    pub fn forward_to_chair(
        &self,
        id: &ApplicationId,
        input: ActionInput,
    ) -> Result<Application, WorkflowError> {
        self.simple_advance(id, TriggerKind::ForwardToChair, input)
    }

    pub fn assign_verification(
        &self,
        id: &ApplicationId,
        input: VerificationRequest,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::AssignVerification;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        self.ensure_owner_role(&application, actor.role)?;

        let member = self
            .directory
            .find_by_id(&input.member)
            .ok_or_else(|| WorkflowError::ActorNotFound(input.member.clone()))?;
        if member.role != UserRole::NrccMember {
            return Err(ValidationError::NotAnNrccMember.into());
        }

        application.verification_assignments.push(VerificationAssignment {
            id: application.next_assignment_id(),
            member: member.clone(),
            assigned_by: actor.clone(),
            due_date: input.due_date,
            visit_date: None,
            status: VerificationStatus::Assigned,
            instructions: input.instructions,
            report: None,
        });

        self.advance(&mut application, kind, &actor, &RoutingContext::default(), None)?;
        let saved = self.commit(application, &actor)?;
        self.notify(
            &member,
            &format!("You were assigned field verification for application {}.", saved.id),
        );
        Ok(saved)
    }

    /// Records a verification report against one assignment. The application
    /// only moves to the review meeting once every assignment is complete;
    /// earlier reports leave the status unchanged.
    pub fn submit_verification_report(
        &self,
        id: &ApplicationId,
        input: VerificationReportInput,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::SubmitVerificationReport;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;

        let assignment = application
            .assignment_mut(input.assignment_id)
            .ok_or(WorkflowError::AssignmentNotFound(input.assignment_id))?;
        if assignment.member.id != actor.id {
            return Err(WorkflowError::NotAssignee);
        }
        if assignment.report.is_some() {
            return Err(WorkflowError::ReportAlreadySubmitted);
        }
        assignment.report = Some(VerificationReport {
            findings: input.findings,
            visit_date: input.visit_date,
            submitted_at: Utc::now(),
        });
        assignment.visit_date = Some(input.visit_date);
        assignment.status = VerificationStatus::Completed;

        let all_complete = application.all_verifications_complete();
        let ctx = RoutingContext {
            all_verifications_complete: all_complete,
            ..Default::default()
        };
        self.advance(&mut application, kind, &actor, &ctx, None)?;
        let saved = self.commit(application, &actor)?;
        if all_complete {
            if let Some(owner) = &saved.current_owner {
                self.notify(
                    owner,
                    &format!("All verification reports for application {} are in.", saved.id),
                );
            }
        }
        Ok(saved)
    }

    pub fn submit_recommendation(
        &self,
        id: &ApplicationId,
        input: RecommendationInput,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::SubmitRecommendation;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        self.ensure_owner_role(&application, actor.role)?;

        application.recommendation = Some(Recommendation {
            text: input.text,
            submitted_by: actor.clone(),
            submitted_at: Utc::now(),
        });
        self.advance(&mut application, kind, &actor, &RoutingContext::default(), None)?;
        self.commit(application, &actor)
    }

    pub fn record_minister_decision(
        &self,
        id: &ApplicationId,
        input: DecisionInput,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::RecordDecision;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        self.ensure_owner_role(&application, actor.role)?;
        if application.recommendation.is_none() {
            return Err(WorkflowError::RecommendationNotFound);
        }
        if input.decision == DecisionType::Disapprove && input.disapproval_type.is_none() {
            return Err(ValidationError::MissingDisapprovalType.into());
        }

        // A decision after a granted appeal replaces the earlier one.
        application.decision = Some(MinisterDecision {
            decision: input.decision,
            disapproval_type: input.disapproval_type,
            reason: input.reason,
            decided_by: actor.clone(),
            decided_at: Utc::now(),
        });
        application.decision_date = Some(Utc::now().date_naive());
        if input.decision == DecisionType::Approve {
            application.gazettement = Some(Gazettement {
                status: GazettementStatus::Pending,
                gazette_number: None,
                gazette_date: None,
                processed_by: None,
            });
        }

        let ctx = RoutingContext {
            minister_decision: Some((input.decision, input.disapproval_type)),
            ..Default::default()
        };
        self.advance(&mut application, kind, &actor, &ctx, None)?;
        let saved = self.commit(application, &actor)?;
        self.notify(
            &saved.applicant,
            &format!(
                "A ministerial decision was recorded on application {}.",
                saved.id
            ),
        );
        Ok(saved)
    }

    pub fn update_gazettement(
        &self,
        id: &ApplicationId,
        input: GazettementUpdate,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::UpdateGazettement;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        self.ensure_owner_role(&application, actor.role)?;

        let gazettement = application
            .gazettement
            .as_mut()
            .ok_or(WorkflowError::GazettementNotFound)?;
        gazettement.status = GazettementStatus::Gazetted;
        gazettement.gazette_number = Some(input.gazette_number);
        gazettement.gazette_date = Some(input.gazette_date);
        gazettement.processed_by = Some(actor.clone());

        self.advance(&mut application, kind, &actor, &RoutingContext::default(), None)?;
        let saved = self.commit(application, &actor)?;
        self.notify(
            &saved.applicant,
            &format!("Application {} has been gazetted.", saved.id),
        );
        Ok(saved)
    }

    pub fn submit_appeal(
        &self,
        id: &ApplicationId,
        input: AppealInput,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::SubmitAppeal;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        if !application.applicant_is(&actor.id) {
            return Err(WorkflowError::NotApplicant);
        }
        if application.decision.is_none() {
            return Err(WorkflowError::DecisionNotFound);
        }
        if application.open_appeal().is_some() {
            return Err(WorkflowError::AppealAlreadyOpen);
        }
        if input.grounds.trim().is_empty() {
            return Err(ValidationError::EmptyGrounds.into());
        }

        application.appeals.push(Appeal {
            grounds: input.grounds,
            status: AppealStatus::Submitted,
            appellant: actor.clone(),
            submitted_at: Utc::now(),
            decision_reason: None,
            decided_by: None,
            decided_at: None,
        });
        self.advance(&mut application, kind, &actor, &RoutingContext::default(), None)?;
        self.commit(application, &actor)
    }

    pub fn decide_appeal(
        &self,
        id: &ApplicationId,
        input: AppealDecisionInput,
    ) -> Result<Application, WorkflowError> {
        let kind = TriggerKind::DecideAppeal;
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        self.ensure_owner_role(&application, actor.role)?;
        if application.open_appeal().is_none() {
            return Err(WorkflowError::AppealNotFound);
        }

        let decided_at = Utc::now();
        if let Some(appeal) = application.latest_appeal_mut() {
            appeal.status = AppealStatus::Closed;
            appeal.decision_reason = Some(input.reason.clone());
            appeal.decided_by = Some(actor.clone());
            appeal.decided_at = Some(decided_at);
        }

        let ctx = RoutingContext {
            appeal_decision: Some(input.decision),
            ..Default::default()
        };
        self.advance(&mut application, kind, &actor, &ctx, Some(input.reason))?;
        let saved = self.commit(application, &actor)?;
        let outcome = match input.decision {
            DecisionType::Approve => "granted",
            DecisionType::Disapprove => "rejected",
        };
        self.notify(
            &saved.applicant,
            &format!("Your appeal on application {} was {outcome}.", saved.id),
        );
        Ok(saved)
    }

    // --- internals ---

    /// Load, guard, advance, save: the shape shared by the comment-only
    /// triggers.
    fn simple_advance(
        &self,
        id: &ApplicationId,
        kind: TriggerKind,
        input: ActionInput,
    ) -> Result<Application, WorkflowError> {
        let actor = self.require_permission(&input.actor, kind.required_permission())?;
        let mut application = self.load(id)?;
        self.ensure_status(kind, &application)?;
        self.ensure_owner_role(&application, actor.role)?;
        self.advance(&mut application, kind, &actor, &RoutingContext::default(), input.comments)?;
        self.commit(application, &actor)
    }

    /// Resolves the route, re-points ownership, mutates the status, and
    /// appends exactly one audit row. Does not persist and does not notify;
    /// `commit` handles both once the transition is durable.
    fn advance(
        &self,
        application: &mut Application,
        kind: TriggerKind,
        actor: &UserRef,
        ctx: &RoutingContext,
        comments: Option<String>,
    ) -> Result<(), WorkflowError> {
        let route = routing::resolve(application.status, kind, ctx).map_err(|err| match err {
            RoutingError::NotAllowedFrom { kind, status } => WorkflowError::Precondition {
                action: kind.label(),
                status,
            },
            RoutingError::MissingDecisionInput => {
                ValidationError::MissingDisapprovalType.into()
            }
        })?;

        let next_owner = match route.owner {
            OwnerRouting::Role(role) => Some(
                self.directory
                    .find_active_by_role(role)
                    .ok_or(WorkflowError::NoActiveRoleHolder(role))?,
            ),
            OwnerRouting::Applicant => Some(application.applicant.clone()),
            OwnerRouting::Keep => application.current_owner.clone(),
            OwnerRouting::Clear => None,
        };

        let from = application.status;
        application.audit.record(
            kind.action(),
            Some(from),
            route.next_status,
            actor.clone(),
            comments,
        );
        application.status = route.next_status;
        application.current_owner = next_owner;

        info!(
            application = %application.id,
            trigger = kind.label(),
            from = from.label(),
            to = route.next_status.label(),
            "workflow transition applied"
        );
        Ok(())
    }

    /// Persists a transitioned aggregate and, only after the write has
    /// committed, hands the file to its new owner. A rejected write must
    /// not leave a handoff notification for a transition that never
    /// happened.
    fn commit(
        &self,
        application: Application,
        actor: &UserRef,
    ) -> Result<Application, WorkflowError> {
        let saved = self.save(application)?;
        if let Some(owner) = &saved.current_owner {
            if owner.id != actor.id {
                self.notify(
                    owner,
                    &format!("Application {} now requires your action.", saved.id),
                );
            }
        }
        Ok(saved)
    }

    fn require_permission(
        &self,
        actor: &UserId,
        permission: Permission,
    ) -> Result<UserRef, WorkflowError> {
        let actor = self
            .directory
            .find_by_id(actor)
            .ok_or_else(|| WorkflowError::ActorNotFound(actor.clone()))?;
        if !self.policy.allows(actor.role, permission) {
            return Err(WorkflowError::PermissionDenied {
                role: actor.role,
                permission,
            });
        }
        Ok(actor)
    }

    fn ensure_status(
        &self,
        kind: TriggerKind,
        application: &Application,
    ) -> Result<(), WorkflowError> {
        if kind.allowed_from().contains(&application.status) {
            Ok(())
        } else {
            Err(WorkflowError::Precondition {
                action: kind.label(),
                status: application.status,
            })
        }
    }

    fn ensure_owner_role(
        &self,
        application: &Application,
        role: UserRole,
    ) -> Result<(), WorkflowError> {
        if application.owned_by_role(role) {
            Ok(())
        } else {
            Err(WorkflowError::NotCurrentOwner)
        }
    }

    fn load(&self, id: &ApplicationId) -> Result<Application, WorkflowError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| WorkflowError::ApplicationNotFound(id.clone()))
    }

    fn save(&self, application: Application) -> Result<Application, WorkflowError> {
        Ok(self.store.update(application)?)
    }

    fn next_application_number(&self) -> Result<ApplicationId, WorkflowError> {
        let sequence = self.store.count()? + 1;
        Ok(ApplicationId(format!(
            "{}/{}/{:04}",
            self.config.application_number_prefix,
            Utc::now().year(),
            sequence
        )))
    }

    /// Notification failures are logged and never fail the transition.
    fn notify(&self, recipient: &UserRef, message: &str) {
        if let Err(err) = self.notifier.notify(&recipient.id, message) {
            warn!(
                recipient = %recipient.id,
                error = %err,
                "notification delivery failed"
            );
        }
    }
}
